//! Setlist extraction.
//!
//! Event pages lay the setlist out as a flat, interleaved sequence of set
//! headings and track cards. A small state machine walks that sequence in
//! document order, grouping tracks under the most recent heading and keeping
//! a single running track counter across all sets.

use scraper::{Html, Selector};

/// One labeled group of tracks (`Set 1`, `Set 2`, `Encore`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetGroup {
    pub label: String,
    /// `(position, track name)` pairs; positions are 1-based and contiguous
    /// across the whole setlist, not per set.
    pub tracks: Vec<(u32, String)>,
}

/// An ordered, set-grouped track listing. Built fresh per event, never
/// mutated afterward, serialized once to `info.txt`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Setlist {
    pub sets: Vec<SetGroup>,
    pub track_names: Vec<String>,
    pub track_count: u32,
}

impl Setlist {
    /// Render the text block persisted alongside the item:
    ///
    /// ```text
    /// SETLIST:
    ///     Set 1:
    ///     1. Track A
    ///     2. Track B
    ///     Encore:
    ///     3. Track C
    /// ```
    pub fn to_text(&self) -> String {
        let mut out = String::from("SETLIST:\n");
        for set in &self.sets {
            out.push_str(&format!("    {}:\n", set.label));
            for (position, name) in &set.tracks {
                out.push_str(&format!("    {position}. {name}\n"));
            }
        }
        out
    }
}

/// Map a heading's text onto a set label; unmatched headings return `None`
/// and leave the current label in place.
fn set_label(heading: &str) -> Option<&'static str> {
    let lowered = heading.to_lowercase();
    if lowered.contains("set one") || lowered.contains("set 1") {
        Some("Set 1")
    } else if lowered.contains("set two") || lowered.contains("set 2") {
        Some("Set 2")
    } else if lowered.contains("encore") {
        Some("Encore")
    } else {
        None
    }
}

/// Strip a leading `"N. "` position prefix from a track label.
fn strip_position_prefix(label: &str) -> &str {
    match label.split_once(". ") {
        Some((prefix, rest)) if !prefix.is_empty() && prefix.chars().all(|c| c.is_ascii_digit()) => {
            rest
        }
        _ => label,
    }
}

/// Parse the setlist from an event page.
///
/// With no heading elements at all, every track lands in a single default
/// `Set 1` group in encounter order.
pub fn parse_setlist(document: &Html) -> Setlist {
    let element_selector = Selector::parse("h2, div.track-card").unwrap();
    let track_label_selector = Selector::parse("span.hidden").unwrap();

    let mut setlist = Setlist::default();
    let mut current_set = "Set 1".to_string();
    let mut current_tracks: Vec<(u32, String)> = Vec::new();

    for element in document.select(&element_selector) {
        if element.value().name() == "h2" {
            if !current_tracks.is_empty() {
                setlist.sets.push(SetGroup {
                    label: current_set.clone(),
                    tracks: std::mem::take(&mut current_tracks),
                });
            }
            let heading = element.text().collect::<String>().trim().to_string();
            if let Some(label) = set_label(&heading) {
                current_set = label.to_string();
            }
        } else if let Some(label_span) = element.select(&track_label_selector).next() {
            setlist.track_count += 1;
            let raw_label = label_span.text().collect::<String>().trim().to_string();
            let name = strip_position_prefix(&raw_label).to_string();
            setlist.track_names.push(name.clone());
            current_tracks.push((setlist.track_count, name));
        }
    }

    if !current_tracks.is_empty() {
        setlist.sets.push(SetGroup {
            label: current_set,
            tracks: current_tracks,
        });
    }

    log::debug!(
        "parsed setlist: {} tracks in {} sets",
        setlist.track_count,
        setlist.sets.len()
    );
    setlist
}
