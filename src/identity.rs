//! Canonical display identity and the dedup normalization key.
//!
//! The display text (`{artist} {YYYY-MM-DD} {venue/location}`) is what gets
//! used for folder and file naming. The normalization key (`{artist}
//! {YYYY-MM-DD}`) is the equality class used for dedup: trailing
//! venue/location formatting differs between a live scrape, a folder name on
//! disk, and a processed-log line, so only the leading artist+date span
//! participates in comparisons. Every code path that produces or consumes a
//! name must go through [`normalization_key`] — that consistency is the
//! central correctness property of the pipeline.

use crate::dates::{find_embedded_date, normalize_date, EventDate};
use crate::sanitize::sanitize;
use regex::Regex;

/// The canonical identity of a single event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalIdentity {
    /// Sanitized `{artist} {date} {venue/location}` display string.
    pub display_text: String,
    /// `{artist} {YYYY-MM-DD}` dedup key, when one could be extracted.
    ///
    /// `None` means the item cannot be deduplicated and is treated as
    /// never-seen. That is a documented edge case, not silently corrected.
    pub key: Option<String>,
}

/// Build the canonical identity for an event.
///
/// If `venue_location` embeds a recognizable date pattern, that date is
/// extracted, removed from the free text, and normalized; otherwise the
/// `fallback` date (typically from the page's `<time>` element) is used
/// as-is. The composed string is sanitized before the key is derived, so the
/// identity matches what lands on disk byte-for-byte.
///
/// Deterministic: identical inputs always yield identical identities.
pub fn build_identity(
    artist: &str,
    venue_location: &str,
    fallback: &EventDate,
    fallback_year: i32,
) -> CanonicalIdentity {
    let (date, residual) = match find_embedded_date(venue_location) {
        Some((range, matched)) => {
            let date = normalize_date(matched, fallback_year);
            let mut residual = String::with_capacity(venue_location.len());
            residual.push_str(&venue_location[..range.start]);
            residual.push_str(&venue_location[range.end..]);
            (date, tidy_residual(&residual))
        }
        None => (*fallback, venue_location.trim().to_string()),
    };

    let display_text = sanitize(&format!("{artist} {date} {residual}"));
    let key = normalization_key(&display_text);
    CanonicalIdentity { display_text, key }
}

/// Extract the `{artist} {YYYY-MM-DD}` normalization key from a display
/// string: a leading free-text span immediately followed by a `YYYY-MM-DD`
/// token. Returns `None` when no such token exists.
pub fn normalization_key(display_text: &str) -> Option<String> {
    let re = Regex::new(r"^(.*?)(\d{4}-\d{2}-\d{2})").unwrap();
    let caps = re.captures(display_text)?;
    let artist = caps[1].trim();
    let date = &caps[2];
    Some(format!("{artist} {date}"))
}

/// Clean up the punctuation debris left behind when a date substring is cut
/// out of a venue/location string: orphaned `: ,` pairs, comma spacing, and
/// leading/trailing separators.
fn tidy_residual(text: &str) -> String {
    let text = Regex::new(r"\s*:\s*,").unwrap().replace_all(text, ":");
    let text = Regex::new(r"\s*,\s*").unwrap().replace_all(&text, ", ");
    let text = text.trim_matches(|c| c == ',' || c == ' ');
    Regex::new(r"\s*:\s*")
        .unwrap()
        .replace_all(text, ": ")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn known(y: i32, m: u32, d: u32) -> EventDate {
        EventDate::Known(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    #[test]
    fn composes_artist_date_venue() {
        let id = build_identity(
            "Phish",
            "Madison Square Garden, New York, NY",
            &known(2023, 9, 3),
            2023,
        );
        assert_eq!(
            id.display_text,
            "Phish 2023-09-03 Madison Square Garden, New York, NY"
        );
        assert_eq!(id.key.as_deref(), Some("Phish 2023-09-03"));
    }

    #[test]
    fn embedded_date_is_extracted_and_removed() {
        let id = build_identity(
            "Billy Strings",
            "Premiere: Red Rocks Sep 3, 2023 Morrison, CO",
            &EventDate::Unknown,
            1999,
        );
        assert_eq!(
            id.display_text,
            "Billy Strings 2023-09-03 Premiere: Red Rocks Morrison, CO"
        );
        assert_eq!(id.key.as_deref(), Some("Billy Strings 2023-09-03"));
    }

    #[test]
    fn fallback_date_used_when_no_embedded_date() {
        let id = build_identity("Phish", "The Gorge", &known(2024, 7, 19), 2024);
        assert_eq!(id.display_text, "Phish 2024-07-19 The Gorge");
    }

    #[test]
    fn differently_formatted_strings_share_a_key() {
        let folder = normalization_key("Phish 2023-09-03 MSG");
        let scraped =
            normalization_key("Phish 2023-09-03 Madison Square Garden, New York, NY");
        assert_eq!(folder, scraped);
        assert_eq!(folder.as_deref(), Some("Phish 2023-09-03"));
    }

    #[test]
    fn missing_date_token_yields_no_key() {
        let id = build_identity("Phish", "The Gorge", &EventDate::Unknown, 2024);
        assert_eq!(id.display_text, "Phish Unknown Date The Gorge");
        assert_eq!(id.key, None);
        assert_eq!(normalization_key("no date in here"), None);
    }

    #[test]
    fn identity_is_deterministic() {
        let a = build_identity("Goose", "The Capitol Theatre, Port Chester, NY", &known(2024, 6, 20), 2024);
        let b = build_identity("Goose", "The Capitol Theatre, Port Chester, NY", &known(2024, 6, 20), 2024);
        assert_eq!(a, b);
    }

    #[test]
    fn display_text_is_sanitized() {
        let id = build_identity(
            "Umphrey's McGee",
            "Red Rocks & Friends - Morrison/CO",
            &known(2023, 6, 30),
            2023,
        );
        assert_eq!(
            id.display_text,
            "Umphrey's McGee 2023-06-30 Red Rocks and Friends, Morrison_CO"
        );
    }
}
