//! HTML field extraction for nugs.net pages.
//!
//! This module contains the parsing logic for pulling structured event
//! metadata out of rendered pages. These are pure functions over parsed
//! documents: the client fetches, this module extracts, and the identity
//! builder composes. Two document shapes exist — a single-event page
//! (release or livestream) and a catalog listing of cards — and both flow
//! through the same parser so their sanitization and normalization rules
//! can never drift apart.

use crate::dates::{normalize_date, parse_datetime_attr, split_day_range, EventDate};
use scraper::{Html, Selector};
use std::collections::HashSet;

pub const BASE_URL: &str = "https://play.nugs.net";

/// Sentinel for a missing artist heading.
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";
/// Sentinel for a missing venue/address element.
pub const UNKNOWN_VENUE: &str = "Unknown Venue";

/// Label prefixes the platform sticks in front of the venue text.
const VENUE_PREFIXES: &[&str] = &["Premiere:", "Friday Night Cheese:"];

/// The two document shapes the extractor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    /// A release or livestream page describing exactly one event.
    SingleEvent,
    /// A listing page of catalog cards, each linking to an event.
    CatalogListing,
}

impl PageKind {
    /// Classify a URL by shape. Release and exclusive URLs point at single
    /// events; everything else is treated as a catalog listing.
    pub fn classify(url: &str) -> PageKind {
        if url.contains("/release/") || url.contains("/exclusive/") {
            PageKind::SingleEvent
        } else {
            PageKind::CatalogListing
        }
    }
}

/// Structured metadata extracted from a single-event page.
///
/// Ephemeral: reconstructed on every scrape, consumed by the identity
/// builder, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRecord {
    /// First top-level heading, or [`UNKNOWN_ARTIST`].
    pub artist: String,
    /// First comma-segment of the address element, or [`UNKNOWN_VENUE`].
    pub venue: String,
    /// Remainder of the address after the first comma; empty when absent.
    pub location: String,
    /// The date text as found in the source, before normalization.
    pub raw_date_text: Option<String>,
    /// Normalized date; [`EventDate::Unknown`] when no time element exists.
    pub date: EventDate,
    /// Livestream-only releases route to a different download source.
    pub exclusive: bool,
    pub source_url: String,
}

impl EventRecord {
    /// The composed free-text venue/location string fed to the identity
    /// builder.
    pub fn venue_location(&self) -> String {
        if self.location.is_empty() {
            self.venue.clone()
        } else {
            format!("{}, {}", self.venue, self.location)
        }
    }
}

/// A single card on a catalog listing page.
///
/// Card metadata is best-effort: a missing anchor degrades the field to
/// `None` without dropping the card, since the event page itself is the
/// authoritative source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogCard {
    /// Absolute URL of the event page this card links to.
    pub url: String,
    pub exclusive: bool,
    pub artist: Option<String>,
    pub venue: Option<String>,
}

/// Parser for nugs.net HTML pages.
///
/// Stateless and focused purely on extraction; degraded fields become
/// sentinels or `None`, never errors.
#[derive(Debug, Clone, Default)]
pub struct NugsParser;

impl NugsParser {
    pub fn new() -> Self {
        Self
    }

    /// Extract the event record from a single-event page.
    ///
    /// Extraction is structural: the artist is the first `h1`, venue and
    /// location come from the `address` element split at its first comma,
    /// and the date comes from the `time` element's machine-readable
    /// `datetime` attribute when present, else its display text (normalized
    /// with `fallback_year` for year-less forms), else stays unknown.
    pub fn parse_event(
        &self,
        document: &Html,
        source_url: &str,
        exclusive: bool,
        fallback_year: i32,
    ) -> EventRecord {
        let artist = self
            .first_text(document, "h1")
            .unwrap_or_else(|| UNKNOWN_ARTIST.to_string());

        let (venue, location) = match self.first_text(document, "address") {
            Some(address) => split_venue_location(&address),
            None => {
                log::warn!("no address element on {source_url}");
                (UNKNOWN_VENUE.to_string(), String::new())
            }
        };

        let (raw_date_text, date) = self.extract_date(document, fallback_year);

        log::debug!("extracted {artist} / {venue} / {date} from {source_url}");
        EventRecord {
            artist,
            venue,
            location,
            raw_date_text,
            date,
            exclusive,
            source_url: source_url.to_string(),
        }
    }

    /// Extract every release/exclusive card from a catalog listing page.
    ///
    /// Cards are keyed by their release id, so the same event linked from
    /// several anchors yields one card.
    pub fn parse_catalog(&self, document: &Html) -> Vec<CatalogCard> {
        let link_selector =
            Selector::parse(r#"a[href*="/release/"], a[href*="/exclusive/"]"#).unwrap();

        let mut cards = Vec::new();
        let mut seen = HashSet::new();

        for anchor in document.select(&link_selector) {
            let href = match anchor.value().attr("href") {
                Some(href) => href,
                None => continue,
            };
            let exclusive = href.contains("/exclusive/");
            let release_id = match trailing_release_id(href) {
                Some(id) => id,
                None => continue,
            };
            if !seen.insert((release_id.to_string(), exclusive)) {
                continue;
            }

            let url = if exclusive {
                format!("{BASE_URL}/watch/livestreams/exclusive/{release_id}")
            } else {
                format!("{BASE_URL}/release/{release_id}")
            };

            let (artist, venue) = self.card_image_metadata(&anchor);
            cards.push(CatalogCard {
                url,
                exclusive,
                artist,
                venue,
            });
        }

        log::debug!("found {} catalog cards", cards.len());
        cards
    }

    /// Best-effort artist/venue from the card image's descriptive alt text,
    /// via fixed substring anchors (`"Artist X,"`, `"released at - Y"`).
    fn card_image_metadata(
        &self,
        anchor: &scraper::ElementRef,
    ) -> (Option<String>, Option<String>) {
        let img_selector = Selector::parse("img").unwrap();
        let alt = anchor
            .select(&img_selector)
            .next()
            .and_then(|img| img.value().attr("alt"))
            .unwrap_or("");

        let artist = alt.split_once("Artist ").and_then(|(_, rest)| {
            let name = rest.split(',').next().unwrap_or("").trim();
            (!name.is_empty()).then(|| name.to_string())
        });
        let venue = alt.split_once("released at - ").and_then(|(_, rest)| {
            let name = rest.trim();
            (!name.is_empty()).then(|| name.to_string())
        });
        (artist, venue)
    }

    /// URL of the event's cover image, if the page carries one. Absence is
    /// not an error; the image is a best-effort extra.
    pub fn cover_image_url(&self, document: &Html) -> Option<String> {
        let selector =
            Selector::parse(".my1 > div:nth-child(1) > div:nth-child(1) > img:nth-child(1)")
                .unwrap();
        document
            .select(&selector)
            .next()
            .and_then(|img| img.value().attr("src"))
            .map(str::to_string)
    }

    fn extract_date(&self, document: &Html, fallback_year: i32) -> (Option<String>, EventDate) {
        let time_selector = Selector::parse("time").unwrap();
        let time_element = match document.select(&time_selector).next() {
            Some(el) => el,
            None => return (None, EventDate::Unknown),
        };

        if let Some(attr) = time_element.value().attr("datetime") {
            let date = parse_datetime_attr(attr);
            if date.is_known() {
                return (Some(attr.to_string()), date);
            }
            log::warn!("unparsable datetime attribute {attr:?}");
        }

        let display = time_element.text().collect::<String>().trim().to_string();
        if display.is_empty() {
            return (None, EventDate::Unknown);
        }
        // Multi-day runs ("Sep 3 & 4, 2023") identify by their first day.
        let days = split_day_range(&display);
        if days.len() > 1 {
            log::debug!("multi-day range {display:?}, keying on the first day");
        }
        let date = normalize_date(&days[0], fallback_year);
        (Some(display), date)
    }

    fn first_text(&self, document: &Html, selector: &str) -> Option<String> {
        let selector = Selector::parse(selector).unwrap();
        let text = document
            .select(&selector)
            .next()?
            .text()
            .collect::<String>()
            .trim()
            .to_string();
        (!text.is_empty()).then_some(text)
    }
}

/// Split an address into `(venue, location)` at the first comma, stripping
/// known label prefixes first.
fn split_venue_location(address: &str) -> (String, String) {
    let mut address = address.trim();
    for prefix in VENUE_PREFIXES {
        if let Some(stripped) = address.strip_prefix(prefix) {
            address = stripped.trim_start();
            break;
        }
    }
    match address.split_once(',') {
        Some((venue, location)) => (venue.trim().to_string(), location.trim().to_string()),
        None => (address.to_string(), String::new()),
    }
}

/// The numeric release id at the end of a release/exclusive href.
fn trailing_release_id(href: &str) -> Option<&str> {
    let id = href.trim_end_matches('/').rsplit('/').next()?;
    (!id.is_empty() && id.chars().all(|c| c.is_ascii_digit())).then_some(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const EVENT_PAGE: &str = r#"<html><body>
        <h1>Phish</h1>
        <address>Madison Square Garden, New York, NY</address>
        <time datetime="2023-09-03T19:30:00.000Z">Sep 3, 2023</time>
    </body></html>"#;

    #[test]
    fn parses_a_complete_event_page() {
        let doc = Html::parse_document(EVENT_PAGE);
        let record =
            NugsParser::new().parse_event(&doc, "https://play.nugs.net/release/12345", false, 2023);
        assert_eq!(record.artist, "Phish");
        assert_eq!(record.venue, "Madison Square Garden");
        assert_eq!(record.location, "New York, NY");
        assert_eq!(
            record.venue_location(),
            "Madison Square Garden, New York, NY"
        );
        assert_eq!(
            record.date,
            EventDate::Known(NaiveDate::from_ymd_opt(2023, 9, 3).unwrap())
        );
        assert!(!record.exclusive);
    }

    #[test]
    fn missing_fields_degrade_to_sentinels() {
        let doc = Html::parse_document("<html><body><p>nothing here</p></body></html>");
        let record = NugsParser::new().parse_event(&doc, "https://example.invalid", false, 2023);
        assert_eq!(record.artist, UNKNOWN_ARTIST);
        assert_eq!(record.venue, UNKNOWN_VENUE);
        assert_eq!(record.location, "");
        assert_eq!(record.date, EventDate::Unknown);
        assert_eq!(record.raw_date_text, None);
    }

    #[test]
    fn display_text_date_used_when_attr_is_garbage() {
        let html = r#"<html><body><h1>Goose</h1>
            <address>The Capitol Theatre, Port Chester, NY</address>
            <time datetime="not-a-date">Jun 20, 2024</time></body></html>"#;
        let record = NugsParser::new().parse_event(
            &Html::parse_document(html),
            "https://play.nugs.net/release/9",
            false,
            2024,
        );
        assert_eq!(
            record.date,
            EventDate::Known(NaiveDate::from_ymd_opt(2024, 6, 20).unwrap())
        );
        assert_eq!(record.raw_date_text.as_deref(), Some("Jun 20, 2024"));
    }

    #[test]
    fn multi_day_range_keys_on_first_day() {
        let html = r#"<html><body><h1>Dead and Company</h1>
            <address>The Sphere, Las Vegas, NV</address>
            <time>Sep 3 & 4, 2023</time></body></html>"#;
        let record = NugsParser::new().parse_event(
            &Html::parse_document(html),
            "https://play.nugs.net/release/8",
            false,
            1999,
        );
        assert_eq!(
            record.date,
            EventDate::Known(NaiveDate::from_ymd_opt(2023, 9, 3).unwrap())
        );
        assert_eq!(record.raw_date_text.as_deref(), Some("Sep 3 & 4, 2023"));
    }

    #[test]
    fn venue_prefix_labels_are_stripped() {
        let (venue, location) = split_venue_location("Premiere: Red Rocks, Morrison, CO");
        assert_eq!(venue, "Red Rocks");
        assert_eq!(location, "Morrison, CO");
    }

    #[test]
    fn address_without_comma_has_empty_location() {
        let (venue, location) = split_venue_location("The Gorge");
        assert_eq!(venue, "The Gorge");
        assert_eq!(location, "");
    }

    const CATALOG_PAGE: &str = r#"<html><body>
        <a href="/release/34001"><img alt="Artist Phish, released at - Madison Square Garden"></a>
        <a href="/release/34001"><span>duplicate anchor</span></a>
        <a href="/exclusive/7001"><img alt="Artist Goose"></a>
        <a href="/release/not-a-number">broken</a>
        <a href="/somewhere/else">unrelated</a>
    </body></html>"#;

    #[test]
    fn catalog_cards_are_deduplicated_and_classified() {
        let cards = NugsParser::new().parse_catalog(&Html::parse_document(CATALOG_PAGE));
        assert_eq!(cards.len(), 2);

        assert_eq!(cards[0].url, "https://play.nugs.net/release/34001");
        assert!(!cards[0].exclusive);
        assert_eq!(cards[0].artist.as_deref(), Some("Phish"));
        assert_eq!(
            cards[0].venue.as_deref(),
            Some("Madison Square Garden")
        );

        assert_eq!(
            cards[1].url,
            "https://play.nugs.net/watch/livestreams/exclusive/7001"
        );
        assert!(cards[1].exclusive);
        assert_eq!(cards[1].artist.as_deref(), Some("Goose"));
        // Missing "released at" anchor degrades to None, card survives.
        assert_eq!(cards[1].venue, None);
    }

    #[test]
    fn page_kind_classification() {
        assert_eq!(
            PageKind::classify("https://play.nugs.net/release/34001"),
            PageKind::SingleEvent
        );
        assert_eq!(
            PageKind::classify("https://play.nugs.net/watch/livestreams/exclusive/7001"),
            PageKind::SingleEvent
        );
        assert_eq!(
            PageKind::classify("https://play.nugs.net/watch/videos/recent"),
            PageKind::CatalogListing
        );
    }
}
