//! Date normalization for event metadata.
//!
//! Dates show up in scraped text in several competing formats ("September 3,
//! 2023", "Sep 3, 2023", "Sep 3", "09 03 2023") and occasionally as multi-day
//! ranges ("Sep 3 & 4, 2023"). Everything funnels through [`normalize_date`]
//! so that the canonical identity and the dedup index always agree on the
//! `YYYY-MM-DD` form.

use chrono::NaiveDate;
use regex::Regex;
use std::fmt;
use std::ops::Range;

const FULL_MONTH_DATE: &str = r"\b(?:January|February|March|April|May|June|July|August|September|October|November|December)\s+\d{1,2},\s+\d{4}\b";
const ABBREV_MONTH_DATE: &str =
    r"\b(?:Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)\s+\d{1,2},\s+\d{4}\b";
const ABBREV_MONTH_NO_YEAR: &str =
    r"\b(?:Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)\s+\d{1,2}\b";
const NUMERIC_DATE: &str = r"\b\d{2}\s\d{2}\s\d{4}\b";

/// A normalized event date.
///
/// Invariant: this is either a valid calendar date or one of exactly two
/// sentinel states. A partially formatted date string is never carried
/// around.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventDate {
    /// A successfully parsed calendar date.
    Known(NaiveDate),
    /// The source text looked like a date but no grammar matched.
    Invalid,
    /// No date was present in the source at all.
    Unknown,
}

impl EventDate {
    pub fn is_known(&self) -> bool {
        matches!(self, EventDate::Known(_))
    }
}

impl fmt::Display for EventDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventDate::Known(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            EventDate::Invalid => write!(f, "Invalid Date"),
            EventDate::Unknown => write!(f, "Unknown Date"),
        }
    }
}

/// Normalize a free-text date substring into an [`EventDate`].
///
/// Candidate grammars are attempted in a fixed order; the first match wins:
///
/// 1. Full month name: `September 3, 2023`
/// 2. Abbreviated month: `Sep 3, 2023`
/// 3. Abbreviated month without a year: `Sep 3` (the year defaults to
///    `fallback_year` — a policy choice, not a correctness guarantee for
///    entries scraped long after the fact)
/// 4. Purely numeric: `09 03 2023`
///
/// Unparsable input yields [`EventDate::Invalid`]; callers treat that as
/// "proceed with a degraded identity", never as a fatal error.
pub fn normalize_date(raw: &str, fallback_year: i32) -> EventDate {
    let raw = raw.trim();
    if raw.is_empty() {
        return EventDate::Unknown;
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%B %d, %Y") {
        return EventDate::Known(date);
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%b %d, %Y") {
        return EventDate::Known(date);
    }
    // "Sep 3" with no year: borrow the fallback year.
    let with_year = format!("{raw}, {fallback_year}");
    if let Ok(date) = NaiveDate::parse_from_str(&with_year, "%b %d, %Y") {
        return EventDate::Known(date);
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%m %d %Y") {
        return EventDate::Known(date);
    }

    EventDate::Invalid
}

/// Parse the machine-readable `datetime="..."` attribute of a `<time>`
/// element, e.g. `2023-09-03T19:30:00.000Z`.
pub fn parse_datetime_attr(value: &str) -> EventDate {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(value) {
        return EventDate::Known(dt.date_naive());
    }
    if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.fZ") {
        return EventDate::Known(dt.date());
    }
    EventDate::Invalid
}

/// Expand a multi-day range like `Sep 3 & 4, 2023` into independent
/// single-day strings (`Sep 3, 2023`, `Sep 4, 2023`).
///
/// Only the first day feeds the canonical identity; the rest exist for
/// download-link resolution. Input without a range comes back unchanged as a
/// single element.
pub fn split_day_range(raw: &str) -> Vec<String> {
    let range_re = Regex::new(r"^([A-Za-z]+)\s+(\d{1,2})\s*&\s*(\d{1,2})(,\s*\d{4})?$").unwrap();
    match range_re.captures(raw.trim()) {
        Some(caps) => {
            let month = &caps[1];
            let year = caps.get(4).map(|m| m.as_str()).unwrap_or("");
            vec![
                format!("{month} {}{year}", &caps[2]),
                format!("{month} {}{year}", &caps[3]),
            ]
        }
        None => vec![raw.trim().to_string()],
    }
}

/// Locate the first recognizable date substring embedded in free text.
///
/// Returns the byte range of the match plus the matched text, so callers can
/// both normalize the date and cut it out of the residual details. The same
/// grammar ordering as [`normalize_date`] applies.
pub fn find_embedded_date(text: &str) -> Option<(Range<usize>, &str)> {
    for pattern in [
        FULL_MONTH_DATE,
        ABBREV_MONTH_DATE,
        ABBREV_MONTH_NO_YEAR,
        NUMERIC_DATE,
    ] {
        let re = Regex::new(pattern).unwrap();
        if let Some(m) = re.find(text) {
            return Some((m.range(), m.as_str()));
        }
    }
    None
}
