//! End-to-end checks of the extract → identity → dedup pipeline, exercising
//! the property the whole system depends on: a live scrape, a folder name on
//! disk, and a processed-log line that all describe the same event must
//! agree on one normalization key.

use nugs_archive::dates::normalize_date;
use nugs_archive::{build_identity, normalization_key, DedupIndex, Html, NugsParser};

fn event_page(artist: &str, address: &str, datetime: &str, display: &str) -> String {
    format!(
        r#"<html><body>
            <h1>{artist}</h1>
            <address>{address}</address>
            <time datetime="{datetime}">{display}</time>
        </body></html>"#
    )
}

fn identity_for(html: &str, url: &str) -> nugs_archive::CanonicalIdentity {
    let document = Html::parse_document(html);
    let record = NugsParser::new().parse_event(&document, url, false, 2023);
    build_identity(&record.artist, &record.venue_location(), &record.date, 2023)
}

#[test]
fn scrape_disk_and_log_agree_on_one_key() {
    let html = event_page(
        "Phish",
        "Madison Square Garden, New York, NY",
        "2023-09-03T19:30:00.000Z",
        "Sep 3, 2023",
    );
    let scraped = identity_for(&html, "https://play.nugs.net/release/34001");
    assert_eq!(
        scraped.display_text,
        "Phish 2023-09-03 Madison Square Garden, New York, NY"
    );

    // A terse folder name from an earlier run and a log line with a
    // resolution suffix both reduce to the scraped key.
    let disk_name = "Phish 2023-09-03 MSG";
    let log_line = "Phish 2023-09-03 Madison Square Garden, New York, NY 1080p.mkv";
    assert_eq!(
        normalization_key(disk_name),
        scraped.key.clone()
    );
    assert_eq!(normalization_key(log_line), scraped.key);
}

#[test]
fn dedup_index_blocks_a_rescrape() {
    let index = DedupIndex::build([
        "Phish 2023-09-03 MSG",
        "Goose 2024-06-20 The Capitol Theatre 720p.mkv",
    ]);

    let html = event_page(
        "Phish",
        "Madison Square Garden, New York, NY",
        "2023-09-03T19:30:00.000Z",
        "Sep 3, 2023",
    );
    let scraped = identity_for(&html, "https://play.nugs.net/release/34001");
    assert!(index.contains(&scraped.display_text));

    // A new date at the same venue sails through.
    let html = event_page(
        "Phish",
        "Madison Square Garden, New York, NY",
        "2023-09-04T19:30:00.000Z",
        "Sep 4, 2023",
    );
    let fresh = identity_for(&html, "https://play.nugs.net/release/34002");
    assert!(!index.contains(&fresh.display_text));
}

#[test]
fn every_date_grammar_lands_on_the_same_identity() {
    // Same show described four ways; the datetime attribute is absent so the
    // display text carries the date.
    let variants = [
        "September 3, 2023",
        "Sep 3, 2023",
        "09 03 2023",
        "Sep 3", // fallback year 2023 supplied below
    ];
    let keys: Vec<_> = variants
        .iter()
        .map(|raw| {
            let date = normalize_date(raw, 2023);
            build_identity("Phish", "Madison Square Garden, New York, NY", &date, 2023).key
        })
        .collect();
    for key in &keys {
        assert_eq!(key.as_deref(), Some("Phish 2023-09-03"));
    }
}

#[test]
fn degraded_identity_is_never_deduplicated() {
    // No date anywhere: the identity has no key and must always be treated
    // as never-seen.
    let html = "<html><body><h1>Phish</h1><address>The Gorge</address></body></html>";
    let identity = identity_for(html, "https://play.nugs.net/release/34003");
    assert_eq!(identity.display_text, "Phish Unknown Date The Gorge");
    assert_eq!(identity.key, None);

    let index = DedupIndex::build(["Phish Unknown Date The Gorge"]);
    assert!(index.is_empty());
    assert!(!index.contains(&identity.display_text));
}

#[test]
fn illegal_characters_never_reach_a_file_name() {
    let html = event_page(
        "Umphrey's McGee",
        r#"Red Rocks "Night 2" - Morrison/CO"#,
        "2023-06-30T19:30:00.000Z",
        "Jun 30, 2023",
    );
    let identity = identity_for(&html, "https://play.nugs.net/release/34004");
    for c in ['<', '>', ':', '"', '/', '\\', '|', '?', '*'] {
        assert!(
            !identity.display_text.contains(c),
            "illegal {c:?} in {:?}",
            identity.display_text
        );
    }
    assert_eq!(identity.key.as_deref(), Some("Umphrey's McGee 2023-06-30"));
}
