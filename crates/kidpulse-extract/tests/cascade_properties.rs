//! Extraction behavior over realistic feed cards, driven through the
//! public `PatternExtractor` API.

use chrono::{NaiveDate, NaiveDateTime};
use kidpulse_core::AttributionConfig;
use kidpulse_extract::{AttributionFilter, FeedInput, PatternExtractor};

fn reference() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 1, 5)
        .unwrap()
        .and_hms_opt(18, 0, 0)
        .unwrap()
}

fn at(h: u32, m: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 1, 5)
        .unwrap()
        .and_hms_opt(h, m, 0)
        .unwrap()
}

fn extract(child: &str, segments: &[&str]) -> kidpulse_core::ChildSummary {
    let segments: Vec<String> = segments.iter().map(|s| s.to_string()).collect();
    let extractor = PatternExtractor::new(AttributionFilter::new(AttributionConfig::default()));
    extractor.extract_child(&FeedInput::new(child, "").with_segments(&segments), reference())
}

#[test]
fn test_sign_out_yields_one_sign_out_and_no_sign_in() {
    let child = extract(
        "Jane Doe",
        &["Sign Out · Jane Doe\nRecorded by Infant C Teacher\nOccurred at Jan 5, 2026 5:30 PM"],
    );
    assert_eq!(child.sign_out_events, vec![at(17, 30)]);
    assert!(child.sign_in_events.is_empty());
    assert_eq!(child.event_count(), 1);
}

#[test]
fn test_repeated_diaper_card_yields_one_record() {
    let card = "Diaper\nWet\nOccurred at Jan 5, 2026 9:10 AM";
    let child = extract("Jane Doe", &[card, card]);
    assert_eq!(child.diapers.len(), 1);
}

#[test]
fn test_other_child_card_is_not_attributed() {
    let child = extract(
        "Jane Doe",
        &["Sign Out · John Smith\nRecorded by Older P Teacher\nOccurred at Jan 5, 2026 5:30 PM"],
    );
    assert!(child.is_empty());
}

#[test]
fn test_bottle_generic_ounces_fill_both_fields() {
    let child = extract("Jane Doe", &["Bottle\n4.0 oz\nOccurred at Jan 5, 2026 9:00 AM"]);
    assert_eq!(child.bottles.len(), 1);
    assert_eq!(child.bottles[0].ounces_offered, 4.0);
    assert_eq!(child.bottles[0].ounces_consumed, 4.0);
}

#[test]
fn test_occurred_at_nap_has_no_end() {
    let child = extract("Jane Doe", &["Napping\nOccurred at Jan 5, 2026 1:10 PM · Back"]);
    assert_eq!(child.naps.len(), 1);
    assert_eq!(child.naps[0].start, at(13, 10));
    assert!(child.naps[0].end.is_none());
    assert!(child.naps[0].duration_minutes().is_none());
}

#[test]
fn test_bare_clock_time_takes_reference_date() {
    let child = extract("Jane Doe", &["Fluids · Lunch\n3 oz\nJan 5 at 12:15 PM"]);
    assert_eq!(child.fluids.len(), 1);
    assert_eq!(child.fluids[0].time, at(12, 15));
    assert_eq!(child.fluids[0].meal_label.as_deref(), Some("Lunch"));
}

#[test]
fn test_yesterdays_card_keeps_its_own_date() {
    let child = extract("Jane Doe", &["Diaper\nWet\nJan 4 at 3:00 PM"]);
    assert_eq!(child.diapers.len(), 1);
    assert_eq!(
        child.diapers[0].time,
        NaiveDate::from_ymd_opt(2026, 1, 4).unwrap().and_hms_opt(15, 0, 0).unwrap()
    );

    let child = extract("Jane Doe", &["Diaper\nBM\nDec 31 at 9:00 AM"]);
    assert_eq!(
        child.diapers[0].time,
        NaiveDate::from_ymd_opt(2025, 12, 31).unwrap().and_hms_opt(9, 0, 0).unwrap()
    );
}
