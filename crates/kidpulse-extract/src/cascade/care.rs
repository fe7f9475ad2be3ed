//! Diaper and nap cards.

use chrono::{Duration, NaiveDateTime};
use kidpulse_core::{DiaperEvent, DiaperType, EventKind, EventRecord, NapEvent};
use once_cell::sync::Lazy;
use regex::Regex;

use super::{FieldError, FieldResult};
use crate::temporal::{self, FULL_TIMESTAMP};

static VERY_NOTE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(very\s+\w+)").unwrap());
static NOTES_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)notes?:\s*([^\n]+)").unwrap());

static NAP_WINDOW_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)From\s+(Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)\s+(\d{1,2}),?\s+(\d{4})\s+(\d{1,2}):(\d{2})\s*(AM|PM)\s+until\s+(\d{1,2}):(\d{2})\s*(AM|PM)",
    )
    .unwrap()
});
static NAP_OCCURRED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"(?i)Occurred at\s+({})", FULL_TIMESTAMP)).unwrap());

const NAP_POSITIONS: &[&str] = &["Back", "Side", "Stomach", "Tummy"];

pub fn parse_diaper(segment: &str, time: NaiveDateTime) -> FieldResult<EventRecord> {
    let notes = [&*VERY_NOTE_RE, &*NOTES_RE]
        .iter()
        .find_map(|re| re.captures(segment))
        .map(|c| c[1].trim().to_string())
        .filter(|n| !n.is_empty());

    Ok(EventRecord::Diaper(DiaperEvent {
        time,
        diaper_type: DiaperType::from_label(segment),
        notes,
    }))
}

/// A nap is either a from/until window or a single "occurred at" start.
/// The window form wins when both appear. The window's end carries no date,
/// so an end earlier than the start falls on the next day.
pub fn parse_nap(segment: &str) -> FieldResult<EventRecord> {
    let position = nap_position(segment);

    if let Some(caps) = NAP_WINDOW_RE.captures(segment) {
        let date = temporal::calendar_date(&caps[1], &caps[2], &caps[3])
            .ok_or(FieldError::MissingTimestamp(EventKind::Napping))?;
        let start = clock(&caps[4], &caps[5], &caps[6])?;
        let end = clock(&caps[7], &caps[8], &caps[9])?;
        let start = date.and_time(start);
        let mut end = date.and_time(end);
        if end < start {
            end += Duration::days(1);
        }
        return Ok(EventRecord::Napping(NapEvent {
            start,
            end: Some(end),
            position,
        }));
    }

    let start = NAP_OCCURRED_RE
        .captures(segment)
        .and_then(|caps| temporal::resolve_full(&caps[1]))
        .ok_or(FieldError::MissingTimestamp(EventKind::Napping))?;

    Ok(EventRecord::Napping(NapEvent {
        start,
        end: None,
        position,
    }))
}

fn clock(hour: &str, minute: &str, meridiem: &str) -> FieldResult<chrono::NaiveTime> {
    hour.parse::<u32>()
        .ok()
        .zip(minute.parse::<u32>().ok())
        .and_then(|(h, m)| temporal::clock_12h(h, m, meridiem))
        .ok_or(FieldError::MissingTimestamp(EventKind::Napping))
}

fn nap_position(segment: &str) -> Option<String> {
    let words: Vec<String> = segment
        .split(|c: char| !c.is_alphanumeric())
        .map(|w| w.to_lowercase())
        .collect();
    NAP_POSITIONS
        .iter()
        .find(|pos| words.iter().any(|w| *w == pos.to_lowercase()))
        .map(|pos| pos.to_string())
}
