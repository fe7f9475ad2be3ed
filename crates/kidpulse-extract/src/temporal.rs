//! Timestamp resolution for feed fragments.
//!
//! Three fragment shapes are understood, tried in this order:
//! - compound `Jan 30, 2026 7:24 AM` (carries its own date),
//! - 12-hour `7:24 AM`,
//! - 24-hour `07:24`.
//!
//! A clock time next to a year-less `Jan 4` takes that month and day in the
//! reference year, or the year before when that would land after the
//! reference. Other bare clock times take the reference date, which is the
//! scrape's "today" in the configured timezone. Wall-clock time is never read.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;

/// Compound timestamp without capture groups, for embedding in larger patterns.
pub const FULL_TIMESTAMP: &str =
    r"(?:Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)\s+\d{1,2},?\s+\d{4}\s+\d{1,2}:\d{2}\s*(?:AM|PM)";

static FULL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)\s+(\d{1,2}),?\s+(\d{4})\s+(\d{1,2}):(\d{2})\s*(AM|PM)",
    )
    .unwrap()
});
static MONTH_DAY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)\s+(\d{1,2})\b").unwrap()
});
static CLOCK_12H_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\d{1,2}):(\d{2})\s*(AM|PM)").unwrap());
static CLOCK_24H_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\d{1,2}):(\d{2})\b").unwrap());

/// Month number for a three-letter abbreviation (case-insensitive).
pub fn month_number(abbrev: &str) -> Option<u32> {
    let month = match abbrev.to_lowercase().as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}

/// Convert a 12-hour clock reading to a time of day.
///
/// `PM` with hour != 12 adds twelve hours; `AM` with hour 12 becomes midnight.
pub fn clock_12h(hour: u32, minute: u32, meridiem: &str) -> Option<NaiveTime> {
    let hour = match (meridiem.to_uppercase().as_str(), hour) {
        ("PM", h) if h != 12 => h + 12,
        ("AM", 12) => 0,
        (_, h) => h,
    };
    NaiveTime::from_hms_opt(hour, minute, 0)
}

/// Build a date from month abbreviation, day and year strings.
pub fn calendar_date(month: &str, day: &str, year: &str) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year.parse().ok()?, month_number(month)?, day.parse().ok()?)
}

/// Resolve a compound `Mon D, YYYY H:MM AM|PM` fragment.
pub fn resolve_full(fragment: &str) -> Option<NaiveDateTime> {
    let caps = FULL_RE.captures(fragment)?;
    let date = calendar_date(&caps[1], &caps[2], &caps[3])?;
    let time = clock_12h(caps[4].parse().ok()?, caps[5].parse().ok()?, &caps[6])?;
    Some(date.and_time(time))
}

/// Date of a year-less `Mon D` in the fragment, placed at or before the
/// reference date.
pub fn month_day(fragment: &str, reference: NaiveDateTime) -> Option<NaiveDate> {
    let caps = MONTH_DAY_RE.captures(fragment)?;
    let month = month_number(&caps[1])?;
    let day: u32 = caps[2].parse().ok()?;
    let year = reference.date().year();
    match NaiveDate::from_ymd_opt(year, month, day) {
        Some(date) if date <= reference.date() => Some(date),
        _ => NaiveDate::from_ymd_opt(year - 1, month, day),
    }
}

/// Resolve any supported fragment, or `None` when nothing parses.
pub fn try_resolve(fragment: &str, reference: NaiveDateTime) -> Option<NaiveDateTime> {
    if let Some(full) = resolve_full(fragment) {
        return Some(full);
    }

    let date = month_day(fragment, reference).unwrap_or_else(|| reference.date());

    if let Some(caps) = CLOCK_12H_RE.captures(fragment) {
        if let Some(time) = clock_12h(caps[1].parse().ok()?, caps[2].parse().ok()?, &caps[3]) {
            return Some(date.and_time(time));
        }
    }

    let caps = CLOCK_24H_RE.captures(fragment)?;
    let time = NaiveTime::from_hms_opt(caps[1].parse().ok()?, caps[2].parse().ok()?, 0)?;
    Some(date.and_time(time))
}

/// Resolve a fragment, falling back to the reference unmodified.
pub fn resolve(fragment: &str, reference: NaiveDateTime) -> NaiveDateTime {
    try_resolve(fragment, reference).unwrap_or(reference)
}

/// `7:24 AM`
pub fn render_12h(ts: NaiveDateTime) -> String {
    ts.format("%-I:%M %p").to_string()
}

/// `07:24`
pub fn render_24h(ts: NaiveDateTime) -> String {
    ts.format("%H:%M").to_string()
}

/// `Jan 30, 2026 7:24 AM`
pub fn render_full(ts: NaiveDateTime) -> String {
    ts.format("%b %-d, %Y %-I:%M %p").to_string()
}
