//! Splitting a captured page into event cards.

use once_cell::sync::Lazy;
use regex::Regex;

/// Line fragments that open a new event card.
pub const EVENT_HEADERS: &[&str] = &[
    "Sign Out", "Sign In", "Diaper", "Bottle", "Fluids", "Napping", "Eating",
];

static MONTH_DAY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)\s+\d{1,2}").unwrap()
});

/// Split raw page text into segments, one per event card.
///
/// Lines are trimmed and blank lines dropped. Text before the first header
/// forms its own segment (usually navigation chrome).
pub fn segment_feed(raw_text: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in raw_text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if EVENT_HEADERS.iter().any(|h| line.contains(h)) && !current.is_empty() {
            segments.push(current.join("\n"));
            current.clear();
        }
        current.push(line);
    }
    if !current.is_empty() {
        segments.push(current.join("\n"));
    }
    segments
}

/// A real event card carries a month-day date somewhere.
pub fn is_event_card(segment: &str) -> bool {
    MONTH_DAY_RE.is_match(segment)
}
