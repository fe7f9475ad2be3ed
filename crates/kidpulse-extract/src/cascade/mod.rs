//! Pattern extraction cascade.
//!
//! A segment is first classified into one event kind (first match wins),
//! then the kind-specific parser pulls out its fields. Precedence:
//!
//! 1. sign out (before sign in, both mention "sign")
//! 2. sign in
//! 3. diaper
//! 4. bottle
//! 5. fluids
//! 6. nap
//! 7. meal
//!
//! A recognized kind whose fields cannot be parsed is skipped and logged;
//! it is never persisted with placeholder values.

pub mod attendance;
pub mod care;
pub mod feeding;

use chrono::NaiveDateTime;
use kidpulse_core::{EventKind, EventRecord};
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use tracing::{debug, warn};

use crate::temporal;

static SIGN_OUT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bsign\s*out\b").unwrap());
static SIGN_IN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bsign\s*in\b").unwrap());
static NAP_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bnap").unwrap());
static MEAL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)eating|\bmeal").unwrap());

/// Why a recognized event could not be turned into a record.
#[derive(Debug, Error, PartialEq)]
pub enum FieldError {
    #[error("{0} card is missing its timestamp")]
    MissingTimestamp(EventKind),

    #[error("{0} card does not have the expected card layout")]
    UnexpectedLayout(EventKind),

    #[error("invalid {field}: '{value}'")]
    InvalidNumber { field: &'static str, value: String },
}

pub type FieldResult<T> = std::result::Result<T, FieldError>;

/// Classify a segment into an event kind.
pub fn classify(segment: &str) -> Option<EventKind> {
    let lower = segment.to_lowercase();
    if SIGN_OUT_RE.is_match(segment) {
        Some(EventKind::SignOut)
    } else if SIGN_IN_RE.is_match(segment) {
        Some(EventKind::SignIn)
    } else if lower.contains("diaper") {
        Some(EventKind::Diaper)
    } else if lower.contains("bottle") {
        Some(EventKind::Bottle)
    } else if lower.contains("fluids") {
        Some(EventKind::Fluids)
    } else if NAP_RE.is_match(segment) {
        Some(EventKind::Napping)
    } else if MEAL_RE.is_match(segment) {
        Some(EventKind::Meal)
    } else {
        None
    }
}

/// Extract the fields of an already-classified segment.
pub fn extract_kind(
    kind: EventKind,
    segment: &str,
    reference: NaiveDateTime,
) -> FieldResult<EventRecord> {
    match kind {
        EventKind::SignIn | EventKind::SignOut => attendance::parse(kind, segment),
        EventKind::Diaper => care::parse_diaper(segment, event_time(kind, segment, reference)?),
        EventKind::Napping => care::parse_nap(segment),
        EventKind::Bottle => feeding::parse_bottle(segment, event_time(kind, segment, reference)?),
        EventKind::Fluids => feeding::parse_fluids(segment, event_time(kind, segment, reference)?),
        EventKind::Meal => feeding::parse_meal(segment, event_time(kind, segment, reference)?),
    }
}

/// Classify a segment and extract its record.
///
/// `None` when the segment matches no kind, or when the kind matched but a
/// field failed to parse (logged at warn).
pub fn classify_and_extract(segment: &str, reference: NaiveDateTime) -> Option<EventRecord> {
    let Some(kind) = classify(segment) else {
        debug!("No event pattern in segment ({} chars)", segment.len());
        return None;
    };

    match extract_kind(kind, segment, reference) {
        Ok(record) => Some(record),
        Err(e) => {
            warn!("Skipping {} event: {}", kind, e);
            None
        }
    }
}

fn event_time(
    kind: EventKind,
    segment: &str,
    reference: NaiveDateTime,
) -> FieldResult<NaiveDateTime> {
    temporal::try_resolve(segment, reference).ok_or(FieldError::MissingTimestamp(kind))
}

/// Parse a captured decimal as a non-negative ounce amount.
pub(crate) fn parse_ounces(field: &'static str, value: &str) -> FieldResult<f64> {
    match value.trim().parse::<f64>() {
        Ok(oz) if oz.is_finite() && oz >= 0.0 => Ok(oz),
        _ => Err(FieldError::InvalidNumber {
            field,
            value: value.to_string(),
        }),
    }
}

/// First pattern in `patterns` whose group 1 matches.
pub(crate) fn first_capture<'t>(patterns: &[&Regex], text: &'t str) -> Option<&'t str> {
    patterns
        .iter()
        .find_map(|re| re.captures(text).and_then(|c| c.get(1)).map(|m| m.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use kidpulse_core::*;

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

    #[test]
    fn test_classification_precedence() {
        assert_eq!(classify("Sign Out · Jane Doe"), Some(EventKind::SignOut));
        assert_eq!(classify("Sign In · Jane Doe"), Some(EventKind::SignIn));
        assert_eq!(classify("Diaper\nBottle nearby"), Some(EventKind::Diaper));
        assert_eq!(classify("Bottle\nFluids"), Some(EventKind::Bottle));
        assert_eq!(classify("Fluids\n3 oz"), Some(EventKind::Fluids));
        assert_eq!(classify("Napping"), Some(EventKind::Napping));
        assert_eq!(classify("Eating\nMeal items: Pasta"), Some(EventKind::Meal));
        assert_eq!(classify("Messages Home Settings"), None);
        // "snap" is not a nap
        assert_eq!(classify("Photo snapshot"), None);
    }

    #[test]
    fn test_sign_out_never_misfires_as_sign_in() {
        let seg = "Sign Out · Jane Doe\nRecorded by Infant C Teacher\nOccurred at Jan 5, 2026 5:30 PM";
        assert_eq!(
            classify_and_extract(seg, reference()),
            Some(EventRecord::SignOut(at(17, 30)))
        );
    }

    #[test]
    fn test_unparseable_segment_discarded() {
        assert_eq!(classify_and_extract("Welcome back!", reference()), None);
    }

    #[test]
    fn test_missing_timestamp_skipped() {
        assert_eq!(classify_and_extract("Diaper\nWet", reference()), None);
        assert_eq!(
            extract_kind(EventKind::Diaper, "Diaper\nWet", reference()),
            Err(FieldError::MissingTimestamp(EventKind::Diaper))
        );
    }

    #[test]
    fn test_parse_ounces() {
        assert_eq!(parse_ounces("ounces", "3.5"), Ok(3.5));
        assert!(parse_ounces("ounces", "lots").is_err());
        assert!(parse_ounces("ounces", "-1").is_err());
    }
}
