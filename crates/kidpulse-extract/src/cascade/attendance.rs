//! Sign-in and sign-out cards.
//!
//! Card layout: `Sign In · <Name>` … `Recorded by <who>` … `Occurred at <timestamp>`.
//! Requiring the recorder line keeps navigation text next to an unrelated
//! timestamp from being read as attendance.

use kidpulse_core::{EventKind, EventRecord};
use once_cell::sync::Lazy;
use regex::Regex;

use super::{FieldError, FieldResult};
use crate::temporal::{self, FULL_TIMESTAMP};

fn card_pattern(header: &str) -> Regex {
    Regex::new(&format!(
        r"(?i){}\s*·[\s\S]{{1,150}}?Recorded by[\s\S]{{1,100}}?Occurred at\s+({})",
        header, FULL_TIMESTAMP
    ))
    .unwrap()
}

static SIGN_OUT_CARD: Lazy<Regex> = Lazy::new(|| card_pattern(r"Sign\s+Out"));
static SIGN_IN_CARD: Lazy<Regex> = Lazy::new(|| card_pattern(r"Sign\s+In"));

pub fn parse(kind: EventKind, segment: &str) -> FieldResult<EventRecord> {
    let card = match kind {
        EventKind::SignOut => &*SIGN_OUT_CARD,
        _ => &*SIGN_IN_CARD,
    };
    let caps = card
        .captures(segment)
        .ok_or(FieldError::UnexpectedLayout(kind))?;
    let at = temporal::resolve_full(&caps[1]).ok_or(FieldError::MissingTimestamp(kind))?;

    Ok(match kind {
        EventKind::SignOut => EventRecord::SignOut(at),
        _ => EventRecord::SignIn(at),
    })
}
