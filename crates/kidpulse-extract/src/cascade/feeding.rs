//! Bottle, fluids and meal cards.

use chrono::NaiveDateTime;
use kidpulse_core::{BottleEvent, EventRecord, FluidsEvent, MealEvent, MealSlot, MilkType};
use once_cell::sync::Lazy;
use regex::Regex;

use super::{first_capture, parse_ounces, FieldResult};

// Offered/consumed amounts appear inline ("Offered: 4"), with the label and
// the value on separate lines, or as "4 oz offered". The trailing form stays
// on one line and is tried first so a labeled pattern cannot run on into the
// next amount.
static OFFERED_LABELED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)ounces\s*offered[:\s]*(\d+(?:\.\d+)?)").unwrap());
static OFFERED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)offered[:\s]*(\d+(?:\.\d+)?)").unwrap());
static OFFERED_TRAILING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\d+(?:\.\d+)?)[ \t]*(?:oz|ounces)[ \t]+offered").unwrap());
static CONSUMED_LABELED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)ounces\s*consumed[:\s]*(\d+(?:\.\d+)?)").unwrap());
static CONSUMED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)consumed[:\s]*(\d+(?:\.\d+)?)").unwrap());
static CONSUMED_TRAILING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\d+(?:\.\d+)?)[ \t]*(?:oz|ounces)[ \t]+consumed").unwrap());
static ANY_OUNCES_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*(?:oz|ounces)\b").unwrap());
static FLUID_OUNCES_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*oz").unwrap());
static MEAL_ITEMS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)Meal items?:\s*([^\n]+)").unwrap());

/// Checked in order; the first label mentioned wins.
const FLUID_MEAL_LABELS: &[&str] = &["AM Snack", "PM Snack", "Breakfast", "Lunch", "Dinner", "Snack"];

pub fn parse_bottle(segment: &str, time: NaiveDateTime) -> FieldResult<EventRecord> {
    let offered = first_capture(
        &[&*OFFERED_TRAILING_RE, &*OFFERED_LABELED_RE, &*OFFERED_RE],
        segment,
    );
    let consumed = first_capture(
        &[&*CONSUMED_TRAILING_RE, &*CONSUMED_LABELED_RE, &*CONSUMED_RE],
        segment,
    );

    let (ounces_offered, ounces_consumed) = match (offered, consumed) {
        (None, None) => {
            let any = first_capture(&[&*ANY_OUNCES_RE], segment)
                .map(|v| parse_ounces("ounces", v))
                .transpose()?
                .unwrap_or(0.0);
            (any, any)
        }
        (offered, consumed) => (
            offered
                .map(|v| parse_ounces("ounces offered", v))
                .transpose()?
                .unwrap_or(0.0),
            consumed
                .map(|v| parse_ounces("ounces consumed", v))
                .transpose()?
                .unwrap_or(0.0),
        ),
    };

    Ok(EventRecord::Bottle(BottleEvent {
        time,
        milk_type: MilkType::from_label(segment),
        ounces_offered,
        ounces_consumed,
    }))
}

pub fn parse_fluids(segment: &str, time: NaiveDateTime) -> FieldResult<EventRecord> {
    let ounces = first_capture(&[&*FLUID_OUNCES_RE], segment)
        .map(|v| parse_ounces("fluid ounces", v))
        .transpose()?
        .unwrap_or(0.0);

    let lower = segment.to_lowercase();
    let meal_label = FLUID_MEAL_LABELS
        .iter()
        .find(|label| lower.contains(&label.to_lowercase()))
        .map(|label| label.to_string());

    Ok(EventRecord::Fluids(FluidsEvent {
        time,
        ounces,
        meal_label,
    }))
}

pub fn parse_meal(segment: &str, time: NaiveDateTime) -> FieldResult<EventRecord> {
    let items = first_capture(&[&*MEAL_ITEMS_RE], segment)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "Unknown".to_string());
    let meal_slot = MealSlot::from_label(segment).unwrap_or_else(|| MealSlot::from_time(time));

    Ok(EventRecord::Meal(MealEvent {
        time,
        items,
        meal_slot,
    }))
}
