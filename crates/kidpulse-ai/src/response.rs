//! Mapping untrusted model output onto the event model.
//!
//! The reply may wrap its JSON in prose or code fences. Individual entries
//! that fail to map are skipped with a warning; the rest of the reply is
//! still used.

use chrono::NaiveDateTime;
use kidpulse_core::*;
use kidpulse_extract::{try_resolve, DedupIndex};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::{info, warn};

static FENCED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```(?:json|JSON)?\s*(\{.*?\})\s*```").unwrap());

/// Find the JSON object inside a reply: fenced block first, then the
/// outermost brace span.
pub fn locate_json(reply: &str) -> Option<&str> {
    if let Some(caps) = FENCED_RE.captures(reply) {
        if let Some(m) = caps.get(1) {
            return Some(m.as_str());
        }
    }
    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    (end > start).then(|| &reply[start..=end])
}

/// Map a backend reply to a child summary.
///
/// `Ok(None)` when the reply parsed but held no usable events.
pub fn map_response(
    reply: &str,
    child_name: &str,
    reference: NaiveDateTime,
) -> Result<Option<ChildSummary>> {
    let json = locate_json(reply).ok_or_else(|| {
        Error::MalformedResponse(format!("no JSON object in reply: {}", preview(reply)))
    })?;
    let data: Value = serde_json::from_str(json)
        .map_err(|e| Error::MalformedResponse(format!("invalid JSON ({}): {}", e, preview(json))))?;
    let data = data
        .as_object()
        .ok_or_else(|| Error::MalformedResponse("top-level JSON is not an object".into()))?;

    let mut child = ChildSummary::new(child_name);
    let mut index = DedupIndex::new();
    let mut admit = |child: &mut ChildSummary, record: EventRecord| {
        if index.admit(&record) {
            info!("AI parsed {} at {}", record.kind(), record.timestamp());
            child.push(record);
        }
    };

    for (key, kind) in [("sign_in", EventKind::SignIn), ("sign_out", EventKind::SignOut)] {
        match data.get(key) {
            None | Some(Value::Null) => {}
            Some(Value::String(s)) if s.trim().is_empty() => {}
            Some(value) => match required_time(value, reference) {
                Ok(t) if kind == EventKind::SignIn => admit(&mut child, EventRecord::SignIn(t)),
                Ok(t) => admit(&mut child, EventRecord::SignOut(t)),
                Err(e) => warn!("Failed to parse {}: {}", key, e),
            },
        }
    }

    let lists: [(&str, MapFn); 5] = [
        ("bottles", map_bottle),
        ("diapers", map_diaper),
        ("fluids", map_fluids),
        ("naps", map_nap),
        ("meals", map_meal),
    ];
    for (key, map_item) in lists {
        let Some(items) = data.get(key) else {
            continue;
        };
        let Some(items) = items.as_array() else {
            warn!("Ignoring '{}': not a list", key);
            continue;
        };
        for item in items {
            match item.as_object().ok_or_else(|| "entry is not an object".to_string()) {
                Ok(obj) => match map_item(obj, reference) {
                    Ok(record) => admit(&mut child, record),
                    Err(e) => warn!("Failed to parse {} entry: {}", key, e),
                },
                Err(e) => warn!("Failed to parse {} entry: {}", key, e),
            }
        }
    }

    Ok((!child.is_empty()).then_some(child))
}

type MapFn = fn(&Map<String, Value>, NaiveDateTime) -> std::result::Result<EventRecord, String>;

fn map_bottle(obj: &Map<String, Value>, reference: NaiveDateTime) -> std::result::Result<EventRecord, String> {
    Ok(EventRecord::Bottle(BottleEvent {
        time: field_time(obj, "time", reference)?,
        milk_type: MilkType::from_label(text(obj, "milk_type").unwrap_or_default()),
        ounces_offered: ounces(obj, "offered")?,
        ounces_consumed: ounces(obj, "consumed")?,
    }))
}

fn map_diaper(obj: &Map<String, Value>, reference: NaiveDateTime) -> std::result::Result<EventRecord, String> {
    Ok(EventRecord::Diaper(DiaperEvent {
        time: field_time(obj, "time", reference)?,
        diaper_type: DiaperType::from_label(text(obj, "type").unwrap_or_default()),
        notes: text(obj, "notes").map(str::to_string),
    }))
}

fn map_fluids(obj: &Map<String, Value>, reference: NaiveDateTime) -> std::result::Result<EventRecord, String> {
    Ok(EventRecord::Fluids(FluidsEvent {
        time: field_time(obj, "time", reference)?,
        ounces: ounces(obj, "ounces")?,
        meal_label: text(obj, "meal").map(str::to_string),
    }))
}

fn map_nap(obj: &Map<String, Value>, reference: NaiveDateTime) -> std::result::Result<EventRecord, String> {
    let start = field_time(obj, "start", reference)?;
    let end = match obj.get("end") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.trim().is_empty() => None,
        Some(v) => Some(required_time(v, reference).map_err(|e| format!("end: {}", e))?),
    };
    if let Some(end) = end {
        if end < start {
            return Err(format!("nap ends ({}) before it starts ({})", end, start));
        }
    }
    Ok(EventRecord::Napping(NapEvent {
        start,
        end,
        position: text(obj, "position").map(str::to_string),
    }))
}

fn map_meal(obj: &Map<String, Value>, reference: NaiveDateTime) -> std::result::Result<EventRecord, String> {
    let time = field_time(obj, "time", reference)?;
    let items = text(obj, "items").unwrap_or("Unknown").to_string();
    let meal_slot = MealSlot::from_label(&items).unwrap_or_else(|| MealSlot::from_time(time));
    Ok(EventRecord::Meal(MealEvent {
        time,
        items,
        meal_slot,
    }))
}

fn field_time(
    obj: &Map<String, Value>,
    key: &str,
    reference: NaiveDateTime,
) -> std::result::Result<NaiveDateTime, String> {
    let value = obj.get(key).ok_or_else(|| format!("missing '{}'", key))?;
    required_time(value, reference).map_err(|e| format!("{}: {}", key, e))
}

fn required_time(value: &Value, reference: NaiveDateTime) -> std::result::Result<NaiveDateTime, String> {
    let s = value.as_str().ok_or_else(|| format!("expected a time string, got {}", value))?;
    try_resolve(s, reference).ok_or_else(|| format!("unparseable time '{}'", s))
}

/// Non-empty trimmed string field.
fn text<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    obj.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Ounce amount given as a number or numeric string. Missing means zero.
fn ounces(obj: &Map<String, Value>, key: &str) -> std::result::Result<f64, String> {
    let value = match obj.get(key) {
        None | Some(Value::Null) => return Ok(0.0),
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().trim_end_matches("oz").trim().parse::<f64>().ok(),
        Some(_) => None,
    };
    match value {
        Some(oz) if oz.is_finite() && oz >= 0.0 => Ok(oz),
        _ => Err(format!("invalid '{}': {}", key, obj[key])),
    }
}

fn preview(s: &str) -> String {
    s.chars().take(200).collect()
}
