//! Typed event records extracted from a caregiving feed.
//!
//! Every record carries a local (timezone-naive) timestamp in the caller's
//! configured timezone. Naps carry a start and an optional end.

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

/// Closed set of event kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    SignIn,
    SignOut,
    Bottle,
    Fluids,
    Diaper,
    Napping,
    Meal,
}

impl EventKind {
    pub fn all() -> &'static [EventKind] {
        &[
            Self::SignIn,
            Self::SignOut,
            Self::Bottle,
            Self::Fluids,
            Self::Diaper,
            Self::Napping,
            Self::Meal,
        ]
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SignIn => write!(f, "sign in"),
            Self::SignOut => write!(f, "sign out"),
            Self::Bottle => write!(f, "bottle"),
            Self::Fluids => write!(f, "fluids"),
            Self::Diaper => write!(f, "diaper"),
            Self::Napping => write!(f, "nap"),
            Self::Meal => write!(f, "meal"),
        }
    }
}

/// Diaper change classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiaperType {
    Wet,
    #[serde(rename = "BM")]
    Bm,
    Dry,
    Unknown,
}

impl DiaperType {
    /// Map a free-text label onto a diaper type. BM wins over Wet over Dry.
    pub fn from_label(label: &str) -> Self {
        let lower = label.to_lowercase();
        if lower.split(|c: char| !c.is_alphanumeric()).any(|w| w == "bm") || lower.contains("bowel") {
            Self::Bm
        } else if lower.contains("wet") {
            Self::Wet
        } else if lower.contains("dry") {
            Self::Dry
        } else {
            Self::Unknown
        }
    }
}

impl std::fmt::Display for DiaperType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Wet => write!(f, "Wet"),
            Self::Bm => write!(f, "BM"),
            Self::Dry => write!(f, "Dry"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

/// What a bottle contained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MilkType {
    #[serde(rename = "Breast milk")]
    BreastMilk,
    Formula,
    Unknown,
}

impl MilkType {
    pub fn from_label(label: &str) -> Self {
        let lower = label.to_lowercase();
        if lower.contains("breast") {
            Self::BreastMilk
        } else if lower.contains("formula") {
            Self::Formula
        } else {
            Self::Unknown
        }
    }
}

impl std::fmt::Display for MilkType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BreastMilk => write!(f, "Breast milk"),
            Self::Formula => write!(f, "Formula"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Meal slot of the day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MealSlot {
    Breakfast,
    Lunch,
    Snack,
    Dinner,
}

impl MealSlot {
    /// Fixed boundaries: before 10:00 breakfast, before 14:00 lunch,
    /// before 17:00 snack, otherwise dinner.
    pub fn from_hour(hour: u32) -> Self {
        if hour < 10 {
            Self::Breakfast
        } else if hour < 14 {
            Self::Lunch
        } else if hour < 17 {
            Self::Snack
        } else {
            Self::Dinner
        }
    }

    pub fn from_time(time: NaiveDateTime) -> Self {
        Self::from_hour(time.hour())
    }

    /// Explicit slot named in free text, if any.
    pub fn from_label(label: &str) -> Option<Self> {
        let lower = label.to_lowercase();
        if lower.contains("breakfast") {
            Some(Self::Breakfast)
        } else if lower.contains("lunch") {
            Some(Self::Lunch)
        } else if lower.contains("dinner") {
            Some(Self::Dinner)
        } else if lower.contains("snack") {
            Some(Self::Snack)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiaperEvent {
    pub time: NaiveDateTime,
    #[serde(rename = "type")]
    pub diaper_type: DiaperType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BottleEvent {
    pub time: NaiveDateTime,
    pub milk_type: MilkType,
    pub ounces_offered: f64,
    pub ounces_consumed: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FluidsEvent {
    pub time: NaiveDateTime,
    pub ounces: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meal_label: Option<String>,
}

/// A nap. `end` is absent while the nap is still in progress at scrape time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NapEvent {
    pub start: NaiveDateTime,
    #[serde(default)]
    pub end: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
}

impl NapEvent {
    /// Whole minutes between start and end; `None` while the nap is open.
    pub fn duration_minutes(&self) -> Option<i64> {
        self.end.map(|end| (end - self.start).num_minutes())
    }

    pub fn is_active(&self) -> bool {
        self.end.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealEvent {
    pub time: NaiveDateTime,
    pub items: String,
    pub meal_slot: MealSlot,
}

/// One extracted event of any kind.
#[derive(Debug, Clone, PartialEq)]
pub enum EventRecord {
    SignIn(NaiveDateTime),
    SignOut(NaiveDateTime),
    Bottle(BottleEvent),
    Fluids(FluidsEvent),
    Diaper(DiaperEvent),
    Napping(NapEvent),
    Meal(MealEvent),
}

/// Identity of a real-world event: its kind plus its (start) timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IdentityKey {
    pub kind: EventKind,
    pub at: NaiveDateTime,
}

impl EventRecord {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::SignIn(_) => EventKind::SignIn,
            Self::SignOut(_) => EventKind::SignOut,
            Self::Bottle(_) => EventKind::Bottle,
            Self::Fluids(_) => EventKind::Fluids,
            Self::Diaper(_) => EventKind::Diaper,
            Self::Napping(_) => EventKind::Napping,
            Self::Meal(_) => EventKind::Meal,
        }
    }

    /// Timestamp the event occurred at (nap start for naps).
    pub fn timestamp(&self) -> NaiveDateTime {
        match self {
            Self::SignIn(t) | Self::SignOut(t) => *t,
            Self::Bottle(b) => b.time,
            Self::Fluids(f) => f.time,
            Self::Diaper(d) => d.time,
            Self::Napping(n) => n.start,
            Self::Meal(m) => m.time,
        }
    }

    /// Calendar date the event occurred on.
    pub fn date(&self) -> NaiveDate {
        self.timestamp().date()
    }

    pub fn identity_key(&self) -> IdentityKey {
        IdentityKey {
            kind: self.kind(),
            at: self.timestamp(),
        }
    }
}
