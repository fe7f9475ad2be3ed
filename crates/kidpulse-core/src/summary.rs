//! Per-child and per-date aggregates.
//!
//! A `ChildSummary` built during one scrape may hold several days of history;
//! the reconcile step partitions it so that every stored `DailySummary` only
//! holds events from its own date. Derived totals are computed on
//! serialization and never read back.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize, Serializer};

use crate::events::*;

/// Everything observed for one child.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ChildSummary {
    pub name: String,
    #[serde(default)]
    pub sign_in: Option<NaiveDateTime>,
    #[serde(default)]
    pub sign_out: Option<NaiveDateTime>,
    /// Every sign-in seen in one scrape, across dates. Collapsed per date.
    #[serde(skip)]
    pub sign_in_events: Vec<NaiveDateTime>,
    /// Every sign-out seen in one scrape, across dates. Collapsed per date.
    #[serde(skip)]
    pub sign_out_events: Vec<NaiveDateTime>,
    #[serde(default)]
    pub bottles: Vec<BottleEvent>,
    #[serde(default)]
    pub fluids: Vec<FluidsEvent>,
    #[serde(default)]
    pub diapers: Vec<DiaperEvent>,
    #[serde(default)]
    pub naps: Vec<NapEvent>,
    #[serde(default)]
    pub meals: Vec<MealEvent>,
}

/// Totals derived from a child's event lists.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChildTotals {
    pub total_bottle_consumed: f64,
    pub total_fluids: f64,
    pub total_nap_minutes: i64,
    pub wet_diapers: usize,
    pub bm_diapers: usize,
    pub meal_count: usize,
}

impl ChildSummary {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Append a record to the matching collection. No deduplication here.
    pub fn push(&mut self, record: EventRecord) {
        match record {
            EventRecord::SignIn(t) => self.sign_in_events.push(t),
            EventRecord::SignOut(t) => self.sign_out_events.push(t),
            EventRecord::Bottle(b) => self.bottles.push(b),
            EventRecord::Fluids(f) => self.fluids.push(f),
            EventRecord::Diaper(d) => self.diapers.push(d),
            EventRecord::Napping(n) => self.naps.push(n),
            EventRecord::Meal(m) => self.meals.push(m),
        }
    }

    /// All sign-in observations, the collapsed value included.
    pub fn all_sign_ins(&self) -> Vec<NaiveDateTime> {
        merged_times(self.sign_in, &self.sign_in_events)
    }

    /// All sign-out observations, the collapsed value included.
    pub fn all_sign_outs(&self) -> Vec<NaiveDateTime> {
        merged_times(self.sign_out, &self.sign_out_events)
    }

    /// Flatten the summary into records, attendance first.
    pub fn records(&self) -> Vec<EventRecord> {
        let mut out = Vec::with_capacity(self.event_count());
        out.extend(self.all_sign_ins().into_iter().map(EventRecord::SignIn));
        out.extend(self.all_sign_outs().into_iter().map(EventRecord::SignOut));
        out.extend(self.bottles.iter().cloned().map(EventRecord::Bottle));
        out.extend(self.fluids.iter().cloned().map(EventRecord::Fluids));
        out.extend(self.diapers.iter().cloned().map(EventRecord::Diaper));
        out.extend(self.naps.iter().cloned().map(EventRecord::Napping));
        out.extend(self.meals.iter().cloned().map(EventRecord::Meal));
        out
    }

    /// Reduce attendance to one sign-in (earliest) and one sign-out (latest).
    ///
    /// Only meaningful once the summary is scoped to a single date.
    pub fn collapse_attendance(&mut self) {
        self.sign_in = self.all_sign_ins().into_iter().min();
        self.sign_out = self.all_sign_outs().into_iter().max();
        self.sign_in_events.clear();
        self.sign_out_events.clear();
    }

    /// Keep only the latest-started open nap; closed naps are untouched.
    pub fn retain_single_active_nap(&mut self) {
        let latest_open = self
            .naps
            .iter()
            .filter(|n| n.is_active())
            .map(|n| n.start)
            .max();
        if let Some(latest) = latest_open {
            self.naps.retain(|n| !n.is_active() || n.start == latest);
        }
    }

    pub fn counts(&self) -> EventCounts {
        EventCounts {
            sign_ins: self.all_sign_ins().len(),
            sign_outs: self.all_sign_outs().len(),
            bottles: self.bottles.len(),
            fluids: self.fluids.len(),
            diapers: self.diapers.len(),
            naps: self.naps.len(),
            meals: self.meals.len(),
        }
    }

    pub fn event_count(&self) -> usize {
        self.counts().total()
    }

    pub fn is_empty(&self) -> bool {
        self.event_count() == 0
    }

    pub fn totals(&self) -> ChildTotals {
        ChildTotals {
            total_bottle_consumed: self.bottles.iter().map(|b| b.ounces_consumed).sum(),
            total_fluids: self.fluids.iter().map(|f| f.ounces).sum(),
            total_nap_minutes: self.naps.iter().filter_map(|n| n.duration_minutes()).sum(),
            wet_diapers: self
                .diapers
                .iter()
                .filter(|d| d.diaper_type == DiaperType::Wet)
                .count(),
            bm_diapers: self
                .diapers
                .iter()
                .filter(|d| d.diaper_type == DiaperType::Bm)
                .count(),
            meal_count: self.meals.len(),
        }
    }
}

fn merged_times(single: Option<NaiveDateTime>, many: &[NaiveDateTime]) -> Vec<NaiveDateTime> {
    let mut out: Vec<NaiveDateTime> = Vec::with_capacity(many.len() + 1);
    for t in single.iter().chain(many.iter()) {
        if !out.contains(t) {
            out.push(*t);
        }
    }
    out
}

#[derive(Serialize)]
struct SerializedChild<'a> {
    name: &'a str,
    sign_in: Option<NaiveDateTime>,
    sign_out: Option<NaiveDateTime>,
    bottles: &'a [BottleEvent],
    fluids: &'a [FluidsEvent],
    diapers: &'a [DiaperEvent],
    naps: Vec<SerializedNap<'a>>,
    meals: &'a [MealEvent],
    totals: ChildTotals,
}

#[derive(Serialize)]
struct SerializedNap<'a> {
    #[serde(flatten)]
    nap: &'a NapEvent,
    duration_minutes: Option<i64>,
}

impl Serialize for ChildSummary {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        SerializedChild {
            name: &self.name,
            sign_in: self.sign_in,
            sign_out: self.sign_out,
            bottles: &self.bottles,
            fluids: &self.fluids,
            diapers: &self.diapers,
            naps: self
                .naps
                .iter()
                .map(|nap| SerializedNap {
                    nap,
                    duration_minutes: nap.duration_minutes(),
                })
                .collect(),
            meals: &self.meals,
            totals: self.totals(),
        }
        .serialize(serializer)
    }
}

/// All children's events for one calendar date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    #[serde(default)]
    pub children: BTreeMap<String, ChildSummary>,
}

impl DailySummary {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            children: BTreeMap::new(),
        }
    }

    /// Get or create the summary for a child.
    pub fn child_mut(&mut self, name: &str) -> &mut ChildSummary {
        self.children
            .entry(name.to_string())
            .or_insert_with(|| ChildSummary::new(name))
    }

    pub fn counts(&self) -> EventCounts {
        let mut counts = EventCounts::default();
        for child in self.children.values() {
            counts.add(&child.counts());
        }
        counts
    }

    pub fn event_count(&self) -> usize {
        self.counts().total()
    }
}

/// Number of events found, per kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EventCounts {
    pub sign_ins: usize,
    pub sign_outs: usize,
    pub bottles: usize,
    pub fluids: usize,
    pub diapers: usize,
    pub naps: usize,
    pub meals: usize,
}

impl EventCounts {
    pub fn total(&self) -> usize {
        self.sign_ins + self.sign_outs + self.bottles + self.fluids + self.diapers + self.naps + self.meals
    }

    pub fn add(&mut self, other: &EventCounts) {
        self.sign_ins += other.sign_ins;
        self.sign_outs += other.sign_outs;
        self.bottles += other.bottles;
        self.fluids += other.fluids;
        self.diapers += other.diapers;
        self.naps += other.naps;
        self.meals += other.meals;
    }

    pub fn get(&self, kind: EventKind) -> usize {
        match kind {
            EventKind::SignIn => self.sign_ins,
            EventKind::SignOut => self.sign_outs,
            EventKind::Bottle => self.bottles,
            EventKind::Fluids => self.fluids,
            EventKind::Diaper => self.diapers,
            EventKind::Napping => self.naps,
            EventKind::Meal => self.meals,
        }
    }
}

impl std::fmt::Display for EventCounts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} events ({} sign-ins, {} sign-outs, {} bottles, {} fluids, {} diapers, {} naps, {} meals)",
            self.total(),
            self.sign_ins,
            self.sign_outs,
            self.bottles,
            self.fluids,
            self.diapers,
            self.naps,
            self.meals
        )
    }
}
