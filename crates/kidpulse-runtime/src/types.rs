//! Runtime types.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use kidpulse_core::EventCounts;
use serde::Serialize;

/// Which extractor produced a child's events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionPath {
    /// The model-backed extractor returned events.
    Probabilistic,
    /// Only the pattern cascade is configured.
    Pattern,
    /// The model-backed extractor failed or found nothing; the cascade ran.
    PatternAfterFallback,
}

impl std::fmt::Display for ExtractionPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Probabilistic => "ai",
            Self::Pattern => "pattern",
            Self::PatternAfterFallback => "pattern (fallback)",
        };
        f.write_str(s)
    }
}

/// Outcome of one successful scrape cycle.
#[derive(Debug, Clone, Serialize)]
pub struct ScrapeReport {
    /// Local time the cycle resolved bare clock times against.
    pub reference: NaiveDateTime,
    pub paths: BTreeMap<String, ExtractionPath>,
    pub counts: EventCounts,
    #[serde(rename = "datesMerged")]
    pub dates_merged: Vec<NaiveDate>,
    #[serde(rename = "durationMs")]
    pub duration_ms: u64,
}

impl ScrapeReport {
    pub fn event_count(&self) -> usize {
        self.counts.total()
    }

    /// Scrape-log message, e.g. `Found 3 events (1 sign-ins, ...)`.
    pub fn message(&self) -> String {
        format!("Found {}", self.counts)
    }
}
