//! Reconcile types.

use chrono::NaiveDate;
use serde::Serialize;

/// Result of reconciling one scrape into the store.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReconcileReport {
    /// Dates written, oldest first.
    #[serde(rename = "datesMerged")]
    pub dates_merged: Vec<NaiveDate>,
    /// Events in the partitions handed to the store.
    #[serde(rename = "eventsMerged")]
    pub events_merged: usize,
    /// Events held by the stored aggregates after the writes.
    #[serde(rename = "eventsStored")]
    pub events_stored: usize,
    #[serde(rename = "durationMs")]
    pub duration_ms: u64,
}

impl ReconcileReport {
    pub fn is_empty(&self) -> bool {
        self.dates_merged.is_empty()
    }
}
