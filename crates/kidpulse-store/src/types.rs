//! Row types and the store interface.

use chrono::{DateTime, NaiveDate, Utc};
use kidpulse_core::{DailySummary, Result};
use serde::{Deserialize, Serialize};

/// A `summaries` row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredSummary {
    pub date: NaiveDate,
    pub summary: DailySummary,
    /// Milliseconds since the Unix epoch.
    pub created_at: i64,
    pub updated_at: i64,
}

/// A `scrape_log` row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeLogEntry {
    pub id: i64,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub events_count: i64,
}

impl ScrapeLogEntry {
    pub fn recorded_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp)
    }
}

/// Durable per-date aggregate storage.
///
/// `update_summary` is the only write path for aggregates: it reads the
/// stored value for one date, hands it to `merge`, and writes the result back
/// inside a single transaction.
pub trait SummaryStore: Send + Sync {
    fn get_summary(&self, date: NaiveDate) -> Result<Option<StoredSummary>>;

    fn update_summary(
        &self,
        date: NaiveDate,
        merge: &dyn Fn(Option<DailySummary>) -> DailySummary,
    ) -> Result<DailySummary>;

    /// Dates with data, newest first.
    fn available_dates(&self, limit: usize) -> Result<Vec<NaiveDate>>;

    fn log_scrape(&self, success: bool, message: Option<&str>, events_count: usize) -> Result<i64>;

    fn last_scrape(&self) -> Result<Option<ScrapeLogEntry>>;

    /// Most recent entries first.
    fn scrape_history(&self, limit: usize) -> Result<Vec<ScrapeLogEntry>>;
}
