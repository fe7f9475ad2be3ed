//! Reconcile pipeline execution.

use kidpulse_core::{DailySummary, Result};
use kidpulse_store::SummaryStore;
use tracing::{info, warn};

use crate::merge::merge_into_store;
use crate::partition::partition_by_date;
use crate::types::ReconcileReport;

/// Partitions a scrape result and merges each date into the store.
pub struct ReconcilePipeline;

impl ReconcilePipeline {
    /// Run partition and merge for one scrape.
    ///
    /// Dates are written oldest first, each in its own transaction. The first
    /// failed write aborts the run; dates written before it stay written.
    pub fn run(store: &dyn SummaryStore, scrape: &DailySummary) -> Result<ReconcileReport> {
        let start = std::time::Instant::now();
        let mut report = ReconcileReport::default();

        let partitions = partition_by_date(scrape);
        if partitions.is_empty() {
            info!("Nothing to reconcile");
            return Ok(report);
        }

        for (date, partial) in &partitions {
            let merged = match merge_into_store(store, *date, partial) {
                Ok(merged) => merged,
                Err(e) => {
                    warn!(
                        "Failed to merge {} after {} dates were saved: {}",
                        date,
                        report.dates_merged.len(),
                        e
                    );
                    return Err(e);
                }
            };
            info!(
                "Saved summary for {}: {} new, {} stored",
                date,
                partial.event_count(),
                merged.event_count()
            );
            report.events_merged += partial.event_count();
            report.events_stored += merged.event_count();
            report.dates_merged.push(*date);
        }

        report.duration_ms = start.elapsed().as_millis() as u64;
        info!(
            "Reconcile complete: dates={}, merged={}, stored={}, duration={}ms",
            report.dates_merged.len(),
            report.events_merged,
            report.events_stored,
            report.duration_ms
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};
    use kidpulse_core::{Error, EventRecord};
    use kidpulse_store::{ScrapeLogEntry, SqliteStore, StoredSummary};

    fn test_store() -> (SqliteStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(dir.path()).unwrap();
        (store, dir)
    }

    fn at(d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 1, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    /// Store that refuses writes for one date.
    struct FailingStore {
        inner: SqliteStore,
        fail_on: NaiveDate,
    }

    impl SummaryStore for FailingStore {
        fn get_summary(&self, date: NaiveDate) -> Result<Option<StoredSummary>> {
            self.inner.get_summary(date)
        }

        fn update_summary(
            &self,
            date: NaiveDate,
            merge: &dyn Fn(Option<DailySummary>) -> DailySummary,
        ) -> Result<DailySummary> {
            if date == self.fail_on {
                return Err(Error::Database("disk I/O error".into()));
            }
            self.inner.update_summary(date, merge)
        }

        fn available_dates(&self, limit: usize) -> Result<Vec<NaiveDate>> {
            self.inner.available_dates(limit)
        }

        fn log_scrape(&self, success: bool, message: Option<&str>, events_count: usize) -> Result<i64> {
            self.inner.log_scrape(success, message, events_count)
        }

        fn last_scrape(&self) -> Result<Option<ScrapeLogEntry>> {
            self.inner.last_scrape()
        }

        fn scrape_history(&self, limit: usize) -> Result<Vec<ScrapeLogEntry>> {
            self.inner.scrape_history(limit)
        }
    }

    #[test]
    fn test_run_writes_each_date() {
        let (store, _dir) = test_store();
        let mut scrape = DailySummary::new(at(30, 0).date());
        let child = scrape.child_mut("Jane Doe");
        child.push(EventRecord::SignIn(at(29, 8)));
        child.push(EventRecord::SignIn(at(30, 8)));
        child.push(EventRecord::SignOut(at(30, 17)));

        let report = ReconcilePipeline::run(&store, &scrape).unwrap();
        assert_eq!(report.dates_merged, vec![at(29, 0).date(), at(30, 0).date()]);
        assert_eq!(report.events_merged, 3);
        assert_eq!(store.count_summaries().unwrap(), 2);
    }

    #[test]
    fn test_empty_scrape_writes_nothing() {
        let (store, _dir) = test_store();
        let report = ReconcilePipeline::run(&store, &DailySummary::new(at(30, 0).date())).unwrap();
        assert!(report.is_empty());
        assert_eq!(store.count_summaries().unwrap(), 0);
    }

    #[test]
    fn test_failure_keeps_earlier_dates() {
        let (inner, _dir) = test_store();
        let store = FailingStore {
            inner,
            fail_on: at(30, 0).date(),
        };
        let mut scrape = DailySummary::new(at(30, 0).date());
        let child = scrape.child_mut("Jane Doe");
        child.push(EventRecord::SignIn(at(29, 8)));
        child.push(EventRecord::SignIn(at(30, 8)));

        let err = ReconcilePipeline::run(&store, &scrape).unwrap_err();
        assert!(matches!(err, Error::Database(_)));
        assert_eq!(store.available_dates(10).unwrap(), vec![at(29, 0).date()]);
    }
}
