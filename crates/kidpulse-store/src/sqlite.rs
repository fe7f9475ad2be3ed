//! SQLite-backed summary store.
//!
//! One row per calendar date keyed by `YYYY-MM-DD`; the aggregate is stored
//! as JSON. All writes to a date go through a read-modify-write transaction.

use std::path::{Path, PathBuf};

use chrono::{NaiveDate, Utc};
use kidpulse_core::{DailySummary, Error, Result};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use tracing::{debug, info};

use crate::schema::SCHEMA_SQL;
use crate::types::*;

const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct SqliteStore {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

fn db_err(e: rusqlite::Error) -> Error {
    Error::Database(e.to_string())
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .map_err(|e| Error::Storage(format!("bad date key '{}': {}", s, e)))
}

impl SqliteStore {
    /// Open or create the store. The file will be `db_dir/kidpulse.db`.
    pub fn open(db_dir: impl AsRef<Path>) -> Result<Self> {
        let db_dir = db_dir.as_ref();
        std::fs::create_dir_all(db_dir).map_err(|e| Error::Storage(e.to_string()))?;
        let db_path = db_dir.join("kidpulse.db");

        let conn = Self::create_connection(&db_path)?;
        conn.execute_batch(SCHEMA_SQL)
            .map_err(|e| Error::Database(format!("Schema init failed: {}", e)))?;

        let store = Self {
            conn: Mutex::new(conn),
            db_path,
        };

        info!(
            "SqliteStore initialized: {} dates, path={}",
            store.count_summaries()?,
            store.db_path.display()
        );
        Ok(store)
    }

    fn create_connection(db_path: &Path) -> Result<Connection> {
        let conn = Connection::open(db_path).map_err(db_err)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA busy_timeout = 5000;",
        )
        .map_err(db_err)?;
        Ok(conn)
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    pub fn count_summaries(&self) -> Result<i64> {
        let conn = self.conn.lock();
        conn.query_row("SELECT COUNT(*) FROM summaries", [], |row| row.get(0))
            .map_err(db_err)
    }

    fn row_to_scrape(row: &rusqlite::Row) -> rusqlite::Result<ScrapeLogEntry> {
        Ok(ScrapeLogEntry {
            id: row.get("id")?,
            timestamp: row.get("timestamp")?,
            success: row.get::<_, i64>("success")? != 0,
            message: row.get("message")?,
            events_count: row.get("events_count")?,
        })
    }
}

impl SummaryStore for SqliteStore {
    fn get_summary(&self, date: NaiveDate) -> Result<Option<StoredSummary>> {
        let key = date.format(DATE_FORMAT).to_string();
        let conn = self.conn.lock();
        let row: Option<(String, i64, i64)> = conn
            .prepare_cached("SELECT data, created_at, updated_at FROM summaries WHERE date = ?1")
            .map_err(db_err)?
            .query_row(params![key], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))
            .optional()
            .map_err(db_err)?;

        row.map(|(data, created_at, updated_at)| -> Result<StoredSummary> {
            Ok(StoredSummary {
                date,
                summary: serde_json::from_str(&data)?,
                created_at,
                updated_at,
            })
        })
        .transpose()
    }

    fn update_summary(
        &self,
        date: NaiveDate,
        merge: &dyn Fn(Option<DailySummary>) -> DailySummary,
    ) -> Result<DailySummary> {
        let key = date.format(DATE_FORMAT).to_string();
        let mut conn = self.conn.lock();
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(db_err)?;

        let existing: Option<String> = tx
            .query_row("SELECT data FROM summaries WHERE date = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()
            .map_err(db_err)?;
        let existing: Option<DailySummary> = existing
            .map(|data| serde_json::from_str(&data))
            .transpose()?;

        let merged = merge(existing);
        if merged.date != date {
            return Err(Error::Internal(format!(
                "merge for {} produced a summary dated {}",
                date, merged.date
            )));
        }

        let data = serde_json::to_string(&merged)?;
        let now = now_millis();
        tx.execute(
            "INSERT INTO summaries (date, data, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?3)
             ON CONFLICT(date) DO UPDATE SET
                 data = excluded.data,
                 updated_at = excluded.updated_at",
            params![key, data, now],
        )
        .map_err(db_err)?;
        tx.commit().map_err(db_err)?;

        debug!("Saved summary for {}", key);
        Ok(merged)
    }

    fn available_dates(&self, limit: usize) -> Result<Vec<NaiveDate>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare_cached("SELECT date FROM summaries ORDER BY date DESC LIMIT ?1")
            .map_err(db_err)?;
        let keys = stmt
            .query_map(params![limit as i64], |row| row.get::<_, String>(0))
            .map_err(db_err)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(db_err)?;
        keys.iter().map(|k| parse_date(k)).collect()
    }

    fn log_scrape(&self, success: bool, message: Option<&str>, events_count: usize) -> Result<i64> {
        let conn = self.conn.lock();
        let id = conn
            .prepare_cached(
                "INSERT INTO scrape_log (timestamp, success, message, events_count) VALUES (?1, ?2, ?3, ?4)",
            )
            .map_err(db_err)?
            .insert(params![now_millis(), success as i64, message, events_count as i64])
            .map_err(db_err)?;
        Ok(id)
    }

    fn last_scrape(&self) -> Result<Option<ScrapeLogEntry>> {
        let conn = self.conn.lock();
        let entry = conn
            .prepare_cached("SELECT * FROM scrape_log ORDER BY id DESC LIMIT 1")
            .map_err(db_err)?
            .query_row([], Self::row_to_scrape)
            .optional()
            .map_err(db_err)?;
        Ok(entry)
    }

    fn scrape_history(&self, limit: usize) -> Result<Vec<ScrapeLogEntry>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare_cached("SELECT * FROM scrape_log ORDER BY id DESC LIMIT ?1")
            .map_err(db_err)?;
        let rows = stmt
            .query_map(params![limit as i64], Self::row_to_scrape)
            .map_err(db_err)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(db_err)?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kidpulse_core::{ChildSummary, EventRecord};
    use tempfile::TempDir;

    fn test_store() -> (SqliteStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = SqliteStore::open(dir.path()).unwrap();
        (store, dir)
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, d).unwrap()
    }

    fn summary_with_sign_in(d: u32) -> DailySummary {
        let mut summary = DailySummary::new(day(d));
        let child = summary.child_mut("Jane Doe");
        child.sign_in = Some(day(d).and_hms_opt(8, 0, 0).unwrap());
        summary
    }

    #[test]
    fn test_update_creates_then_updates() {
        let (store, _dir) = test_store();
        assert!(store.get_summary(day(30)).unwrap().is_none());

        store
            .update_summary(day(30), &|existing| {
                assert!(existing.is_none());
                summary_with_sign_in(30)
            })
            .unwrap();
        let first = store.get_summary(day(30)).unwrap().unwrap();
        assert_eq!(first.summary.children["Jane Doe"].sign_in, Some(day(30).and_hms_opt(8, 0, 0).unwrap()));

        store
            .update_summary(day(30), &|existing| {
                let mut s = existing.expect("stored summary");
                s.child_mut("Jane Doe").sign_out = Some(day(30).and_hms_opt(17, 0, 0).unwrap());
                s
            })
            .unwrap();
        let second = store.get_summary(day(30)).unwrap().unwrap();
        let child: &ChildSummary = &second.summary.children["Jane Doe"];
        assert!(child.sign_in.is_some());
        assert!(child.sign_out.is_some());
        assert_eq!(second.created_at, first.created_at);
        assert!(second.updated_at >= first.updated_at);
        assert_eq!(store.count_summaries().unwrap(), 1);
    }

    #[test]
    fn test_update_rejects_wrong_date() {
        let (store, _dir) = test_store();
        let err = store
            .update_summary(day(30), &|_| summary_with_sign_in(29))
            .unwrap_err();
        assert!(matches!(err, Error::Internal(_)));
        assert!(store.get_summary(day(30)).unwrap().is_none());
    }

    #[test]
    fn test_stored_totals_are_not_read_back() {
        let (store, _dir) = test_store();
        store
            .update_summary(day(30), &|_| {
                let mut s = DailySummary::new(day(30));
                s.child_mut("Jane Doe").push(EventRecord::Napping(kidpulse_core::NapEvent {
                    start: day(30).and_hms_opt(13, 0, 0).unwrap(),
                    end: Some(day(30).and_hms_opt(14, 0, 0).unwrap()),
                    position: None,
                }));
                s
            })
            .unwrap();

        let stored = store.get_summary(day(30)).unwrap().unwrap();
        let child = &stored.summary.children["Jane Doe"];
        assert_eq!(child.naps.len(), 1);
        assert_eq!(child.totals().total_nap_minutes, 60);
    }

    #[test]
    fn test_available_dates_newest_first() {
        let (store, _dir) = test_store();
        for d in [28, 30, 29] {
            store.update_summary(day(d), &|_| DailySummary::new(day(d))).unwrap();
        }
        assert_eq!(store.available_dates(2).unwrap(), vec![day(30), day(29)]);
    }

    #[test]
    fn test_scrape_log() {
        let (store, _dir) = test_store();
        assert!(store.last_scrape().unwrap().is_none());

        store.log_scrape(true, Some("Found 4 events"), 4).unwrap();
        store.log_scrape(false, Some("capture failed"), 0).unwrap();

        let last = store.last_scrape().unwrap().unwrap();
        assert!(!last.success);
        assert_eq!(last.message.as_deref(), Some("capture failed"));
        assert!(last.recorded_at().is_some());

        let history = store.scrape_history(10).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].events_count, 4);
    }

    #[test]
    fn test_reopen_keeps_data() {
        let dir = TempDir::new().unwrap();
        {
            let store = SqliteStore::open(dir.path()).unwrap();
            store.update_summary(day(30), &|_| summary_with_sign_in(30)).unwrap();
        }
        let store = SqliteStore::open(dir.path()).unwrap();
        assert_eq!(store.available_dates(10).unwrap(), vec![day(30)]);
    }
}
