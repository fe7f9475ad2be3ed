//! Database schema SQL.

/// Per-date aggregates and the scrape log.
///
/// `summaries.data` holds the serialized `DailySummary`; derived totals in it
/// are informational and recomputed on every read.
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS summaries (
    date TEXT PRIMARY KEY,
    data TEXT NOT NULL,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS scrape_log (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp INTEGER NOT NULL,
    success INTEGER NOT NULL,
    message TEXT,
    events_count INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_scrape_log_timestamp ON scrape_log(timestamp);
"#;
