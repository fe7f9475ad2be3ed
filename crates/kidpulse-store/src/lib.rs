//! KidPulse Store: SQLite per-date summaries and scrape log.

pub mod schema;
pub mod sqlite;
pub mod types;

pub use sqlite::SqliteStore;
pub use types::*;
