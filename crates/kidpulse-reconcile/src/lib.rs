//! Partition & merge: date-scoped reconciliation of scrape results.
//!
//! One scrape can surface several days of history. Its events are grouped by
//! the date they occurred on, and each date's slice is merged into the stored
//! aggregate for that date without dropping what earlier scrapes recorded.

pub mod merge;
pub mod partition;
pub mod pipeline;
pub mod types;

pub use merge::{merge_child, merge_into_store, merge_summaries};
pub use partition::{partition_by_date, partition_child};
pub use pipeline::ReconcilePipeline;
pub use types::*;
