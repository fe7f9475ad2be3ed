//! KidPulse Core: event model, daily summaries, configuration, errors.

pub mod config;
pub mod error;
pub mod events;
pub mod summary;

pub use config::{AttributionConfig, DataPaths, KidPulseConfig};
pub use error::{Error, Result};
pub use events::*;
pub use summary::{ChildSummary, ChildTotals, DailySummary, EventCounts};
