//! Runtime: one scrape cycle end to end.
//!
//! Captures feed text, runs the extraction chain per child, aggregates the
//! counts, hands the result to partition & merge, and records the outcome in
//! the scrape log. Only one cycle runs at a time.

pub mod chain;
pub mod notify;
pub mod orchestrator;
pub mod sources;
pub mod types;

pub use chain::ExtractionChain;
pub use notify::{LogNotifier, Notifier};
pub use orchestrator::Orchestrator;
pub use sources::{FeedCapture, FeedSource, FileFeedSource};
pub use types::*;
