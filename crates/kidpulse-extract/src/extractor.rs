//! The extraction interface shared by the pattern cascade and the
//! model-backed extractor.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use kidpulse_core::{ChildSummary, Result};

/// Text captured for one child.
#[derive(Debug, Clone, Copy)]
pub struct FeedInput<'a> {
    pub child_name: &'a str,
    /// Whole page text.
    pub raw_text: &'a str,
    /// Discrete event cards, when the capture layer could isolate them.
    pub segments: Option<&'a [String]>,
}

impl<'a> FeedInput<'a> {
    pub fn new(child_name: &'a str, raw_text: &'a str) -> Self {
        Self {
            child_name,
            raw_text,
            segments: None,
        }
    }

    pub fn with_segments(mut self, segments: &'a [String]) -> Self {
        self.segments = Some(segments);
        self
    }
}

/// Turns captured feed text into a child's events.
///
/// `Ok(None)` means "nothing found"; callers treat it like an empty summary.
#[async_trait]
pub trait FeedExtractor: Send + Sync {
    /// Short name for logs and reports.
    fn name(&self) -> &'static str;

    async fn extract(
        &self,
        feed: &FeedInput<'_>,
        reference: NaiveDateTime,
    ) -> Result<Option<ChildSummary>>;
}
