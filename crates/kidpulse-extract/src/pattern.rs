//! Deterministic extractor: segmentation, attribution, cascade, dedup.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use kidpulse_core::{ChildSummary, Result};
use tracing::{debug, info};

use crate::attribution::AttributionFilter;
use crate::cascade;
use crate::dedup::DedupIndex;
use crate::extractor::{FeedExtractor, FeedInput};
use crate::segment::{is_event_card, segment_feed};

pub struct PatternExtractor {
    filter: AttributionFilter,
}

impl PatternExtractor {
    pub fn new(filter: AttributionFilter) -> Self {
        Self { filter }
    }

    /// Run the cascade over every segment of a child's feed.
    pub fn extract_child(&self, feed: &FeedInput<'_>, reference: NaiveDateTime) -> ChildSummary {
        let owned;
        let segments: &[String] = match feed.segments {
            Some(s) => s,
            None => {
                owned = segment_feed(feed.raw_text);
                &owned
            }
        };

        let mut child = ChildSummary::new(feed.child_name);
        let mut index = DedupIndex::new();
        let mut skipped = 0usize;

        for segment in segments {
            if !is_event_card(segment) {
                skipped += 1;
                continue;
            }
            if !self.filter.applies_to(segment, feed.child_name) {
                skipped += 1;
                continue;
            }
            let Some(record) = cascade::classify_and_extract(segment, reference) else {
                continue;
            };
            if !index.admit(&record) {
                debug!("Duplicate {} at {} ignored", record.kind(), record.timestamp());
                continue;
            }
            info!(
                "Parsed {} for {} at {}",
                record.kind(),
                feed.child_name,
                record.timestamp()
            );
            child.push(record);
        }

        debug!(
            "{}: {} segments, {} skipped, {} events",
            feed.child_name,
            segments.len(),
            skipped,
            child.event_count()
        );
        child
    }
}

#[async_trait]
impl FeedExtractor for PatternExtractor {
    fn name(&self) -> &'static str {
        "pattern"
    }

    /// Always returns a summary, possibly empty.
    async fn extract(
        &self,
        feed: &FeedInput<'_>,
        reference: NaiveDateTime,
    ) -> Result<Option<ChildSummary>> {
        Ok(Some(self.extract_child(feed, reference)))
    }
}
