//! Extraction chain: model-backed extractor first, pattern cascade behind it.

use std::sync::Arc;

use chrono::NaiveDateTime;
use kidpulse_ai::{AiConfig, ProbabilisticExtractor};
use kidpulse_core::{AttributionConfig, ChildSummary};
use kidpulse_extract::{AttributionFilter, FeedExtractor, FeedInput, PatternExtractor};
use tracing::{info, warn};

use crate::types::ExtractionPath;

pub struct ExtractionChain {
    probabilistic: Option<Arc<dyn FeedExtractor>>,
    pattern: Arc<dyn FeedExtractor>,
}

impl ExtractionChain {
    pub fn new(pattern: Arc<dyn FeedExtractor>) -> Self {
        Self {
            probabilistic: None,
            pattern,
        }
    }

    pub fn with_probabilistic(mut self, extractor: Arc<dyn FeedExtractor>) -> Self {
        self.probabilistic = Some(extractor);
        self
    }

    /// Pattern cascade with the given attribution rules, plus the model-backed
    /// extractor when `ai` configures one.
    pub fn from_config(attribution: AttributionConfig, ai: &AiConfig) -> Self {
        let pattern = PatternExtractor::new(AttributionFilter::new(attribution));
        let chain = Self::new(Arc::new(pattern));
        match ProbabilisticExtractor::from_config(ai) {
            Some(extractor) => chain.with_probabilistic(Arc::new(extractor)),
            None => chain,
        }
    }

    pub fn has_probabilistic(&self) -> bool {
        self.probabilistic.is_some()
    }

    /// Extract one child's feed.
    ///
    /// Never fails: a model error, malformed reply or empty result falls back
    /// to the cascade, and a cascade error yields an empty summary.
    pub async fn extract(
        &self,
        feed: &FeedInput<'_>,
        reference: NaiveDateTime,
    ) -> (ChildSummary, ExtractionPath) {
        let mut path = ExtractionPath::Pattern;

        if let Some(extractor) = &self.probabilistic {
            match extractor.extract(feed, reference).await {
                Ok(Some(child)) if !child.is_empty() => {
                    info!(
                        "{} extractor found {} events for {}",
                        extractor.name(),
                        child.event_count(),
                        feed.child_name
                    );
                    return (child, ExtractionPath::Probabilistic);
                }
                Ok(_) => warn!(
                    "{} extractor found no events for {}, falling back to {}",
                    extractor.name(),
                    feed.child_name,
                    self.pattern.name()
                ),
                Err(e) => warn!(
                    "{} extractor failed for {}: {}. Falling back to {}",
                    extractor.name(),
                    feed.child_name,
                    e,
                    self.pattern.name()
                ),
            }
            path = ExtractionPath::PatternAfterFallback;
        }

        let child = match self.pattern.extract(feed, reference).await {
            Ok(child) => child.unwrap_or_else(|| ChildSummary::new(feed.child_name)),
            Err(e) => {
                warn!("{} extractor failed for {}: {}", self.pattern.name(), feed.child_name, e);
                ChildSummary::new(feed.child_name)
            }
        };
        (child, path)
    }
}
