//! KidPulse AI: model-backed feed extraction.
//!
//! Sends the captured feed to a completion backend (Ollama or OpenAI) and maps
//! the JSON it returns onto the same event model the pattern cascade produces.
//! Backend errors and malformed replies are returned to the caller, which
//! falls back to the cascade.

pub mod config;
pub mod prompt;
pub mod providers;
pub mod response;

pub use config::{AiConfig, AiProvider};
pub use providers::{create_backend, CompletionBackend, OllamaBackend, OpenAiBackend};
pub use response::{locate_json, map_response};

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use kidpulse_core::{ChildSummary, Result};
use kidpulse_extract::{FeedExtractor, FeedInput};
use tracing::debug;

/// `FeedExtractor` backed by a completion model.
pub struct ProbabilisticExtractor {
    backend: Arc<dyn CompletionBackend>,
}

impl ProbabilisticExtractor {
    pub fn new(backend: Arc<dyn CompletionBackend>) -> Self {
        Self { backend }
    }

    /// Build from config; `None` when no backend is configured.
    pub fn from_config(config: &AiConfig) -> Option<Self> {
        create_backend(config).map(Self::new)
    }
}

#[async_trait]
impl FeedExtractor for ProbabilisticExtractor {
    fn name(&self) -> &'static str {
        "ai"
    }

    async fn extract(
        &self,
        feed: &FeedInput<'_>,
        reference: NaiveDateTime,
    ) -> Result<Option<ChildSummary>> {
        let text = match feed.segments {
            Some(segments) if feed.raw_text.trim().is_empty() => segments.join("\n\n"),
            _ => feed.raw_text.to_string(),
        };

        let prompt = prompt::build_prompt(&text, feed.child_name, reference.date());
        debug!(
            "Sending {} chars of feed for {} to {}",
            text.len(),
            feed.child_name,
            self.backend.name()
        );
        let reply = self.backend.complete(&prompt).await?;
        map_response(&reply, feed.child_name, reference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use kidpulse_core::Error;
    use std::sync::Mutex;

    /// Canned-reply backend that records the prompts it receives.
    struct FakeBackend {
        reply: std::result::Result<String, String>,
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl CompletionBackend for FakeBackend {
        fn name(&self) -> &str {
            "fake"
        }

        async fn complete(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.reply.clone().map_err(Error::Backend)
        }
    }

    fn reference() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 1, 30)
            .unwrap()
            .and_hms_opt(18, 0, 0)
            .unwrap()
    }

    fn extractor(reply: std::result::Result<&str, &str>) -> (ProbabilisticExtractor, Arc<FakeBackend>) {
        let backend = Arc::new(FakeBackend {
            reply: reply.map(str::to_string).map_err(str::to_string),
            prompts: Default::default(),
        });
        (ProbabilisticExtractor::new(backend.clone()), backend)
    }

    #[tokio::test]
    async fn test_extract_maps_reply() {
        let (ai, backend) = extractor(Ok(r#"{"diapers": [{"time": "9:00 AM", "type": "Wet"}]}"#));
        let summary = ai
            .extract(&FeedInput::new("Jane Doe", "Diaper Wet 9:00 AM"), reference())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(summary.diapers.len(), 1);

        let prompts = backend.prompts.lock().unwrap();
        assert!(prompts[0].contains("Diaper Wet 9:00 AM"));
        assert!(prompts[0].contains("Jan 30, 2026"));
        assert!(prompts[0].contains("events for Jane Doe"));
    }

    #[tokio::test]
    async fn test_segments_used_when_raw_text_empty() {
        let (ai, backend) = extractor(Ok("{}"));
        let segments = vec!["Bottle 4 oz".to_string(), "Diaper Wet".to_string()];
        let out = ai
            .extract(&FeedInput::new("Jane Doe", "").with_segments(&segments), reference())
            .await
            .unwrap();
        assert!(out.is_none());
        assert!(backend.prompts.lock().unwrap()[0].contains("Bottle 4 oz\n\nDiaper Wet"));
    }

    #[tokio::test]
    async fn test_backend_error_propagates() {
        let (ai, _) = extractor(Err("connection refused"));
        let err = ai
            .extract(&FeedInput::new("Jane Doe", "text"), reference())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Backend(_)));
    }
}
