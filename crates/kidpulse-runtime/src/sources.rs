//! Where feed text comes from.
//!
//! Logging in to the caregiving site and walking its pages belongs to the
//! capture layer; the cycle only needs the text it produced.

use std::path::PathBuf;

use async_trait::async_trait;
use kidpulse_core::Result;
use kidpulse_extract::FeedInput;
use tracing::debug;

/// Text captured for one child in one cycle.
#[derive(Debug, Clone)]
pub struct FeedCapture {
    pub child_name: String,
    pub raw_text: String,
    /// Discrete event cards, when the capture layer isolated them.
    pub segments: Option<Vec<String>>,
}

impl FeedCapture {
    pub fn new(child_name: impl Into<String>, raw_text: impl Into<String>) -> Self {
        Self {
            child_name: child_name.into(),
            raw_text: raw_text.into(),
            segments: None,
        }
    }

    pub fn with_segments(mut self, segments: Vec<String>) -> Self {
        self.segments = Some(segments);
        self
    }

    pub fn input(&self) -> FeedInput<'_> {
        let input = FeedInput::new(&self.child_name, &self.raw_text);
        match &self.segments {
            Some(segments) => input.with_segments(segments),
            None => input,
        }
    }
}

#[async_trait]
pub trait FeedSource: Send + Sync {
    fn name(&self) -> &str;

    async fn capture(&self) -> Result<Vec<FeedCapture>>;
}

/// A feed page saved to disk, attributed to one child.
pub struct FileFeedSource {
    path: PathBuf,
    child_name: String,
}

impl FileFeedSource {
    pub fn new(path: impl Into<PathBuf>, child_name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            child_name: child_name.into(),
        }
    }
}

#[async_trait]
impl FeedSource for FileFeedSource {
    fn name(&self) -> &str {
        "file"
    }

    async fn capture(&self) -> Result<Vec<FeedCapture>> {
        let raw_text = tokio::fs::read_to_string(&self.path).await?;
        debug!("Read {} chars from {}", raw_text.len(), self.path.display());
        Ok(vec![FeedCapture::new(self.child_name.as_str(), raw_text)])
    }
}
