//! Completion backends.
//!
//! Both backends send one non-streaming request and return the raw text of
//! the model's answer; locating and validating the JSON inside it is left to
//! `response`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use kidpulse_core::{Error, Result};
use reqwest::Client;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::config::{AiConfig, AiProvider};

pub const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";
const TEMPERATURE: f64 = 0.1;
const SYSTEM_MESSAGE: &str =
    "You extract structured data from text. Always respond with valid JSON only.";

/// A text-completion service.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    fn name(&self) -> &str;

    async fn complete(&self, prompt: &str) -> Result<String>;
}

fn http_client(timeout_secs: u64) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| Error::Http(e.to_string()))
}

async fn post_json(
    request: reqwest::RequestBuilder,
    body: &serde_json::Value,
) -> Result<serde_json::Value> {
    let response = request
        .header("Content-Type", "application/json")
        .json(body)
        .send()
        .await
        .map_err(|e| Error::Backend(format!("Request failed: {}", e)))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(Error::Backend(format!("API error {}: {}", status, body)));
    }

    response
        .json()
        .await
        .map_err(|e| Error::MalformedResponse(e.to_string()))
}

// ---------------------------------------------------------------------------
// Ollama
// ---------------------------------------------------------------------------

/// Local Ollama server (`/api/generate`).
pub struct OllamaBackend {
    client: Client,
    url: String,
    model: String,
}

impl OllamaBackend {
    pub fn new(url: &str, model: &str, timeout_secs: u64) -> Result<Self> {
        Ok(Self {
            client: http_client(timeout_secs)?,
            url: url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        })
    }
}

#[async_trait]
impl CompletionBackend for OllamaBackend {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        // Qwen-family models skip their reasoning preamble with this marker.
        let body = json!({
            "model": self.model,
            "prompt": format!("{}\n\n/no_think", prompt),
            "stream": false,
            "options": { "temperature": TEMPERATURE },
        });

        let endpoint = format!("{}/api/generate", self.url);
        debug!("Requesting completion from {} with model {}", endpoint, self.model);
        let parsed = post_json(self.client.post(&endpoint), &body).await?;

        parsed["response"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| Error::MalformedResponse("Ollama reply has no 'response' field".into()))
    }
}

// ---------------------------------------------------------------------------
// OpenAI
// ---------------------------------------------------------------------------

/// OpenAI chat completions in JSON mode.
pub struct OpenAiBackend {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl OpenAiBackend {
    pub fn new(api_key: &str, model: &str, timeout_secs: u64) -> Result<Self> {
        Ok(Self {
            client: http_client(timeout_secs)?,
            endpoint: OPENAI_CHAT_URL.to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        })
    }

    /// Point at an OpenAI-compatible endpoint.
    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.to_string();
        self
    }
}

#[async_trait]
impl CompletionBackend for OpenAiBackend {
    fn name(&self) -> &str {
        "openai"
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let body = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": SYSTEM_MESSAGE},
                {"role": "user", "content": prompt},
            ],
            "temperature": TEMPERATURE,
            "response_format": {"type": "json_object"},
        });

        debug!("Requesting completion from {} with model {}", self.endpoint, self.model);
        let request = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key));
        let parsed = post_json(request, &body).await?;

        parsed["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| Error::MalformedResponse("OpenAI reply has no message content".into()))
    }
}

/// Build the configured backend.
///
/// Returns `None` when the model path is disabled, the provider is unknown,
/// or OpenAI has no API key; callers then use the pattern cascade alone.
pub fn create_backend(config: &AiConfig) -> Option<Arc<dyn CompletionBackend>> {
    if !config.enabled {
        info!("AI extraction disabled. Using pattern extraction only.");
        return None;
    }

    let built: Result<Arc<dyn CompletionBackend>> = match config.resolve_provider() {
        None => {
            warn!("Unknown AI provider '{}'. Using pattern extraction only.", config.provider);
            return None;
        }
        Some(AiProvider::Ollama) => {
            OllamaBackend::new(&config.ollama_url, &config.ollama_model, config.timeout_secs)
                .map(|b| Arc::new(b) as Arc<dyn CompletionBackend>)
        }
        Some(AiProvider::OpenAi) => {
            let Some(key) = config.openai_api_key.as_deref().filter(|k| !k.is_empty()) else {
                warn!("OpenAI API key not configured. Using pattern extraction only.");
                return None;
            };
            OpenAiBackend::new(key, &config.openai_model, config.timeout_secs)
                .map(|b| Arc::new(b) as Arc<dyn CompletionBackend>)
        }
    };

    match built {
        Ok(backend) => {
            info!("Using {} backend for AI extraction", backend.name());
            Some(backend)
        }
        Err(e) => {
            warn!("AI backend unavailable: {}. Using pattern extraction only.", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_config_has_no_backend() {
        assert!(create_backend(&AiConfig::default()).is_none());
    }

    #[test]
    fn test_unknown_provider_has_no_backend() {
        let config = AiConfig {
            enabled: true,
            provider: "mystery".into(),
            ..Default::default()
        };
        assert!(create_backend(&config).is_none());
    }

    #[test]
    fn test_openai_requires_key() {
        let config = AiConfig {
            enabled: true,
            provider: "openai".into(),
            openai_api_key: None,
            ..Default::default()
        };
        assert!(create_backend(&config).is_none());

        let config = AiConfig {
            openai_api_key: Some("sk-test".into()),
            ..config
        };
        assert_eq!(create_backend(&config).unwrap().name(), "openai");
    }

    #[test]
    fn test_ollama_backend_built() {
        let config = AiConfig {
            enabled: true,
            ollama_url: "http://localhost:11434/".into(),
            ..Default::default()
        };
        assert_eq!(create_backend(&config).unwrap().name(), "ollama");
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_a_backend_error() {
        let backend = OllamaBackend::new("http://127.0.0.1:9", "qwen3:8b", 2).unwrap();
        let err = backend.complete("hello").await.unwrap_err();
        assert!(matches!(err, Error::Backend(_)));
    }
}
