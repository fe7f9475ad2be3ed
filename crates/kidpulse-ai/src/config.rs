//! Backend configuration loading and provider selection.

use std::path::Path;

use kidpulse_core::config::parse_flag;
use serde::{Deserialize, Serialize};
use tracing::warn;

pub const DEFAULT_PROVIDER: &str = "ollama";
pub const DEFAULT_OLLAMA_URL: &str = "http://host.docker.internal:11434";
pub const DEFAULT_OLLAMA_MODEL: &str = "qwen3:8b";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Supported completion providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AiProvider {
    Ollama,
    OpenAi,
}

impl AiProvider {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "ollama" => Some(Self::Ollama),
            "openai" => Some(Self::OpenAi),
            _ => None,
        }
    }
}

impl std::fmt::Display for AiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AiProvider::Ollama => write!(f, "ollama"),
            AiProvider::OpenAi => write!(f, "openai"),
        }
    }
}

/// Backend configuration, read from ai-config.json.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Provider name as configured; validated when the backend is built.
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_ollama_url")]
    pub ollama_url: String,
    #[serde(default = "default_ollama_model")]
    pub ollama_model: String,
    #[serde(default)]
    pub openai_api_key: Option<String>,
    #[serde(default = "default_openai_model")]
    pub openai_model: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_provider() -> String {
    DEFAULT_PROVIDER.into()
}
fn default_ollama_url() -> String {
    DEFAULT_OLLAMA_URL.into()
}
fn default_ollama_model() -> String {
    DEFAULT_OLLAMA_MODEL.into()
}
fn default_openai_model() -> String {
    DEFAULT_OPENAI_MODEL.into()
}
fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: DEFAULT_PROVIDER.into(),
            ollama_url: DEFAULT_OLLAMA_URL.into(),
            ollama_model: DEFAULT_OLLAMA_MODEL.into(),
            openai_api_key: None,
            openai_model: DEFAULT_OPENAI_MODEL.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl AiConfig {
    /// Load config from file, falling back to env vars and defaults.
    pub fn load(config_path: &Path) -> Self {
        let from_file: Option<AiConfig> = std::fs::read_to_string(config_path)
            .ok()
            .and_then(|s| match serde_json::from_str(&s) {
                Ok(c) => Some(c),
                Err(e) => {
                    warn!("Ignoring malformed {}: {}", config_path.display(), e);
                    None
                }
            });

        let mut config = match from_file {
            Some(c) => c,
            None => Self::from_env(),
        };

        // Env var as fallback for the API key
        if config.openai_api_key.is_none() {
            config.openai_api_key = std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty());
        }

        config
    }

    /// Build config purely from environment variables.
    pub fn from_env() -> Self {
        let var = |name: &str, default: &str| std::env::var(name).unwrap_or_else(|_| default.into());
        Self {
            enabled: std::env::var("AI_ENABLED").map(|v| parse_flag(&v)).unwrap_or(false),
            provider: var("AI_PROVIDER", DEFAULT_PROVIDER),
            ollama_url: var("OLLAMA_URL", DEFAULT_OLLAMA_URL),
            ollama_model: var("OLLAMA_MODEL", DEFAULT_OLLAMA_MODEL),
            openai_api_key: std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty()),
            openai_model: var("OPENAI_MODEL", DEFAULT_OPENAI_MODEL),
            timeout_secs: std::env::var("AI_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// The configured provider, if it names a known one.
    pub fn resolve_provider(&self) -> Option<AiProvider> {
        AiProvider::parse(&self.provider)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AiConfig::default();
        assert!(!config.enabled);
        assert_eq!(config.resolve_provider(), Some(AiProvider::Ollama));
        assert_eq!(config.ollama_model, "qwen3:8b");
        assert_eq!(config.timeout_secs, 60);
    }

    #[test]
    fn test_provider_parse() {
        assert_eq!(AiProvider::parse("OpenAI"), Some(AiProvider::OpenAi));
        assert_eq!(AiProvider::parse(" ollama "), Some(AiProvider::Ollama));
        assert_eq!(AiProvider::parse("anthropic"), None);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ai-config.json");

        let config = AiConfig {
            enabled: true,
            provider: "openai".into(),
            openai_api_key: Some("sk-test".into()),
            ..Default::default()
        };
        std::fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();

        let loaded = AiConfig::load(&path);
        assert!(loaded.enabled);
        assert_eq!(loaded.resolve_provider(), Some(AiProvider::OpenAi));
        assert_eq!(loaded.openai_api_key.as_deref(), Some("sk-test"));
        assert_eq!(loaded.openai_model, DEFAULT_OPENAI_MODEL);
    }

    #[test]
    fn test_partial_file_gets_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ai-config.json");
        std::fs::write(&path, r#"{"enabled": true}"#).unwrap();

        let loaded = AiConfig::load(&path);
        assert!(loaded.enabled);
        assert_eq!(loaded.provider, "ollama");
        assert_eq!(loaded.ollama_url, DEFAULT_OLLAMA_URL);
    }
}
