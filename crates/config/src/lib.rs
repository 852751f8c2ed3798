//! Configuration loading, validation, and management for Zhiyuan.
//!
//! Loads configuration from `~/.zhiyuan/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// The root configuration structure.
///
/// Maps directly to `~/.zhiyuan/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the completion service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Completion service base URL (OpenAI-compatible).
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Model or endpoint id sent with every completion request.
    #[serde(default = "default_model")]
    pub model: String,

    /// Request timeout for the non-streaming completion call, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Gateway configuration.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Knowledge corpus configuration.
    #[serde(default)]
    pub corpus: CorpusConfig,

    /// Prompt assembly configuration.
    #[serde(default)]
    pub prompt: PromptConfig,
}

fn default_api_url() -> String {
    "https://ark.cn-beijing.volces.com/api/v3".into()
}
fn default_model() -> String {
    "doubao-seed-1-6".into()
}
fn default_request_timeout_secs() -> u64 {
    120
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field(
                "api_key",
                &if self.api_key.is_some() {
                    "[REDACTED]"
                } else {
                    "None"
                },
            )
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("gateway", &self.gateway)
            .field("corpus", &self.corpus)
            .field("prompt", &self.prompt)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,
}

fn default_port() -> u16 {
    3000
}
fn default_host() -> String {
    "127.0.0.1".into()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusConfig {
    /// Directory holding the manifest and one file per section.
    #[serde(default = "default_corpus_dir")]
    pub dir: PathBuf,

    /// Manifest file name inside the corpus directory.
    #[serde(default = "default_manifest")]
    pub manifest: String,
}

fn default_corpus_dir() -> PathBuf {
    PathBuf::from("corpus")
}
fn default_manifest() -> String {
    "knowledgebase.json".into()
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            dir: default_corpus_dir(),
            manifest: default_manifest(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptConfig {
    /// Total prompt budget in estimated tokens.
    #[serde(default = "default_max_prompt_tokens")]
    pub max_prompt_tokens: usize,

    /// Cap on flat-search excerpts folded into the prompt.
    #[serde(default = "default_max_search_hits")]
    pub max_search_hits: usize,

    /// Cap on conversation turns folded into the prompt, before the token
    /// budget trims further.
    #[serde(default = "default_max_history_turns")]
    pub max_history_turns: usize,
}

fn default_max_prompt_tokens() -> usize {
    12_000
}
fn default_max_search_hits() -> usize {
    5
}
fn default_max_history_turns() -> usize {
    20
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            max_prompt_tokens: default_max_prompt_tokens(),
            max_search_hits: default_max_search_hits(),
            max_history_turns: default_max_history_turns(),
        }
    }
}

/// Errors from configuration loading or validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Cannot parse config at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

impl AppConfig {
    /// Load configuration from the default path (~/.zhiyuan/config.toml).
    ///
    /// Environment variables take priority over the file:
    /// - `ZHIYUAN_API_KEY` (falls back to `ARK_API_KEY`)
    /// - `ZHIYUAN_API_URL`
    /// - `ZHIYUAN_MODEL`
    /// - `ZHIYUAN_CORPUS_DIR`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;

        if let Some(key) = std::env::var("ZHIYUAN_API_KEY")
            .ok()
            .or_else(|| std::env::var("ARK_API_KEY").ok())
        {
            config.api_key = Some(key);
        }
        if let Ok(url) = std::env::var("ZHIYUAN_API_URL") {
            config.api_url = url;
        }
        if let Ok(model) = std::env::var("ZHIYUAN_MODEL") {
            config.model = model;
        }
        if let Ok(dir) = std::env::var("ZHIYUAN_CORPUS_DIR") {
            config.corpus.dir = PathBuf::from(dir);
        }

        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".zhiyuan")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.api_url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "api_url must not be empty".into(),
            ));
        }

        if self.prompt.max_search_hits == 0 {
            return Err(ConfigError::ValidationError(
                "prompt.max_search_hits must be at least 1".into(),
            ));
        }

        // The preamble plus a short question alone run a few hundred tokens;
        // anything below this leaves no room for retrieval.
        if self.prompt.max_prompt_tokens < 512 {
            return Err(ConfigError::ValidationError(
                "prompt.max_prompt_tokens must be at least 512".into(),
            ));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generate a default config TOML string (for first-run setup).
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: default_api_url(),
            model: default_model(),
            request_timeout_secs: default_request_timeout_secs(),
            gateway: GatewayConfig::default(),
            corpus: CorpusConfig::default(),
            prompt: PromptConfig::default(),
        }
    }
}

fn dirs_home() -> PathBuf {
    #[cfg(windows)]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."))
    }
    #[cfg(not(windows))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."))
    }
}
