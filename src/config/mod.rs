//! Application configuration for kubequery

use crate::error::{KqError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Application configuration stored in ~/.kq/config.toml
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Language model settings
    #[serde(default)]
    pub model: ModelConfig,
}

/// Language model endpoint settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// API key; empty disables the model and the rule-based parser takes over
    #[serde(default)]
    pub api_key: String,

    /// generateContent endpoint URL
    #[serde(default = "default_model_url")]
    pub url: String,

    /// Request timeout in seconds
    #[serde(default = "default_model_timeout")]
    pub timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            url: default_model_url(),
            timeout_secs: default_model_timeout(),
        }
    }
}

fn default_model_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent"
        .to_string()
}

fn default_model_timeout() -> u64 {
    30
}

/// Get the kq config directory (~/.kq)
pub fn config_dir() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|h| h.join(".kq"))
        .ok_or_else(|| KqError::Config("Could not determine home directory".to_string()))
}

/// Load configuration from ~/.kq/config.toml, then apply environment
/// overrides (GEMINI_API_KEY, GEMINI_URL). The result is immutable and
/// passed down at construction time.
pub fn load_config() -> Result<AppConfig> {
    let path = config_dir()?.join("config.toml");
    let mut config = if path.exists() {
        let content = std::fs::read_to_string(&path)?;
        toml::from_str(&content).map_err(|e| KqError::Config(e.to_string()))?
    } else {
        AppConfig::default()
    };

    if let Ok(key) = std::env::var("GEMINI_API_KEY") {
        config.model.api_key = key;
    }
    if let Ok(url) = std::env::var("GEMINI_URL") {
        config.model.url = url;
    }

    Ok(config)
}
