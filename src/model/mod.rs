//! Language model client
//!
//! A single text-in/text-out capability. The extractor only ever sees
//! `complete`, so the network client can be swapped for a stub in tests
//! and the rule-based fallback stays reachable without any model at all.

use crate::config::ModelConfig;
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Synchronous (per-request) text completion collaborator
#[async_trait]
pub trait CompletionModel: Send + Sync {
    /// Send a prompt, get the raw completion text back
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// HTTP client for the Gemini `generateContent` endpoint
pub struct GeminiClient {
    http: reqwest::Client,
    url: String,
    api_key: String,
}

impl GeminiClient {
    /// Build a client from configuration. Returns `None` when no API key is
    /// set; callers then run without a model and rely on the fallback parser.
    pub fn from_config(config: &ModelConfig) -> Result<Option<Self>> {
        if config.api_key.is_empty() {
            return Ok(None);
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Some(Self {
            http,
            url: config.url.clone(),
            api_key: config.api_key.clone(),
        }))
    }
}

#[async_trait]
impl CompletionModel for GeminiClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        };

        let response = self
            .http
            .post(&self.url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json::<GenerateResponse>()
            .await?;

        Ok(extract_text(&response))
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ReplyPart>,
}

#[derive(Deserialize)]
struct ReplyPart {
    #[serde(default)]
    text: String,
}

/// Join the text parts of the first candidate, as the REST v1beta shape nests them
fn extract_text(response: &GenerateResponse) -> String {
    let Some(content) = response.candidates.first().and_then(|c| c.content.as_ref()) else {
        return String::new();
    };

    content
        .parts
        .iter()
        .map(|p| p.text.as_str())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}
