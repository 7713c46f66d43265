//! Intent extraction
//!
//! Turns a free-form request into a validated `Intent`. The primary path
//! asks the language model for a strict-schema JSON object; any failure on
//! that path (transport error, timeout, fenced or malformed reply, missing
//! fields) drops to the deterministic rule-based parser in [`fallback`].
//! Every request ends with an intent, `unknown` at worst.

pub mod fallback;

use crate::model::CompletionModel;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

const DEFAULT_PERCENTAGE: u32 = 30;

/// Instruction preamble sent ahead of the user text
const SYSTEM_PROMPT: &str = r#"You are an intent extractor for Kubernetes ops.
Return ONLY valid JSON (no code fences), following exactly this schema:

{
  "action": "list_pods" | "top_pods" | "scale_resources",
  "params": {
    "namespace": "default",
    "resource_name": "string",
    "percentage": 30,
    "operation": "decrease" | "increase"
  }
}
Do not include any other keys. Do not include markdown or comments.
"#;

/// The action a request resolves to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    ListPods,
    TopPods,
    ScaleResources,
    Unknown,
}

/// Scaling direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Increase,
    Decrease,
}

/// Normalized intent parameters.
///
/// `namespace` is always present. For `scale_resources`, `percentage` and
/// `operation` are always filled in after normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentParams {
    pub namespace: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percentage: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation: Option<Operation>,
}

impl Default for IntentParams {
    fn default() -> Self {
        Self {
            namespace: "default".to_string(),
            resource_name: None,
            percentage: None,
            operation: None,
        }
    }
}

/// A validated, normalized request intent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    pub action: Action,
    pub params: IntentParams,
}

/// Extracts intents via the model, falling back to rule-based parsing
pub struct IntentExtractor<M> {
    model: Option<M>,
}

impl<M: CompletionModel> IntentExtractor<M> {
    /// `model: None` means every request goes straight to the rule-based parser
    pub fn new(model: Option<M>) -> Self {
        Self { model }
    }

    /// Interpret a request. Never fails: model trouble of any kind routes
    /// to the deterministic parser.
    pub async fn extract(&self, user_text: &str) -> Intent {
        let Some(model) = &self.model else {
            debug!("no model configured, using rule-based parser");
            return fallback::parse(user_text);
        };

        let prompt = format!("{SYSTEM_PROMPT}\nUser: {user_text}");
        match model.complete(&prompt).await {
            Ok(raw) => intent_from_model_reply(&raw, user_text),
            Err(err) => {
                debug!(error = %err, "model call failed, using rule-based parser");
                fallback::parse(user_text)
            }
        }
    }
}

/// Sanitize and validate a raw model reply; fall back on any defect
pub fn intent_from_model_reply(raw: &str, user_text: &str) -> Intent {
    let cleaned = strip_code_fence(raw);

    let Ok(Value::Object(reply)) = serde_json::from_str::<Value>(&cleaned) else {
        return fallback::parse(user_text);
    };

    let Some(action) = reply.get("action").and_then(Value::as_str) else {
        return fallback::parse(user_text);
    };

    let action = match action {
        "list_pods" => Action::ListPods,
        "top_pods" => Action::TopPods,
        "scale_resources" => Action::ScaleResources,
        _ => Action::Unknown,
    };

    let params = reply.get("params").cloned().unwrap_or(Value::Null);
    normalize_intent(action, &params)
}

/// Strip a Markdown code fence (optionally tagged ```json) around a reply
fn strip_code_fence(raw: &str) -> String {
    let cleaned = raw.trim();
    if !cleaned.starts_with("```") {
        return cleaned.to_string();
    }

    let cleaned = cleaned.trim_matches('`').trim();
    match cleaned.strip_prefix("json").or_else(|| cleaned.strip_prefix("JSON")) {
        Some(rest) => rest.trim().to_string(),
        None => cleaned.to_string(),
    }
}

/// Force the params invariants: namespace always present; for
/// `scale_resources` a non-negative percentage (default 30) and a legal
/// operation (default decrease). Out-of-domain values become defaults,
/// never errors.
fn normalize_intent(action: Action, params: &Value) -> Intent {
    let namespace = params
        .get("namespace")
        .and_then(Value::as_str)
        .filter(|ns| !ns.is_empty())
        .unwrap_or("default")
        .to_string();

    let mut normalized = IntentParams {
        namespace,
        ..Default::default()
    };

    if action == Action::ScaleResources {
        normalized.resource_name = params
            .get("resource_name")
            .and_then(Value::as_str)
            .filter(|n| !n.is_empty())
            .map(String::from);
        normalized.percentage = Some(coerce_percentage(params.get("percentage")));
        normalized.operation = Some(coerce_operation(params.get("operation")));
    }

    Intent {
        action,
        params: normalized,
    }
}

fn coerce_percentage(value: Option<&Value>) -> u32 {
    match value {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .and_then(|v| u32::try_from(v).ok())
            .unwrap_or(DEFAULT_PERCENTAGE),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(DEFAULT_PERCENTAGE),
        _ => DEFAULT_PERCENTAGE,
    }
}

fn coerce_operation(value: Option<&Value>) -> Operation {
    match value.and_then(Value::as_str) {
        Some("increase") => Operation::Increase,
        _ => Operation::Decrease,
    }
}
