//! Deterministic rule-based intent parser
//!
//! Used whenever the language model is unavailable or replies with
//! something that does not parse. Keyword matching over the lowercased
//! request text; always produces an intent, `unknown` at worst.

use super::{Action, Intent, IntentParams, Operation};
use regex::Regex;
use std::sync::OnceLock;

const DEFAULT_PERCENTAGE: u32 = 30;

/// Words that can never be a resource name in a scaling request
const STOPWORDS: &[&str] = &[
    "scale", "optimize", "optimise", "reduce", "increase", "decrease", "by", "to", "in", "from",
    "the", "of", "a", "an", "and", "down", "up", "percent", "namespace", "resource", "resources",
    "usage", "please", "pod", "pods", "deployment", "deployments",
];

fn namespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?:in|from)\s+([a-z0-9-]+)\s+namespace").unwrap())
}

fn percentage_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+)\s*%").unwrap())
}

fn token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[a-z0-9-]+").unwrap())
}

/// Parse a request without any model involvement
pub fn parse(user_text: &str) -> Intent {
    let text = user_text.trim().to_lowercase();

    if text.contains("list") && text.contains("pod") {
        return Intent {
            action: Action::ListPods,
            params: IntentParams {
                namespace: extract_namespace(&text),
                ..Default::default()
            },
        };
    }

    if (text.contains("top") || text.contains("most")) && text.contains("pod") {
        return Intent {
            action: Action::TopPods,
            params: IntentParams {
                namespace: extract_namespace(&text),
                ..Default::default()
            },
        };
    }

    let scale_verbs = ["scale", "optimise", "optimize", "reduce", "increase"];
    if scale_verbs.iter().any(|v| text.contains(v)) {
        let operation = if text.contains("increase") {
            Operation::Increase
        } else {
            Operation::Decrease
        };

        return Intent {
            action: Action::ScaleResources,
            params: IntentParams {
                namespace: extract_namespace(&text),
                resource_name: extract_resource_name(&text),
                percentage: Some(extract_percentage(&text)),
                operation: Some(operation),
            },
        };
    }

    Intent {
        action: Action::Unknown,
        params: IntentParams::default(),
    }
}

fn extract_namespace(text: &str) -> String {
    namespace_re()
        .captures(text)
        .map(|c| c[1].to_string())
        .unwrap_or_else(|| "default".to_string())
}

fn extract_percentage(text: &str) -> u32 {
    percentage_re()
        .captures(text)
        .and_then(|c| c[1].parse().ok())
        .unwrap_or(DEFAULT_PERCENTAGE)
}

/// The resource name is the last token that is neither a filler word nor a
/// bare number. The "in <ns> namespace" clause is cut first so its tokens
/// cannot win.
fn extract_resource_name(text: &str) -> Option<String> {
    let text = namespace_re().replace_all(text, "");

    token_re()
        .find_iter(&text)
        .map(|m| m.as_str())
        .filter(|t| !STOPWORDS.contains(t))
        .filter(|t| !t.chars().all(|c| c.is_ascii_digit()))
        .last()
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_pods_with_namespace() {
        let intent = parse("list pods in kube-system namespace");
        assert_eq!(intent.action, Action::ListPods);
        assert_eq!(intent.params.namespace, "kube-system");
    }

    #[test]
    fn test_list_pods_default_namespace() {
        let intent = parse("List all pods");
        assert_eq!(intent.action, Action::ListPods);
        assert_eq!(intent.params.namespace, "default");
    }

    #[test]
    fn test_top_pods() {
        let intent = parse("show the most expensive pods from monitoring namespace");
        assert_eq!(intent.action, Action::TopPods);
        assert_eq!(intent.params.namespace, "monitoring");
    }

    #[test]
    fn test_scale_with_percentage() {
        let intent = parse("reduce payments-api by 25%");
        assert_eq!(intent.action, Action::ScaleResources);
        assert_eq!(intent.params.resource_name.as_deref(), Some("payments-api"));
        assert_eq!(intent.params.percentage, Some(25));
        assert_eq!(intent.params.operation, Some(Operation::Decrease));
        assert_eq!(intent.params.namespace, "default");
    }

    #[test]
    fn test_scale_defaults() {
        let intent = parse("scale payments-api down");
        assert_eq!(intent.action, Action::ScaleResources);
        assert_eq!(intent.params.resource_name.as_deref(), Some("payments-api"));
        assert_eq!(intent.params.percentage, Some(30));
        assert_eq!(intent.params.operation, Some(Operation::Decrease));
    }

    #[test]
    fn test_scale_increase_with_namespace() {
        let intent = parse("increase web-frontend by 50% in staging namespace");
        assert_eq!(intent.action, Action::ScaleResources);
        assert_eq!(intent.params.resource_name.as_deref(), Some("web-frontend"));
        assert_eq!(intent.params.percentage, Some(50));
        assert_eq!(intent.params.operation, Some(Operation::Increase));
        assert_eq!(intent.params.namespace, "staging");
    }

    #[test]
    fn test_unknown() {
        let intent = parse("what is the weather today");
        assert_eq!(intent.action, Action::Unknown);
        assert_eq!(intent.params.namespace, "default");
    }
}
