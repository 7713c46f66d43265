//! Error types for kubequery

use thiserror::Error;

/// Main error type for kubequery
#[derive(Debug, Error)]
pub enum KqError {
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    #[error("prompt is required")]
    EmptyPrompt,

    #[error("Could not resolve a Deployment from '{name}' in namespace '{namespace}'{}", format_suggestions(.suggestions))]
    ResolutionFailed {
        name: String,
        namespace: String,
        suggestions: Vec<String>,
    },

    #[error("metrics.k8s.io not available: {0}")]
    MetricsUnavailable(String),

    #[error("model request failed: {0}")]
    Model(#[from] reqwest::Error),

    #[error("model endpoint not configured")]
    ModelNotConfigured,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for KqError {
    fn from(e: serde_json::Error) -> Self {
        KqError::Serialization(e.to_string())
    }
}

fn format_suggestions(suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        String::new()
    } else {
        format!(" (closest matches: {})", suggestions.join(", "))
    }
}

/// Result type alias for kubequery
pub type Result<T> = std::result::Result<T, KqError>;

/// True when a kube API error is a plain 404 for the requested object
pub fn is_not_found(err: &kube::Error) -> bool {
    matches!(err, kube::Error::Api(resp) if resp.code == 404)
}
