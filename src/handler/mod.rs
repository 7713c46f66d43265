//! Request pipeline: free text → intent → cluster action → structured result
//!
//! The single entry point consumed by both transports (CLI and HTTP).
//! Domain-level failures (unknown action, missing resource name, workload
//! that resolves to nothing, absent metrics API) come back in-band as an
//! `Error` result so the caller always gets `{intent, result}`; cluster
//! transport failures and patch rejections propagate as `KqError`.

use crate::client::create_client;
use crate::config::AppConfig;
use crate::error::{KqError, Result};
use crate::intent::{Action, Intent, IntentExtractor, Operation};
use crate::metrics::{self, MetricsReport};
use crate::model::GeminiClient;
use crate::scaling::{self, ScaleResult};
use k8s_openapi::api::core::v1::Pod;
use kube::api::ListParams;
use kube::{Api, Client};
use serde::Serialize;
use serde_json::json;

/// Long-lived per-process state: one cluster client, one extractor
pub struct AppContext {
    pub client: Client,
    pub extractor: IntentExtractor<GeminiClient>,
}

impl AppContext {
    pub async fn new(kube_context: Option<&str>, config: &AppConfig) -> Result<Self> {
        let client = create_client(kube_context).await?;
        let model = GeminiClient::from_config(&config.model)?;
        Ok(Self {
            client,
            extractor: IntentExtractor::new(model),
        })
    }
}

/// One pod line of a listing
#[derive(Debug, Clone, Serialize)]
pub struct PodSummary {
    pub namespace: String,
    pub name: String,
    pub phase: String,
}

/// Discriminated union over everything an action can produce
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ActionResult {
    Pods(Vec<PodSummary>),
    Report(MetricsReport),
    Scale(ScaleResult),
    Error(ErrorPayload),
}

/// In-band error result with enough context to retry by hand
#[derive(Debug, Clone, Serialize)]
pub struct ErrorPayload {
    pub message: String,
    #[serde(skip_serializing_if = "serde_json::Value::is_null")]
    pub context: serde_json::Value,
}

/// What `handle` returns for every non-failed request
#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub intent: Intent,
    pub result: ActionResult,
}

/// Run the full pipeline for one request
pub async fn handle(ctx: &AppContext, user_text: &str) -> Result<QueryResponse> {
    if user_text.trim().is_empty() {
        return Err(KqError::EmptyPrompt);
    }

    let intent = ctx.extractor.extract(user_text).await;
    let result = execute(ctx, &intent).await?;
    Ok(QueryResponse { intent, result })
}

async fn execute(ctx: &AppContext, intent: &Intent) -> Result<ActionResult> {
    let namespace = intent.params.namespace.as_str();
    // "all" means every namespace, anything else is a concrete one
    let namespace_scope = (namespace != "all").then_some(namespace);

    match intent.action {
        Action::ListPods => Ok(ActionResult::Pods(
            list_pods(&ctx.client, namespace_scope).await?,
        )),

        Action::TopPods => match metrics::top_pods(&ctx.client, namespace_scope).await {
            Ok(report) => Ok(ActionResult::Report(report)),
            Err(err @ KqError::MetricsUnavailable(_)) => Ok(ActionResult::Error(ErrorPayload {
                message: err.to_string(),
                context: json!({ "namespace": namespace }),
            })),
            Err(err) => Err(err),
        },

        Action::ScaleResources => {
            let Some(resource_name) = intent.params.resource_name.as_deref() else {
                return Ok(ActionResult::Error(ErrorPayload {
                    message: "resource_name missing".to_string(),
                    context: serde_json::to_value(intent)?,
                }));
            };
            let percentage = intent.params.percentage.unwrap_or(30);
            let operation = intent.params.operation.unwrap_or(Operation::Decrease);

            match scaling::scale_resources(&ctx.client, resource_name, namespace, percentage, operation)
                .await
            {
                Ok(result) => Ok(ActionResult::Scale(result)),
                Err(err @ KqError::ResolutionFailed { .. }) => {
                    Ok(ActionResult::Error(ErrorPayload {
                        message: err.to_string(),
                        context: json!({ "namespace": namespace, "resource_name": resource_name }),
                    }))
                }
                Err(err) => Err(err),
            }
        }

        Action::Unknown => Ok(ActionResult::Error(ErrorPayload {
            message: "Unknown action".to_string(),
            context: serde_json::to_value(intent)?,
        })),
    }
}

/// List pods in one namespace, or everywhere when the scope is `None`
async fn list_pods(client: &Client, namespace: Option<&str>) -> Result<Vec<PodSummary>> {
    let api: Api<Pod> = match namespace {
        Some(ns) => Api::namespaced(client.clone(), ns),
        None => Api::all(client.clone()),
    };

    let pods = api.list(&ListParams::default()).await?;

    Ok(pods
        .items
        .into_iter()
        .map(|pod| PodSummary {
            namespace: pod.metadata.namespace.unwrap_or_default(),
            name: pod.metadata.name.unwrap_or_default(),
            phase: pod
                .status
                .and_then(|s| s.phase)
                .unwrap_or_else(|| "Unknown".to_string()),
        })
        .collect())
}
