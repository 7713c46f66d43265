//! Deployment resource scaling
//!
//! Resolves the target workload to a deployment, rescales every container's
//! requests and limits by a percentage, applies one strategic-merge patch
//! touching only `spec.template.spec.containers[*].resources`, then stamps
//! the kubectl restart annotation with a second patch so the change always
//! rolls the pods. A container without any requests or limits is recorded
//! as skipped and the rest still scale.

pub mod resolver;

use crate::error::{KqError, Result};
use crate::intent::Operation;
use crate::quantity::scale_quantity;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Container;
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use kube::api::{Patch, PatchParams};
use kube::{Api, Client};
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;
use tracing::info;

/// What happened to one container during a scaling pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContainerOutcome {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requests: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limits: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped: Option<String>,
}

impl ContainerOutcome {
    pub fn was_scaled(&self) -> bool {
        self.skipped.is_none()
    }
}

/// Summary of a completed scaling operation.
/// `scaled_by_percent` is negative for a decrease, positive for an increase.
#[derive(Debug, Clone, Serialize)]
pub struct ScaleResult {
    pub namespace: String,
    pub deployment: String,
    pub scaled_by_percent: i64,
    pub operation: Operation,
    pub containers: Vec<ContainerOutcome>,
    pub status: String,
}

/// Scale a deployment's (or its pod's owning deployment's) container
/// resources by `percentage` in the given direction.
pub async fn scale_resources(
    client: &Client,
    resource_name: &str,
    namespace: &str,
    percentage: u32,
    operation: Operation,
) -> Result<ScaleResult> {
    let Some(deployment_name) =
        resolver::resolve_deployment(client, namespace, resource_name).await?
    else {
        let suggestions = resolver::suggest_workloads(client, namespace, resource_name).await;
        return Err(KqError::ResolutionFailed {
            name: resource_name.to_string(),
            namespace: namespace.to_string(),
            suggestions,
        });
    };

    let deployments: Api<Deployment> = Api::namespaced(client.clone(), namespace);
    let deployment = deployments.get(&deployment_name).await?;

    let containers = deployment
        .spec
        .as_ref()
        .and_then(|s| s.template.spec.as_ref())
        .map(|pod_spec| pod_spec.containers.as_slice())
        .unwrap_or_default();

    let outcomes: Vec<ContainerOutcome> = containers
        .iter()
        .map(|c| plan_container(c, operation, percentage))
        .collect();

    let patch = resources_patch(&outcomes);
    deployments
        .patch(&deployment_name, &PatchParams::default(), &Patch::Strategic(&patch))
        .await?;

    // Resource-only changes do not reliably roll pods on every cluster
    // version; the restart annotation does.
    let now = chrono::Utc::now().to_rfc3339();
    let restart = json!({
        "spec": {
            "template": {
                "metadata": {
                    "annotations": {
                        "kubectl.kubernetes.io/restartedAt": now
                    }
                }
            }
        }
    });
    deployments
        .patch(&deployment_name, &PatchParams::default(), &Patch::Merge(&restart))
        .await?;

    let scaled = outcomes.iter().filter(|o| o.was_scaled()).count();
    info!(
        deployment = %deployment_name,
        namespace = %namespace,
        scaled,
        skipped = outcomes.len() - scaled,
        "deployment resources patched"
    );

    Ok(ScaleResult {
        namespace: namespace.to_string(),
        deployment: deployment_name,
        scaled_by_percent: signed_percent(operation, percentage),
        operation,
        containers: outcomes,
        status: "Deployment resources patched; rollout restart triggered".to_string(),
    })
}

/// The external sign encoding of direction: negative means decrease
fn signed_percent(operation: Operation, percentage: u32) -> i64 {
    match operation {
        Operation::Increase => percentage as i64,
        Operation::Decrease => -(percentage as i64),
    }
}

/// Compute the new quantities for one container, or a skip outcome when it
/// carries neither requests nor limits (scaling such a container would
/// invent numbers out of thin air).
fn plan_container(container: &Container, operation: Operation, percentage: u32) -> ContainerOutcome {
    let resources = container.resources.as_ref();
    let requests = resources
        .and_then(|r| r.requests.as_ref())
        .filter(|m| !m.is_empty());
    let limits = resources
        .and_then(|r| r.limits.as_ref())
        .filter(|m| !m.is_empty());

    if requests.is_none() && limits.is_none() {
        return ContainerOutcome {
            name: container.name.clone(),
            requests: None,
            limits: None,
            skipped: Some("container has no resources set; cannot scale safely".to_string()),
        };
    }

    ContainerOutcome {
        name: container.name.clone(),
        requests: requests.map(|m| rescale_map(m, operation, percentage)),
        limits: limits.map(|m| rescale_map(m, operation, percentage)),
        skipped: None,
    }
}

fn rescale_map(
    quantities: &BTreeMap<String, Quantity>,
    operation: Operation,
    percentage: u32,
) -> BTreeMap<String, String> {
    quantities
        .iter()
        .map(|(kind, q)| (kind.clone(), scale_quantity(&q.0, operation, percentage)))
        .collect()
}

/// Minimal strategic-merge patch carrying only the rescaled containers'
/// resources; strategic merge keys the containers list by name, so
/// everything else on the pod template is left alone.
fn resources_patch(outcomes: &[ContainerOutcome]) -> serde_json::Value {
    let containers: Vec<serde_json::Value> = outcomes
        .iter()
        .filter(|o| o.was_scaled())
        .map(|o| {
            let mut resources = serde_json::Map::new();
            if let Some(requests) = &o.requests {
                resources.insert("requests".to_string(), json!(requests));
            }
            if let Some(limits) = &o.limits {
                resources.insert("limits".to_string(), json!(limits));
            }
            json!({ "name": o.name, "resources": resources })
        })
        .collect();

    json!({
        "spec": {
            "template": {
                "spec": {
                    "containers": containers
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::ResourceRequirements;

    fn quantities(entries: &[(&str, &str)]) -> BTreeMap<String, Quantity> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), Quantity(v.to_string())))
            .collect()
    }

    fn container(name: &str, requests: Option<BTreeMap<String, Quantity>>, limits: Option<BTreeMap<String, Quantity>>) -> Container {
        Container {
            name: name.to_string(),
            resources: Some(ResourceRequirements {
                requests,
                limits,
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_plan_scales_requests_and_limits() {
        let c = container(
            "app",
            Some(quantities(&[("cpu", "200m"), ("memory", "128Mi")])),
            Some(quantities(&[("cpu", "400m")])),
        );
        let outcome = plan_container(&c, Operation::Decrease, 50);

        assert!(outcome.was_scaled());
        let requests = outcome.requests.unwrap();
        assert_eq!(requests["cpu"], "100m");
        assert_eq!(requests["memory"], "64Mi");
        assert_eq!(outcome.limits.unwrap()["cpu"], "200m");
    }

    #[test]
    fn test_plan_skips_container_without_resources() {
        let bare = Container {
            name: "sidecar".to_string(),
            ..Default::default()
        };
        let outcome = plan_container(&bare, Operation::Decrease, 30);

        assert!(!outcome.was_scaled());
        assert!(outcome.skipped.unwrap().contains("no resources"));
    }

    #[test]
    fn test_partial_failure_is_per_container() {
        let scalable = container("app", Some(quantities(&[("cpu", "100m")])), None);
        let bare = Container {
            name: "sidecar".to_string(),
            ..Default::default()
        };

        let outcomes: Vec<ContainerOutcome> = [scalable, bare]
            .iter()
            .map(|c| plan_container(c, Operation::Decrease, 20))
            .collect();

        assert!(outcomes[0].was_scaled());
        assert!(!outcomes[1].was_scaled());
    }

    #[test]
    fn test_patch_contains_only_scaled_containers() {
        let scalable = container("app", Some(quantities(&[("cpu", "100m")])), None);
        let bare = Container {
            name: "sidecar".to_string(),
            ..Default::default()
        };
        let outcomes: Vec<ContainerOutcome> = [scalable, bare]
            .iter()
            .map(|c| plan_container(c, Operation::Decrease, 20))
            .collect();

        let patch = resources_patch(&outcomes);
        let containers = &patch["spec"]["template"]["spec"]["containers"];
        assert_eq!(containers.as_array().unwrap().len(), 1);
        assert_eq!(containers[0]["name"], "app");
        assert_eq!(containers[0]["resources"]["requests"]["cpu"], "80m");
        assert!(containers[0]["resources"].get("limits").is_none());
    }

    #[test]
    fn test_scaled_by_percent_sign() {
        assert_eq!(signed_percent(Operation::Decrease, 25), -25);
        assert_eq!(signed_percent(Operation::Increase, 25), 25);
    }
}
