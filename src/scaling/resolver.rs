//! Owner resolution: a user-supplied name → its controlling Deployment
//!
//! Ownership chains in this domain are at most two hops
//! (Pod → ReplicaSet → Deployment), so this is an explicit two-level
//! lookup, not a general graph walk.

use crate::error::{is_not_found, Result};
use crate::fuzzy;
use k8s_openapi::api::apps::v1::{Deployment, ReplicaSet};
use k8s_openapi::api::core::v1::Pod;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::api::ListParams;
use kube::{Api, Client};

/// Resolve `name` to a deployment name.
///
/// A literal deployment name is already resolved (the fast path). Otherwise
/// the name is read as a pod and its owner references are followed.
/// `Ok(None)` means the name is not a managed workload; callers surface that
/// to the user, there is no retry.
pub async fn resolve_deployment(
    client: &Client,
    namespace: &str,
    name: &str,
) -> Result<Option<String>> {
    let deployments: Api<Deployment> = Api::namespaced(client.clone(), namespace);
    match deployments.get(name).await {
        Ok(_) => return Ok(Some(name.to_string())),
        Err(e) if is_not_found(&e) => {}
        Err(e) => return Err(e.into()),
    }

    let pods: Api<Pod> = Api::namespaced(client.clone(), namespace);
    let pod = match pods.get(name).await {
        Ok(p) => p,
        Err(e) if is_not_found(&e) => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let owners = pod.metadata.owner_references.unwrap_or_default();

    if let Some(rs_name) = owner_of_kind(&owners, "ReplicaSet") {
        let replicasets: Api<ReplicaSet> = Api::namespaced(client.clone(), namespace);
        match replicasets.get(rs_name).await {
            Ok(rs) => {
                let rs_owners = rs.metadata.owner_references.unwrap_or_default();
                if let Some(deployment) = owner_of_kind(&rs_owners, "Deployment") {
                    return Ok(Some(deployment.to_string()));
                }
            }
            Err(e) if is_not_found(&e) => {}
            Err(e) => return Err(e.into()),
        }
    }

    Ok(owner_of_kind(&owners, "Deployment").map(String::from))
}

/// First owner reference of the given kind
fn owner_of_kind<'a>(owners: &'a [OwnerReference], kind: &str) -> Option<&'a str> {
    owners
        .iter()
        .find(|o| o.kind == kind)
        .map(|o| o.name.as_str())
}

/// Collect workload names near `name` for the resolution error message.
/// Best effort: a failed listing just means no suggestions.
pub async fn suggest_workloads(client: &Client, namespace: &str, name: &str) -> Vec<String> {
    let mut candidates = Vec::new();

    let deployments: Api<Deployment> = Api::namespaced(client.clone(), namespace);
    if let Ok(list) = deployments.list(&ListParams::default()).await {
        candidates.extend(list.items.into_iter().filter_map(|d| d.metadata.name));
    }

    let pods: Api<Pod> = Api::namespaced(client.clone(), namespace);
    if let Ok(list) = pods.list(&ListParams::default()).await {
        candidates.extend(list.items.into_iter().filter_map(|p| p.metadata.name));
    }

    fuzzy::suggestions(name, &candidates, 3)
}
