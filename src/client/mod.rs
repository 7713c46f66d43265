//! Kubernetes client abstraction

use crate::error::{KqError, Result};
use kube::{config::KubeConfigOptions, Client, Config};
use tracing::debug;

/// Create a Kubernetes client.
///
/// Prefers the local kubeconfig (honoring an explicit context); when no
/// kubeconfig can be loaded, falls back to the in-cluster service account
/// so the same binary works from an operator's laptop or inside a pod.
pub async fn create_client(context: Option<&str>) -> Result<Client> {
    let config = load_config(context).await?;
    Client::try_from(config).map_err(KqError::from)
}

async fn load_config(context: Option<&str>) -> Result<Config> {
    let options = KubeConfigOptions {
        context: context.map(String::from),
        ..Default::default()
    };

    match Config::from_kubeconfig(&options).await {
        Ok(config) => Ok(config),
        Err(kubeconfig_err) => {
            debug!(error = %kubeconfig_err, "kubeconfig unavailable, trying in-cluster config");
            Config::incluster().map_err(|e| {
                KqError::Config(format!(
                    "Failed to load kubeconfig ({kubeconfig_err}) or in-cluster config ({e})"
                ))
            })
        }
    }
}
