//! Pod usage metrics via the metrics.k8s.io aggregation API
//!
//! The metrics API is a custom resource served by metrics-server, so the
//! snapshot is fetched with a raw API request on the shared client. Usage
//! samples arrive with heterogeneous unit suffixes; they are normalized to
//! millicores and bytes before per-pod summing and sorting.

use crate::error::{KqError, Result};
use kube::Client;
use serde::{Deserialize, Serialize};

/// Report columns, in `kubectl top pods` order
const REPORT_HEADERS: [&str; 4] = ["NAMESPACE", "NAME", "CPU(m)", "MEMORY(bytes)"];

/// Per-pod usage totals
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsRow {
    pub namespace: String,
    pub name: String,
    pub cpu_millicores: u64,
    pub memory_bytes: u64,
}

/// A sorted usage report, heaviest CPU consumers first
#[derive(Debug, Clone, Serialize)]
pub struct MetricsReport {
    pub headers: Vec<String>,
    pub rows: Vec<MetricsRow>,
}

/// Fetch a metrics snapshot and produce the sorted report.
///
/// Any failure to reach the metrics API (absent metrics-server included)
/// comes back as `MetricsUnavailable`, which the dispatcher reports
/// in-band instead of aborting the request.
pub async fn top_pods(client: &Client, namespace: Option<&str>) -> Result<MetricsReport> {
    let path = match namespace {
        Some(ns) => format!("/apis/metrics.k8s.io/v1beta1/namespaces/{}/pods", ns),
        None => "/apis/metrics.k8s.io/v1beta1/pods".to_string(),
    };

    let request = http::Request::builder()
        .method("GET")
        .uri(&path)
        .body(Vec::new())
        .map_err(|e| KqError::MetricsUnavailable(e.to_string()))?;

    let list = client
        .request::<PodMetricsList>(request)
        .await
        .map_err(|e| KqError::MetricsUnavailable(e.to_string()))?;

    Ok(MetricsReport {
        headers: REPORT_HEADERS.iter().map(|h| h.to_string()).collect(),
        rows: aggregate(list.items),
    })
}

/// Sum container samples per pod and sort by CPU descending.
/// Stable sort, so equal-CPU pods keep their snapshot order.
fn aggregate(items: Vec<PodMetricsItem>) -> Vec<MetricsRow> {
    let mut rows: Vec<MetricsRow> = items
        .into_iter()
        .map(|item| {
            let cpu_millicores = item
                .containers
                .iter()
                .map(|c| normalize_cpu(&c.usage.cpu))
                .sum();
            let memory_bytes = item
                .containers
                .iter()
                .map(|c| normalize_memory(&c.usage.memory))
                .sum();

            MetricsRow {
                namespace: item.metadata.namespace,
                name: item.metadata.name,
                cpu_millicores,
                memory_bytes,
            }
        })
        .collect();

    rows.sort_by(|a, b| b.cpu_millicores.cmp(&a.cpu_millicores));
    rows
}

/// Normalize a CPU usage sample to millicores.
///
/// `m` is literal millicores, `n` is nanocores (floored at 1m so real usage
/// never reads as zero), a bare numeral is whole cores. A sample that does
/// not parse contributes zero rather than failing the report.
fn normalize_cpu(sample: &str) -> u64 {
    let sample = sample.trim();

    if let Some(v) = sample.strip_suffix('n') {
        v.parse::<u64>().map(|n| (n / 1_000_000).max(1)).unwrap_or(0)
    } else if let Some(v) = sample.strip_suffix('m') {
        v.parse::<u64>().unwrap_or(0)
    } else {
        sample
            .parse::<f64>()
            .map(|cores| (cores * 1000.0) as u64)
            .unwrap_or(0)
    }
}

/// Normalize a memory usage sample to bytes; unsuffixed values are taken
/// as a raw byte count, unparseable ones contribute zero.
fn normalize_memory(sample: &str) -> u64 {
    let sample = sample.trim();

    if let Some(v) = sample.strip_suffix("Ki") {
        v.parse::<u64>().map(|k| k * 1024).unwrap_or(0)
    } else if let Some(v) = sample.strip_suffix("Mi") {
        v.parse::<u64>().map(|m| m * 1024 * 1024).unwrap_or(0)
    } else if let Some(v) = sample.strip_suffix("Gi") {
        v.parse::<u64>().map(|g| g * 1024 * 1024 * 1024).unwrap_or(0)
    } else {
        sample.parse::<u64>().unwrap_or(0)
    }
}

// metrics.k8s.io/v1beta1 wire shapes (only the fields this report reads)

#[derive(Debug, Deserialize)]
struct PodMetricsList {
    #[serde(default)]
    items: Vec<PodMetricsItem>,
}

#[derive(Debug, Deserialize)]
struct PodMetricsItem {
    metadata: PodMetricsMetadata,
    #[serde(default)]
    containers: Vec<ContainerSample>,
}

#[derive(Debug, Deserialize)]
struct PodMetricsMetadata {
    #[serde(default)]
    name: String,
    #[serde(default)]
    namespace: String,
}

#[derive(Debug, Deserialize)]
struct ContainerSample {
    usage: UsageSample,
}

#[derive(Debug, Deserialize, Default)]
struct UsageSample {
    #[serde(default)]
    cpu: String,
    #[serde(default)]
    memory: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(ns: &str, name: &str, samples: &[(&str, &str)]) -> PodMetricsItem {
        PodMetricsItem {
            metadata: PodMetricsMetadata {
                name: name.to_string(),
                namespace: ns.to_string(),
            },
            containers: samples
                .iter()
                .map(|(cpu, memory)| ContainerSample {
                    usage: UsageSample {
                        cpu: cpu.to_string(),
                        memory: memory.to_string(),
                    },
                })
                .collect(),
        }
    }

    #[test]
    fn test_normalize_cpu() {
        assert_eq!(normalize_cpu("5m"), 5);
        assert_eq!(normalize_cpu("2000000n"), 2);
        assert_eq!(normalize_cpu("1"), 1000);
        assert_eq!(normalize_cpu("0.5"), 500);
    }

    #[test]
    fn test_nanocores_floor_at_one_millicore() {
        assert_eq!(normalize_cpu("500000n"), 1);
    }

    #[test]
    fn test_normalize_cpu_malformed_is_zero() {
        assert_eq!(normalize_cpu("banana"), 0);
        assert_eq!(normalize_cpu("12x"), 0);
    }

    #[test]
    fn test_normalize_memory() {
        assert_eq!(normalize_memory("1Ki"), 1024);
        assert_eq!(normalize_memory("1Mi"), 1_048_576);
        assert_eq!(normalize_memory("1Gi"), 1_073_741_824);
        assert_eq!(normalize_memory("4096"), 4096);
        assert_eq!(normalize_memory("1Tb"), 0);
    }

    #[test]
    fn test_aggregate_sums_containers() {
        let rows = aggregate(vec![item(
            "default",
            "web",
            &[("5m", "1Mi"), ("1", "1Ki")],
        )]);
        assert_eq!(rows[0].cpu_millicores, 1005);
        assert_eq!(rows[0].memory_bytes, 1_048_576 + 1024);
    }

    #[test]
    fn test_aggregate_sorts_by_cpu_descending() {
        let rows = aggregate(vec![
            item("default", "low", &[("5m", "1Mi")]),
            item("default", "high", &[("50m", "1Mi")]),
            item("default", "mid", &[("20m", "1Mi")]),
        ]);
        let order: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(order, vec!["high", "mid", "low"]);
    }

    #[test]
    fn test_malformed_sample_degrades_not_fails() {
        let rows = aggregate(vec![item("default", "web", &[("oops", "oops"), ("5m", "1Ki")])]);
        assert_eq!(rows[0].cpu_millicores, 5);
        assert_eq!(rows[0].memory_bytes, 1024);
    }
}
