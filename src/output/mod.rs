//! Output formatting for kubequery

use crate::handler::{ActionResult, PodSummary, QueryResponse};
use crate::metrics::MetricsReport;
use crate::scaling::{ContainerOutcome, ScaleResult};
use owo_colors::OwoColorize;

/// Render a query response as a human-readable block
pub fn format_response(response: &QueryResponse) -> String {
    match &response.result {
        ActionResult::Pods(pods) => format_pods(pods),
        ActionResult::Report(report) => format_report(report),
        ActionResult::Scale(result) => format_scale(result),
        ActionResult::Error(payload) => format!("{} {}", "Error:".red().bold(), payload.message),
    }
}

/// Render a query response as pretty JSON (intent included)
pub fn format_json(response: &QueryResponse) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(response)
}

fn format_pods(pods: &[PodSummary]) -> String {
    if pods.is_empty() {
        return "No resources found".to_string();
    }

    let rows: Vec<Vec<String>> = pods
        .iter()
        .map(|p| {
            vec![
                p.namespace.clone(),
                p.name.clone(),
                colorize_phase(&p.phase),
            ]
        })
        .collect();

    format_table_raw(&["NAMESPACE", "NAME", "STATUS"], &rows)
}

fn format_report(report: &MetricsReport) -> String {
    if report.rows.is_empty() {
        return "No resources found".to_string();
    }

    let headers: Vec<&str> = report.headers.iter().map(String::as_str).collect();
    let rows: Vec<Vec<String>> = report
        .rows
        .iter()
        .map(|r| {
            vec![
                r.namespace.clone(),
                r.name.clone(),
                r.cpu_millicores.to_string(),
                r.memory_bytes.to_string(),
            ]
        })
        .collect();

    format_table_raw(&headers, &rows)
}

fn format_scale(result: &ScaleResult) -> String {
    let mut output = format!(
        "deployment.apps/{} in {}: resources scaled by {}%\n",
        result.deployment, result.namespace, result.scaled_by_percent
    );

    for container in &result.containers {
        output.push_str(&format_container_outcome(container));
        output.push('\n');
    }

    output.push_str(&result.status);
    output
}

fn format_container_outcome(outcome: &ContainerOutcome) -> String {
    if let Some(reason) = &outcome.skipped {
        return format!("  {}: {} ({})", outcome.name, "skipped".yellow(), reason);
    }

    let section = |label: &str, values: &Option<std::collections::BTreeMap<String, String>>| {
        values.as_ref().map(|map| {
            let pairs: Vec<String> = map.iter().map(|(k, v)| format!("{k}={v}")).collect();
            format!("{label} {}", pairs.join(" "))
        })
    };

    let parts: Vec<String> = [
        section("requests:", &outcome.requests),
        section("limits:", &outcome.limits),
    ]
    .into_iter()
    .flatten()
    .collect();

    format!("  {}: {}", outcome.name, parts.join("  "))
}

/// Format raw headers and rows as a table
pub fn format_table_raw(headers: &[&str], rows: &[Vec<String>]) -> String {
    // Calculate column widths
    let num_cols = headers.len();
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();

    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if i < num_cols {
                widths[i] = widths[i].max(strip_ansi_codes(cell).len());
            }
        }
    }

    let mut output = String::new();

    // Format header row
    let mut header_line = String::new();
    for (i, header) in headers.iter().enumerate() {
        let padding = widths[i].saturating_sub(header.len());
        header_line.push_str(header);
        header_line.push_str(&" ".repeat(padding + 2));
    }
    output.push_str(&header_line.trim_end().bold().to_string());
    output.push('\n');

    // Format data rows
    for row in rows {
        let mut line = String::new();
        for (i, cell) in row.iter().enumerate() {
            if i < num_cols {
                let stripped_len = strip_ansi_codes(cell).len();
                let padding = widths[i].saturating_sub(stripped_len);
                line.push_str(cell);
                line.push_str(&" ".repeat(padding + 2));
            }
        }
        output.push_str(line.trim_end());
        output.push('\n');
    }

    output.trim_end().to_string()
}

/// Strip ANSI escape codes for length calculation
fn strip_ansi_codes(s: &str) -> String {
    let mut result = String::new();
    let mut in_escape = false;

    for c in s.chars() {
        if c == '\x1b' {
            in_escape = true;
        } else if in_escape {
            if c == 'm' {
                in_escape = false;
            }
        } else {
            result.push(c);
        }
    }

    result
}

/// Colorize a pod phase for table output
fn colorize_phase(phase: &str) -> String {
    match phase {
        "Running" | "Succeeded" => phase.green().to_string(),
        "Pending" | "Unknown" => phase.yellow().to_string(),
        "Failed" => phase.red().to_string(),
        _ => phase.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_column_alignment() {
        let table = format_table_raw(
            &["NAME", "CPU(m)"],
            &[
                vec!["a-very-long-pod-name".to_string(), "5".to_string()],
                vec!["short".to_string(), "100".to_string()],
            ],
        );
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(strip_ansi_codes(lines[0]).starts_with("NAME"));
        assert!(lines[1].starts_with("a-very-long-pod-name"));
    }

    #[test]
    fn test_empty_pod_list() {
        assert_eq!(format_pods(&[]), "No resources found");
    }
}
