use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::RunReport;
use crate::types::{Finding, Namespace, Snapshot};

/// Message used when a run surfaced no findings at all. Written instead of
/// an empty findings section; an empty list is never handed to a summarizer.
pub const NO_ISSUES_MESSAGE: &str =
    "No significant issues were detected in the environment based on the current rules.";

/// Render the run payload as `latest.md` in the reports directory.
pub fn write(report: &RunReport, reports_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(reports_dir)
        .with_context(|| format!("Failed to create reports dir {}", reports_dir.display()))?;

    let content = render(report);
    let path = reports_dir.join("latest.md");
    fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;

    Ok(path)
}

fn render(report: &RunReport) -> String {
    let mut lines = vec![
        "# Cloud Diagnostics Report".to_string(),
        format!(
            "_Run generated {} UTC_",
            report.finished.format("%Y-%m-%d %H:%M:%S")
        ),
        String::new(),
        "## Findings".to_string(),
    ];

    if report.findings.is_empty() {
        lines.push(NO_ISSUES_MESSAGE.to_string());
    } else {
        for finding in &report.findings {
            lines.push(render_finding(finding));
        }
    }

    for namespace in Namespace::REPORT_ORDER {
        let mut items: Vec<&Snapshot> = report
            .results
            .iter()
            .filter(|s| s.namespace == namespace)
            .collect();
        if items.is_empty() {
            continue;
        }
        items.sort_by(|a, b| a.resource_id.cmp(&b.resource_id));

        lines.push(String::new());
        lines.push("---".to_string());
        lines.push(format!("## {}", namespace.title()));
        for snapshot in items {
            lines.push(format!("### {}", snapshot.resource_id));
            lines.extend(render_snapshot(snapshot));
        }
    }

    lines.join("\n")
}

fn render_finding(finding: &Finding) -> String {
    // The explanation is pre-formatted by the analyzer; the quality notice
    // is appended verbatim whenever present.
    let mut line = format!(
        "- **{}** on `{}` ({}, confidence {:.2}): {}",
        finding.issue, finding.resource_id, finding.strength, finding.confidence,
        finding.explanation
    );
    if !finding.data_quality_notice.is_empty() {
        line.push(' ');
        line.push_str(&finding.data_quality_notice);
    }
    line
}

fn metric_line(snapshot: &Snapshot, label: &str, key: &str) -> String {
    format!("- *{}:* **{:.2}**", label, snapshot.metric_or(key, 0.0))
}

fn render_snapshot(snapshot: &Snapshot) -> Vec<String> {
    match snapshot.namespace {
        Namespace::Ecs => vec![
            metric_line(snapshot, "Services", "service_count"),
            format!(
                "- *Tasks running / desired:* **{:.0} / {:.0}**",
                snapshot.metric_or("running_tasks", 0.0),
                snapshot.metric_or("desired_tasks", 0.0)
            ),
            metric_line(snapshot, "CPU avg (%)", "cpu_avg"),
            metric_line(snapshot, "Mem avg (%)", "mem_avg"),
        ],
        Namespace::Alb => vec![
            metric_line(snapshot, "HTTP 5xx Errors", "http_5xx_errors"),
            metric_line(snapshot, "Request Count", "request_count"),
            metric_line(snapshot, "Avg Latency (ms)", "avg_latency_ms"),
        ],
        Namespace::Rds => vec![
            metric_line(snapshot, "CPU Utilization (%)", "cpu_utilization"),
            metric_line(snapshot, "Freeable Memory (MB)", "freeable_memory"),
            metric_line(snapshot, "DB Connections", "db_connections"),
        ],
        Namespace::Opensearch => vec![
            metric_line(snapshot, "CPU Utilization (%)", "cpu_utilization"),
            metric_line(snapshot, "Free Storage (MB)", "free_storage_mb"),
            format!(
                "- *Cluster Status (Red/Yellow):* **{:.0} / {:.0}**",
                snapshot.metric_or("cluster_status_red", 0.0),
                snapshot.metric_or("cluster_status_yellow", 0.0)
            ),
            metric_line(snapshot, "Search Latency (ms)", "search_latency_ms"),
            metric_line(snapshot, "Query Cache Hit Rate (%)", "query_cache_hit_rate"),
        ],
        Namespace::Elasticache => vec![
            metric_line(snapshot, "CPU Utilization (%)", "cpu_utilization"),
            format!(
                "- *Freeable Memory (MB):* **{:.2}**",
                snapshot.metric_or("freeable_memory", 0.0) / 1e6
            ),
            metric_line(snapshot, "Cache Hit Rate (%)", "cache_hit_rate"),
            metric_line(snapshot, "Evictions (Count)", "evictions"),
            metric_line(snapshot, "Replication Lag (s)", "replication_lag"),
        ],
        Namespace::Waf => vec![
            metric_line(snapshot, "Allowed Requests", "allowed_requests"),
            metric_line(snapshot, "Blocked Requests", "blocked_requests"),
        ],
        Namespace::Cloudformation => vec![
            format!("- *Status:* **{}**", snapshot.attribute("stack_status")),
            format!("- *Last Updated:* **{}**", snapshot.attribute("last_updated")),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FindingType, Strength};
    use chrono::Utc;

    fn empty_report() -> RunReport {
        RunReport {
            started: Utc::now(),
            finished: Utc::now(),
            results: vec![],
            findings: vec![],
        }
    }

    #[test]
    fn empty_run_renders_no_issues_message() {
        let content = render(&empty_report());
        assert!(content.contains(NO_ISSUES_MESSAGE));
    }

    #[test]
    fn quality_notice_is_appended_to_the_finding_line() {
        let mut report = empty_report();
        report.findings.push(Finding {
            finding_type: FindingType::Temporal,
            namespace: Namespace::Rds,
            resource_id: "db-1".into(),
            issue: "RDS CPU Utilization Trend Deviation".into(),
            metric: "RDS CPU Utilization".into(),
            value: "80.00".into(),
            threshold: ">= 2.0 std dev from mean 20.00".into(),
            strength: Strength::High,
            confidence: 0.95,
            explanation: "The metric 'RDS CPU Utilization' increased significantly.".into(),
            data_quality_notice:
                "(Note: Analysis based on 5/14 runs; some data may be missing.)".into(),
        });

        let content = render(&report);
        assert!(content.contains(
            "increased significantly. (Note: Analysis based on 5/14 runs; some data may be missing.)"
        ));
    }

    #[test]
    fn sections_are_sorted_and_ordered_by_namespace() {
        let mut report = empty_report();
        report.results.push(Snapshot::new(Namespace::Rds, "db-b"));
        report.results.push(Snapshot::new(Namespace::Rds, "db-a"));
        report.results.push(Snapshot::new(Namespace::Ecs, "cluster-1"));

        let content = render(&report);
        let ecs_pos = content.find("## ECS").unwrap();
        let rds_pos = content.find("## RDS").unwrap();
        assert!(ecs_pos < rds_pos);

        let a_pos = content.find("### db-a").unwrap();
        let b_pos = content.find("### db-b").unwrap();
        assert!(a_pos < b_pos);
    }

    #[test]
    fn write_produces_latest_md() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&empty_report(), dir.path()).unwrap();
        assert_eq!(path.file_name().unwrap(), "latest.md");
        assert!(path.exists());
    }
}
