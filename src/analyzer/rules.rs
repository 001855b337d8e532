//! Static threshold rules.
//!
//! Each category has a fixed, ordered list of checks against a snapshot's
//! current values. The first matching check produces the snapshot's single
//! static finding; remaining checks are not evaluated. Strength and
//! confidence are fixed per rule, not computed.

use crate::types::{Finding, FindingType, Namespace, Snapshot, Strength};

/// Evaluate one snapshot against its category's rules.
///
/// Categories without registered rules (currently WAF) return `None`.
pub fn evaluate(snapshot: &Snapshot) -> Option<Finding> {
    match snapshot.namespace {
        Namespace::Ecs => ecs_rules(snapshot),
        Namespace::Alb => alb_rules(snapshot),
        Namespace::Rds => rds_rules(snapshot),
        Namespace::Opensearch => opensearch_rules(snapshot),
        Namespace::Elasticache => elasticache_rules(snapshot),
        Namespace::Waf => None,
        Namespace::Cloudformation => cloudformation_rules(snapshot),
    }
}

/// Evaluate a whole snapshot list, preserving snapshot order.
pub fn run(snapshots: &[Snapshot]) -> Vec<Finding> {
    snapshots.iter().filter_map(evaluate).collect()
}

#[allow(clippy::too_many_arguments)]
fn finding(
    snapshot: &Snapshot,
    issue: &str,
    metric: &str,
    value: String,
    threshold: &str,
    strength: Strength,
    confidence: f64,
    explanation: String,
) -> Finding {
    Finding {
        finding_type: FindingType::Static,
        namespace: snapshot.namespace,
        resource_id: snapshot.resource_id.clone(),
        issue: issue.to_string(),
        metric: metric.to_string(),
        value,
        threshold: threshold.to_string(),
        strength,
        confidence,
        explanation,
        data_quality_notice: String::new(),
    }
}

/// Short display name for a load balancer: ARNs carry the human-readable
/// name as the second-to-last path segment.
fn alb_short_name(resource_id: &str) -> &str {
    let segments: Vec<&str> = resource_id.split('/').collect();
    if segments.len() >= 2 {
        segments[segments.len() - 2]
    } else {
        resource_id
    }
}

fn alb_rules(snapshot: &Snapshot) -> Option<Finding> {
    let short_name = alb_short_name(&snapshot.resource_id);

    let http_5xx = snapshot.metric_or("http_5xx_errors", 0.0);
    if http_5xx > 20.0 {
        return Some(finding(
            snapshot,
            "High 5xx Error Count",
            "HTTP 5xx Errors",
            format!("{:.0}", http_5xx),
            "> 20",
            Strength::High,
            0.90,
            format!(
                "Load balancer '{}' returned {:.0} HTTP 5xx errors in the lookback window (threshold: 20).",
                short_name, http_5xx
            ),
        ));
    }

    let latency_ms = snapshot.metric_or("avg_latency_ms", 0.0);
    if latency_ms > 100.0 {
        return Some(finding(
            snapshot,
            "High Target Response Time",
            "Avg Latency (ms)",
            format!("{:.2}", latency_ms),
            "> 100ms",
            Strength::Moderate,
            0.80,
            format!(
                "Load balancer '{}' averaged {:.2} ms target response time in the lookback window (threshold: 100 ms).",
                short_name, latency_ms
            ),
        ));
    }

    None
}

fn rds_rules(snapshot: &Snapshot) -> Option<Finding> {
    let cpu = snapshot.metric_or("cpu_utilization", 0.0);
    let is_read_replica = snapshot.resource_id.contains("read");

    if !is_read_replica && cpu > 75.0 {
        return Some(finding(
            snapshot,
            "High CPU Utilization on Primary DB",
            "CPU Utilization (%)",
            format!("{:.2}", cpu),
            "> 75%",
            Strength::High,
            0.90,
            format!(
                "Primary database '{}' is running at {:.2}% CPU (threshold: 75%).",
                snapshot.resource_id, cpu
            ),
        ));
    }

    // Elevated CPU on a read replica usually points at inefficient queries
    if is_read_replica && cpu > 20.0 {
        return Some(finding(
            snapshot,
            "Elevated CPU on Read Replica",
            "CPU Utilization (%)",
            format!("{:.2}", cpu),
            "> 20%",
            Strength::Moderate,
            0.75,
            format!(
                "Read replica '{}' is running at {:.2}% CPU (threshold: 20%).",
                snapshot.resource_id, cpu
            ),
        ));
    }

    None
}

fn elasticache_rules(snapshot: &Snapshot) -> Option<Finding> {
    // Hit-rate check only applies to redis clusters
    let hit_rate = snapshot.metric_or("cache_hit_rate", 100.0);
    if hit_rate < 80.0 && snapshot.resource_id.contains("redis") {
        return Some(finding(
            snapshot,
            "Low Cache Hit Rate",
            "Cache Hit Rate (%)",
            format!("{:.2}", hit_rate),
            "< 80%",
            Strength::Moderate,
            0.80,
            format!(
                "Cache cluster '{}' served only {:.2}% of reads from cache (threshold: 80%).",
                snapshot.resource_id, hit_rate
            ),
        ));
    }

    let evictions = snapshot.metric_or("evictions", 0.0);
    if evictions > 1000.0 {
        return Some(finding(
            snapshot,
            "High Eviction Count",
            "Evictions (Count)",
            format!("{:.0}", evictions),
            "> 1000",
            Strength::Moderate,
            0.75,
            format!(
                "Cache cluster '{}' evicted {:.0} keys in the lookback window (threshold: 1000).",
                snapshot.resource_id, evictions
            ),
        ));
    }

    None
}

fn ecs_rules(snapshot: &Snapshot) -> Option<Finding> {
    // Check each service rather than cluster totals: an overprovisioned
    // service (normal during a deployment) must not mask a starved sibling.
    // The first underprovisioned service produces the cluster's finding.
    for (key, running) in &snapshot.metrics {
        let Some(service) = key.strip_prefix("service_running:") else {
            continue;
        };
        let desired = snapshot.metric_or(&format!("service_desired:{}", service), 0.0);
        if *running < desired {
            let mut underprovisioned = finding(
                snapshot,
                "Service Underprovisioned",
                "Running Tasks vs. Desired",
                format!("{:.0}/{:.0}", running, desired),
                "Running < Desired",
                Strength::High,
                0.90,
                format!(
                    "Service '{}' in cluster '{}' is running {:.0} of {:.0} desired tasks.",
                    service, snapshot.resource_id, running, desired
                ),
            );
            underprovisioned.resource_id = format!("{}/{}", snapshot.resource_id, service);
            return Some(underprovisioned);
        }
    }

    None
}

fn opensearch_rules(snapshot: &Snapshot) -> Option<Finding> {
    // Red before yellow: a red cluster must win when both counters are set
    if snapshot.metric_or("cluster_status_red", 0.0) > 0.0 {
        return Some(finding(
            snapshot,
            "Cluster in Red State",
            "Cluster Status",
            "Red".to_string(),
            "Not Green",
            Strength::High,
            0.95,
            format!(
                "Search domain '{}' reported a red cluster status during the lookback window.",
                snapshot.resource_id
            ),
        ));
    }

    if snapshot.metric_or("cluster_status_yellow", 0.0) > 0.0 {
        return Some(finding(
            snapshot,
            "Cluster in Yellow State",
            "Cluster Status",
            "Yellow".to_string(),
            "Not Green",
            Strength::Moderate,
            0.80,
            format!(
                "Search domain '{}' reported a yellow cluster status during the lookback window.",
                snapshot.resource_id
            ),
        ));
    }

    None
}

const FAILED_STACK_STATES: [&str; 3] = [
    "CREATE_FAILED",
    "ROLLBACK_COMPLETE",
    "UPDATE_ROLLBACK_COMPLETE",
];

fn cloudformation_rules(snapshot: &Snapshot) -> Option<Finding> {
    let status = snapshot.attribute("stack_status");
    if FAILED_STACK_STATES.contains(&status) {
        return Some(finding(
            snapshot,
            "Stack in Failed State",
            "Stack Status",
            status.to_string(),
            "not in CREATE_FAILED / ROLLBACK_COMPLETE / UPDATE_ROLLBACK_COMPLETE",
            Strength::High,
            0.90,
            format!(
                "Stack '{}' is in status {}, which indicates a failed deployment.",
                snapshot.resource_id, status
            ),
        ));
    }

    None
}
