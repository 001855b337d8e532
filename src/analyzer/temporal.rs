//! Temporal trend detection against a historical baseline.
//!
//! Each category tracks a fixed set of metrics with a known bad direction.
//! A metric with at least three historical samples is compared against the
//! sample mean and standard deviation of its history; deviations past the
//! configured z-score threshold in the bad direction become findings. A
//! constant history with a different current value is a step change and is
//! handled without a z-score, since the variance is zero.

use crate::config::TemporalConfig;
use crate::types::{Finding, FindingType, Namespace, Snapshot, Strength};

/// Minimum history length before a baseline is considered meaningful.
const MIN_SAMPLES: usize = 3;

/// A metric the temporal analyzer watches for one category.
struct TrackedMetric {
    /// Key into `Snapshot::metrics` / `Snapshot::history`.
    key: &'static str,
    /// Human-readable label used in findings.
    label: &'static str,
    higher_is_worse: bool,
}

fn tracked_metrics(namespace: Namespace) -> &'static [TrackedMetric] {
    match namespace {
        Namespace::Alb => &[TrackedMetric {
            key: "http_5xx_errors",
            label: "ALB 5xx Errors",
            higher_is_worse: true,
        }],
        Namespace::Rds => &[TrackedMetric {
            key: "cpu_utilization",
            label: "RDS CPU Utilization",
            higher_is_worse: true,
        }],
        Namespace::Elasticache => &[
            TrackedMetric {
                key: "cpu_utilization",
                label: "ElastiCache CPU Utilization",
                higher_is_worse: true,
            },
            TrackedMetric {
                key: "cache_hit_rate",
                label: "ElastiCache Cache Hit Rate",
                higher_is_worse: false,
            },
        ],
        _ => &[],
    }
}

/// Sample mean and sample (n-1) standard deviation. Callers guarantee at
/// least two values.
fn baseline(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    (mean, variance.sqrt())
}

/// Render a lookback window in human units.
fn format_window(seconds: f64) -> String {
    if seconds < 3600.0 {
        format!("{:.1} minutes", seconds / 60.0)
    } else {
        format!("{:.1} hours", seconds / 3600.0)
    }
}

struct Trend {
    strength: Strength,
    confidence: f64,
    explanation: String,
    baseline_desc: String,
    quality_notice: String,
}

#[allow(clippy::too_many_arguments)]
fn analyze_trend(
    label: &str,
    current: f64,
    history: &[f64],
    window: &str,
    expected_samples: usize,
    threshold_std_dev: f64,
    higher_is_worse: bool,
) -> Option<Trend> {
    if history.len() < MIN_SAMPLES {
        return None;
    }

    let quality_notice = if expected_samples > 0 && history.len() < expected_samples {
        format!(
            "(Note: Analysis based on {}/{} runs; some data may be missing.)",
            history.len(),
            expected_samples
        )
    } else {
        String::new()
    };

    let (mean, stdev) = baseline(history);

    if stdev == 0.0 {
        // Z-score is undefined for a constant history; any departure from
        // the constant is reported as a step change.
        if current != mean {
            return Some(Trend {
                strength: Strength::High,
                confidence: 0.95,
                explanation: format!(
                    "The metric '{}' changed from a stable value of {:.2} to {:.2} over {}.",
                    label, mean, current, window
                ),
                baseline_desc: format!("stable at {:.2}", mean),
                quality_notice,
            });
        }
        return None;
    }

    let z_score = (current - mean) / stdev;
    let is_bad_trend =
        (z_score > 0.0 && higher_is_worse) || (z_score < 0.0 && !higher_is_worse);

    if z_score.abs() >= threshold_std_dev && is_bad_trend {
        let change_direction = if z_score > 0.0 { "increased" } else { "decreased" };
        let strength = if z_score.abs() >= threshold_std_dev + 1.0 {
            Strength::High
        } else {
            Strength::Moderate
        };
        let confidence = (0.9 + (z_score.abs() - threshold_std_dev) * 0.1).min(0.99);
        return Some(Trend {
            strength,
            confidence,
            explanation: format!(
                "The metric '{}' {} significantly to {:.2} over {}, which is {:.1} standard \
                 deviations from the historical average of {:.2}.",
                label,
                change_direction,
                current,
                window,
                z_score.abs(),
                mean
            ),
            baseline_desc: format!(
                ">= {:.1} std dev from mean {:.2}",
                threshold_std_dev, mean
            ),
            quality_notice,
        });
    }

    None
}

/// Evaluate one snapshot's tracked metrics against their baselines.
///
/// Pure function of the snapshot and config; zero or more findings, at most
/// one per tracked metric.
pub fn evaluate(snapshot: &Snapshot, config: &TemporalConfig) -> Vec<Finding> {
    let window = format_window(config.lookback_days as f64 * 86_400.0);
    let expected_samples = config.lookback_days as usize;
    let mut findings = Vec::new();

    for tracked in tracked_metrics(snapshot.namespace) {
        let current = snapshot.metric_or(tracked.key, 0.0);
        let history = snapshot.history(tracked.key);

        if let Some(trend) = analyze_trend(
            tracked.label,
            current,
            history,
            &window,
            expected_samples,
            config.threshold_std_dev,
            tracked.higher_is_worse,
        ) {
            findings.push(Finding {
                finding_type: FindingType::Temporal,
                namespace: snapshot.namespace,
                resource_id: snapshot.resource_id.clone(),
                issue: format!("{} Trend Deviation", tracked.label),
                metric: tracked.label.to_string(),
                value: format!("{:.2}", current),
                threshold: trend.baseline_desc,
                strength: trend.strength,
                confidence: trend.confidence,
                explanation: trend.explanation,
                data_quality_notice: trend.quality_notice,
            });
        }
    }

    findings
}

/// Evaluate a whole snapshot list, preserving snapshot order.
pub fn run(snapshots: &[Snapshot], config: &TemporalConfig) -> Vec<Finding> {
    snapshots
        .iter()
        .flat_map(|s| evaluate(s, config))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> TemporalConfig {
        TemporalConfig {
            lookback_days: 14,
            threshold_std_dev: 2.0,
        }
    }

    fn rds_snapshot(current: f64, history: Vec<f64>) -> Snapshot {
        let mut snap = Snapshot::new(Namespace::Rds, "orders-db");
        snap.metrics.insert("cpu_utilization".into(), current);
        snap.history.insert("cpu_utilization".into(), history);
        snap
    }

    #[test]
    fn insufficient_history_yields_no_finding() {
        let snap = rds_snapshot(99.0, vec![10.0, 10.0]);
        assert!(evaluate(&snap, &config()).is_empty());

        let snap = rds_snapshot(99.0, vec![]);
        assert!(evaluate(&snap, &config()).is_empty());
    }

    #[test]
    fn zero_variance_step_change_is_high_strength() {
        let snap = rds_snapshot(75.0, vec![50.0, 50.0, 50.0]);
        let findings = evaluate(&snap, &config());
        assert_eq!(findings.len(), 1);

        let f = &findings[0];
        assert_eq!(f.strength, Strength::High);
        assert_eq!(f.confidence, 0.95);
        assert!(f.explanation.contains("stable value of 50.00"));
        assert!(f.explanation.contains("75.00"));
    }

    #[test]
    fn zero_variance_without_change_is_quiet() {
        let snap = rds_snapshot(50.0, vec![50.0, 50.0, 50.0]);
        assert!(evaluate(&snap, &config()).is_empty());
    }

    #[test]
    fn large_deviation_caps_confidence() {
        // mean 10, sample stdev ~0.71; z ~= 7.1
        let snap = rds_snapshot(15.0, vec![10.0, 10.0, 11.0, 9.0, 10.0]);
        let findings = evaluate(&snap, &config());
        assert_eq!(findings.len(), 1);

        let f = &findings[0];
        assert_eq!(f.strength, Strength::High);
        assert_eq!(f.confidence, 0.99);
        assert!(f.explanation.contains("increased"));
        assert!(f.explanation.contains("historical average of 10.00"));
    }

    #[test]
    fn moderate_strength_below_threshold_plus_one() {
        // mean 10, stdev 1.0 over [9,10,11,10,10]: deviations 1,0,1,0,0 ->
        // variance 2/4 = 0.5, stdev ~0.71. Pick current for z between 2 and 3.
        let snap = rds_snapshot(11.8, vec![9.0, 10.0, 11.0, 10.0, 10.0]);
        let findings = evaluate(&snap, &config());
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].strength, Strength::Moderate);
        assert!(findings[0].confidence < 0.99);
    }

    #[test]
    fn improvement_in_good_direction_is_not_flagged() {
        // CPU dropping far below the baseline is not a bad trend.
        let snap = rds_snapshot(1.0, vec![50.0, 52.0, 48.0, 51.0]);
        assert!(evaluate(&snap, &config()).is_empty());
    }

    #[test]
    fn lower_is_worse_metric_flags_drops() {
        let mut snap = Snapshot::new(Namespace::Elasticache, "sessions-redis-001");
        snap.metrics.insert("cache_hit_rate".into(), 40.0);
        snap.history
            .insert("cache_hit_rate".into(), vec![95.0, 94.0, 96.0, 95.0]);

        let findings = evaluate(&snap, &config());
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].metric, "ElastiCache Cache Hit Rate");
        assert!(findings[0].explanation.contains("decreased"));

        // A rate climbing above its baseline is an improvement.
        let mut improving = Snapshot::new(Namespace::Elasticache, "sessions-redis-001");
        improving.metrics.insert("cache_hit_rate".into(), 99.9);
        improving
            .history
            .insert("cache_hit_rate".into(), vec![80.0, 81.0, 79.0, 80.0]);
        let findings = evaluate(&improving, &config());
        assert!(findings.is_empty());
    }

    #[test]
    fn quality_notice_reports_missing_samples() {
        let snap = rds_snapshot(75.0, vec![50.0, 50.0, 50.0]);
        let findings = evaluate(&snap, &config());
        assert_eq!(
            findings[0].data_quality_notice,
            "(Note: Analysis based on 3/14 runs; some data may be missing.)"
        );

        // Full history: no notice.
        let full: Vec<f64> = (0..14).map(|_| 50.0).collect();
        let snap = rds_snapshot(75.0, full);
        let findings = evaluate(&snap, &config());
        assert!(findings[0].data_quality_notice.is_empty());
    }

    #[test]
    fn evaluate_is_idempotent() {
        let snap = rds_snapshot(15.0, vec![10.0, 10.0, 11.0, 9.0, 10.0]);
        let first = evaluate(&snap, &config());
        let second = evaluate(&snap, &config());

        assert_eq!(first.len(), second.len());
        assert_eq!(first[0].explanation, second[0].explanation);
        assert_eq!(first[0].confidence, second[0].confidence);
    }

    #[test]
    fn untracked_namespaces_are_skipped() {
        let mut snap = Snapshot::new(Namespace::Waf, "edge-acl");
        snap.metrics.insert("blocked_requests".into(), 9999.0);
        snap.history
            .insert("blocked_requests".into(), vec![1.0, 1.0, 1.0]);
        assert!(evaluate(&snap, &config()).is_empty());
    }

    #[test]
    fn window_formats_in_human_units() {
        assert_eq!(format_window(14.0 * 86_400.0), "336.0 hours");
        assert_eq!(format_window(1800.0), "30.0 minutes");
    }
}
