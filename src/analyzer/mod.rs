pub mod rules;
pub mod temporal;

use crate::config::TemporalConfig;
use crate::types::{Finding, Snapshot};

/// Merge the two analysis stages into one ordered findings list.
///
/// Pure concatenation: static findings first, temporal second, each stage's
/// internal order preserved. No deduplication; a static and a temporal
/// finding about the same resource are both reported.
pub fn aggregate(static_findings: Vec<Finding>, temporal_findings: Vec<Finding>) -> Vec<Finding> {
    let mut findings = static_findings;
    findings.extend(temporal_findings);
    findings
}

/// Run both analysis stages over a snapshot list.
pub fn run_analysis(snapshots: &[Snapshot], config: &TemporalConfig) -> Vec<Finding> {
    let static_findings = rules::run(snapshots);
    let temporal_findings = temporal::run(snapshots, config);

    tracing::info!(
        static_count = static_findings.len(),
        temporal_count = temporal_findings.len(),
        "Analysis pass complete"
    );

    aggregate(static_findings, temporal_findings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FindingType, Namespace, Strength};

    fn finding(finding_type: FindingType, resource_id: &str) -> Finding {
        Finding {
            finding_type,
            namespace: Namespace::Alb,
            resource_id: resource_id.to_string(),
            issue: "test".into(),
            metric: "test".into(),
            value: "1".into(),
            threshold: "> 0".into(),
            strength: Strength::Low,
            confidence: 0.5,
            explanation: String::new(),
            data_quality_notice: String::new(),
        }
    }

    #[test]
    fn aggregate_preserves_stage_order() {
        let a = finding(FindingType::Static, "a");
        let b = finding(FindingType::Static, "b");
        let c = finding(FindingType::Temporal, "c");

        let merged = aggregate(vec![a, b], vec![c]);
        let ids: Vec<&str> = merged.iter().map(|f| f.resource_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn aggregate_of_nothing_is_empty() {
        assert!(aggregate(Vec::new(), Vec::new()).is_empty());
    }

    #[test]
    fn run_analysis_reports_static_and_temporal_for_same_resource() {
        // Breaches the 5xx threshold *and* deviates from its baseline; both
        // findings must survive aggregation.
        let mut snap = Snapshot::new(Namespace::Alb, "lb-1");
        snap.metrics.insert("http_5xx_errors".into(), 500.0);
        snap.history
            .insert("http_5xx_errors".into(), vec![5.0, 6.0, 4.0, 5.0]);

        let config = TemporalConfig {
            lookback_days: 14,
            threshold_std_dev: 2.0,
        };
        let findings = run_analysis(&[snap], &config);

        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].finding_type, FindingType::Static);
        assert_eq!(findings[1].finding_type, FindingType::Temporal);
        assert_eq!(findings[0].resource_id, findings[1].resource_id);
    }
}
