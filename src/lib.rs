pub mod analyzer;
pub mod collector;
pub mod config;
pub mod orchestrator;
pub mod reporter;

/// Common types used across modules
pub mod types {
    use std::collections::BTreeMap;

    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Serialize};

    /// Resource categories the agent knows how to probe.
    ///
    /// Rule dispatch is a closed match on this enum; a category without
    /// registered rules is simply skipped by the analyzers.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum Namespace {
        Ecs,
        Alb,
        Rds,
        Opensearch,
        Elasticache,
        Waf,
        Cloudformation,
    }

    impl Namespace {
        /// Fixed presentation order for reports.
        pub const REPORT_ORDER: [Namespace; 7] = [
            Namespace::Ecs,
            Namespace::Alb,
            Namespace::Rds,
            Namespace::Opensearch,
            Namespace::Elasticache,
            Namespace::Waf,
            Namespace::Cloudformation,
        ];

        /// Section title used in reports.
        pub fn title(&self) -> &'static str {
            match self {
                Namespace::Ecs => "ECS",
                Namespace::Alb => "ALB",
                Namespace::Rds => "RDS",
                Namespace::Opensearch => "OpenSearch",
                Namespace::Elasticache => "ElastiCache",
                Namespace::Waf => "WAF",
                Namespace::Cloudformation => "CloudFormation",
            }
        }
    }

    impl std::fmt::Display for Namespace {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            let s = match self {
                Namespace::Ecs => "ecs",
                Namespace::Alb => "alb",
                Namespace::Rds => "rds",
                Namespace::Opensearch => "opensearch",
                Namespace::Elasticache => "elasticache",
                Namespace::Waf => "waf",
                Namespace::Cloudformation => "cloudformation",
            };
            write!(f, "{}", s)
        }
    }

    /// One resource's metric readout at collection time.
    ///
    /// Produced once per collection pass by a collector and immutable
    /// afterwards. `history` holds fixed-cadence series (oldest to newest)
    /// for the metrics the temporal analyzer tracks; `attributes` carries
    /// non-numeric facts such as a CloudFormation stack status.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct Snapshot {
        pub namespace: Namespace,
        pub resource_id: String,
        #[serde(default)]
        pub metrics: BTreeMap<String, f64>,
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        pub history: BTreeMap<String, Vec<f64>>,
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        pub attributes: BTreeMap<String, String>,
        pub collected_at: DateTime<Utc>,
    }

    impl Snapshot {
        pub fn new(namespace: Namespace, resource_id: impl Into<String>) -> Self {
            Self {
                namespace,
                resource_id: resource_id.into(),
                metrics: BTreeMap::new(),
                history: BTreeMap::new(),
                attributes: BTreeMap::new(),
                collected_at: Utc::now(),
            }
        }

        /// Current value of a metric, or `default` when the collector did
        /// not report it. Missing data must never abort analysis.
        pub fn metric_or(&self, name: &str, default: f64) -> f64 {
            self.metrics.get(name).copied().unwrap_or(default)
        }

        /// Historical series for a metric (empty slice when absent).
        pub fn history(&self, name: &str) -> &[f64] {
            self.history.get(name).map(Vec::as_slice).unwrap_or(&[])
        }

        /// Non-numeric attribute, or `""` when absent.
        pub fn attribute(&self, name: &str) -> &str {
            self.attributes.get(name).map(String::as_str).unwrap_or("")
        }
    }

    /// Which analysis stage produced a finding.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum FindingType {
        Static,
        Temporal,
    }

    /// How pronounced an anomaly is.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
    pub enum Strength {
        Low,
        Moderate,
        High,
    }

    impl std::fmt::Display for Strength {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Strength::Low => write!(f, "Low"),
                Strength::Moderate => write!(f, "Moderate"),
                Strength::High => write!(f, "High"),
            }
        }
    }

    /// A structured anomaly record, ready for human-readable rendering.
    ///
    /// `explanation` is pre-formatted for verbatim reuse by a report writer
    /// or summarizer. `data_quality_notice` is empty when not applicable;
    /// when present a formatter must append it, never drop it.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct Finding {
        pub finding_type: FindingType,
        pub namespace: Namespace,
        pub resource_id: String,
        pub issue: String,
        pub metric: String,
        pub value: String,
        pub threshold: String,
        pub strength: Strength,
        pub confidence: f64,
        pub explanation: String,
        #[serde(default)]
        pub data_quality_notice: String,
    }
}

#[cfg(test)]
mod tests {
    use super::types::*;

    #[test]
    fn metric_or_falls_back_to_default() {
        let mut snap = Snapshot::new(Namespace::Alb, "lb-1");
        snap.metrics.insert("request_count".into(), 42.0);

        assert_eq!(snap.metric_or("request_count", 0.0), 42.0);
        assert_eq!(snap.metric_or("http_5xx_errors", 0.0), 0.0);
        assert_eq!(snap.metric_or("cache_hit_rate", 100.0), 100.0);
    }

    #[test]
    fn history_is_empty_when_absent() {
        let mut snap = Snapshot::new(Namespace::Rds, "db-1");
        assert!(snap.history("cpu_utilization").is_empty());

        snap.history
            .insert("cpu_utilization".into(), vec![10.0, 11.0, 9.0]);
        assert_eq!(snap.history("cpu_utilization"), &[10.0, 11.0, 9.0]);
    }

    #[test]
    fn namespace_serializes_lowercase() {
        let json = serde_json::to_string(&Namespace::Cloudformation).unwrap();
        assert_eq!(json, "\"cloudformation\"");
        assert_eq!(Namespace::Opensearch.to_string(), "opensearch");
    }
}
