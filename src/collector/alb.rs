use async_trait::async_trait;

use super::gateway::{MetricsGateway, Stat};
use super::{CollectionError, Collector, DiscoveryError};
use crate::config::Config;
use crate::types::{Namespace, Snapshot};

/// Collects load balancer traffic and error metrics.
pub struct AlbCollector {
    gateway: MetricsGateway,
    names: Vec<String>,
    lookback_hours: u32,
    history_days: u32,
}

impl AlbCollector {
    pub fn new(config: &Config, gateway: MetricsGateway) -> Self {
        Self {
            gateway,
            names: config.collector.alb.names.clone(),
            lookback_hours: config.collection.lookback_hours,
            history_days: config.temporal.lookback_days,
        }
    }
}

#[async_trait]
impl Collector for AlbCollector {
    fn namespace(&self) -> Namespace {
        Namespace::Alb
    }

    async fn discover(&self) -> Result<Vec<String>, DiscoveryError> {
        if self.names.iter().any(|n| n == "*") {
            Ok(self.gateway.list_resources("alb").await?)
        } else {
            Ok(self.names.clone())
        }
    }

    async fn collect(&self, resource_id: &str) -> Result<Snapshot, CollectionError> {
        let hours = self.lookback_hours;

        let http_5xx = self
            .gateway
            .metric("alb", resource_id, "HTTPCode_Target_5XX_Count", Stat::Sum, hours)
            .await?;
        let request_count = self
            .gateway
            .metric("alb", resource_id, "RequestCount", Stat::Sum, hours)
            .await?;
        // Target response time comes back in seconds
        let latency_secs = self
            .gateway
            .metric("alb", resource_id, "TargetResponseTime", Stat::Average, hours)
            .await?;

        let http_5xx_history = self
            .gateway
            .metric_history("alb", resource_id, "HTTPCode_Target_5XX_Count", self.history_days)
            .await?;

        let mut snapshot = Snapshot::new(Namespace::Alb, resource_id);
        snapshot.metrics.insert("http_5xx_errors".into(), http_5xx);
        snapshot.metrics.insert("request_count".into(), request_count);
        snapshot
            .metrics
            .insert("avg_latency_ms".into(), (latency_secs * 1000.0 * 100.0).round() / 100.0);
        snapshot
            .history
            .insert("http_5xx_errors".into(), http_5xx_history);

        Ok(snapshot)
    }
}
