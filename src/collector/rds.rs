use async_trait::async_trait;

use super::gateway::{MetricsGateway, Stat};
use super::{CollectionError, Collector, DiscoveryError};
use crate::config::Config;
use crate::types::{Namespace, Snapshot};

/// Collects relational database utilisation metrics.
pub struct RdsCollector {
    gateway: MetricsGateway,
    instances: Vec<String>,
    lookback_hours: u32,
    history_days: u32,
}

impl RdsCollector {
    pub fn new(config: &Config, gateway: MetricsGateway) -> Self {
        Self {
            gateway,
            instances: config.collector.rds.instances.clone(),
            lookback_hours: config.collection.lookback_hours,
            history_days: config.temporal.lookback_days,
        }
    }
}

#[async_trait]
impl Collector for RdsCollector {
    fn namespace(&self) -> Namespace {
        Namespace::Rds
    }

    async fn discover(&self) -> Result<Vec<String>, DiscoveryError> {
        if self.instances.iter().any(|n| n == "*") {
            Ok(self.gateway.list_resources("rds").await?)
        } else {
            Ok(self.instances.clone())
        }
    }

    async fn collect(&self, resource_id: &str) -> Result<Snapshot, CollectionError> {
        let hours = self.lookback_hours;

        let cpu = self
            .gateway
            .metric("rds", resource_id, "CPUUtilization", Stat::Average, hours)
            .await?;
        let freeable_memory = self
            .gateway
            .metric("rds", resource_id, "FreeableMemory", Stat::Average, hours)
            .await?;
        let connections = self
            .gateway
            .metric("rds", resource_id, "DatabaseConnections", Stat::Average, hours)
            .await?;

        let cpu_history = self
            .gateway
            .metric_history("rds", resource_id, "CPUUtilization", self.history_days)
            .await?;

        let mut snapshot = Snapshot::new(Namespace::Rds, resource_id);
        snapshot.metrics.insert("cpu_utilization".into(), cpu);
        snapshot
            .metrics
            .insert("freeable_memory".into(), freeable_memory);
        snapshot.metrics.insert("db_connections".into(), connections);
        snapshot
            .history
            .insert("cpu_utilization".into(), cpu_history);

        Ok(snapshot)
    }
}
