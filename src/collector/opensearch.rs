use async_trait::async_trait;

use super::gateway::{MetricsGateway, Stat};
use super::{CollectionError, Collector, DiscoveryError};
use crate::config::Config;
use crate::types::{Namespace, Snapshot};

/// Collects search cluster health and latency metrics.
pub struct OpensearchCollector {
    gateway: MetricsGateway,
    domains: Vec<String>,
    lookback_hours: u32,
}

impl OpensearchCollector {
    pub fn new(config: &Config, gateway: MetricsGateway) -> Self {
        Self {
            gateway,
            domains: config.collector.opensearch.domains.clone(),
            lookback_hours: config.collection.lookback_hours,
        }
    }
}

#[async_trait]
impl Collector for OpensearchCollector {
    fn namespace(&self) -> Namespace {
        Namespace::Opensearch
    }

    async fn discover(&self) -> Result<Vec<String>, DiscoveryError> {
        if self.domains.iter().any(|n| n == "*") {
            Ok(self.gateway.list_resources("opensearch").await?)
        } else {
            Ok(self.domains.clone())
        }
    }

    async fn collect(&self, resource_id: &str) -> Result<Snapshot, CollectionError> {
        let hours = self.lookback_hours;

        let cpu = self
            .gateway
            .metric("opensearch", resource_id, "CPUUtilization", Stat::Average, hours)
            .await?;
        let free_storage = self
            .gateway
            .metric("opensearch", resource_id, "FreeStorageSpace", Stat::Average, hours)
            .await?;
        let status_red = self
            .gateway
            .metric("opensearch", resource_id, "ClusterStatus.red", Stat::Maximum, hours)
            .await?;
        let status_yellow = self
            .gateway
            .metric("opensearch", resource_id, "ClusterStatus.yellow", Stat::Maximum, hours)
            .await?;
        // Search latency is reported in seconds, indexing latency in ms
        let search_latency_secs = self
            .gateway
            .metric("opensearch", resource_id, "SearchLatency", Stat::Average, hours)
            .await?;
        let cache_hits = self
            .gateway
            .metric("opensearch", resource_id, "QueryCacheHitCount", Stat::Sum, hours)
            .await?;
        let cache_misses = self
            .gateway
            .metric("opensearch", resource_id, "QueryCacheMissCount", Stat::Sum, hours)
            .await?;

        let total_queries = cache_hits + cache_misses;
        let cache_hit_rate = if total_queries > 0.0 {
            (cache_hits / total_queries) * 100.0
        } else {
            0.0
        };

        let mut snapshot = Snapshot::new(Namespace::Opensearch, resource_id);
        snapshot.metrics.insert("cpu_utilization".into(), cpu);
        snapshot
            .metrics
            .insert("free_storage_mb".into(), free_storage);
        snapshot
            .metrics
            .insert("cluster_status_red".into(), status_red);
        snapshot
            .metrics
            .insert("cluster_status_yellow".into(), status_yellow);
        snapshot.metrics.insert(
            "search_latency_ms".into(),
            (search_latency_secs * 1000.0 * 100.0).round() / 100.0,
        );
        snapshot.metrics.insert(
            "query_cache_hit_rate".into(),
            (cache_hit_rate * 100.0).round() / 100.0,
        );

        Ok(snapshot)
    }
}
