use async_trait::async_trait;
use tracing::debug;

use super::gateway::{MetricsGateway, Stat};
use super::{CollectionError, Collector, DiscoveryError};
use crate::config::Config;
use crate::types::{Namespace, Snapshot};

/// Collects cache cluster utilisation and effectiveness metrics.
pub struct ElasticacheCollector {
    gateway: MetricsGateway,
    clusters: Vec<String>,
    lookback_hours: u32,
    history_days: u32,
}

impl ElasticacheCollector {
    pub fn new(config: &Config, gateway: MetricsGateway) -> Self {
        Self {
            gateway,
            clusters: config.collector.elasticache.clusters.clone(),
            lookback_hours: config.collection.lookback_hours,
            history_days: config.temporal.lookback_days,
        }
    }
}

/// Hit rate in percent; 0 when the cache served no reads at all.
fn hit_rate(hits: f64, misses: f64) -> f64 {
    let total = hits + misses;
    if total > 0.0 {
        (hits / total) * 100.0
    } else {
        0.0
    }
}

#[async_trait]
impl Collector for ElasticacheCollector {
    fn namespace(&self) -> Namespace {
        Namespace::Elasticache
    }

    async fn discover(&self) -> Result<Vec<String>, DiscoveryError> {
        if self.clusters.iter().any(|n| n == "*") {
            Ok(self.gateway.list_resources("elasticache").await?)
        } else {
            Ok(self.clusters.clone())
        }
    }

    async fn collect(&self, resource_id: &str) -> Result<Snapshot, CollectionError> {
        let hours = self.lookback_hours;

        let cpu = self
            .gateway
            .metric("elasticache", resource_id, "CPUUtilization", Stat::Average, hours)
            .await?;
        let freeable_memory = self
            .gateway
            .metric("elasticache", resource_id, "FreeableMemory", Stat::Average, hours)
            .await?;
        let hits = self
            .gateway
            .metric("elasticache", resource_id, "CacheHits", Stat::Sum, hours)
            .await?;
        let misses = self
            .gateway
            .metric("elasticache", resource_id, "CacheMisses", Stat::Sum, hours)
            .await?;
        let evictions = self
            .gateway
            .metric("elasticache", resource_id, "Evictions", Stat::Sum, hours)
            .await?;
        // Memcached clusters have no replication metric; a miss here means
        // no lag to report, not a broken snapshot.
        let replication_lag = match self
            .gateway
            .metric("elasticache", resource_id, "ReplicationLag", Stat::Average, hours)
            .await
        {
            Ok(value) => value,
            Err(e) => {
                debug!(resource = resource_id, error = %e, "No replication lag reported, defaulting to 0");
                0.0
            }
        };

        let cpu_history = self
            .gateway
            .metric_history("elasticache", resource_id, "CPUUtilization", self.history_days)
            .await?;
        let hits_history = self
            .gateway
            .metric_history("elasticache", resource_id, "CacheHits", self.history_days)
            .await?;
        let misses_history = self
            .gateway
            .metric_history("elasticache", resource_id, "CacheMisses", self.history_days)
            .await?;

        // Derive a daily hit-rate series from the hits/misses series; the
        // two may have different lengths when datapoints are missing, so
        // pair them up from the oldest end.
        let hit_rate_history: Vec<f64> = hits_history
            .iter()
            .zip(misses_history.iter())
            .map(|(h, m)| hit_rate(*h, *m))
            .collect();

        let mut snapshot = Snapshot::new(Namespace::Elasticache, resource_id);
        snapshot.metrics.insert("cpu_utilization".into(), cpu);
        snapshot
            .metrics
            .insert("freeable_memory".into(), freeable_memory);
        snapshot
            .metrics
            .insert("cache_hit_rate".into(), (hit_rate(hits, misses) * 100.0).round() / 100.0);
        snapshot.metrics.insert("evictions".into(), evictions);
        snapshot
            .metrics
            .insert("replication_lag".into(), replication_lag);
        snapshot
            .history
            .insert("cpu_utilization".into(), cpu_history);
        snapshot
            .history
            .insert("cache_hit_rate".into(), hit_rate_history);

        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GatewayConfig;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[test]
    fn hit_rate_handles_idle_cache() {
        assert_eq!(hit_rate(0.0, 0.0), 0.0);
        assert_eq!(hit_rate(80.0, 20.0), 80.0);
        assert_eq!(hit_rate(1.0, 0.0), 100.0);
    }

    /// Minimal gateway stub: answers every metric request with a fixed
    /// value, except ReplicationLag which gets a 404.
    async fn spawn_gateway_stub() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let mut buf = vec![0u8; 4096];
                    let n = socket.read(&mut buf).await.unwrap_or(0);
                    let request = String::from_utf8_lossy(&buf[..n]).to_string();

                    let (status, body) = if request.contains("ReplicationLag") {
                        ("404 Not Found", r#"{"error":"no datapoints"}"#)
                    } else if request.contains("/v1/metrics/history") {
                        ("200 OK", r#"{"values":[1.0,2.0,3.0]}"#)
                    } else {
                        ("200 OK", r#"{"value":5.0}"#)
                    };
                    let response = format!(
                        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                        status,
                        body.len(),
                        body
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                });
            }
        });

        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn missing_replication_lag_does_not_fail_the_snapshot() {
        let config = GatewayConfig {
            base_url: spawn_gateway_stub().await,
            token: None,
            timeout_secs: 5,
        };
        let collector = ElasticacheCollector {
            gateway: MetricsGateway::new(&config).unwrap(),
            clusters: vec!["*".to_string()],
            lookback_hours: 3,
            history_days: 14,
        };

        let snapshot = collector.collect("sessions-mc-001").await.unwrap();
        assert_eq!(snapshot.metric_or("replication_lag", -1.0), 0.0);
        assert_eq!(snapshot.metric_or("cpu_utilization", -1.0), 5.0);
    }
}
