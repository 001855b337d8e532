use async_trait::async_trait;

use super::gateway::{EcsService, MetricsGateway};
use super::{CollectionError, Collector, DiscoveryError};
use crate::config::Config;
use crate::types::{Namespace, Snapshot};

/// Collects container cluster task counts and utilisation.
pub struct EcsCollector {
    gateway: MetricsGateway,
    clusters: Vec<String>,
}

impl EcsCollector {
    pub fn new(config: &Config, gateway: MetricsGateway) -> Self {
        Self {
            gateway,
            clusters: config.collector.ecs.clusters.clone(),
        }
    }
}

/// Build a cluster snapshot from its service list.
///
/// Cluster totals feed the report sections; per-service task counts are kept
/// under `service_running:{name}` / `service_desired:{name}` keys so the
/// rule layer can spot a single underprovisioned service that cluster totals
/// would mask.
fn snapshot_from_services(resource_id: &str, services: &[EcsService]) -> Snapshot {
    let mut running = 0u32;
    let mut desired = 0u32;
    let mut cpu_sum = 0.0;
    let mut mem_sum = 0.0;

    let mut snapshot = Snapshot::new(Namespace::Ecs, resource_id);
    for service in services {
        running += service.running_tasks;
        desired += service.desired_tasks;
        cpu_sum += service.cpu_utilization;
        mem_sum += service.memory_utilization;

        snapshot.metrics.insert(
            format!("service_running:{}", service.name),
            service.running_tasks as f64,
        );
        snapshot.metrics.insert(
            format!("service_desired:{}", service.name),
            service.desired_tasks as f64,
        );
    }

    let count = services.len();
    let (cpu_avg, mem_avg) = if count > 0 {
        (cpu_sum / count as f64, mem_sum / count as f64)
    } else {
        (0.0, 0.0)
    };

    snapshot.metrics.insert("service_count".into(), count as f64);
    snapshot
        .metrics
        .insert("running_tasks".into(), running as f64);
    snapshot
        .metrics
        .insert("desired_tasks".into(), desired as f64);
    snapshot.metrics.insert("cpu_avg".into(), cpu_avg);
    snapshot.metrics.insert("mem_avg".into(), mem_avg);

    snapshot
}

#[async_trait]
impl Collector for EcsCollector {
    fn namespace(&self) -> Namespace {
        Namespace::Ecs
    }

    async fn discover(&self) -> Result<Vec<String>, DiscoveryError> {
        if self.clusters.iter().any(|n| n == "*") {
            Ok(self.gateway.list_resources("ecs").await?)
        } else {
            Ok(self.clusters.clone())
        }
    }

    async fn collect(&self, resource_id: &str) -> Result<Snapshot, CollectionError> {
        let services = self.gateway.ecs_services(resource_id).await?;
        Ok(snapshot_from_services(resource_id, &services))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(name: &str, running: u32, desired: u32) -> EcsService {
        EcsService {
            name: name.to_string(),
            running_tasks: running,
            desired_tasks: desired,
            cpu_utilization: 10.0,
            memory_utilization: 20.0,
        }
    }

    #[test]
    fn cluster_totals_and_per_service_counts_coexist() {
        let services = vec![service("api", 3, 2), service("worker", 1, 2)];
        let snap = snapshot_from_services("prod-cluster", &services);

        assert_eq!(snap.metric_or("service_count", 0.0), 2.0);
        assert_eq!(snap.metric_or("running_tasks", 0.0), 4.0);
        assert_eq!(snap.metric_or("desired_tasks", 0.0), 4.0);
        assert_eq!(snap.metric_or("service_running:worker", -1.0), 1.0);
        assert_eq!(snap.metric_or("service_desired:worker", -1.0), 2.0);
        assert_eq!(snap.metric_or("service_running:api", -1.0), 3.0);
    }

    #[test]
    fn empty_cluster_reports_zeroes() {
        let snap = snapshot_from_services("idle-cluster", &[]);
        assert_eq!(snap.metric_or("service_count", -1.0), 0.0);
        assert_eq!(snap.metric_or("cpu_avg", -1.0), 0.0);
        assert_eq!(snap.metric_or("mem_avg", -1.0), 0.0);
    }
}
