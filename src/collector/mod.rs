pub mod alb;
pub mod cloudformation;
pub mod ecs;
pub mod elasticache;
pub mod gateway;
pub mod opensearch;
pub mod rds;
pub mod waf;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::Config;
use crate::types::{Namespace, Snapshot};
use gateway::{GatewayError, MetricsGateway};

/// A category's resource enumeration failed. The category contributes zero
/// snapshots for this run; other categories are unaffected.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    /// Escape hatch for collector implementations outside this crate.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// One resource's snapshot fetch failed. The resource is dropped from this
/// run; its siblings are unaffected.
#[derive(Debug, Error)]
pub enum CollectionError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error("malformed gateway response: {0}")]
    Malformed(String),
    /// Escape hatch for collector implementations outside this crate.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Trait for all resource collectors.
///
/// Each collector enumerates the resources of one category and fetches one
/// metric snapshot per resource. Both phases talk to remote APIs and can
/// fail; neither failure is allowed past the orchestrator boundary.
#[async_trait]
pub trait Collector: Send + Sync {
    /// The resource category this collector probes.
    fn namespace(&self) -> Namespace;

    /// Enumerate the resource identifiers this collector can process.
    async fn discover(&self) -> Result<Vec<String>, DiscoveryError>;

    /// Fetch a metric snapshot for a single resource.
    async fn collect(&self, resource_id: &str) -> Result<Snapshot, CollectionError>;
}

/// Create all enabled collectors based on configuration.
///
/// The list is built once at startup and passed into the orchestrator by
/// value; there is no global collector registry.
pub fn create_collectors(config: &Config, gateway: MetricsGateway) -> Vec<Arc<dyn Collector>> {
    let mut collectors: Vec<Arc<dyn Collector>> = Vec::new();

    if config.collector.ecs.enabled {
        collectors.push(Arc::new(ecs::EcsCollector::new(config, gateway.clone())));
    }

    if config.collector.alb.enabled {
        collectors.push(Arc::new(alb::AlbCollector::new(config, gateway.clone())));
    }

    if config.collector.rds.enabled {
        collectors.push(Arc::new(rds::RdsCollector::new(config, gateway.clone())));
    }

    if config.collector.opensearch.enabled {
        collectors.push(Arc::new(opensearch::OpensearchCollector::new(
            config,
            gateway.clone(),
        )));
    }

    if config.collector.elasticache.enabled {
        collectors.push(Arc::new(elasticache::ElasticacheCollector::new(
            config,
            gateway.clone(),
        )));
    }

    if config.collector.waf.enabled {
        collectors.push(Arc::new(waf::WafCollector::new(config, gateway.clone())));
    }

    if config.collector.cloudformation.enabled {
        collectors.push(Arc::new(cloudformation::CloudformationCollector::new(
            config, gateway,
        )));
    }

    tracing::info!(count = collectors.len(), "Initialized collectors");
    collectors
}
