//! HTTP client for the internal metrics gateway.
//!
//! The gateway fronts the cloud provider's monitoring APIs and exposes a
//! small JSON surface: resource enumeration per service, aggregated metric
//! values over a lookback window, and daily-resolution metric history.
//! Collectors never talk to provider SDKs directly.

use std::time::Duration;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;

use crate::config::GatewayConfig;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("gateway returned {status} for {url}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
    #[error("could not decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Aggregation applied by the gateway over the lookback window.
#[derive(Debug, Clone, Copy)]
pub enum Stat {
    Average,
    Sum,
    Maximum,
}

impl Stat {
    fn as_str(&self) -> &'static str {
        match self {
            Stat::Average => "avg",
            Stat::Sum => "sum",
            Stat::Maximum => "max",
        }
    }
}

#[derive(Debug, Deserialize)]
struct ResourceList {
    resources: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct MetricValue {
    value: f64,
}

#[derive(Debug, Deserialize)]
struct MetricSeries {
    values: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct EcsServiceList {
    services: Vec<EcsService>,
}

/// Per-service task counts and utilisation reported by the gateway.
#[derive(Debug, Clone, Deserialize)]
pub struct EcsService {
    pub name: String,
    pub running_tasks: u32,
    pub desired_tasks: u32,
    #[serde(default)]
    pub cpu_utilization: f64,
    #[serde(default)]
    pub memory_utilization: f64,
}

/// Stack status details reported by the gateway.
#[derive(Debug, Clone, Deserialize)]
pub struct StackStatus {
    pub status: String,
    #[serde(default)]
    pub last_updated: String,
}

/// Shared, cheaply cloneable gateway client.
#[derive(Clone)]
pub struct MetricsGateway {
    client: reqwest::Client,
    base_url: String,
}

impl MetricsGateway {
    pub fn new(config: &GatewayConfig) -> Result<Self> {
        let mut builder =
            reqwest::Client::builder().timeout(Duration::from_secs(config.timeout_secs));

        if let Some(ref token) = config.token {
            let mut headers = reqwest::header::HeaderMap::new();
            let mut value = reqwest::header::HeaderValue::from_str(&format!("Bearer {}", token))
                .context("gateway token is not a valid header value")?;
            value.set_sensitive(true);
            headers.insert(reqwest::header::AUTHORIZATION, value);
            builder = builder.default_headers(headers);
        }

        Ok(Self {
            client: builder.build().context("Failed to build HTTP client")?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, GatewayError> {
        let url = format!("{}/v1/{}", self.base_url, path);
        let resp = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|source| GatewayError::Request {
                url: url.clone(),
                source,
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(GatewayError::Status { url, status });
        }

        resp.json::<T>()
            .await
            .map_err(|source| GatewayError::Decode { url, source })
    }

    /// Enumerate all resource identifiers for a service.
    pub async fn list_resources(&self, service: &str) -> Result<Vec<String>, GatewayError> {
        let list: ResourceList = self
            .get_json("resources", &[("service", service.to_string())])
            .await?;
        Ok(list.resources)
    }

    /// Aggregated value of one metric over the lookback window.
    pub async fn metric(
        &self,
        service: &str,
        resource: &str,
        metric: &str,
        stat: Stat,
        lookback_hours: u32,
    ) -> Result<f64, GatewayError> {
        let value: MetricValue = self
            .get_json(
                "metrics",
                &[
                    ("service", service.to_string()),
                    ("resource", resource.to_string()),
                    ("name", metric.to_string()),
                    ("stat", stat.as_str().to_string()),
                    ("lookback_hours", lookback_hours.to_string()),
                ],
            )
            .await?;
        Ok(value.value)
    }

    /// Daily-resolution history of one metric, oldest first.
    pub async fn metric_history(
        &self,
        service: &str,
        resource: &str,
        metric: &str,
        lookback_days: u32,
    ) -> Result<Vec<f64>, GatewayError> {
        let series: MetricSeries = self
            .get_json(
                "metrics/history",
                &[
                    ("service", service.to_string()),
                    ("resource", resource.to_string()),
                    ("name", metric.to_string()),
                    ("lookback_days", lookback_days.to_string()),
                ],
            )
            .await?;
        Ok(series.values)
    }

    /// Per-service task state for an ECS cluster.
    pub async fn ecs_services(&self, cluster: &str) -> Result<Vec<EcsService>, GatewayError> {
        let list: EcsServiceList = self
            .get_json("ecs/services", &[("cluster", cluster.to_string())])
            .await?;
        Ok(list.services)
    }

    /// Status details for a CloudFormation stack.
    pub async fn stack_status(&self, stack: &str) -> Result<StackStatus, GatewayError> {
        self.get_json("cloudformation/stack", &[("name", stack.to_string())])
            .await
    }
}
