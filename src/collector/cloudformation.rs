use async_trait::async_trait;

use super::gateway::MetricsGateway;
use super::{CollectionError, Collector, DiscoveryError};
use crate::config::Config;
use crate::types::{Namespace, Snapshot};

/// Collects infrastructure stack deployment status.
pub struct CloudformationCollector {
    gateway: MetricsGateway,
    stack_prefix: String,
    stack_suffix: String,
}

impl CloudformationCollector {
    pub fn new(config: &Config, gateway: MetricsGateway) -> Self {
        Self {
            gateway,
            stack_prefix: config.collector.cloudformation.stack_prefix.clone(),
            stack_suffix: config.collector.cloudformation.stack_suffix.clone(),
        }
    }
}

/// Narrow a discovered stack list by the configured prefix and suffix.
/// `"*"` disables the corresponding filter.
fn filter_stack_names(mut names: Vec<String>, prefix: &str, suffix: &str) -> Vec<String> {
    if prefix != "*" {
        names.retain(|n| n.starts_with(prefix));
    }
    if suffix != "*" {
        names.retain(|n| n.ends_with(suffix));
    }
    names
}

#[async_trait]
impl Collector for CloudformationCollector {
    fn namespace(&self) -> Namespace {
        Namespace::Cloudformation
    }

    async fn discover(&self) -> Result<Vec<String>, DiscoveryError> {
        let names = self.gateway.list_resources("cloudformation").await?;
        Ok(filter_stack_names(
            names,
            &self.stack_prefix,
            &self.stack_suffix,
        ))
    }

    async fn collect(&self, resource_id: &str) -> Result<Snapshot, CollectionError> {
        let stack = self.gateway.stack_status(resource_id).await?;
        if stack.status.is_empty() {
            return Err(CollectionError::Malformed(format!(
                "stack {} has no status",
                resource_id
            )));
        }

        let mut snapshot = Snapshot::new(Namespace::Cloudformation, resource_id);
        snapshot
            .attributes
            .insert("stack_status".into(), stack.status);
        snapshot
            .attributes
            .insert("last_updated".into(), stack.last_updated);

        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::filter_stack_names;

    fn stacks() -> Vec<String> {
        vec![
            "prod-billing-v2".to_string(),
            "prod-search-v1".to_string(),
            "staging-billing-v2".to_string(),
        ]
    }

    #[test]
    fn wildcard_passes_everything_through() {
        assert_eq!(filter_stack_names(stacks(), "*", "*"), stacks());
    }

    #[test]
    fn prefix_narrows_the_stack_list() {
        let filtered = filter_stack_names(stacks(), "prod-", "*");
        assert_eq!(filtered, vec!["prod-billing-v2", "prod-search-v1"]);
    }

    #[test]
    fn suffix_narrows_the_stack_list() {
        let filtered = filter_stack_names(stacks(), "*", "-v2");
        assert_eq!(filtered, vec!["prod-billing-v2", "staging-billing-v2"]);
    }

    #[test]
    fn prefix_and_suffix_combine() {
        let filtered = filter_stack_names(stacks(), "prod-", "-v2");
        assert_eq!(filtered, vec!["prod-billing-v2"]);
    }
}
