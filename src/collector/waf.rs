use async_trait::async_trait;

use super::gateway::{MetricsGateway, Stat};
use super::{CollectionError, Collector, DiscoveryError};
use crate::config::Config;
use crate::types::{Namespace, Snapshot};

/// Collects web ACL request counters.
///
/// No analysis rules are registered for this category; its snapshots only
/// appear in the raw report sections.
pub struct WafCollector {
    gateway: MetricsGateway,
    web_acls: Vec<String>,
    lookback_hours: u32,
}

impl WafCollector {
    pub fn new(config: &Config, gateway: MetricsGateway) -> Self {
        Self {
            gateway,
            web_acls: config.collector.waf.web_acls.clone(),
            lookback_hours: config.collection.lookback_hours,
        }
    }
}

/// Configured entries act as substring filters over the discovered set, so
/// a short name can select a fully qualified ACL id. A `"*"` entry keeps
/// everything.
fn filter_web_acls(all: Vec<String>, patterns: &[String]) -> Vec<String> {
    if patterns.iter().any(|n| n == "*") {
        return all;
    }
    all.into_iter()
        .filter(|acl| patterns.iter().any(|pat| acl.contains(pat.as_str())))
        .collect()
}

#[async_trait]
impl Collector for WafCollector {
    fn namespace(&self) -> Namespace {
        Namespace::Waf
    }

    async fn discover(&self) -> Result<Vec<String>, DiscoveryError> {
        let all = self.gateway.list_resources("waf").await?;
        Ok(filter_web_acls(all, &self.web_acls))
    }

    async fn collect(&self, resource_id: &str) -> Result<Snapshot, CollectionError> {
        let hours = self.lookback_hours;

        let allowed = self
            .gateway
            .metric("waf", resource_id, "AllowedRequests", Stat::Sum, hours)
            .await?;
        let blocked = self
            .gateway
            .metric("waf", resource_id, "BlockedRequests", Stat::Sum, hours)
            .await?;

        let mut snapshot = Snapshot::new(Namespace::Waf, resource_id);
        snapshot.metrics.insert("allowed_requests".into(), allowed);
        snapshot.metrics.insert("blocked_requests".into(), blocked);

        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::filter_web_acls;

    fn acls() -> Vec<String> {
        vec![
            "edge-acl-8f3a".to_string(),
            "internal-acl-11bc".to_string(),
        ]
    }

    #[test]
    fn wildcard_keeps_every_acl() {
        assert_eq!(filter_web_acls(acls(), &["*".to_string()]), acls());
    }

    #[test]
    fn substring_selects_qualified_ids() {
        let filtered = filter_web_acls(acls(), &["edge".to_string()]);
        assert_eq!(filtered, vec!["edge-acl-8f3a"]);
    }

    #[test]
    fn unmatched_pattern_selects_nothing() {
        assert!(filter_web_acls(acls(), &["missing".to_string()]).is_empty());
    }
}
