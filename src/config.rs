use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Top-level configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub collection: CollectionConfig,
    #[serde(default)]
    pub temporal: TemporalConfig,
    #[serde(default)]
    pub collector: CollectorConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AgentConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_reports_dir")]
    pub reports_dir: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            reports_dir: default_reports_dir(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct GatewayConfig {
    #[serde(default = "default_gateway_url")]
    pub base_url: String,
    /// Bearer token for the gateway; usually supplied via ${ENV_VAR}.
    pub token: Option<String>,
    #[serde(default = "default_gateway_timeout")]
    pub timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: default_gateway_url(),
            token: None,
            timeout_secs: default_gateway_timeout(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CollectionConfig {
    /// Hours of metric data each collector looks back over.
    #[serde(default = "default_lookback_hours")]
    pub lookback_hours: u32,
    /// Worker pool size for collection tasks; 0 = auto.
    #[serde(default)]
    pub threads: usize,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            lookback_hours: default_lookback_hours(),
            threads: 0,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct TemporalConfig {
    /// Days of daily-resolution history fetched for baseline analysis.
    #[serde(default = "default_temporal_lookback")]
    pub lookback_days: u32,
    /// Standard deviations from the baseline mean before a trend is flagged.
    #[serde(default = "default_zscore_threshold")]
    pub threshold_std_dev: f64,
}

impl Default for TemporalConfig {
    fn default() -> Self {
        Self {
            lookback_days: default_temporal_lookback(),
            threshold_std_dev: default_zscore_threshold(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct CollectorConfig {
    #[serde(default)]
    pub ecs: EcsCollectorConfig,
    #[serde(default)]
    pub alb: AlbCollectorConfig,
    #[serde(default)]
    pub rds: RdsCollectorConfig,
    #[serde(default)]
    pub opensearch: OpensearchCollectorConfig,
    #[serde(default)]
    pub elasticache: ElasticacheCollectorConfig,
    #[serde(default)]
    pub waf: WafCollectorConfig,
    #[serde(default)]
    pub cloudformation: CloudformationCollectorConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EcsCollectorConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_wildcard")]
    pub clusters: Vec<String>,
}

impl Default for EcsCollectorConfig {
    fn default() -> Self {
        Self { enabled: true, clusters: default_wildcard() }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AlbCollectorConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_wildcard")]
    pub names: Vec<String>,
}

impl Default for AlbCollectorConfig {
    fn default() -> Self {
        Self { enabled: true, names: default_wildcard() }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RdsCollectorConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_wildcard")]
    pub instances: Vec<String>,
}

impl Default for RdsCollectorConfig {
    fn default() -> Self {
        Self { enabled: true, instances: default_wildcard() }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct OpensearchCollectorConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_wildcard")]
    pub domains: Vec<String>,
}

impl Default for OpensearchCollectorConfig {
    fn default() -> Self {
        Self { enabled: true, domains: default_wildcard() }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ElasticacheCollectorConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_wildcard")]
    pub clusters: Vec<String>,
}

impl Default for ElasticacheCollectorConfig {
    fn default() -> Self {
        Self { enabled: true, clusters: default_wildcard() }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct WafCollectorConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_wildcard")]
    pub web_acls: Vec<String>,
}

impl Default for WafCollectorConfig {
    fn default() -> Self {
        Self { enabled: true, web_acls: default_wildcard() }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CloudformationCollectorConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_star")]
    pub stack_prefix: String,
    #[serde(default = "default_star")]
    pub stack_suffix: String,
}

impl Default for CloudformationCollectorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            stack_prefix: default_star(),
            stack_suffix: default_star(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file. A missing file yields the
    /// built-in defaults so the agent can run from environment alone.
    pub fn load(path: &str) -> Result<Self> {
        if !Path::new(path).exists() {
            return Config::parse("");
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;
        Config::parse(&content)
    }

    fn parse(content: &str) -> Result<Self> {
        // Expand environment variables
        let expanded = expand_env_vars(content);

        let config: Config =
            toml::from_str(&expanded).with_context(|| "Failed to parse configuration")?;

        Ok(config)
    }

    /// Reject misconfiguration before any collection begins.
    pub fn validate(&self) -> Result<()> {
        if self.gateway.base_url.trim().is_empty() {
            bail!("gateway.base_url must not be empty");
        }
        if self.collection.lookback_hours == 0 {
            bail!("collection.lookback_hours must be at least 1");
        }
        if self.temporal.lookback_days == 0 {
            bail!("temporal.lookback_days must be at least 1");
        }
        if self.temporal.threshold_std_dev <= 0.0 {
            bail!("temporal.threshold_std_dev must be positive");
        }
        Ok(())
    }
}

/// Expand ${ENV_VAR} references in config string
fn expand_env_vars(input: &str) -> String {
    let re = regex::Regex::new(r"\$\{([^}]+)\}").unwrap();
    re.replace_all(input, |caps: &regex::Captures| {
        let var_name = &caps[1];
        std::env::var(var_name).unwrap_or_default()
    })
    .to_string()
}

// Default value functions
fn default_log_level() -> String { "info".to_string() }
fn default_reports_dir() -> String { "reports".to_string() }
fn default_gateway_url() -> String { "http://localhost:8480".to_string() }
fn default_gateway_timeout() -> u64 { 30 }
fn default_lookback_hours() -> u32 { 3 }
fn default_temporal_lookback() -> u32 { 14 }
fn default_zscore_threshold() -> f64 { 2.0 }
fn default_true() -> bool { true }
fn default_wildcard() -> Vec<String> { vec!["*".into()] }
fn default_star() -> String { "*".to_string() }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.collection.lookback_hours, 3);
        assert_eq!(config.collection.threads, 0);
        assert_eq!(config.temporal.lookback_days, 14);
        assert_eq!(config.temporal.threshold_std_dev, 2.0);
        assert!(config.collector.waf.enabled);
        assert_eq!(config.collector.alb.names, vec!["*".to_string()]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn sections_override_defaults() {
        let config = Config::parse(
            r#"
            [collection]
            lookback_hours = 6
            threads = 8

            [temporal]
            threshold_std_dev = 3.0

            [collector.rds]
            enabled = false

            [collector.cloudformation]
            stack_prefix = "prod-"
            "#,
        )
        .unwrap();

        assert_eq!(config.collection.lookback_hours, 6);
        assert_eq!(config.collection.threads, 8);
        assert_eq!(config.temporal.threshold_std_dev, 3.0);
        assert!(!config.collector.rds.enabled);
        assert_eq!(config.collector.cloudformation.stack_prefix, "prod-");
        assert_eq!(config.collector.cloudformation.stack_suffix, "*");
    }

    #[test]
    fn env_vars_are_expanded() {
        std::env::set_var("CLOUD_DIAG_TEST_TOKEN", "sekrit");
        let config = Config::parse(
            r#"
            [gateway]
            base_url = "https://metrics.internal"
            token = "${CLOUD_DIAG_TEST_TOKEN}"
            "#,
        )
        .unwrap();
        assert_eq!(config.gateway.token.as_deref(), Some("sekrit"));
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut config = Config::parse("").unwrap();
        config.temporal.threshold_std_dev = 0.0;
        assert!(config.validate().is_err());

        let mut config = Config::parse("").unwrap();
        config.gateway.base_url = " ".into();
        assert!(config.validate().is_err());

        let mut config = Config::parse("").unwrap();
        config.collection.lookback_hours = 0;
        assert!(config.validate().is_err());
    }
}
