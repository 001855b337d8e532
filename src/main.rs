use std::path::PathBuf;

use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use tracing::{error, info};

use cloud_diag_agent::collector::gateway::MetricsGateway;
use cloud_diag_agent::config::Config;
use cloud_diag_agent::reporter::RunReport;
use cloud_diag_agent::{analyzer, collector, orchestrator, reporter};

#[derive(Parser, Debug)]
#[command(name = "cloud-diag", about = "Cloud infrastructure diagnostics agent")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "cloud-diag.toml")]
    config: String,

    /// Hours of metric data to look back over (overrides config)
    #[arg(long)]
    lookback: Option<u32>,

    /// Worker pool size for collection tasks, 0 = auto (overrides config)
    #[arg(long)]
    threads: Option<usize>,

    /// Directory for JSON and Markdown reports (overrides config)
    #[arg(long)]
    reports_dir: Option<PathBuf>,

    /// Validate config and exit
    #[arg(long)]
    check: bool,

    /// Print version and exit
    #[arg(short, long)]
    version: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.version {
        println!("cloud-diag {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    // Load configuration and apply CLI overrides
    let mut config = Config::load(&cli.config)?;
    if let Some(lookback) = cli.lookback {
        config.collection.lookback_hours = lookback;
    }
    if let Some(threads) = cli.threads {
        config.collection.threads = threads;
    }
    if let Some(ref dir) = cli.reports_dir {
        config.agent.reports_dir = dir.display().to_string();
    }

    // Misconfiguration is fatal before any collection starts
    config.validate()?;

    if cli.check {
        println!("Configuration is valid.");
        return Ok(());
    }

    init_logging(&config);

    info!(version = env!("CARGO_PKG_VERSION"), "Starting diagnostic run");

    if let Err(e) = run(config).await {
        error!(error = %e, "Diagnostic run failed");
        return Err(e);
    }

    Ok(())
}

fn init_logging(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.agent.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .init();
}

async fn run(config: Config) -> Result<()> {
    let started = Utc::now();

    let gateway = MetricsGateway::new(&config.gateway)?;
    let collectors = collector::create_collectors(&config, gateway);

    let pool_size = orchestrator::worker_pool_size(config.collection.threads);
    info!(workers = pool_size, "Starting collection pass");
    let snapshots = orchestrator::run_collection(&collectors, pool_size).await;

    let findings = analyzer::run_analysis(&snapshots, &config.temporal);

    let report = RunReport {
        started,
        finished: Utc::now(),
        results: snapshots,
        findings,
    };

    let reports_dir = PathBuf::from(&config.agent.reports_dir);
    let json_path = reporter::json::write(&report, &reports_dir)?;
    reporter::markdown::write(&report, &reports_dir)?;

    info!(path = %json_path.display(), "Diagnostic run completed");
    Ok(())
}
