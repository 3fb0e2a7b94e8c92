//! Dependency orchestrator CLI.
//!
//! ```text
//! resilience-orchestrator [--config PATH] [check | watch]
//!
//! check: initialize once, print the health snapshot as JSON, exit
//!        non-zero if startup failed or overall health is critical
//! watch: initialize, keep health checks running, log the snapshot
//!        periodically until SIGINT/SIGTERM (default)
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use resilience_orchestrator::config::ObservabilityConfig;
use resilience_orchestrator::lifecycle::signals::shutdown_signal;
use resilience_orchestrator::lifecycle::startup::load_registry;
use resilience_orchestrator::observability::{logging, metrics};
use resilience_orchestrator::{OrchestratorConfig, OverallStatus, Registry};

#[derive(Parser)]
#[command(name = "resilience-orchestrator")]
#[command(about = "Health-check and monitor external service dependencies", long_about = None)]
struct Cli {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Clone, Copy)]
enum Commands {
    /// Initialize once and print the health snapshot
    Check,
    /// Monitor dependencies until interrupted
    Watch,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let (config, registry) = match load_registry(cli.config.as_deref()) {
        Ok(loaded) => loaded,
        Err(e) => {
            logging::init_logging(&ObservabilityConfig::default());
            tracing::error!(error = %e, "Failed to load configuration");
            return ExitCode::FAILURE;
        }
    };

    logging::init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "resilience-orchestrator starting");

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let code = match cli.command.unwrap_or(Commands::Watch) {
        Commands::Check => check(&registry).await,
        Commands::Watch => watch(&config, &registry).await,
    };

    registry.shutdown().await;
    tracing::info!("Shutdown complete");
    code
}

async fn check(registry: &Registry) -> ExitCode {
    let initialized = registry.initialize().await;
    let snapshot = registry.health_status();

    match serde_json::to_string_pretty(&snapshot) {
        Ok(json) => println!("{json}"),
        Err(e) => tracing::error!(error = %e, "Failed to serialize health snapshot"),
    }

    if let Err(e) = initialized {
        tracing::error!(error = %e, "Startup failed");
        return ExitCode::FAILURE;
    }
    if snapshot.overall == OverallStatus::Critical {
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

async fn watch(config: &OrchestratorConfig, registry: &Registry) -> ExitCode {
    if let Err(e) = registry.initialize().await {
        tracing::error!(error = %e, "Startup failed");
        return ExitCode::FAILURE;
    }

    let period = Duration::from_secs(config.monitor.report_interval_secs.max(1));
    let mut ticker = tokio::time::interval(period);
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let snapshot = registry.health_status();
                let unhealthy: Vec<&str> = snapshot.unhealthy().collect();
                tracing::info!(
                    overall = ?snapshot.overall,
                    dependencies = snapshot.dependencies.len(),
                    unhealthy = ?unhealthy,
                    "Health report"
                );
            }
            _ = &mut shutdown => {
                tracing::info!("Shutdown signal received, stopping");
                break;
            }
        }
    }

    ExitCode::SUCCESS
}
