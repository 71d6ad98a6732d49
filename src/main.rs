use anyhow::{Context, Result};
use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::info;

use quickdeal_watcher::config::AppConfig;
use quickdeal_watcher::core::{NotificationComposer, ZoneDedupStore};
use quickdeal_watcher::logging;
use quickdeal_watcher::monitor::{DealMonitor, MonitorSettings};
use quickdeal_watcher::plugins::{PluginManager, SourceKind};

#[derive(Debug, Parser)]
#[command(name = "quickdeal-watcher", version, about = "Per-pincode JioMart QUICK deal alerts on Telegram")]
struct Cli {
    /// Extra configuration file, layered over config/ and under QUICKDEAL__* variables
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured deal source
    #[arg(short, long, value_enum)]
    source: Option<SourceKind>,

    /// Run a single cycle and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();

    let mut config = AppConfig::from_env(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(source) = cli.source {
        config.monitor.source = source;
        config.validate().context("Invalid configuration")?;
    }

    let _log_guard = logging::init_tracing(&config.logging);
    info!("Starting QuickDeal Watcher...");

    if config.metrics.enabled {
        let addr = SocketAddr::from(([0, 0, 0, 0], config.metrics.port));
        PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()
            .context("Failed to start metrics exporter")?;
        info!(%addr, "Prometheus metrics exporter listening");
    }

    let source = PluginManager::create_source(&config).context("Failed to create deal source")?;
    let notifier = PluginManager::create_notifier(&config).context("Failed to create notifier")?;

    let settings = MonitorSettings::from_config(&config);
    let store = ZoneDedupStore::new(&settings.zones);
    let composer = NotificationComposer::new(config.telegram.header.clone());
    let mut monitor = DealMonitor::new(source, notifier, composer, store, settings);

    if cli.once {
        let report = monitor.run_cycle().await;
        info!(
            notified = report.notified(),
            failures = report.failures(),
            "Single cycle complete"
        );
    } else {
        monitor
            .run(async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::error!("Failed to listen for shutdown signal: {}", e);
                    std::future::pending::<()>().await;
                }
            })
            .await;
    }

    info!("Shutting down...");
    monitor.shutdown().await;

    Ok(())
}
