mod bootstrap;
mod health;
mod sweeper;
mod webhook;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use infohub_core::config::{AppConfig, LoadOptions};
use tokio::sync::Notify;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "infohub-server", version, about = "Info Hub Slack webhook server")]
struct Cli {
    /// Path to a TOML config file (defaults to ./infohub.toml or ./config/infohub.toml)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Validate configuration and exit
    #[arg(long)]
    check: bool,
}

fn init_logging(config: &AppConfig) {
    use infohub_core::config::LogFormat::*;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.as_str()));

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_env_filter(filter).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_env_filter(filter).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_env_filter(filter).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run(Cli::parse()).await
}

async fn run(cli: Cli) -> Result<()> {
    let options = LoadOptions {
        require_file: cli.config.is_some(),
        config_path: cli.config,
        ..LoadOptions::default()
    };
    let config = AppConfig::load(options).context("failed to load configuration")?;

    if cli.check {
        println!("configuration ok");
        return Ok(());
    }

    init_logging(&config);
    let app = bootstrap::bootstrap_with_config(config)?;

    let sweeper = sweeper::spawn(
        app.receipts.clone(),
        app.rate_limiter.clone(),
        app.config.dedup.sweep_interval(),
    );

    let routes = webhook::router(webhook::WebhookState {
        dispatcher: app.dispatcher.clone(),
        max_body_bytes: app.config.server.max_body_bytes,
    })
    .merge(health::router(health::HealthState {
        completion_available: app.completion_available,
    }));

    let address = format!("{}:{}", app.config.server.bind_address, app.config.server.port);
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;

    tracing::info!(
        event_name = "system.server.started",
        correlation_id = "bootstrap",
        bind_address = %address,
        started_at = %app.started.wall_clock.to_rfc3339(),
        "infohub-server listening"
    );

    let shutdown = Arc::new(Notify::new());
    let server = tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            axum::serve(listener, routes)
                .with_graceful_shutdown(async move { shutdown.notified().await })
                .await
        }
    });

    wait_for_shutdown().await?;
    tracing::info!(
        event_name = "system.server.stopping",
        correlation_id = "shutdown",
        "infohub-server stopping"
    );
    shutdown.notify_one();
    sweeper.abort();

    let grace = Duration::from_secs(app.config.server.graceful_shutdown_secs);
    match tokio::time::timeout(grace, server).await {
        Ok(joined) => joined.context("server task failed")?.context("server error")?,
        Err(_) => tracing::warn!(
            event_name = "system.server.shutdown_timeout",
            correlation_id = "shutdown",
            grace_secs = grace.as_secs(),
            "in-flight requests did not finish within the grace period"
        ),
    }

    Ok(())
}

async fn wait_for_shutdown() -> Result<()> {
    tokio::signal::ctrl_c().await?;
    Ok(())
}
