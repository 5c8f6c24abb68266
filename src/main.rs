//! # Main Entry Point
//!
//! Wires the pieces together: CLI parsing, logging, binary provisioning,
//! and the rmcp stdio transport. Everything with behavior lives in the
//! other modules; this is setup glue.

mod config;
mod exec;
mod provision;
mod sanitize;
mod server;

use anyhow::{Context, Result};
use clap::Parser;
use rmcp::{ServiceExt, transport::stdio};

use crate::config::{Cli, ServerConfig};
use crate::server::DroidServer;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. CLI / Configuration
    let cli = Cli::parse();
    let config = ServerConfig::from_cli(&cli);

    // 2. Logging Setup
    // Stdout carries the MCP transport, so the live layer writes to stderr;
    // a file layer keeps the full session log.
    if !std::path::Path::new(&cli.log_dir).exists() {
        std::fs::create_dir_all(&cli.log_dir).context("Failed to create log directory")?;
    }

    let file_appender = tracing_appender::rolling::never(&cli.log_dir, "session.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false);

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stderr_layer)
        .init();

    // 3. Provisioning
    // The installer drops the binary under ~/.droid/bin; skippable when
    // droid is already on PATH.
    if !cli.skip_install {
        provision::ensure_droid_installed()
            .await
            .context("Failed to provision droid binary")?;
    }

    // 4. Serve over stdio until the client disconnects.
    tracing::info!("Droid MCP server running on stdio");
    let service = DroidServer::new(config)
        .serve(stdio())
        .await
        .context("Failed to start MCP server")?;
    service.waiting().await?;

    Ok(())
}
