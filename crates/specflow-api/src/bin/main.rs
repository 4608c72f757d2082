//! Specflow server and CLI
//!
//! # Exit Codes (`validate`, `trace`)
//!
//! - 0: Success
//! - 1: Validation failed with errors
//! - 2: Validation passed with warnings
//! - 3: Invalid input (missing or empty directory)
//! - 10: Internal error

use anyhow::Context;
use clap::Parser;
use specflow_api::cli::{self, Cli, Commands};
use specflow_api::{create_router, init_tracing, AppState, LogTarget};
use specflow_core::config::ServiceConfig;
use specflow_core::{StoreHandles, SystemClock};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = ServiceConfig::load(cli.config.as_deref()).context("loading configuration")?;
    cli.command.apply_overrides(&mut config);
    config.validate().context("invalid configuration")?;

    let target = match cli.command {
        Commands::Serve { .. } => LogTarget::Stdout,
        _ => LogTarget::Stderr,
    };
    init_tracing(&config.logging, target)?;

    match cli.command {
        Commands::Serve { .. } => serve(config).await,
        Commands::Validate { dir, phase, format } => {
            let code = cli::execute_validate(&dir, phase, format).await;
            std::process::exit(code.into());
        }
        Commands::Trace { dir, format } => {
            let code = cli::execute_trace(&dir, format);
            std::process::exit(code.into());
        }
    }
}

async fn serve(config: ServiceConfig) -> anyhow::Result<()> {
    let state = AppState::new(StoreHandles::memory(), Arc::new(SystemClock), &config).await?;
    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;

    tracing::info!(
        addr = %addr,
        think_time_ms = config.orchestrator.think_time_ms,
        "Specflow API listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
