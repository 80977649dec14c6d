//! Moneymon - login server
//!
//! Main entry point for the HTTP service.

use std::sync::Arc;

use anyhow::Context as _;
use moneymon_api::shutdown::shutdown_signal;
use moneymon_api::{build_router, AppContext};
use moneymon_infra::config;
use moneymon_infra::observability::{self, LoggingOptions};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let dotenv = dotenvy::dotenv();
    observability::init(&LoggingOptions::from_env());
    match dotenv {
        Ok(path) => tracing::info!(path = %path.display(), "loaded .env"),
        Err(e) => tracing::debug!(error = %e, "no .env file loaded"),
    }

    let config = config::load().context("failed to load configuration")?;
    config.validate().context("invalid configuration")?;
    let bind_addr = config.server.bind_addr.clone();

    let ctx = Arc::new(AppContext::new(config).context("failed to initialize application")?);
    ctx.start_background_tasks().await.context("failed to start background tasks")?;

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    tracing::info!(addr = %bind_addr, "moneymon listening");

    let served = axum::serve(listener, build_router(Arc::clone(&ctx)))
        .with_graceful_shutdown(async {
            let signal = shutdown_signal().await;
            tracing::info!(%signal, "shutdown requested");
        })
        .await;

    ctx.shutdown().await;
    served.context("server error")?;
    tracing::info!("moneymon stopped");
    Ok(())
}
