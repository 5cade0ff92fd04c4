//! RecruiterHub API server binary.

use std::net::SocketAddr;
use std::time::Duration;

use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use rhub_api::{create_router, metrics, ApiConfig, AppState};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("rhub-api: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // rustls 0.23+ needs a process-wide crypto provider
    if rustls::crypto::ring::default_provider().install_default().is_err() {
        anyhow::bail!("Failed to install rustls crypto provider");
    }

    init_tracing()?;

    info!("Starting rhub-api");

    let config = ApiConfig::from_env();
    info!(
        "API config: host={}, port={}, documents={:?}, identity={:?}",
        config.host, config.port, config.document_store, config.identity_provider
    );

    let (state, triggers) = AppState::new(config.clone()).await?;

    let metrics_enabled = std::env::var("METRICS_ENABLED")
        .map(|v| v == "true" || v == "1")
        .unwrap_or(true);

    let metrics_handle = if metrics_enabled {
        info!("Prometheus metrics enabled at /metrics");
        Some(metrics::init_metrics()?)
    } else {
        None
    };

    let executor = std::sync::Arc::clone(&triggers.executor);
    let trigger_task = triggers.spawn();

    let app = create_router(state, metrics_handle);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    // Let queued trigger events finish before exiting.
    executor.shutdown();
    if tokio::time::timeout(Duration::from_secs(15), trigger_task)
        .await
        .is_err()
    {
        warn!("Trigger executor did not stop in time");
    }

    info!("Server shutdown complete");
    Ok(())
}

fn init_tracing() -> anyhow::Result<()> {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env().add_directive("rhub=info".parse()?);

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal");
}
