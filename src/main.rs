//! APK Sentinel server binary

use std::net::SocketAddr;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use apk_sentinel::{create_router, AppState, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration (.env first so RUST_LOG from it applies)
    dotenvy::dotenv().ok();
    let config = Config::from_env();

    // Initialize logging, JSON lines in production
    let json_logs = config.is_production();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "apk_sentinel=debug,tower_http=debug".into()))
        .with(json_logs.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json_logs).then(tracing_subscriber::fmt::layer))
        .init();

    tracing::info!("APK Sentinel starting ({})...", config.environment);
    tracing::info!(
        "Upload limit: {} bytes, ledger delays: {:?}",
        config.max_upload_bytes,
        config.ledger
    );
    tracing::warn!("Ledger verification and threat scoring are simulated");

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let app = create_router(AppState::new(config));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .await
        .context("server error")?;

    Ok(())
}
