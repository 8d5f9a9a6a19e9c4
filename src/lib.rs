//! APK Sentinel
//!
//! Upload an Android package, get a threat verdict.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       APK SENTINEL                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌───────────┐   ┌──────────────────────────────────────┐  │
//! │  │  API      │   │  Orchestrator (one task per upload)  │  │
//! │  │  (Axum)   │──▶│  hash → permissions → score → ledger │  │
//! │  └─────┬─────┘   └──────────────────┬───────────────────┘  │
//! │        └────────────────┬───────────┘                      │
//! │                         ▼                                  │
//! │                 ┌──────────────┐                           │
//! │                 │  MemStore    │                           │
//! │                 └──────────────┘                           │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod models;
pub mod store;
pub mod analysis;
pub mod handlers;

use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower_http::{
    cors::{CorsLayer, Any},
    trace::TraceLayer,
    compression::CompressionLayer,
};

use analysis::{LedgerOracle, Orchestrator};
use store::{AnalysisStore, MemStore};

pub use config::Config;
pub use error::{AppError, AppResult};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn AnalysisStore>,
    pub orchestrator: Orchestrator<LedgerOracle>,
    pub config: Config,
}

impl AppState {
    /// Fresh in-memory store and a ledger oracle timed by `config`
    pub fn new(config: Config) -> Self {
        let store: Arc<dyn AnalysisStore> = Arc::new(MemStore::new());
        Self::with_store(config, store)
    }

    pub fn with_store(config: Config, store: Arc<dyn AnalysisStore>) -> Self {
        let oracle = Arc::new(LedgerOracle::new(config.ledger));
        Self {
            orchestrator: Orchestrator::new(Arc::clone(&store), oracle),
            store,
            config,
        }
    }
}

/// Create the main router with all routes
pub fn create_router(state: AppState) -> Router {
    let upload_limit = DefaultBodyLimit::max(state.config.upload_body_limit());

    Router::new()
        .route("/health", get(handlers::health::check))
        .route("/api/analyze", post(handlers::analyses::analyze).layer(upload_limit))
        .route("/api/analyses", get(handlers::analyses::list))
        .route("/api/analyses/trend", get(handlers::analyses::trend))
        .route("/api/analysis/:id", get(handlers::analyses::get))
        .route("/api/analysis/:id/install", get(handlers::analyses::install))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        )
        .with_state(state)
}
