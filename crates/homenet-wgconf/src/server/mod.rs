//! HTTP server handing out WireGuard configs
//!
//! Every request path is `/<host>/<name>`; the client proves it owns the
//! config by sending the interface private key as the basic-auth password.

pub mod handlers;

use axum::Router;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::config::ConfigStore;

/// Application state shared across handlers
pub struct AppState {
    /// Configs loaded at startup
    pub store: ConfigStore,
    /// Configs successfully served
    pub served_count: AtomicU64,
}

impl AppState {
    pub fn new(store: ConfigStore) -> Self {
        Self {
            store,
            served_count: AtomicU64::new(0),
        }
    }
}

/// Create the server router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Any method, any path: the handler validates the shape itself
        .fallback(handlers::serve_config)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
