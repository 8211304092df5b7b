//! cartsync storefront library.
//!
//! Keeps a local mirror of a cart held by a hosted commerce API and serves
//! it as JSON views. Provided as a library so the CLI and the integration
//! tests drive the same controller and router as the server binary.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod commerce;
pub mod config;
pub mod error;
pub mod preferences;
pub mod routes;
pub mod state;
pub mod sync;

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Router, routing::get};

use state::AppState;

/// Build the storefront router with health checks, without outer layers.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes::routes())
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable until a cart has been loaded from the store.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    if state.cart().snapshot().cart().is_some() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}
