//! Booking and payment core for a self-drive car rental platform.
//!
//! Owns car availability, the reservation guard, the booking lifecycle,
//! payment reconciliation and the cancellation/refund policy. Identity is
//! forwarded by the upstream gateway; everything stateful lives in Postgres.

use axum::{routing::get, Json, Router};
use sqlx::PgPool;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

pub mod auth;
pub mod booking;
pub mod cache;
pub mod config;
pub mod error;
pub mod fleet;
pub mod models;
pub mod notify;
pub mod payments;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub cache: cache::AppCache,
    pub notifier: notify::Notifier,
}

/// Build the full application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(booking::router())
        .merge(payments::router())
        .merge(fleet::router())
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "cache": state.cache.stats(),
    }))
}
