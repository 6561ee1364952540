pub mod checkout;
pub mod orders;
pub mod webhooks;

use axum::{Json, Router, routing::get};
use serde::Serialize;

use crate::config::RateLimitConfig;
use crate::db::AppState;
use crate::rate_limit::per_ip_layer;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

/// Every route, with per-IP limits on the session-authenticated areas.
///
/// Gateway notifications stay unthrottled so that retries are never dropped.
pub fn app(state: AppState, limits: RateLimitConfig) -> Router<AppState> {
    Router::new()
        .merge(router())
        .merge(checkout::router(state.clone()).layer(per_ip_layer(limits.strict_rpm)))
        .merge(orders::router(state).layer(per_ip_layer(limits.standard_rpm)))
        .merge(webhooks::router())
}
