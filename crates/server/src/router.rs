//! HTTP router construction.

use std::sync::Arc;

use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::state::AppState;
use crate::{api, live};

/// Build the complete application router with all routes and middleware.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(api::health))
        .route("/api/config", get(api::config))
        .route("/api/dashboard", get(api::dashboard))
        .route("/api/scenarios", get(api::scenarios))
        .route("/api/scenarios/temperature", put(api::set_temperature_scenario))
        .route("/api/scenarios/heart-rate", put(api::set_heart_rate_scenario))
        .route("/api/mute/toggle", post(api::toggle_mute))
        .route("/api/alerts", get(api::alerts).delete(api::clear_alerts))
        .route("/ws", get(live::ws_upgrade))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
