//! checkin-server library - event check-in backend
//!
//! Keeps the participant roster, applies QR check-ins against it and
//! serves the roster import/export endpoints.

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod checkin;
pub mod config;
pub mod error;
pub mod export;
pub mod rollover;
pub mod roster;
pub mod state;
pub mod store;

use config::Config;
use state::SharedState;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Roster, daily counter and demo flag
    pub shared: Arc<SharedState>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(shared: Arc<SharedState>, config: Arc<Config>) -> Self {
        Self { shared, config }
    }
}

/// Cross-origin policy for the single configured front end
fn cors_layer(config: &Config) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(config.allowed_origin.clone())
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);
    let body_limit = DefaultBodyLimit::max(state.config.max_upload_bytes);

    Router::new()
        .route("/api/set-demo-mode", post(api::set_demo_mode))
        .route("/api/participants", get(api::list_participants))
        .route("/api/clear-participants", post(api::clear_participants))
        .route("/api/upload-participants", post(api::upload_participants))
        .route("/api/export-checkins", get(api::export_checkins))
        .route("/api/total-people", get(api::total_people))
        .route("/api/daily-check-in-count", get(api::daily_check_in_count))
        .route("/api/check-in", post(api::check_in))
        .merge(api::health_routes())
        .layer(body_limit)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
