//! HTTP API for the XP coordinator
//!
//! JSON endpoints for the dashboard and an SSE stream of every [`LiveEvent`].
//!
//! [`LiveEvent`]: levelup_common::events::LiveEvent

pub mod handlers;
pub mod sse;

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::State,
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::coordinator::XpCoordinator;

/// Shared application context passed to all handlers
#[derive(Clone)]
pub struct AppContext {
    pub coordinator: Arc<XpCoordinator>,
    pub port: u16,
    pub root_folder: PathBuf,
}

/// Build the API router
pub fn create_router(ctx: AppContext) -> Router {
    Router::new()
        .route("/health", get(health))
        // XP state and triggers
        .route("/api/xp/state", get(handlers::get_state))
        .route("/api/xp/config", get(handlers::get_config))
        .route("/api/xp/history", get(handlers::get_history))
        .route("/api/xp/add-audio", post(handlers::add_audio_xp))
        .route("/api/xp/add-manual", post(handlers::add_manual_xp))
        .route("/api/xp/add-fixed", post(handlers::add_fixed_xp))
        .route("/api/xp/level-up", post(handlers::force_level_up))
        .route("/api/xp/reset", post(handlers::reset_session))
        // Sound-only triggers
        .route("/api/viewer/join", post(handlers::viewer_join))
        .route("/api/sound/transition", post(handlers::transition))
        // Level thresholds
        .route("/api/levels/thresholds", get(handlers::get_thresholds))
        .route("/api/levels/reload", post(handlers::reload_thresholds))
        .route("/api/levels/xp/:xp", get(handlers::level_for_xp))
        // Live sessions
        .route("/api/session/current", get(handlers::current_session))
        .route("/api/session/start", post(handlers::start_session))
        .route("/api/session/stop", post(handlers::stop_session))
        .route("/api/sessions", get(handlers::list_sessions))
        // SSE event stream
        .route("/api/events", get(sse::event_stream))
        .with_state(ctx)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Health check endpoint
async fn health(State(ctx): State<AppContext>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "module": "levelup-xp",
        "version": env!("CARGO_PKG_VERSION"),
        "port": ctx.port,
        "root_folder": ctx.root_folder.display().to_string(),
        "live": ctx.coordinator.is_live().await,
    }))
}
