//! HTTP request handlers
//!
//! Thin adapters over [`XpCoordinator`]; validation errors become 4xx
//! responses through [`Error`]'s `IntoResponse`.
//!
//! [`XpCoordinator`]: crate::coordinator::XpCoordinator

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use levelup_common::config::XpConfig;
use levelup_common::events::{XpEvent, XpStatus};
use levelup_common::models::{Level, LiveSession};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use super::AppContext;
use crate::coordinator::ThresholdSummary;
use crate::xp::AudioTrigger;
use crate::{Error, Result};

// ========================================
// Request / response types
// ========================================

#[derive(Debug, Deserialize)]
pub struct AddAudioRequest {
    #[serde(rename = "triggerType", alias = "trigger_type")]
    pub trigger_type: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct AddManualRequest {
    #[serde(default)]
    pub amount: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct AddFixedRequest {
    pub amount: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct ViewerJoinRequest {
    #[serde(default, rename = "viewerName", alias = "viewer_name")]
    pub viewer_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TransitionRequest {
    #[serde(rename = "fromLevel", alias = "from_level")]
    pub from_level: u32,
    #[serde(rename = "toLevel", alias = "to_level")]
    pub to_level: u32,
}

#[derive(Debug, Serialize)]
pub struct CurrentSessionResponse {
    pub active: bool,
    pub session: Option<LiveSession>,
}

/// Parse a body that may be omitted entirely
///
/// An empty body yields the default request; anything else must be valid
/// JSON for `T`.
fn optional_body<T: DeserializeOwned + Default>(body: &Bytes) -> Result<T> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| Error::InvalidInput(format!("Invalid request body: {}", e)))
}

// ========================================
// XP state
// ========================================

/// GET /api/xp/state
pub async fn get_state(State(ctx): State<AppContext>) -> Json<XpStatus> {
    Json(ctx.coordinator.status().await)
}

/// GET /api/xp/config
pub async fn get_config(State(ctx): State<AppContext>) -> Json<XpConfig> {
    Json(ctx.coordinator.config())
}

/// GET /api/xp/history
pub async fn get_history(State(ctx): State<AppContext>) -> Json<Vec<XpEvent>> {
    Json(ctx.coordinator.history().await)
}

// ========================================
// XP triggers
// ========================================

/// POST /api/xp/add-audio
pub async fn add_audio_xp(
    State(ctx): State<AppContext>,
    Json(req): Json<AddAudioRequest>,
) -> Result<Json<XpStatus>> {
    let trigger: AudioTrigger = req.trigger_type.parse()?;
    Ok(Json(ctx.coordinator.add_audio_xp(trigger).await))
}

/// POST /api/xp/add-manual
///
/// Body is optional; without an amount the configured manual XP is used.
pub async fn add_manual_xp(
    State(ctx): State<AppContext>,
    body: Bytes,
) -> Result<Json<XpStatus>> {
    let req: AddManualRequest = optional_body(&body)?;
    let amount = match req.amount {
        Some(amount) if amount < 0 => {
            return Err(Error::InvalidInput(format!(
                "Manual XP amount must not be negative (got {})",
                amount
            )));
        }
        Some(amount) => Some(amount as u64),
        None => None,
    };
    Ok(Json(ctx.coordinator.add_manual_xp(amount).await))
}

/// POST /api/xp/add-fixed
pub async fn add_fixed_xp(
    State(ctx): State<AppContext>,
    Json(req): Json<AddFixedRequest>,
) -> Result<Json<XpStatus>> {
    Ok(Json(ctx.coordinator.add_fixed_xp(req.amount).await?))
}

/// POST /api/xp/level-up
pub async fn force_level_up(State(ctx): State<AppContext>) -> Json<XpStatus> {
    Json(ctx.coordinator.force_level_up().await)
}

/// POST /api/xp/reset
pub async fn reset_session(State(ctx): State<AppContext>) -> Json<XpStatus> {
    Json(ctx.coordinator.reset_session().await)
}

// ========================================
// Sound triggers
// ========================================

/// POST /api/viewer/join
pub async fn viewer_join(
    State(ctx): State<AppContext>,
    body: Bytes,
) -> Result<StatusCode> {
    let req: ViewerJoinRequest = optional_body(&body)?;
    ctx.coordinator.viewer_join(req.viewer_name).await;
    Ok(StatusCode::ACCEPTED)
}

/// POST /api/sound/transition
pub async fn transition(
    State(ctx): State<AppContext>,
    Json(req): Json<TransitionRequest>,
) -> Result<StatusCode> {
    if req.from_level == 0 || req.to_level == 0 {
        return Err(Error::InvalidInput("Levels are numbered from 1".to_string()));
    }
    ctx.coordinator.transition(req.from_level, req.to_level);
    Ok(StatusCode::ACCEPTED)
}

// ========================================
// Levels
// ========================================

/// GET /api/levels/thresholds
pub async fn get_thresholds(State(ctx): State<AppContext>) -> Json<ThresholdSummary> {
    Json(ctx.coordinator.thresholds().await)
}

/// POST /api/levels/reload
pub async fn reload_thresholds(State(ctx): State<AppContext>) -> Result<Json<ThresholdSummary>> {
    Ok(Json(ctx.coordinator.reload_thresholds().await?))
}

/// GET /api/levels/xp/:xp
pub async fn level_for_xp(
    State(ctx): State<AppContext>,
    Path(xp): Path<u64>,
) -> Result<Json<Level>> {
    Ok(Json(ctx.coordinator.level_for_xp(xp).await?))
}

// ========================================
// Sessions
// ========================================

/// GET /api/session/current
pub async fn current_session(
    State(ctx): State<AppContext>,
) -> Result<Json<CurrentSessionResponse>> {
    let session = ctx.coordinator.current_session().await?;
    Ok(Json(CurrentSessionResponse {
        active: session.is_some(),
        session,
    }))
}

/// POST /api/session/start
pub async fn start_session(State(ctx): State<AppContext>) -> Result<Json<LiveSession>> {
    Ok(Json(ctx.coordinator.go_live().await?))
}

/// POST /api/session/stop
pub async fn stop_session(State(ctx): State<AppContext>) -> Result<Json<LiveSession>> {
    Ok(Json(ctx.coordinator.end_live().await?))
}

/// GET /api/sessions
pub async fn list_sessions(State(ctx): State<AppContext>) -> Result<Json<Vec<LiveSession>>> {
    Ok(Json(ctx.coordinator.list_sessions().await?))
}
