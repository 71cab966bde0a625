//! Live session lifecycle
//!
//! Tracks the one active session and writes its start and summary records
//! through the [`SessionCatalog`]. Nothing here touches XP state.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use levelup_common::models::LiveSession;
use levelup_common::time::elapsed_seconds;
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use crate::catalog::SessionCatalog;
use crate::{Error, Result};

/// Summary written when a session stops
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSummary {
    pub final_level: u32,
    pub total_xp: u64,
    pub metrics_json: Option<String>,
}

#[derive(Debug, Clone)]
struct ActiveSession {
    id: String,
    started_at: DateTime<Utc>,
}

pub struct SessionController {
    catalog: Arc<dyn SessionCatalog>,
    active: Mutex<Option<ActiveSession>>,
}

impl SessionController {
    pub fn new(catalog: Arc<dyn SessionCatalog>) -> Self {
        Self {
            catalog,
            active: Mutex::new(None),
        }
    }

    pub async fn is_active(&self) -> bool {
        self.active.lock().await.is_some()
    }

    pub async fn current_session_id(&self) -> Option<String> {
        self.active.lock().await.as_ref().map(|s| s.id.clone())
    }

    /// Start a new session, closing any running one first
    ///
    /// A session that is still open is closed with a minimal summary
    /// (level 1, no XP). Failure to close it is logged and ignored.
    pub async fn start_session(&self, now: DateTime<Utc>) -> Result<LiveSession> {
        let mut active = self.active.lock().await;

        if let Some(previous) = active.take() {
            let summary = SessionSummary {
                final_level: 1,
                ..Default::default()
            };
            if let Err(e) = self.persist_stop(&previous, &summary, now).await {
                warn!("Failed to close previous session {}: {}", previous.id, e);
            }
        }

        let session = LiveSession::started(Uuid::new_v4().to_string(), now);
        self.catalog.create_session(&session).await?;

        *active = Some(ActiveSession {
            id: session.id.clone(),
            started_at: now,
        });
        info!("Live session started: {}", session.id);

        Ok(session)
    }

    /// Stop the active session and persist its summary
    ///
    /// The session stays active if the write fails.
    pub async fn stop_session(
        &self,
        summary: SessionSummary,
        now: DateTime<Utc>,
    ) -> Result<LiveSession> {
        let mut active = self.active.lock().await;
        let current = active.clone().ok_or(Error::NoActiveSession)?;

        let stored = self.persist_stop(&current, &summary, now).await?;
        *active = None;
        info!(
            "Live session stopped: {} (level {}, {} XP, {}s)",
            stored.id,
            summary.final_level,
            summary.total_xp,
            stored.total_duration.unwrap_or(0)
        );

        Ok(stored)
    }

    async fn persist_stop(
        &self,
        current: &ActiveSession,
        summary: &SessionSummary,
        now: DateTime<Utc>,
    ) -> Result<LiveSession> {
        let session = LiveSession {
            id: current.id.clone(),
            started_at: current.started_at,
            ended_at: Some(now),
            total_duration: Some(elapsed_seconds(current.started_at, now)),
            final_level: Some(summary.final_level),
            total_xp: Some(summary.total_xp),
            metrics_json: summary.metrics_json.clone(),
        };
        self.catalog.update_session(&session).await?;

        Ok(self
            .catalog
            .session_by_id(&session.id)
            .await?
            .unwrap_or(session))
    }

    /// Record for the active session, if any
    pub async fn current_session(&self) -> Result<Option<LiveSession>> {
        let id = match self.current_session_id().await {
            Some(id) => id,
            None => return Ok(None),
        };
        self.catalog.session_by_id(&id).await
    }

    /// All sessions, newest first
    pub async fn list_sessions(&self) -> Result<Vec<LiveSession>> {
        self.catalog.all_sessions().await
    }
}
