//! Collaborator traits for the level and session catalogs
//!
//! The coordinator only talks to storage through these seams, so tests can
//! swap in in-memory fakes and the binary uses the SQLite implementations in
//! [`crate::db`].

use async_trait::async_trait;
use levelup_common::models::{Level, LiveSession};

use crate::Result;

/// Read-only access to level definitions
#[async_trait]
pub trait LevelCatalog: Send + Sync {
    /// All levels, ascending by order
    async fn all_levels(&self) -> Result<Vec<Level>>;

    /// Level with the given 1-based order, if any
    async fn level_by_order(&self, order: u32) -> Result<Option<Level>>;
}

/// Persistence for live session records
#[async_trait]
pub trait SessionCatalog: Send + Sync {
    async fn create_session(&self, session: &LiveSession) -> Result<()>;

    /// Overwrite the summary fields of an existing session
    async fn update_session(&self, session: &LiveSession) -> Result<()>;

    async fn session_by_id(&self, id: &str) -> Result<Option<LiveSession>>;

    /// All sessions, newest first
    async fn all_sessions(&self) -> Result<Vec<LiveSession>>;
}
