//! Live session persistence over the `live_sessions` table

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use levelup_common::models::LiveSession;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

use crate::catalog::SessionCatalog;
use crate::{Error, Result};

#[derive(Clone)]
pub struct SqliteSessionCatalog {
    pool: SqlitePool,
}

impl SqliteSessionCatalog {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionCatalog for SqliteSessionCatalog {
    async fn create_session(&self, session: &LiveSession) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO live_sessions (
                id, started_at, ended_at, total_duration, final_level, total_xp, metrics_json
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&session.id)
        .bind(format_timestamp(session.started_at))
        .bind(session.ended_at.map(format_timestamp))
        .bind(session.total_duration)
        .bind(session.final_level.map(|l| l as i64))
        .bind(session.total_xp.map(|xp| xp as i64))
        .bind(&session.metrics_json)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_session(&self, session: &LiveSession) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE live_sessions SET
                ended_at = ?, total_duration = ?, final_level = ?, total_xp = ?, metrics_json = ?
            WHERE id = ?
            "#,
        )
        .bind(session.ended_at.map(format_timestamp))
        .bind(session.total_duration)
        .bind(session.final_level.map(|l| l as i64))
        .bind(session.total_xp.map(|xp| xp as i64))
        .bind(&session.metrics_json)
        .bind(&session.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("Session {}", session.id)));
        }

        Ok(())
    }

    async fn session_by_id(&self, id: &str) -> Result<Option<LiveSession>> {
        let row = sqlx::query(
            r#"
            SELECT id, started_at, ended_at, total_duration, final_level, total_xp, metrics_json
            FROM live_sessions
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(session_from_row).transpose()
    }

    async fn all_sessions(&self) -> Result<Vec<LiveSession>> {
        let rows = sqlx::query(
            r#"
            SELECT id, started_at, ended_at, total_duration, final_level, total_xp, metrics_json
            FROM live_sessions
            ORDER BY started_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(session_from_row).collect()
    }
}

/// Fixed-precision RFC 3339 so `ORDER BY started_at` sorts chronologically
fn format_timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(field: &str, value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Catalog(format!("Failed to parse {}: {}", field, e)))
}

fn session_from_row(row: &SqliteRow) -> Result<LiveSession> {
    let started_at: String = row.get("started_at");
    let ended_at: Option<String> = row.get("ended_at");
    let final_level: Option<i64> = row.get("final_level");
    let total_xp: Option<i64> = row.get("total_xp");

    Ok(LiveSession {
        id: row.get("id"),
        started_at: parse_timestamp("started_at", &started_at)?,
        ended_at: ended_at
            .as_deref()
            .map(|s| parse_timestamp("ended_at", s))
            .transpose()?,
        total_duration: row.get("total_duration"),
        final_level: final_level.map(|l| l.max(0) as u32),
        total_xp: total_xp.map(|xp| xp.max(0) as u64),
        metrics_json: row.get("metrics_json"),
    })
}
