//! XP coordinator
//!
//! Owns the single [`XpAccumulator`] behind one async mutex. Every mutation
//! runs to completion under the lock and broadcasts its notifications before
//! releasing it, so subscribers see `XpAdded` then `LevelUp`s in level order
//! for each trigger. Sound cues are resolved on detached tasks.

use std::collections::BTreeMap;
use std::sync::{Arc, Weak};
use std::time::Duration;

use levelup_common::config::XpConfig;
use levelup_common::events::{CueMetadata, LiveEvent, SoundCueKind, XpEvent, XpState, XpStatus};
use levelup_common::models::{Level, LiveSession};
use levelup_common::time::{elapsed_seconds, now};
use serde::Serialize;
use serde_json::json;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::bridge::NotificationBridge;
use crate::catalog::LevelCatalog;
use crate::session::{SessionController, SessionSummary};
use crate::xp::{
    AudioTrigger, CueRequest, GrantOutcome, LevelUpRecord, ThresholdEntry, ThresholdTable,
    XpAccumulator,
};
use crate::{Error, Result};

/// How often idle combos are checked for decay
pub const COMBO_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

/// Threshold table as reported after a load
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThresholdSummary {
    pub level_count: usize,
    pub max_level: u32,
    /// Highest level progression can reach; below `max_level` when the
    /// catalog has a gap or inversion
    pub reachable_max: u32,
    pub thresholds: Vec<ThresholdEntry>,
}

impl ThresholdSummary {
    fn of(table: &ThresholdTable) -> Self {
        Self {
            level_count: table.entries().len(),
            max_level: table.max_level(),
            reachable_max: table.reachable_max(),
            thresholds: table.entries(),
        }
    }
}

pub struct XpCoordinator {
    config: XpConfig,
    accumulator: Mutex<XpAccumulator>,
    levels: Arc<dyn LevelCatalog>,
    sessions: SessionController,
    bridge: NotificationBridge,
}

impl XpCoordinator {
    pub fn new(
        config: XpConfig,
        levels: Arc<dyn LevelCatalog>,
        sessions: SessionController,
        bridge: NotificationBridge,
    ) -> Self {
        Self {
            accumulator: Mutex::new(XpAccumulator::new(config, now())),
            config,
            levels,
            sessions,
            bridge,
        }
    }

    pub fn config(&self) -> XpConfig {
        self.config
    }

    pub fn bridge(&self) -> &NotificationBridge {
        &self.bridge
    }

    // ========================================
    // Thresholds
    // ========================================

    /// Fetch the level catalog and install its thresholds
    ///
    /// The fetch happens outside the lock; on failure the current table is
    /// kept and the error returned.
    pub async fn load_thresholds(&self) -> Result<ThresholdSummary> {
        let levels = self.levels.all_levels().await?;
        let table = ThresholdTable::from_levels(&levels);
        let summary = ThresholdSummary::of(&table);

        self.accumulator.lock().await.install_thresholds(table);
        info!(
            "Loaded {} level thresholds (max level {})",
            summary.level_count, summary.max_level
        );

        Ok(summary)
    }

    /// Reload thresholds after a catalog edit and tell subscribers
    pub async fn reload_thresholds(&self) -> Result<ThresholdSummary> {
        let summary = self.load_thresholds().await?;
        self.bridge.notify(LiveEvent::LevelsChanged {
            level_count: summary.level_count,
            max_level: summary.reachable_max,
            timestamp: now(),
        });
        Ok(summary)
    }

    pub async fn thresholds(&self) -> ThresholdSummary {
        ThresholdSummary::of(self.accumulator.lock().await.thresholds())
    }

    /// Catalog level that `xp` total XP corresponds to
    pub async fn level_for_xp(&self, xp: u64) -> Result<Level> {
        let order = self.accumulator.lock().await.thresholds().level_for_xp(xp);
        self.levels
            .level_by_order(order)
            .await?
            .ok_or_else(|| Error::NotFound(format!("No level for {} XP", xp)))
    }

    // ========================================
    // Queries
    // ========================================

    pub async fn state(&self) -> XpState {
        self.accumulator.lock().await.state()
    }

    pub async fn status(&self) -> XpStatus {
        self.accumulator.lock().await.status()
    }

    pub async fn history(&self) -> Vec<XpEvent> {
        self.accumulator.lock().await.history()
    }

    // ========================================
    // Triggers
    // ========================================

    pub async fn add_audio_xp(&self, trigger: AudioTrigger) -> XpStatus {
        let mut acc = self.accumulator.lock().await;
        let outcome = acc.add_audio_xp(trigger, now());
        self.publish_grant(outcome)
    }

    pub async fn add_manual_xp(&self, amount: Option<u64>) -> XpStatus {
        let mut acc = self.accumulator.lock().await;
        let outcome = acc.add_manual_xp(amount, now());
        self.publish_grant(outcome)
    }

    pub async fn add_fixed_xp(&self, amount: i64) -> Result<XpStatus> {
        let mut acc = self.accumulator.lock().await;
        let outcome = acc.add_fixed_xp(amount, now())?;
        Ok(self.publish_grant(outcome))
    }

    pub async fn force_level_up(&self) -> XpStatus {
        let mut acc = self.accumulator.lock().await;
        let outcome = acc.force_level_up();
        if outcome.level_ups.is_empty() {
            debug!("Forced level-up ignored at max level");
        }
        self.publish_level_ups(outcome.level_ups);
        self.bridge.fire(outcome.cues);
        outcome.status
    }

    pub async fn reset_session(&self) -> XpStatus {
        let mut acc = self.accumulator.lock().await;
        let status = acc.reset_session(now());
        self.bridge.notify(LiveEvent::SessionReset {
            status,
            timestamp: now(),
        });
        status
    }

    /// Decay an idle combo; returns the count that expired
    pub async fn sweep_combo(&self) -> Option<u32> {
        let mut acc = self.accumulator.lock().await;
        let previous = acc.sweep_combo(now())?;
        self.bridge.notify(LiveEvent::ComboDecay {
            combo_count: 0,
            previous_combo: previous,
            timestamp: now(),
        });
        Some(previous)
    }

    /// Play the viewer-join sound for the current level
    pub async fn viewer_join(&self, viewer_name: Option<String>) {
        let level = self.accumulator.lock().await.state().current_level;
        self.bridge.fire(vec![CueRequest {
            kind: SoundCueKind::ViewerJoin,
            level,
            metadata: CueMetadata {
                viewer_name,
                ..Default::default()
            },
        }]);
    }

    /// Play the target level's transition sound, if it has one
    pub fn transition(&self, from_level: u32, to_level: u32) {
        self.bridge.fire(vec![CueRequest {
            kind: SoundCueKind::Transition,
            level: to_level,
            metadata: CueMetadata {
                from_level: Some(from_level),
                to_level: Some(to_level),
                ..Default::default()
            },
        }]);
    }

    fn publish_grant(&self, outcome: GrantOutcome) -> XpStatus {
        let timestamp = now();
        self.bridge.notify(LiveEvent::XpAdded {
            xp: outcome.final_xp,
            base_xp: outcome.base_xp,
            multiplier: outcome.multiplier,
            combo_count: outcome.combo_count,
            status: outcome.status,
            timestamp,
        });
        self.publish_level_ups(outcome.level_ups);
        self.bridge.fire(outcome.cues);
        outcome.status
    }

    fn publish_level_ups(&self, level_ups: Vec<LevelUpRecord>) {
        for level_up in level_ups {
            self.bridge.notify(LiveEvent::LevelUp {
                new_level: level_up.new_level,
                xp: level_up.xp,
                state: level_up.state,
                timestamp: now(),
            });
        }
    }

    // ========================================
    // Live sessions
    // ========================================

    /// Start a live session and reset XP for it
    ///
    /// A session still running is closed first with the current XP summary.
    pub async fn go_live(&self) -> Result<LiveSession> {
        if self.sessions.is_active().await {
            if let Err(e) = self.end_live().await {
                warn!("Failed to end running session before going live: {}", e);
            }
        }

        let session = self.sessions.start_session(now()).await?;
        self.reset_session().await;
        self.bridge.notify(LiveEvent::SessionStarted {
            session_id: session.id.clone(),
            timestamp: now(),
        });

        Ok(session)
    }

    /// Stop the live session with the accumulator's level and total XP
    pub async fn end_live(&self) -> Result<LiveSession> {
        let summary = {
            let acc = self.accumulator.lock().await;
            let state = acc.state();
            SessionSummary {
                final_level: state.current_level,
                total_xp: state.total_xp_earned,
                metrics_json: Some(history_metrics(&acc.history()).to_string()),
            }
        };

        let stopped_at = now();
        let session = self.sessions.stop_session(summary, stopped_at).await?;
        self.bridge.notify(LiveEvent::SessionStopped {
            session_id: session.id.clone(),
            final_level: session.final_level.unwrap_or(1),
            total_xp: session.total_xp.unwrap_or(0),
            duration_seconds: session
                .total_duration
                .unwrap_or_else(|| elapsed_seconds(session.started_at, stopped_at)),
            timestamp: stopped_at,
        });

        Ok(session)
    }

    pub async fn is_live(&self) -> bool {
        self.sessions.is_active().await
    }

    pub async fn current_session(&self) -> Result<Option<LiveSession>> {
        self.sessions.current_session().await
    }

    pub async fn list_sessions(&self) -> Result<Vec<LiveSession>> {
        self.sessions.list_sessions().await
    }

    // ========================================
    // Background tasks
    // ========================================

    /// Run the combo decay sweep until the coordinator is dropped
    pub fn spawn_combo_sweep(self: &Arc<Self>, period: Duration) -> JoinHandle<()> {
        let coordinator: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(coordinator) = coordinator.upgrade() else {
                    debug!("Coordinator dropped, stopping combo sweep");
                    break;
                };
                coordinator.sweep_combo().await;
            }
        })
    }
}

/// Per-source totals stored with a finished session
fn history_metrics(history: &[XpEvent]) -> serde_json::Value {
    let mut by_source: BTreeMap<&'static str, (u64, u64)> = BTreeMap::new();
    for event in history {
        let entry = by_source.entry(event.source.as_str()).or_default();
        entry.0 += 1;
        entry.1 += event.amount;
    }

    let by_source: serde_json::Map<String, serde_json::Value> = by_source
        .into_iter()
        .map(|(source, (count, xp))| (source.to_string(), json!({ "count": count, "xp": xp })))
        .collect();

    json!({
        "events": history.len(),
        "by_source": by_source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use levelup_common::events::XpSource;

    #[test]
    fn test_history_metrics_groups_by_source() {
        let event = |source, amount| XpEvent {
            timestamp: Utc::now(),
            source,
            amount,
            multiplier: 1.0,
        };
        let history = vec![
            event(XpSource::AudioDrop, 2),
            event(XpSource::AudioDrop, 3),
            event(XpSource::Fixed, 50),
        ];

        let metrics = history_metrics(&history);
        assert_eq!(metrics["events"], 3);
        assert_eq!(metrics["by_source"]["audioDrop"]["count"], 2);
        assert_eq!(metrics["by_source"]["audioDrop"]["xp"], 5);
        assert_eq!(metrics["by_source"]["fixed"]["xp"], 50);
        assert!(metrics["by_source"].get("manualTrigger").is_none());
    }
}
