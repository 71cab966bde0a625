//! XP progression types carried by events and API responses

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Snapshot of the live XP state
///
/// The coordinator owns the only mutable instance; everything outside it
/// sees copies.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct XpState {
    /// Cumulative XP; never reset on level-up
    pub current_xp: u64,
    pub current_level: u32,
    /// XP earned this session
    pub total_xp_earned: u64,
    pub combo_count: u32,
    pub last_event_time: DateTime<Utc>,
    /// Origin for the time bonus
    pub session_start_time: DateTime<Utc>,
}

impl XpState {
    /// Level 1, no XP, both clocks stamped at `now`
    pub fn zero(now: DateTime<Utc>) -> Self {
        Self {
            current_xp: 0,
            current_level: 1,
            total_xp_earned: 0,
            combo_count: 0,
            last_event_time: now,
            session_start_time: now,
        }
    }
}

/// State plus the derived progress figures the dashboard renders
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct XpStatus {
    #[serde(flatten)]
    pub state: XpState,
    /// Progress through the current level, 0-100
    pub progress: f64,
    pub xp_to_next: u64,
    /// None once the last level is reached
    pub next_level_threshold: Option<u64>,
}

/// Origin of an XP grant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum XpSource {
    AudioDrop,
    AudioBuildUp,
    ManualTrigger,
    /// Unmultiplied grant from test/admin tooling
    Fixed,
}

impl XpSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            XpSource::AudioDrop => "audioDrop",
            XpSource::AudioBuildUp => "audioBuildUp",
            XpSource::ManualTrigger => "manualTrigger",
            XpSource::Fixed => "fixed",
        }
    }
}

impl std::fmt::Display for XpSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Session-scoped XP audit entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XpEvent {
    pub timestamp: DateTime<Utc>,
    pub source: XpSource,
    /// Final (multiplied) XP granted
    pub amount: u64,
    pub multiplier: f64,
}
