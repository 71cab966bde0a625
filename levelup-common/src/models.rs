//! Domain models shared between the catalogs and the XP coordinator

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::events::SoundCueKind;

/// Per-level sound configuration
///
/// Empty strings mean "not configured"; cue resolution then falls back to
/// the default asset for that cue type. camelCase keys written by the level
/// editor are accepted as aliases.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelSounds {
    #[serde(default, alias = "xpGain")]
    pub xp_gain: String,
    #[serde(default)]
    pub drop: String,
    #[serde(default, alias = "buildUp")]
    pub build_up: String,
    #[serde(default, alias = "levelUp")]
    pub level_up: String,
    #[serde(default, alias = "viewerJoin")]
    pub viewer_join: String,
    #[serde(default)]
    pub transition: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ambient: Option<String>,
}

impl LevelSounds {
    /// Configured path for a cue, or None when blank
    pub fn path_for(&self, kind: SoundCueKind) -> Option<&str> {
        let path = match kind {
            SoundCueKind::XpGain => &self.xp_gain,
            SoundCueKind::Drop => &self.drop,
            SoundCueKind::BuildUp => &self.build_up,
            SoundCueKind::LevelUp => &self.level_up,
            SoundCueKind::ViewerJoin => &self.viewer_join,
            SoundCueKind::Transition => &self.transition,
        };
        let trimmed = path.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    }
}

/// Level catalog record
///
/// The coordinator only reads levels; editing happens elsewhere and is
/// followed by a threshold reload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Level {
    pub id: String,
    /// 1-based position in the progression
    pub order: u32,
    pub name: String,
    /// Cumulative XP required to reach this level
    pub xp_threshold: u64,
    #[serde(default)]
    pub sounds: LevelSounds,
}

/// Live session record as stored in the session catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveSession {
    pub id: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    /// Duration in whole seconds
    pub total_duration: Option<i64>,
    pub final_level: Option<u32>,
    pub total_xp: Option<u64>,
    pub metrics_json: Option<String>,
}

impl LiveSession {
    /// A freshly started session with no summary yet
    pub fn started(id: String, started_at: DateTime<Utc>) -> Self {
        Self {
            id,
            started_at,
            ended_at: None,
            total_duration: None,
            final_level: None,
            total_xp: None,
            metrics_json: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.ended_at.is_none()
    }
}
