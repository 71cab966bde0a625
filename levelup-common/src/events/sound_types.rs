//! Sound cue types
//!
//! A cue is a request for every connected stage/dashboard to play a sound,
//! resolved against the level catalog before it is published.

use serde::{Deserialize, Serialize};

/// Kind of sound cue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SoundCueKind {
    XpGain,
    Drop,
    BuildUp,
    LevelUp,
    ViewerJoin,
    Transition,
}

impl SoundCueKind {
    /// All cue kinds, in declaration order
    pub const ALL: [SoundCueKind; 6] = [
        SoundCueKind::XpGain,
        SoundCueKind::Drop,
        SoundCueKind::BuildUp,
        SoundCueKind::LevelUp,
        SoundCueKind::ViewerJoin,
        SoundCueKind::Transition,
    ];

    /// SSE event name for this cue
    pub fn event_name(&self) -> &'static str {
        match self {
            SoundCueKind::XpGain => "SoundXpGain",
            SoundCueKind::Drop => "SoundDrop",
            SoundCueKind::BuildUp => "SoundBuildUp",
            SoundCueKind::LevelUp => "SoundLevelUp",
            SoundCueKind::ViewerJoin => "SoundViewerJoin",
            SoundCueKind::Transition => "SoundTransition",
        }
    }
}

/// Optional context attached to a cue
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CueMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viewer_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xp_amount: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_level: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_level: Option<u32>,
}

/// A resolved cue, ready to publish
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoundCue {
    pub kind: SoundCueKind,
    pub sound_path: String,
    /// Catalog id of the level whose configuration was used
    pub level_id: Option<String>,
    #[serde(default)]
    pub metadata: CueMetadata,
}
