//! XP progression engine
//!
//! Pure, clock-injected state machine. The coordinator owns the single
//! instance and turns its outcomes into notifications and sound cues.

pub mod accumulator;
pub mod combo;
pub mod thresholds;

pub use accumulator::{CueRequest, GrantOutcome, LevelUpOutcome, LevelUpRecord, XpAccumulator};
pub use combo::ComboTracker;
pub use thresholds::{ThresholdEntry, ThresholdTable};

use std::str::FromStr;

use levelup_common::events::{SoundCueKind, XpSource};
use serde::{Deserialize, Serialize};

use crate::Error;

/// Audio analysis trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AudioTrigger {
    Drop,
    BuildUp,
}

impl AudioTrigger {
    pub fn source(&self) -> XpSource {
        match self {
            AudioTrigger::Drop => XpSource::AudioDrop,
            AudioTrigger::BuildUp => XpSource::AudioBuildUp,
        }
    }

    /// Trigger-specific cue, played instead of the generic XP gain sound
    pub fn cue_kind(&self) -> SoundCueKind {
        match self {
            AudioTrigger::Drop => SoundCueKind::Drop,
            AudioTrigger::BuildUp => SoundCueKind::BuildUp,
        }
    }
}

impl FromStr for AudioTrigger {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "drop" => Ok(AudioTrigger::Drop),
            "buildUp" => Ok(AudioTrigger::BuildUp),
            other => Err(Error::InvalidTrigger(format!(
                "'{}' (expected 'drop' or 'buildUp')",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_trigger_parse() {
        assert_eq!("drop".parse::<AudioTrigger>().unwrap(), AudioTrigger::Drop);
        assert_eq!(
            "buildUp".parse::<AudioTrigger>().unwrap(),
            AudioTrigger::BuildUp
        );
        assert!(matches!(
            "snare".parse::<AudioTrigger>(),
            Err(Error::InvalidTrigger(_))
        ));
    }
}
