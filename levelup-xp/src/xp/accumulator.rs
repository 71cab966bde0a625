//! XP accumulator
//!
//! Holds the live XP state, the combo tracker, the session history and the
//! threshold table it levels against. Every operation takes `now` so the
//! caller controls the clock.

use chrono::{DateTime, Utc};
use levelup_common::config::XpConfig;
use levelup_common::events::{CueMetadata, SoundCueKind, XpEvent, XpSource, XpState, XpStatus};
use levelup_common::time::elapsed_minutes;
use tracing::{debug, info};

use super::combo::ComboTracker;
use super::thresholds::ThresholdTable;
use super::AudioTrigger;
use crate::{Error, Result};

/// Sound cue to resolve against the level catalog
#[derive(Debug, Clone, PartialEq)]
pub struct CueRequest {
    pub kind: SoundCueKind,
    /// Level order whose sound configuration applies
    pub level: u32,
    pub metadata: CueMetadata,
}

/// One level crossed
#[derive(Debug, Clone, PartialEq)]
pub struct LevelUpRecord {
    pub new_level: u32,
    pub xp: u64,
    pub state: XpState,
}

/// Result of an XP grant
#[derive(Debug, Clone, PartialEq)]
pub struct GrantOutcome {
    pub base_xp: u64,
    pub final_xp: u64,
    pub multiplier: f64,
    pub combo_count: u32,
    pub status: XpStatus,
    /// Ascending by level
    pub level_ups: Vec<LevelUpRecord>,
    pub cues: Vec<CueRequest>,
}

/// Result of a forced level-up
#[derive(Debug, Clone, PartialEq)]
pub struct LevelUpOutcome {
    pub status: XpStatus,
    pub level_ups: Vec<LevelUpRecord>,
    pub cues: Vec<CueRequest>,
}

#[derive(Debug, Clone)]
pub struct XpAccumulator {
    config: XpConfig,
    table: ThresholdTable,
    current_xp: u64,
    current_level: u32,
    total_xp_earned: u64,
    session_start_time: DateTime<Utc>,
    combo: ComboTracker,
    history: Vec<XpEvent>,
}

impl XpAccumulator {
    /// Fresh session at level 1 with an empty threshold table
    pub fn new(config: XpConfig, now: DateTime<Utc>) -> Self {
        Self {
            combo: ComboTracker::new(&config.multipliers, now),
            config,
            table: ThresholdTable::default(),
            current_xp: 0,
            current_level: 1,
            total_xp_earned: 0,
            session_start_time: now,
            history: Vec::new(),
        }
    }

    pub fn config(&self) -> &XpConfig {
        &self.config
    }

    pub fn thresholds(&self) -> &ThresholdTable {
        &self.table
    }

    /// Swap in a reloaded table
    ///
    /// The current level is kept even if the new table would place it lower.
    pub fn install_thresholds(&mut self, table: ThresholdTable) {
        self.table = table;
    }

    pub fn state(&self) -> XpState {
        XpState {
            current_xp: self.current_xp,
            current_level: self.current_level,
            total_xp_earned: self.total_xp_earned,
            combo_count: self.combo.count(),
            last_event_time: self.combo.last_event_time(),
            session_start_time: self.session_start_time,
        }
    }

    pub fn status(&self) -> XpStatus {
        XpStatus {
            state: self.state(),
            progress: self.level_progress(),
            xp_to_next: self.xp_to_next_level(),
            next_level_threshold: self.table.next_level_threshold(self.current_level),
        }
    }

    /// Progress through the current level, clamped to 0-100
    pub fn level_progress(&self) -> f64 {
        let Some(next) = self.table.next_level_threshold(self.current_level) else {
            return if self.table.is_empty() { 0.0 } else { 100.0 };
        };
        let floor = self.table.current_level_floor(self.current_level) as f64;
        let span = next as f64 - floor;
        if span <= 0.0 {
            return if self.current_xp >= next { 100.0 } else { 0.0 };
        }
        let progress = (self.current_xp as f64 - floor) / span * 100.0;
        progress.clamp(0.0, 100.0)
    }

    /// XP still needed for the next level; 0 at the top
    pub fn xp_to_next_level(&self) -> u64 {
        self.table
            .next_level_threshold(self.current_level)
            .map(|next| next.saturating_sub(self.current_xp))
            .unwrap_or(0)
    }

    pub fn history(&self) -> Vec<XpEvent> {
        self.history.clone()
    }

    /// Grant base XP for an audio trigger
    ///
    /// Plays the trigger's own cue for the level it fired on; the generic
    /// XP gain cue is not played.
    pub fn add_audio_xp(&mut self, trigger: AudioTrigger, now: DateTime<Utc>) -> GrantOutcome {
        let base_xp = match trigger {
            AudioTrigger::Drop => self.config.sources.audio_drop,
            AudioTrigger::BuildUp => self.config.sources.audio_build_up,
        };
        let trigger_cue = CueRequest {
            kind: trigger.cue_kind(),
            level: self.current_level,
            metadata: CueMetadata::default(),
        };

        let mut outcome = self.add_xp(base_xp, trigger.source(), now);
        outcome.cues.insert(0, trigger_cue);
        outcome
    }

    /// Grant manual XP; `None` uses the configured manual amount
    pub fn add_manual_xp(&mut self, amount: Option<u64>, now: DateTime<Utc>) -> GrantOutcome {
        let base_xp = amount.unwrap_or(self.config.sources.manual_trigger);
        self.add_xp(base_xp, XpSource::ManualTrigger, now)
    }

    /// Grant XP without multipliers
    ///
    /// Leaves the combo untouched and plays no level-up cue.
    pub fn add_fixed_xp(&mut self, amount: i64, now: DateTime<Utc>) -> Result<GrantOutcome> {
        if amount <= 0 {
            return Err(Error::InvalidInput(format!(
                "Fixed XP amount must be positive (got {})",
                amount
            )));
        }
        let amount = amount as u64;

        self.current_xp = self.current_xp.saturating_add(amount);
        self.total_xp_earned = self.total_xp_earned.saturating_add(amount);
        self.history.push(XpEvent {
            timestamp: now,
            source: XpSource::Fixed,
            amount,
            multiplier: 1.0,
        });

        let mut level_ups = Vec::new();
        let mut cues = Vec::new();
        self.check_level_up(false, &mut level_ups, &mut cues);

        debug!("+{} XP (fixed)", amount);

        Ok(GrantOutcome {
            base_xp: amount,
            final_xp: amount,
            multiplier: 1.0,
            combo_count: self.combo.count(),
            status: self.status(),
            level_ups,
            cues,
        })
    }

    /// Jump to the next level's threshold
    ///
    /// No-op once the reachable maximum is hit. Cumulative XP never moves
    /// down, even if a reload lowered the threshold below it.
    pub fn force_level_up(&mut self) -> LevelUpOutcome {
        let mut level_ups = Vec::new();
        let mut cues = Vec::new();

        if self.current_level < self.table.reachable_max() {
            if let Some(next) = self.table.next_level_threshold(self.current_level) {
                self.current_xp = self.current_xp.max(next);
                self.check_level_up(true, &mut level_ups, &mut cues);
            }
        }

        LevelUpOutcome {
            status: self.status(),
            level_ups,
            cues,
        }
    }

    /// Back to level 1 with no XP; both clocks restart at `now`
    pub fn reset_session(&mut self, now: DateTime<Utc>) -> XpStatus {
        self.current_xp = 0;
        self.current_level = 1;
        self.total_xp_earned = 0;
        self.session_start_time = now;
        self.combo.reset(now);
        self.history.clear();
        info!("XP session reset");
        self.status()
    }

    /// Expire an idle combo; returns the dropped count
    pub fn sweep_combo(&mut self, now: DateTime<Utc>) -> Option<u32> {
        let decayed = self.combo.sweep(now);
        if let Some(previous) = decayed {
            debug!("Combo decayed from {} to 0", previous);
        }
        decayed
    }

    fn add_xp(&mut self, base_xp: u64, source: XpSource, now: DateTime<Utc>) -> GrantOutcome {
        let combo_multiplier = self.combo.on_event(now);
        let time_bonus = elapsed_minutes(self.session_start_time, now)
            * self.config.multipliers.time_bonus_per_minute;
        let multiplier = combo_multiplier + time_bonus;
        let final_xp = (base_xp as f64 * multiplier).floor() as u64;

        self.current_xp = self.current_xp.saturating_add(final_xp);
        self.total_xp_earned = self.total_xp_earned.saturating_add(final_xp);
        self.history.push(XpEvent {
            timestamp: now,
            source,
            amount: final_xp,
            multiplier,
        });

        let mut cues = Vec::new();
        if source == XpSource::ManualTrigger {
            cues.push(CueRequest {
                kind: SoundCueKind::XpGain,
                level: self.current_level,
                metadata: CueMetadata {
                    xp_amount: Some(final_xp),
                    ..Default::default()
                },
            });
        }

        let mut level_ups = Vec::new();
        self.check_level_up(true, &mut level_ups, &mut cues);

        debug!(
            "+{} XP (base: {}, multiplier: {:.2}x, combo: {}, source: {})",
            final_xp,
            base_xp,
            multiplier,
            self.combo.count(),
            source
        );

        GrantOutcome {
            base_xp,
            final_xp,
            multiplier,
            combo_count: self.combo.count(),
            status: self.status(),
            level_ups,
            cues,
        }
    }

    /// Advance while the next threshold is met
    ///
    /// Bounded by the table's reachable maximum, so at most one iteration per
    /// remaining level.
    fn check_level_up(
        &mut self,
        play_sound: bool,
        level_ups: &mut Vec<LevelUpRecord>,
        cues: &mut Vec<CueRequest>,
    ) {
        while self.current_level < self.table.reachable_max() {
            let Some(next) = self.table.next_level_threshold(self.current_level) else {
                break;
            };
            if self.current_xp < next {
                break;
            }

            let from_level = self.current_level;
            self.current_level += 1;

            if play_sound {
                cues.push(CueRequest {
                    kind: SoundCueKind::LevelUp,
                    level: self.current_level,
                    metadata: CueMetadata {
                        from_level: Some(from_level),
                        to_level: Some(self.current_level),
                        ..Default::default()
                    },
                });
            }

            level_ups.push(LevelUpRecord {
                new_level: self.current_level,
                xp: self.current_xp,
                state: self.state(),
            });

            info!("LEVEL UP! Level {} -> {}", from_level, self.current_level);
        }
    }
}
