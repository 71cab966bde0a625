//! Combo tracking
//!
//! Consecutive triggers inside the decay window ramp the combo multiplier by
//! 0.1 per step up to `combo_max`.

use chrono::{DateTime, Utc};
use levelup_common::config::XpMultipliers;
use levelup_common::time::millis_to_duration;

const COMBO_STEP: f64 = 0.1;

#[derive(Debug, Clone)]
pub struct ComboTracker {
    count: u32,
    last_event_time: DateTime<Utc>,
    combo_max: f64,
    decay: chrono::Duration,
}

impl ComboTracker {
    pub fn new(multipliers: &XpMultipliers, now: DateTime<Utc>) -> Self {
        Self {
            count: 0,
            last_event_time: now,
            combo_max: multipliers.combo_max,
            decay: millis_to_duration(multipliers.combo_decay_ms),
        }
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn last_event_time(&self) -> DateTime<Utc> {
        self.last_event_time
    }

    /// `min(1 + count * 0.1, combo_max)`
    pub fn multiplier(&self) -> f64 {
        (1.0 + self.count as f64 * COMBO_STEP).min(self.combo_max)
    }

    fn expired(&self, now: DateTime<Utc>) -> bool {
        now - self.last_event_time > self.decay
    }

    /// Register a trigger and return the multiplier it earns
    ///
    /// The multiplier reflects the combo built up before this trigger; the
    /// count then advances.
    pub fn on_event(&mut self, now: DateTime<Utc>) -> f64 {
        if self.expired(now) {
            self.count = 0;
        }
        let multiplier = self.multiplier();
        self.count = self.count.saturating_add(1);
        self.last_event_time = now;
        multiplier
    }

    /// Expire an idle combo
    ///
    /// Returns the count that was dropped, or None when nothing decayed.
    pub fn sweep(&mut self, now: DateTime<Utc>) -> Option<u32> {
        if self.count > 0 && self.expired(now) {
            let previous = self.count;
            self.count = 0;
            Some(previous)
        } else {
            None
        }
    }

    pub fn reset(&mut self, now: DateTime<Utc>) {
        self.count = 0;
        self.last_event_time = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn tracker(now: DateTime<Utc>) -> ComboTracker {
        ComboTracker::new(&XpMultipliers::default(), now)
    }

    #[test]
    fn test_ramp_within_window() {
        let t0 = Utc::now();
        let mut combo = tracker(t0);

        assert_eq!(combo.on_event(t0), 1.0);
        assert!((combo.on_event(t0 + Duration::milliseconds(300)) - 1.1).abs() < 1e-9);
        assert!((combo.on_event(t0 + Duration::milliseconds(600)) - 1.2).abs() < 1e-9);
        assert_eq!(combo.count(), 3);
    }

    #[test]
    fn test_multiplier_is_capped() {
        let t0 = Utc::now();
        let mut combo = tracker(t0);
        for i in 0..30 {
            combo.on_event(t0 + Duration::milliseconds(i * 10));
        }
        assert_eq!(combo.multiplier(), 2.0);
    }

    #[test]
    fn test_gap_resets_before_increment() {
        let t0 = Utc::now();
        let mut combo = tracker(t0);
        combo.on_event(t0);
        combo.on_event(t0 + Duration::seconds(1));

        let multiplier = combo.on_event(t0 + Duration::seconds(7));
        assert_eq!(multiplier, 1.0);
        assert_eq!(combo.count(), 1);
    }

    #[test]
    fn test_gap_equal_to_window_keeps_combo() {
        let t0 = Utc::now();
        let mut combo = tracker(t0);
        combo.on_event(t0);
        combo.on_event(t0 + Duration::milliseconds(5000));
        assert_eq!(combo.count(), 2);
    }

    #[test]
    fn test_sweep_reports_once() {
        let t0 = Utc::now();
        let mut combo = tracker(t0);
        combo.on_event(t0);
        combo.on_event(t0);

        assert_eq!(combo.sweep(t0 + Duration::seconds(2)), None);
        assert_eq!(combo.sweep(t0 + Duration::seconds(6)), Some(2));
        assert_eq!(combo.sweep(t0 + Duration::seconds(7)), None);
        assert_eq!(combo.count(), 0);
    }
}
