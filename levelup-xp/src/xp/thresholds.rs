//! Level threshold table
//!
//! Thresholds are cumulative: the stored value for order N is the total XP
//! needed to reach level N. The table is rebuilt wholesale on every reload.

use std::collections::BTreeMap;

use levelup_common::models::Level;
use serde::Serialize;
use tracing::warn;

/// Snapshot of the level catalog's thresholds
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThresholdTable {
    thresholds: BTreeMap<u32, u64>,
    max_level: u32,
    reachable_max: u32,
}

/// One row of the table, as served to the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ThresholdEntry {
    pub order: u32,
    pub xp_threshold: u64,
}

impl ThresholdTable {
    /// Build the table from catalog records
    ///
    /// Gaps and inversions are logged once here and cap progression at the
    /// last level before the defect.
    pub fn from_levels(levels: &[Level]) -> Self {
        let mut thresholds = BTreeMap::new();
        for level in levels {
            if thresholds.insert(level.order, level.xp_threshold).is_some() {
                warn!("Duplicate level order {} in catalog, last one wins", level.order);
            }
        }

        let max_level = u32::try_from(levels.len()).unwrap_or(u32::MAX);
        let reachable_max = Self::contiguous_prefix(&thresholds);

        if levels.is_empty() {
            warn!("Level catalog is empty, progression is capped at level 1");
        } else if reachable_max < max_level {
            warn!(
                "Level thresholds have a gap or inversion after level {}; progression is capped there ({} levels loaded)",
                reachable_max, max_level
            );
        }

        Self {
            thresholds,
            max_level,
            reachable_max,
        }
    }

    /// Last order of the run 1, 2, 3... whose thresholds never decrease
    fn contiguous_prefix(thresholds: &BTreeMap<u32, u64>) -> u32 {
        let mut reachable = 0;
        let mut previous = 0;
        for (&order, &threshold) in thresholds {
            if order != reachable + 1 || threshold < previous {
                break;
            }
            reachable = order;
            previous = threshold;
        }
        reachable
    }

    pub fn is_empty(&self) -> bool {
        self.thresholds.is_empty()
    }

    /// Number of levels in the catalog
    pub fn max_level(&self) -> u32 {
        self.max_level
    }

    /// Highest level the level-up check will advance to
    pub fn reachable_max(&self) -> u32 {
        self.reachable_max
    }

    pub fn threshold(&self, order: u32) -> Option<u64> {
        self.thresholds.get(&order).copied()
    }

    /// Lower bound used for progress: threshold of `level - 1`, 0 for level 1
    pub fn current_level_floor(&self, level: u32) -> u64 {
        if level <= 1 {
            return 0;
        }
        self.threshold(level - 1).unwrap_or(0)
    }

    /// Threshold of `level + 1`, or None when no higher level can be reached
    pub fn next_level_threshold(&self, level: u32) -> Option<u64> {
        if level >= self.max_level {
            return None;
        }
        self.threshold(level + 1)
    }

    /// Highest level whose threshold is at most `xp`
    ///
    /// Scans in order and stops at the first threshold above `xp`. Always at
    /// least 1.
    pub fn level_for_xp(&self, xp: u64) -> u32 {
        let mut level = 1;
        for (&order, &threshold) in &self.thresholds {
            if xp >= threshold {
                level = order;
            } else {
                break;
            }
        }
        level.max(1)
    }

    pub fn entries(&self) -> Vec<ThresholdEntry> {
        self.thresholds
            .iter()
            .map(|(&order, &xp_threshold)| ThresholdEntry {
                order,
                xp_threshold,
            })
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use levelup_common::models::LevelSounds;

    pub(crate) fn levels(thresholds: &[(u32, u64)]) -> Vec<Level> {
        thresholds
            .iter()
            .map(|&(order, xp_threshold)| Level {
                id: format!("level-{}", order),
                order,
                name: format!("Level {}", order),
                xp_threshold,
                sounds: LevelSounds::default(),
            })
            .collect()
    }

    #[test]
    fn test_floor_and_next() {
        let table = ThresholdTable::from_levels(&levels(&[(1, 0), (2, 100), (3, 250)]));

        assert_eq!(table.max_level(), 3);
        assert_eq!(table.reachable_max(), 3);
        assert_eq!(table.current_level_floor(1), 0);
        assert_eq!(table.current_level_floor(2), 0);
        assert_eq!(table.current_level_floor(3), 100);
        assert_eq!(table.next_level_threshold(1), Some(100));
        assert_eq!(table.next_level_threshold(2), Some(250));
        assert_eq!(table.next_level_threshold(3), None);
    }

    #[test]
    fn test_empty_table() {
        let table = ThresholdTable::from_levels(&[]);
        assert!(table.is_empty());
        assert_eq!(table.max_level(), 0);
        assert_eq!(table.reachable_max(), 0);
        assert_eq!(table.next_level_threshold(1), None);
        assert_eq!(table.level_for_xp(10_000), 1);
    }

    #[test]
    fn test_inversion_caps_reachable_max() {
        let table = ThresholdTable::from_levels(&levels(&[(1, 0), (2, 300), (3, 200), (4, 400)]));
        assert_eq!(table.max_level(), 4);
        assert_eq!(table.reachable_max(), 2);
    }

    #[test]
    fn test_gap_caps_reachable_max() {
        let table = ThresholdTable::from_levels(&levels(&[(1, 0), (2, 100), (4, 400)]));
        assert_eq!(table.max_level(), 3);
        assert_eq!(table.reachable_max(), 2);
        assert_eq!(table.next_level_threshold(2), None);
    }

    #[test]
    fn test_level_for_xp() {
        let table = ThresholdTable::from_levels(&levels(&[(1, 0), (2, 100), (3, 250)]));
        assert_eq!(table.level_for_xp(0), 1);
        assert_eq!(table.level_for_xp(99), 1);
        assert_eq!(table.level_for_xp(100), 2);
        assert_eq!(table.level_for_xp(9_999), 3);
    }

    #[test]
    fn test_entries_are_ordered() {
        let table = ThresholdTable::from_levels(&levels(&[(2, 100), (1, 0)]));
        let orders: Vec<u32> = table.entries().iter().map(|e| e.order).collect();
        assert_eq!(orders, vec![1, 2]);
    }
}
