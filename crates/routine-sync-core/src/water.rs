//! Water intake tracking.
//!
//! Intake is kept per calendar date (no rollover hour), in millilitres.
//! Older app builds wrote unprefixed keys, so every read checks the
//! prefixed key first and then the bare one.

use std::fmt::Display;
use std::ops::RangeInclusive;

use chrono::{DateTime, TimeZone};
use serde::Serialize;

use crate::day::calendar_date_key;
use crate::prefs::{keys, PrefEdit, PrefStore};
use crate::storage::WaterConfig;

/// Percentages at which the app shows a reminder.
pub const REMINDER_THRESHOLDS: [u32; 5] = [20, 40, 60, 80, 100];

const GOAL_RANGE: RangeInclusive<i64> = 1..=5000;
const AMOUNT_PER_TAP_RANGE: RangeInclusive<i64> = 1..=1000;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WaterStatus {
    pub date: String,
    pub intake_ml: i64,
    pub goal_ml: i64,
    /// Fill fraction in `[0, 1]`.
    pub level: f64,
    pub goal_reached: bool,
    /// Reminder thresholds at or below the current percentage.
    pub thresholds_reached: Vec<u32>,
}

impl WaterStatus {
    fn new(date: String, intake_ml: i64, goal_ml: i64) -> Self {
        let ratio = intake_ml as f64 / goal_ml as f64;
        let percent = (ratio * 100.0) as i64;
        Self {
            date,
            intake_ml,
            goal_ml,
            level: ratio.clamp(0.0, 1.0),
            goal_reached: intake_ml >= goal_ml,
            thresholds_reached: REMINDER_THRESHOLDS
                .into_iter()
                .filter(|t| percent >= i64::from(*t))
                .collect(),
        }
    }

    pub fn percent(&self) -> i64 {
        (self.intake_ml as f64 / self.goal_ml as f64 * 100.0) as i64
    }
}

/// Result of [`WaterTracker::add`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WaterUpdate {
    /// Zero when the goal was already reached or the write failed.
    pub added_ml: i64,
    pub status: WaterStatus,
}

pub struct WaterTracker<S: PrefStore> {
    store: S,
    defaults: WaterConfig,
}

impl<S: PrefStore> WaterTracker<S> {
    pub fn new(store: S, defaults: &WaterConfig) -> Self {
        Self {
            store,
            defaults: defaults.clone(),
        }
    }

    fn read_ranged(&self, key: &str, range: &RangeInclusive<i64>) -> Option<i64> {
        [key, keys::unprefixed(key)]
            .into_iter()
            .filter_map(|k| self.store.get_int(k))
            .find(|v| range.contains(v))
    }

    /// Daily goal in millilitres.
    pub fn goal(&self) -> i64 {
        self.read_ranged(keys::WATER_GOAL, &GOAL_RANGE)
            .unwrap_or(self.defaults.default_goal_ml)
    }

    pub fn amount_per_tap(&self) -> i64 {
        self.read_ranged(keys::WATER_AMOUNT_PER_TAP, &AMOUNT_PER_TAP_RANGE)
            .unwrap_or(self.defaults.default_increment_ml)
    }

    /// Intake for `date_key` and the key it was found under.
    fn intake_entry(&self, date_key: &str) -> (String, i64) {
        let [prefixed, bare] = keys::water_intake(date_key);
        for key in [&prefixed, &bare] {
            if let Some(amount) = self.store.get_int(key).filter(|v| *v >= 0) {
                return (key.clone(), amount);
            }
        }
        (prefixed, 0)
    }

    pub fn status<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> WaterStatus
    where
        Tz::Offset: Display,
    {
        let date = calendar_date_key(now);
        let (_, intake) = self.intake_entry(&date);
        WaterStatus::new(date, intake, self.goal())
    }

    /// Add one tap's worth of water unless today's goal is already met.
    pub fn add<Tz: TimeZone>(&mut self, now: &DateTime<Tz>) -> WaterUpdate
    where
        Tz::Offset: Display,
    {
        let date = calendar_date_key(now);
        let goal = self.goal();
        let (key, intake) = self.intake_entry(&date);

        if intake >= goal {
            tracing::debug!(intake, goal, "water goal already reached");
            return WaterUpdate {
                added_ml: 0,
                status: WaterStatus::new(date, intake, goal),
            };
        }

        let increment = self.amount_per_tap();
        let updated = intake + increment;
        let edits = vec![
            PrefEdit::put(key, updated),
            PrefEdit::put(keys::WATER_LAST_RESET_DATE, date.clone()),
        ];
        if let Err(e) = self.store.apply(edits) {
            tracing::error!(error = %e, "failed to record water intake");
            return WaterUpdate {
                added_ml: 0,
                status: WaterStatus::new(date, intake, goal),
            };
        }

        tracing::info!(intake = updated, goal, "water intake recorded");
        WaterUpdate {
            added_ml: increment,
            status: WaterStatus::new(date, updated, goal),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prefs::MemoryStore;
    use chrono::Utc;

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap()
    }

    fn tracker(store: MemoryStore) -> WaterTracker<MemoryStore> {
        WaterTracker::new(store, &WaterConfig::default())
    }

    #[test]
    fn defaults_apply_when_nothing_is_stored() {
        let water = tracker(MemoryStore::new());
        assert_eq!(water.goal(), 1500);
        assert_eq!(water.amount_per_tap(), 125);
        let status = water.status(&noon());
        assert_eq!(status.intake_ml, 0);
        assert_eq!(status.date, "2024-03-10");
        assert!(status.thresholds_reached.is_empty());
    }

    #[test]
    fn out_of_range_settings_fall_through_to_bare_key_then_default() {
        let water = tracker(
            MemoryStore::new()
                .with(keys::WATER_GOAL, 0)
                .with("water_goal", 2000)
                .with(keys::WATER_AMOUNT_PER_TAP, 5000),
        );
        assert_eq!(water.goal(), 2000);
        assert_eq!(water.amount_per_tap(), 125);
    }

    #[test]
    fn add_writes_back_under_the_key_it_read() {
        let mut store = MemoryStore::new().with("water_2024-03-10", 250);
        let update = WaterTracker::new(&mut store, &WaterConfig::default()).add(&noon());
        assert_eq!(update.added_ml, 125);
        assert_eq!(update.status.intake_ml, 375);
        assert_eq!(store.get_int("water_2024-03-10"), Some(375));
        assert!(!store.contains("flutter.water_2024-03-10"));
        assert_eq!(
            store.get_string(keys::WATER_LAST_RESET_DATE).as_deref(),
            Some("2024-03-10")
        );
    }

    #[test]
    fn add_is_a_no_op_once_goal_is_met() {
        let mut store = MemoryStore::new()
            .with(keys::WATER_GOAL, 1000)
            .with("flutter.water_2024-03-10", 1000);
        let update = WaterTracker::new(&mut store, &WaterConfig::default()).add(&noon());
        assert_eq!(update.added_ml, 0);
        assert!(update.status.goal_reached);
        assert_eq!(update.status.thresholds_reached, REMINDER_THRESHOLDS.to_vec());
        assert!(!store.contains(keys::WATER_LAST_RESET_DATE));
    }

    #[test]
    fn level_is_clamped_and_thresholds_follow_percent() {
        let status = WaterStatus::new("d".into(), 650, 1000);
        assert_eq!(status.percent(), 65);
        assert_eq!(status.thresholds_reached, vec![20, 40, 60]);
        assert!((status.level - 0.65).abs() < 1e-9);

        let over = WaterStatus::new("d".into(), 1800, 1500);
        assert_eq!(over.level, 1.0);
        assert!(over.goal_reached);
    }

    #[test]
    fn negative_intake_is_ignored() {
        let water = tracker(MemoryStore::new().with("flutter.water_2024-03-10", -5));
        assert_eq!(water.status(&noon()).intake_ml, 0);
    }
}
