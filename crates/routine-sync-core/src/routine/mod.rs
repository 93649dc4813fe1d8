//! Routines and their daily progress.
//!
//! Routine definitions are owned by the companion app and are read-only
//! here. What this module mutates is the per-day progress of a routine,
//! the per-day completion marker and the global override that pins the
//! current routine.
//!
//! ## Components
//!
//! - [`Routine`] / [`RoutineStep`]: lenient view of the app's routine records
//! - [`DayProgress`]: per routine, per effective day step flags
//! - [`RoutineRepository`]: storage contract over a [`PrefStore`](crate::prefs::PrefStore)
//! - [`RoutineTracker`]: current-routine selection, step actions, hand-off

mod progress;
mod repository;
mod tracker;

pub use progress::{DayProgress, ProgressCounts, StepAction, StepState};
pub use repository::RoutineRepository;
pub use tracker::{RoutineHandoff, RoutineTracker, RoutineView, StepOutcome};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Title shown when a routine record has none.
pub const DEFAULT_TITLE: &str = "Morning Routine";

/// One step of a routine. Its identity is its position in `items`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutineStep {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Routine {
    pub id: String,
    pub title: String,
    /// Weekdays the routine is scheduled on, 1 = Monday .. 7 = Sunday.
    pub active_days: Vec<u8>,
    pub items: Vec<RoutineStep>,
}

impl Routine {
    /// Read a routine from a decoded record.
    ///
    /// Only the top level has to be an object. A missing id yields an empty
    /// id, which the schedule scan ignores; day entries outside 1..=7 are
    /// dropped.
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let id = obj
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let title = obj
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_TITLE)
            .to_string();
        let active_days = obj
            .get("activeDays")
            .and_then(Value::as_array)
            .map(|days| {
                days.iter()
                    .filter_map(Value::as_i64)
                    .filter(|d| (1..=7).contains(d))
                    .map(|d| d as u8)
                    .collect()
            })
            .unwrap_or_default();
        let items = obj
            .get("items")
            .and_then(Value::as_array)
            .map(|items| items.iter().map(RoutineStep::from_value).collect())
            .unwrap_or_default();

        Some(Self {
            id,
            title,
            active_days,
            items,
        })
    }

    pub fn is_active_on(&self, weekday: u8) -> bool {
        self.active_days.contains(&weekday)
    }

    pub fn step(&self, index: usize) -> Option<&RoutineStep> {
        self.items.get(index)
    }
}

impl RoutineStep {
    fn from_value(value: &Value) -> Self {
        let text = match value {
            Value::Object(obj) => obj
                .get("text")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            Value::String(s) => s.clone(),
            _ => String::new(),
        };
        Self { text }
    }
}

/// Manual pin of the current routine, valid only on `date`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutineOverride {
    pub routine_id: String,
    pub date: String,
}

impl RoutineOverride {
    pub fn is_valid_on(&self, date_key: &str) -> bool {
        !self.routine_id.is_empty() && self.date == date_key
    }
}
