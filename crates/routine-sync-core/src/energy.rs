//! Daily battery and flow record.
//!
//! The app creates one record per calendar day; this module only adjusts
//! an existing record and never creates one. Fields it does not know are
//! preserved on write.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::codec::decode_object;
use crate::prefs::{keys, PrefEdit, PrefStore};

const DEFAULT_BATTERY: i64 = 100;
const DEFAULT_FLOW_GOAL: i64 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnergySnapshot {
    pub battery: i64,
    pub flow_points: i64,
    pub flow_goal: i64,
    pub streak: i64,
    /// Whether a record exists for the day.
    pub recorded: bool,
}

impl EnergySnapshot {
    pub fn goal_met(&self) -> bool {
        self.flow_points >= self.flow_goal
    }
}

/// Integer field that may have been written as a number or a numeric string.
fn int_field(obj: &Map<String, Value>, key: &str, default: i64) -> i64 {
    match obj.get(key) {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(default),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(default),
        _ => default,
    }
}

pub struct EnergyTracker<S: PrefStore> {
    store: S,
}

impl<S: PrefStore> EnergyTracker<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    fn record_key(date: NaiveDate) -> String {
        keys::energy_today(date.year(), date.month(), date.day())
    }

    fn record(&self, date: NaiveDate) -> Option<Map<String, Value>> {
        let raw = self.store.get_string(&Self::record_key(date))?;
        let record = decode_object(&raw);
        if record.is_none() {
            tracing::warn!(%date, "energy record is not a JSON object");
        }
        record
    }

    fn streak(&self) -> i64 {
        self.store
            .get_string(keys::ENERGY_SETTINGS)
            .and_then(|raw| decode_object(&raw))
            .map(|settings| int_field(&settings, "currentStreak", 0))
            .unwrap_or(0)
    }

    fn snapshot_of(&self, record: Option<&Map<String, Value>>) -> EnergySnapshot {
        let empty = Map::new();
        let obj = record.unwrap_or(&empty);
        EnergySnapshot {
            battery: int_field(obj, "currentBattery", DEFAULT_BATTERY),
            flow_points: int_field(obj, "flowPoints", 0),
            flow_goal: int_field(obj, "flowGoal", DEFAULT_FLOW_GOAL),
            streak: self.streak(),
            recorded: record.is_some(),
        }
    }

    /// Values for `date`, with defaults when there is no record.
    pub fn snapshot(&self, date: NaiveDate) -> EnergySnapshot {
        self.snapshot_of(self.record(date).as_ref())
    }

    fn update(
        &mut self,
        date: NaiveDate,
        change: impl FnOnce(&mut Map<String, Value>),
    ) -> Option<EnergySnapshot> {
        let Some(mut record) = self.record(date) else {
            tracing::debug!(%date, "no energy record for the day");
            return None;
        };
        change(&mut record);
        let edit = PrefEdit::put(Self::record_key(date), Value::Object(record.clone()).to_string());
        if let Err(e) = self.store.apply(vec![edit]) {
            tracing::error!(%date, error = %e, "failed to save energy record");
            return None;
        }
        Some(self.snapshot_of(Some(&record)))
    }

    /// Shift the battery level by `delta`. `None` when the day has no
    /// record or the write failed.
    pub fn adjust_battery(&mut self, date: NaiveDate, delta: i64) -> Option<EnergySnapshot> {
        self.update(date, |record| {
            let battery = int_field(record, "currentBattery", DEFAULT_BATTERY).saturating_add(delta);
            record.insert("currentBattery".into(), battery.into());
        })
    }

    /// Add flow points and refresh `isGoalMet`.
    pub fn add_flow_points(&mut self, date: NaiveDate, points: i64) -> Option<EnergySnapshot> {
        self.update(date, |record| {
            let flow = int_field(record, "flowPoints", 0).saturating_add(points);
            let goal = int_field(record, "flowGoal", DEFAULT_FLOW_GOAL);
            record.insert("flowPoints".into(), flow.into());
            record.insert("isGoalMet".into(), Value::Bool(flow >= goal));
        })
    }
}
