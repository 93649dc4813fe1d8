//! Per-day step progress and the step progression state machine.
//!
//! ## Transitions
//!
//! ```text
//! Pending ──complete──> Completed
//!    │ ──skip──────> Skipped
//!    └ ──postpone──> Postponed ──(revisited)──> Pending
//! ```
//!
//! Every action targets the step at `current_step_index`. Afterwards the
//! index moves to the next pending step after it (no wrap). When none is
//! left, postponed steps come back round-robin starting after the acted-on
//! step; when there are none either, the index is parked at `item_count`.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};

/// Wire format of `lastUpdated`, always UTC with milliseconds.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepAction {
    Complete,
    Postpone,
    Skip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepState {
    Pending,
    Completed,
    Skipped,
    /// Deferred; cleared again as soon as the step is revisited.
    Postponed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProgressCounts {
    pub total: usize,
    pub completed: usize,
    pub skipped: usize,
    pub postponed: usize,
    pub pending: usize,
}

/// Progress of one routine on one effective day.
///
/// The three flag vectors are at least `item_count` long. Shorter stored
/// vectors are padded with `false` on load; longer ones are kept as-is and
/// only the first `item_count` entries take part in the state machine.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayProgress {
    pub current_step_index: usize,
    pub completed_steps: Vec<bool>,
    pub skipped_steps: Vec<bool>,
    pub postponed_steps: Vec<bool>,
    pub last_updated: Option<DateTime<Utc>>,
    pub item_count: usize,
}

impl DayProgress {
    /// Nothing done yet: index 0, all flags false.
    pub fn fresh(item_count: usize) -> Self {
        Self {
            current_step_index: 0,
            completed_steps: vec![false; item_count],
            skipped_steps: vec![false; item_count],
            postponed_steps: vec![false; item_count],
            last_updated: None,
            item_count,
        }
    }

    /// Read a stored progress record.
    ///
    /// Never fails: a non-object yields [`DayProgress::fresh`], a missing or
    /// negative index becomes 0 and non-boolean flags read as `false`.
    pub fn from_value(value: &Value, item_count: usize) -> Self {
        let Some(obj) = value.as_object() else {
            tracing::warn!("progress record is not an object, starting fresh");
            return Self::fresh(item_count);
        };

        let current_step_index = obj
            .get("currentStepIndex")
            .and_then(|v| match v {
                Value::Number(n) => n.as_u64(),
                Value::String(s) => s.trim().parse::<u64>().ok(),
                _ => None,
            })
            .map(|i| i as usize)
            .unwrap_or(0);

        let flags = |name: &str| -> Vec<bool> {
            let mut out: Vec<bool> = obj
                .get(name)
                .and_then(Value::as_array)
                .map(|arr| arr.iter().map(|b| b.as_bool().unwrap_or(false)).collect())
                .unwrap_or_default();
            if out.len() < item_count {
                out.resize(item_count, false);
            }
            out
        };

        let last_updated = obj
            .get("lastUpdated")
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc));

        Self {
            current_step_index,
            completed_steps: flags("completedSteps"),
            skipped_steps: flags("skippedSteps"),
            postponed_steps: flags("postponedSteps"),
            last_updated,
            item_count,
        }
    }

    /// Full record as written back to the store.
    pub fn to_value(&self, routine_id: &str) -> Value {
        json!({
            "currentStepIndex": self.current_step_index,
            "completedSteps": self.completed_steps,
            "skippedSteps": self.skipped_steps,
            "postponedSteps": self.postponed_steps,
            "lastUpdated": self
                .last_updated
                .map(|t| t.format(TIMESTAMP_FORMAT).to_string()),
            "routineId": routine_id,
            "itemCount": self.item_count,
        })
    }

    /// Index of the step to show, or `None` once every step is dealt with.
    pub fn current_step(&self) -> Option<usize> {
        (self.current_step_index < self.item_count).then_some(self.current_step_index)
    }

    pub fn state_of(&self, index: usize) -> StepState {
        if self.completed_steps.get(index).copied().unwrap_or(false) {
            StepState::Completed
        } else if self.skipped_steps.get(index).copied().unwrap_or(false) {
            StepState::Skipped
        } else if self.postponed_steps.get(index).copied().unwrap_or(false) {
            StepState::Postponed
        } else {
            StepState::Pending
        }
    }

    /// Every step completed or skipped. Postponed steps do not count, so a
    /// routine that was only ever postponed is never finished.
    pub fn is_finished(&self) -> bool {
        (0..self.item_count).all(|i| self.completed_steps[i] || self.skipped_steps[i])
    }

    pub fn counts(&self) -> ProgressCounts {
        let mut counts = ProgressCounts {
            total: self.item_count,
            ..ProgressCounts::default()
        };
        for i in 0..self.item_count {
            match self.state_of(i) {
                StepState::Completed => counts.completed += 1,
                StepState::Skipped => counts.skipped += 1,
                StepState::Postponed => counts.postponed += 1,
                StepState::Pending => counts.pending += 1,
            }
        }
        counts
    }

    /// Apply `action` to step `index` and move the cursor.
    ///
    /// Returns `false`, leaving the record untouched, when `index` is not a
    /// step of the routine.
    pub fn apply(&mut self, action: StepAction, index: usize) -> bool {
        if index >= self.item_count {
            return false;
        }

        let (completed, skipped, postponed) = match action {
            StepAction::Complete => (true, false, false),
            StepAction::Skip => (false, true, false),
            StepAction::Postpone => (false, false, true),
        };
        self.completed_steps[index] = completed;
        self.skipped_steps[index] = skipped;
        self.postponed_steps[index] = postponed;

        self.current_step_index = self.next_index_after(index);
        true
    }

    /// Same as [`DayProgress::apply`] on the current step, stamping the
    /// update time.
    pub fn apply_current(&mut self, action: StepAction, now: DateTime<Utc>) -> Option<usize> {
        let index = self.current_step()?;
        self.apply(action, index);
        self.last_updated = Some(now);
        Some(index)
    }

    fn next_index_after(&mut self, index: usize) -> usize {
        let len = self.item_count;

        if let Some(next) = (index + 1..len).find(|&i| self.state_of(i) == StepState::Pending) {
            return next;
        }

        // Bring back postponed steps, starting after the one just handled.
        for offset in 0..len {
            let i = (index + 1 + offset) % len;
            if self.postponed_steps[i] && !self.completed_steps[i] && !self.skipped_steps[i] {
                self.postponed_steps[i] = false;
                return i;
            }
        }

        len
    }
}
