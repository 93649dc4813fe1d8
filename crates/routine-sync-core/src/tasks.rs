//! Task list shared with the companion app.
//!
//! The app keeps its tasks under one key as a list of JSON records, either
//! as a native string list or packed into one string (see
//! [`codec::decode_string_list`](crate::codec::decode_string_list)).
//! Completing a task rewrites the whole list in the packed form, keeping
//! every field this crate does not know about.

use chrono::NaiveDateTime;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::codec::{decode_object, decode_string_list, encode_string_list};
use crate::prefs::{keys, PrefEdit, PrefStore, PrefValue};

const COMPLETED_AT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskEntry {
    pub id: String,
    pub title: String,
    pub is_important: bool,
    pub is_completed: bool,
}

impl TaskEntry {
    /// `id` and `title` are required; the flags default to `false`.
    fn from_map(obj: &Map<String, Value>) -> Option<Self> {
        Some(Self {
            id: obj.get("id")?.as_str()?.to_string(),
            title: obj.get("title")?.as_str()?.to_string(),
            is_important: obj.get("isImportant").and_then(Value::as_bool).unwrap_or(false),
            is_completed: obj.get("isCompleted").and_then(Value::as_bool).unwrap_or(false),
        })
    }
}

/// First few pending tasks plus how many there are in total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingTasks {
    pub tasks: Vec<TaskEntry>,
    pub total_pending: usize,
}

impl PendingTasks {
    /// Pending tasks not included in `tasks`.
    pub fn overflow(&self) -> usize {
        self.total_pending.saturating_sub(self.tasks.len())
    }
}

pub struct TaskList<S: PrefStore> {
    store: S,
}

impl<S: PrefStore> TaskList<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    fn raw_records(&self) -> Vec<String> {
        match self.store.get(keys::TASKS) {
            Some(PrefValue::String(raw)) => decode_string_list(&raw).unwrap_or_else(|| {
                tracing::warn!("task list is not a decodable list");
                Vec::new()
            }),
            Some(PrefValue::StringList(items)) => items,
            Some(other) => {
                tracing::warn!(kind = other.kind(), "unexpected type for task list");
                Vec::new()
            }
            None => Vec::new(),
        }
    }

    /// Every decodable task in stored order.
    pub fn all(&self) -> Vec<TaskEntry> {
        self.raw_records()
            .iter()
            .filter_map(|raw| {
                let entry = decode_object(raw).as_ref().and_then(TaskEntry::from_map);
                if entry.is_none() {
                    tracing::debug!("skipping undecodable task record");
                }
                entry
            })
            .collect()
    }

    /// Up to `limit` tasks that are not completed, in stored order.
    pub fn pending(&self, limit: usize) -> PendingTasks {
        let pending: Vec<TaskEntry> = self.all().into_iter().filter(|t| !t.is_completed).collect();
        let total_pending = pending.len();
        PendingTasks {
            tasks: pending.into_iter().take(limit).collect(),
            total_pending,
        }
    }

    /// Mark `task_id` completed at `now` (local time).
    ///
    /// Returns whether a task was updated. Records that cannot be decoded
    /// are written back untouched.
    pub fn complete(&mut self, task_id: &str, now: NaiveDateTime) -> bool {
        let mut changed = false;
        let updated: Vec<String> = self
            .raw_records()
            .into_iter()
            .map(|raw| match decode_object(&raw) {
                Some(mut obj) if obj.get("id").and_then(Value::as_str) == Some(task_id) => {
                    obj.insert("isCompleted".into(), Value::Bool(true));
                    obj.insert(
                        "completedAt".into(),
                        Value::String(now.format(COMPLETED_AT_FORMAT).to_string()),
                    );
                    changed = true;
                    Value::Object(obj).to_string()
                }
                _ => raw,
            })
            .collect();

        if !changed {
            tracing::debug!(task_id, "no task with this id");
            return false;
        }

        let edit = PrefEdit::put(keys::TASKS, encode_string_list(&updated));
        if let Err(e) = self.store.apply(vec![edit]) {
            tracing::error!(task_id, error = %e, "failed to save task list");
            return false;
        }
        tracing::info!(task_id, "task completed");
        true
    }
}
