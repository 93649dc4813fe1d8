//! Shared preference store abstraction.
//!
//! The companion application owns a flat key-value store holding typed
//! values. Everything in this crate reads and writes through [`PrefStore`]
//! so the same logic runs against the on-disk SQLite mirror or the
//! in-memory fake used by tests.

pub mod keys;
mod memory;

pub use memory::MemoryStore;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// A single typed preference value.
///
/// Integers are always widened to `i64`; the companion app stores both
/// 32- and 64-bit integers depending on platform and version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrefValue {
    Bool(bool),
    Int(i64),
    Double(f64),
    String(String),
    StringList(Vec<String>),
}

impl PrefValue {
    /// Name of the variant, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            PrefValue::Bool(_) => "bool",
            PrefValue::Int(_) => "int",
            PrefValue::Double(_) => "double",
            PrefValue::String(_) => "string",
            PrefValue::StringList(_) => "string_list",
        }
    }

    /// Infer a preference value from arbitrary JSON.
    ///
    /// Objects, nulls and arrays containing non-strings have no preference
    /// representation and yield `None`.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(PrefValue::Bool(*b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Some(PrefValue::Int(i)),
                None => n.as_f64().map(PrefValue::Double),
            },
            Value::String(s) => Some(PrefValue::String(s.clone())),
            Value::Array(items) => items
                .iter()
                .map(|item| item.as_str().map(str::to_string))
                .collect::<Option<Vec<_>>>()
                .map(PrefValue::StringList),
            Value::Null | Value::Object(_) => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            PrefValue::Bool(b) => Value::Bool(*b),
            PrefValue::Int(i) => Value::from(*i),
            PrefValue::Double(d) => Value::from(*d),
            PrefValue::String(s) => Value::String(s.clone()),
            PrefValue::StringList(items) => {
                Value::Array(items.iter().cloned().map(Value::String).collect())
            }
        }
    }
}

impl From<bool> for PrefValue {
    fn from(value: bool) -> Self {
        PrefValue::Bool(value)
    }
}

impl From<i64> for PrefValue {
    fn from(value: i64) -> Self {
        PrefValue::Int(value)
    }
}

impl From<i32> for PrefValue {
    fn from(value: i32) -> Self {
        PrefValue::Int(value.into())
    }
}

impl From<String> for PrefValue {
    fn from(value: String) -> Self {
        PrefValue::String(value)
    }
}

impl From<&str> for PrefValue {
    fn from(value: &str) -> Self {
        PrefValue::String(value.to_string())
    }
}

/// One mutation inside a write batch.
#[derive(Debug, Clone, PartialEq)]
pub enum PrefEdit {
    Put(String, PrefValue),
    Remove(String),
}

impl PrefEdit {
    pub fn put(key: impl Into<String>, value: impl Into<PrefValue>) -> Self {
        PrefEdit::Put(key.into(), value.into())
    }

    pub fn remove(key: impl Into<String>) -> Self {
        PrefEdit::Remove(key.into())
    }

    pub fn key(&self) -> &str {
        match self {
            PrefEdit::Put(key, _) | PrefEdit::Remove(key) => key,
        }
    }
}

/// Typed key-value repository shared with the companion application.
///
/// `apply` commits a whole batch at once: readers observe either none or
/// all of its edits. Nothing spans two batches, so back-to-back writers
/// can lose updates (last write wins).
pub trait PrefStore {
    /// Raw typed value under `key`, if any.
    fn get(&self, key: &str) -> Option<PrefValue>;

    /// All keys currently present, sorted.
    fn keys(&self) -> Vec<String>;

    /// Apply a batch of edits atomically.
    fn apply(&mut self, edits: Vec<PrefEdit>) -> Result<()>;

    fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    fn get_string(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            PrefValue::String(s) => Some(s),
            other => {
                tracing::debug!(key, kind = other.kind(), "expected string preference");
                None
            }
        }
    }

    fn get_bool(&self, key: &str) -> Option<bool> {
        match self.get(key)? {
            PrefValue::Bool(b) => Some(b),
            other => {
                tracing::debug!(key, kind = other.kind(), "expected bool preference");
                None
            }
        }
    }

    fn get_int(&self, key: &str) -> Option<i64> {
        match self.get(key)? {
            PrefValue::Int(i) => Some(i),
            other => {
                tracing::debug!(key, kind = other.kind(), "expected int preference");
                None
            }
        }
    }

    fn get_string_list(&self, key: &str) -> Option<Vec<String>> {
        match self.get(key)? {
            PrefValue::StringList(items) => Some(items),
            other => {
                tracing::debug!(key, kind = other.kind(), "expected string list preference");
                None
            }
        }
    }

    fn put(&mut self, key: &str, value: PrefValue) -> Result<()> {
        self.apply(vec![PrefEdit::Put(key.to_string(), value)])
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.apply(vec![PrefEdit::Remove(key.to_string())])
    }
}

impl<S: PrefStore + ?Sized> PrefStore for &mut S {
    fn get(&self, key: &str) -> Option<PrefValue> {
        (**self).get(key)
    }

    fn keys(&self) -> Vec<String> {
        (**self).keys()
    }

    fn apply(&mut self, edits: Vec<PrefEdit>) -> Result<()> {
        (**self).apply(edits)
    }
}

// ── Snapshots ──

/// Every key and value in `store` as one JSON object.
pub fn export_snapshot<S: PrefStore + ?Sized>(store: &S) -> serde_json::Map<String, Value> {
    store
        .keys()
        .into_iter()
        .filter_map(|key| {
            let value = store.get(&key)?.to_json();
            Some((key, value))
        })
        .collect()
}

/// Write every representable entry of a JSON object into `store` in one
/// batch. Returns how many entries were written.
///
/// # Errors
/// Returns an error if `snapshot` is not an object or the batch fails.
pub fn import_snapshot<S: PrefStore + ?Sized>(store: &mut S, snapshot: &Value) -> Result<usize> {
    let obj = snapshot.as_object().ok_or_else(|| {
        crate::error::CoreError::Custom("preference snapshot must be a JSON object".into())
    })?;

    let edits: Vec<PrefEdit> = obj
        .iter()
        .filter_map(|(key, value)| match PrefValue::from_json(value) {
            Some(pref) => Some(PrefEdit::Put(key.clone(), pref)),
            None => {
                tracing::warn!(key = %key, "skipping snapshot entry with no preference type");
                None
            }
        })
        .collect();

    let written = edits.len();
    store.apply(edits)?;
    tracing::info!(written, "imported preference snapshot");
    Ok(written)
}
