use std::collections::BTreeMap;

use super::{PrefEdit, PrefStore, PrefValue};
use crate::error::Result;

/// In-memory preference store.
///
/// Backs tests and anything that needs a throwaway store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: BTreeMap<String, PrefValue>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, handy for seeding fixtures.
    pub fn with(mut self, key: &str, value: impl Into<PrefValue>) -> Self {
        self.values.insert(key.to_string(), value.into());
        self
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &PrefValue)> {
        self.values.iter()
    }
}

impl PrefStore for MemoryStore {
    fn get(&self, key: &str) -> Option<PrefValue> {
        self.values.get(key).cloned()
    }

    fn keys(&self) -> Vec<String> {
        self.values.keys().cloned().collect()
    }

    fn apply(&mut self, edits: Vec<PrefEdit>) -> Result<()> {
        for edit in edits {
            match edit {
                PrefEdit::Put(key, value) => {
                    self.values.insert(key, value);
                }
                PrefEdit::Remove(key) => {
                    self.values.remove(&key);
                }
            }
        }
        Ok(())
    }
}
