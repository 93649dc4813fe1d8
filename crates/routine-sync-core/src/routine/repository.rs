//! Storage contract for routine data.
//!
//! Reads tolerate every shape the companion app has used over time;
//! writes are returned as [`PrefEdit`] batches so callers can commit a
//! whole transition at once.

use serde_json::Value;

use super::{DayProgress, Routine, RoutineOverride};
use crate::codec::{decode_object, decode_record, decode_string_list};
use crate::day::EffectiveDay;
use crate::prefs::{keys, PrefEdit, PrefStore, PrefValue};

pub struct RoutineRepository<'a, S: PrefStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: PrefStore + ?Sized> RoutineRepository<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// All routine definitions in declaration order.
    ///
    /// The indexed form (`routines_count` + `routine_<i>`) wins when it
    /// yields at least one entry; otherwise the legacy `routines` value is
    /// read, whether stored as a native list or as a single string.
    pub fn routines(&self) -> Vec<Routine> {
        let raw = self.raw_routine_records();
        raw.iter()
            .filter_map(|entry| {
                let decoded = decode_record(entry);
                if decoded.is_none() {
                    tracing::warn!("skipping undecodable routine record");
                }
                decoded
            })
            .filter_map(|value| Routine::from_value(&value))
            .collect()
    }

    fn raw_routine_records(&self) -> Vec<String> {
        let count = self.store.get_int(keys::ROUTINES_COUNT).unwrap_or(-1);
        if count > 0 {
            let indexed = self.indexed_records(count.unsigned_abs());
            if !indexed.is_empty() {
                return indexed;
            }
        }

        match self.store.get(keys::ROUTINES_LEGACY) {
            Some(PrefValue::StringList(items)) => items,
            Some(PrefValue::String(raw)) => {
                // A packed list, or a single bare record.
                match decode_string_list(&raw) {
                    Some(items) => items,
                    None => vec![raw],
                }
            }
            Some(other) => {
                tracing::warn!(kind = other.kind(), "unexpected type for legacy routine list");
                Vec::new()
            }
            None => Vec::new(),
        }
    }

    /// Entries `routine_<i>` with `i < count`, in index order. Driven by
    /// the keys present, so a corrupt count costs nothing extra.
    fn indexed_records(&self, count: u64) -> Vec<String> {
        let mut indices: Vec<u64> = self
            .store
            .keys()
            .iter()
            .filter_map(|key| keys::routine_entry_index(key))
            .filter(|index| *index < count)
            .collect();
        indices.sort_unstable();
        indices
            .into_iter()
            .filter_map(|i| self.store.get_string(&keys::routine_entry(i as usize)))
            .collect()
    }

    pub fn find(&self, routine_id: &str) -> Option<Routine> {
        self.routines().into_iter().find(|r| r.id == routine_id)
    }

    /// Progress for `routine_id` on `day`, padded to `item_count`.
    ///
    /// Falls back to the shared legacy key when the routine-specific key is
    /// absent. A legacy record stamped with another routine's id belongs to
    /// that routine and is ignored.
    pub fn load_progress(&self, routine_id: &str, day: &EffectiveDay, item_count: usize) -> DayProgress {
        let date = day.date_key();
        let specific = self.store.get_string(&keys::routine_progress(routine_id, &date));

        let raw = match specific {
            Some(raw) => Some(raw),
            None => self
                .store
                .get_string(&keys::legacy_progress(&date))
                .filter(|raw| legacy_belongs_to(raw, routine_id)),
        };

        match raw {
            Some(raw) => match decode_record(&raw) {
                Some(value) => DayProgress::from_value(&value, item_count),
                None => {
                    tracing::warn!(routine_id, date = %date, "undecodable progress record, starting fresh");
                    DayProgress::fresh(item_count)
                }
            },
            None => DayProgress::fresh(item_count),
        }
    }

    pub fn is_completed(&self, routine_id: &str, day: &EffectiveDay) -> bool {
        self.store
            .get_bool(&keys::routine_completed(routine_id, &day.date_key()))
            .unwrap_or(false)
    }

    /// The stored override, whatever its date.
    pub fn load_override(&self) -> Option<RoutineOverride> {
        let raw = self.store.get_string(keys::ACTIVE_ROUTINE_OVERRIDE)?;
        let obj = decode_object(&raw)?;
        Some(RoutineOverride {
            routine_id: obj
                .get("routineId")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            date: obj
                .get("date")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        })
    }
}

fn legacy_belongs_to(raw: &str, routine_id: &str) -> bool {
    match decode_object(raw).as_ref().and_then(|obj| obj.get("routineId")) {
        Some(Value::String(owner)) if !owner.is_empty() => owner == routine_id,
        _ => true,
    }
}

/// Edits writing one progress record under the routine key and the legacy
/// shared key, plus the legacy last-date marker.
pub fn progress_edits(routine_id: &str, day: &EffectiveDay, progress: &DayProgress) -> Vec<PrefEdit> {
    let date = day.date_key();
    let record = progress.to_value(routine_id).to_string();
    vec![
        PrefEdit::put(keys::routine_progress(routine_id, &date), record.clone()),
        PrefEdit::put(keys::legacy_progress(&date), record),
        PrefEdit::put(keys::PROGRESS_LAST_DATE, date),
    ]
}

pub fn completion_edit(routine_id: &str, day: &EffectiveDay) -> PrefEdit {
    PrefEdit::put(keys::routine_completed(routine_id, &day.date_key()), true)
}

/// Pin `routine_id` for `day` and reset its progress for that day.
pub fn override_edits(routine_id: &str, day: &EffectiveDay) -> Vec<PrefEdit> {
    let date = day.date_key();
    let encoded = serde_json::json!({ "routineId": routine_id, "date": date }).to_string();
    vec![
        PrefEdit::put(keys::ACTIVE_ROUTINE_OVERRIDE, encoded),
        PrefEdit::remove(keys::legacy_progress(&date)),
        PrefEdit::remove(keys::routine_progress(routine_id, &date)),
    ]
}

pub fn clear_override_edit() -> PrefEdit {
    PrefEdit::remove(keys::ACTIVE_ROUTINE_OVERRIDE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::encode_string_list;
    use crate::prefs::MemoryStore;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use chrono::NaiveDate;
    use serde_json::json;

    fn day() -> EffectiveDay {
        EffectiveDay::from_date(NaiveDate::from_ymd_opt(2024, 3, 10).unwrap())
    }

    fn record(id: &str) -> String {
        json!({"id": id, "title": id, "activeDays": [7], "items": [{"text": "a"}]}).to_string()
    }

    #[test]
    fn indexed_form_is_preferred() {
        let store = MemoryStore::new()
            .with(keys::ROUTINES_COUNT, 2)
            .with(&keys::routine_entry(0), record("a"))
            .with(&keys::routine_entry(1), record("b"))
            .with(keys::ROUTINES_LEGACY, PrefValue::StringList(vec![record("legacy")]));
        let ids: Vec<_> = RoutineRepository::new(&store)
            .routines()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn huge_count_reads_only_present_entries() {
        let store = MemoryStore::new()
            .with(keys::ROUTINES_COUNT, PrefValue::Int(i64::MAX))
            .with(&keys::routine_entry(3), record("d"))
            .with(&keys::routine_entry(0), record("a"))
            .with(keys::ROUTINES_LEGACY, PrefValue::StringList(vec![record("legacy")]));
        let ids: Vec<_> = RoutineRepository::new(&store)
            .routines()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["a", "d"]);
    }

    #[test]
    fn entries_past_count_are_ignored() {
        let store = MemoryStore::new()
            .with(keys::ROUTINES_COUNT, 1)
            .with(&keys::routine_entry(0), record("a"))
            .with(&keys::routine_entry(1), record("b"));
        let ids: Vec<_> = RoutineRepository::new(&store)
            .routines()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["a"]);
    }

    #[test]
    fn empty_indexed_form_falls_back_to_legacy_list() {
        let store = MemoryStore::new()
            .with(keys::ROUTINES_COUNT, 3)
            .with(keys::ROUTINES_LEGACY, PrefValue::StringList(vec![record("legacy")]));
        let routines = RoutineRepository::new(&store).routines();
        assert_eq!(routines.len(), 1);
        assert_eq!(routines[0].id, "legacy");
    }

    #[test]
    fn legacy_string_forms() {
        let packed = MemoryStore::new().with(
            keys::ROUTINES_LEGACY,
            encode_string_list(&[record("x"), record("y")]),
        );
        assert_eq!(RoutineRepository::new(&packed).routines().len(), 2);

        let single = MemoryStore::new().with(keys::ROUTINES_LEGACY, record("solo"));
        assert_eq!(RoutineRepository::new(&single).routines()[0].id, "solo");
    }

    #[test]
    fn base64_entries_are_decoded_and_garbage_skipped() {
        let store = MemoryStore::new()
            .with(keys::ROUTINES_COUNT, 2)
            .with(&keys::routine_entry(0), STANDARD.encode(record("b64")))
            .with(&keys::routine_entry(1), "%%% not a routine");
        let routines = RoutineRepository::new(&store).routines();
        assert_eq!(routines.len(), 1);
        assert_eq!(routines[0].id, "b64");
    }

    #[test]
    fn wrong_count_type_uses_legacy() {
        let store = MemoryStore::new()
            .with(keys::ROUTINES_COUNT, "2")
            .with(keys::ROUTINES_LEGACY, PrefValue::StringList(vec![record("l")]));
        assert_eq!(RoutineRepository::new(&store).routines()[0].id, "l");
    }

    #[test]
    fn progress_prefers_specific_key() {
        let d = day();
        let store = MemoryStore::new()
            .with(
                &keys::routine_progress("a", &d.date_key()),
                json!({"currentStepIndex": 2}).to_string(),
            )
            .with(
                &keys::legacy_progress(&d.date_key()),
                json!({"currentStepIndex": 1}).to_string(),
            );
        let p = RoutineRepository::new(&store).load_progress("a", &d, 3);
        assert_eq!(p.current_step_index, 2);
    }

    #[test]
    fn legacy_progress_is_used_unless_owned_by_another_routine() {
        let d = day();
        let unowned = MemoryStore::new().with(
            &keys::legacy_progress(&d.date_key()),
            json!({"currentStepIndex": 1}).to_string(),
        );
        assert_eq!(
            RoutineRepository::new(&unowned).load_progress("a", &d, 3).current_step_index,
            1
        );

        let foreign = MemoryStore::new().with(
            &keys::legacy_progress(&d.date_key()),
            json!({"currentStepIndex": 1, "routineId": "other"}).to_string(),
        );
        assert_eq!(
            RoutineRepository::new(&foreign).load_progress("a", &d, 3),
            DayProgress::fresh(3)
        );
    }

    #[test]
    fn malformed_progress_is_fresh() {
        let d = day();
        let store = MemoryStore::new().with(&keys::routine_progress("a", &d.date_key()), "{not json");
        assert_eq!(
            RoutineRepository::new(&store).load_progress("a", &d, 2),
            DayProgress::fresh(2)
        );

        let wrong_type = MemoryStore::new().with(&keys::routine_progress("a", &d.date_key()), 5);
        assert_eq!(
            RoutineRepository::new(&wrong_type).load_progress("a", &d, 2),
            DayProgress::fresh(2)
        );
    }

    #[test]
    fn override_round_trips_through_edits() {
        let d = day();
        let mut store = MemoryStore::new();
        store.apply(override_edits("b", &d)).unwrap();
        let ovr = RoutineRepository::new(&store).load_override().unwrap();
        assert_eq!(ovr.routine_id, "b");
        assert!(ovr.is_valid_on("2024-03-10"));

        store.apply(vec![clear_override_edit()]).unwrap();
        assert!(RoutineRepository::new(&store).load_override().is_none());
    }

    #[test]
    fn completion_marker() {
        let d = day();
        let mut store = MemoryStore::new();
        assert!(!RoutineRepository::new(&store).is_completed("a", &d));
        store.apply(vec![completion_edit("a", &d)]).unwrap();
        assert!(RoutineRepository::new(&store).is_completed("a", &d));
    }

    #[test]
    fn progress_edits_write_both_keys() {
        let d = day();
        let mut store = MemoryStore::new();
        store
            .apply(progress_edits("a", &d, &DayProgress::fresh(1)))
            .unwrap();
        assert!(store.contains(&keys::routine_progress("a", "2024-03-10")));
        assert!(store.contains(&keys::legacy_progress("2024-03-10")));
        assert_eq!(
            store.get_string(keys::PROGRESS_LAST_DATE).as_deref(),
            Some("2024-03-10")
        );
    }
}
