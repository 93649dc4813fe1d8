//! Key layout shared with the companion application.
//!
//! Every key the app writes carries the `flutter.` prefix. A few readers
//! also check the bare form, which older app builds used.

pub const PREFIX: &str = "flutter.";

pub const ROUTINES_COUNT: &str = "flutter.routines_count";
pub const ROUTINES_LEGACY: &str = "flutter.routines";
pub const ACTIVE_ROUTINE_OVERRIDE: &str = "flutter.active_routine_override";
pub const PROGRESS_LAST_DATE: &str = "flutter.morning_routine_last_date";

pub const TASKS: &str = "flutter.tasks";

pub const WATER_GOAL: &str = "flutter.water_goal";
pub const WATER_AMOUNT_PER_TAP: &str = "flutter.water_amount_per_tap";
pub const WATER_LAST_RESET_DATE: &str = "flutter.last_water_reset_date";

pub const ENERGY_SETTINGS: &str = "flutter.energy_settings";
pub const NOTIFICATION_ALARM_SETTINGS: &str = "flutter.notification_alarm_settings";

/// Indexed routine entry `i` (0-based).
pub fn routine_entry(index: usize) -> String {
    format!("flutter.routine_{index}")
}

/// Index of an indexed routine entry key, the inverse of [`routine_entry`].
pub fn routine_entry_index(key: &str) -> Option<u64> {
    let digits = key.strip_prefix("flutter.routine_")?;
    let index = digits.parse::<u64>().ok()?;
    (routine_entry(index as usize) == key).then_some(index)
}

/// Per-routine progress for one effective day.
pub fn routine_progress(routine_id: &str, date_key: &str) -> String {
    format!("flutter.routine_progress_{routine_id}_{date_key}")
}

/// Shared progress key from before progress was tracked per routine.
pub fn legacy_progress(date_key: &str) -> String {
    format!("flutter.morning_routine_progress_{date_key}")
}

pub fn routine_completed(routine_id: &str, date_key: &str) -> String {
    format!("flutter.routine_completed_{routine_id}_{date_key}")
}

/// Water intake for a calendar date, prefixed form first.
pub fn water_intake(date_key: &str) -> [String; 2] {
    [format!("flutter.water_{date_key}"), format!("water_{date_key}")]
}

/// Energy record key; month and day are not zero-padded.
pub fn energy_today(year: i32, month: u32, day: u32) -> String {
    format!("flutter.energy_today_{year}_{month}_{day}")
}

/// Bare form of a prefixed key.
pub fn unprefixed(key: &str) -> &str {
    key.strip_prefix(PREFIX).unwrap_or(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_keys_embed_routine_and_date() {
        assert_eq!(
            routine_progress("r1", "2024-03-10"),
            "flutter.routine_progress_r1_2024-03-10"
        );
        assert_eq!(
            legacy_progress("2024-03-10"),
            "flutter.morning_routine_progress_2024-03-10"
        );
        assert_eq!(
            routine_completed("r1", "2024-03-10"),
            "flutter.routine_completed_r1_2024-03-10"
        );
    }

    #[test]
    fn routine_entry_index_accepts_only_canonical_entry_keys() {
        assert_eq!(routine_entry_index(&routine_entry(12)), Some(12));
        assert_eq!(routine_entry_index("flutter.routine_012"), None);
        assert_eq!(routine_entry_index("flutter.routine_+1"), None);
        assert_eq!(routine_entry_index(ROUTINES_COUNT), None);
        assert_eq!(routine_entry_index(&routine_completed("1", "2024-03-10")), None);
    }

    #[test]
    fn energy_key_is_not_zero_padded() {
        assert_eq!(energy_today(2024, 3, 9), "flutter.energy_today_2024_3_9");
    }

    #[test]
    fn unprefixed_strips_only_the_app_prefix() {
        assert_eq!(unprefixed(WATER_GOAL), "water_goal");
        assert_eq!(unprefixed("water_goal"), "water_goal");
    }
}
