//! Effective-day calculation.
//!
//! All routine progress is partitioned by an "effective" date rather than
//! the calendar date: the small hours before the rollover hour still belong
//! to the previous day, so a routine started late at night is not cut off
//! at midnight.

use chrono::{DateTime, Datelike, Days, Local, NaiveDate, TimeZone, Timelike};
use serde::{Deserialize, Serialize};

/// Default rollover hour: times in `[00:00, 02:00)` count as yesterday.
pub const DEFAULT_ROLLOVER_HOUR: u32 = 2;

/// Logical day used as the partition key for progress data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectiveDay {
    pub date: NaiveDate,
    /// 1 = Monday .. 7 = Sunday.
    pub weekday: u8,
}

impl EffectiveDay {
    /// Effective day for a wall-clock instant in its own timezone.
    pub fn at<Tz: TimeZone>(now: &DateTime<Tz>, rollover_hour: u32) -> Self {
        let local = now.naive_local();
        let date = if local.hour() < rollover_hour {
            local
                .date()
                .checked_sub_days(Days::new(1))
                .unwrap_or(local.date())
        } else {
            local.date()
        };
        Self::from_date(date)
    }

    /// Effective day for the current local time.
    pub fn now(rollover_hour: u32) -> Self {
        Self::at(&Local::now(), rollover_hour)
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            date,
            weekday: date.weekday().number_from_monday() as u8,
        }
    }

    /// `YYYY-MM-DD`, the form embedded in every per-day key.
    pub fn date_key(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }
}

/// Plain calendar date key, without the rollover adjustment.
pub fn calendar_date_key<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    now.format("%Y-%m-%d").to_string()
}
