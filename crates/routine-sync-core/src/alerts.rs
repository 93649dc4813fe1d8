//! Notification alarm filter.
//!
//! Decides whether an incoming notification should raise the alarm: the
//! feature must be enabled, the hour must fall in the night window when
//! night-only mode is on, and the notification must mention a detection.

use serde::{Deserialize, Serialize};

use crate::codec::decode_record;
use crate::prefs::{keys, PrefStore};
use crate::storage::AlertsConfig;

const TRIGGER_WORD: &str = "detected";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlarmSettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_night_mode_only")]
    pub night_mode_only: bool,
}

fn default_night_mode_only() -> bool {
    true
}

impl Default for AlarmSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            night_mode_only: default_night_mode_only(),
        }
    }
}

/// Night window bounds, both inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NightWindow {
    pub start_hour: u32,
    pub end_hour: u32,
}

impl NightWindow {
    /// A window whose start is after its end wraps past midnight.
    pub fn contains(&self, hour: u32) -> bool {
        if self.start_hour > self.end_hour {
            hour >= self.start_hour || hour <= self.end_hour
        } else {
            (self.start_hour..=self.end_hour).contains(&hour)
        }
    }
}

impl From<&AlertsConfig> for NightWindow {
    fn from(config: &AlertsConfig) -> Self {
        Self {
            start_hour: config.night_start_hour,
            end_hour: config.night_end_hour,
        }
    }
}

/// Stored alarm settings; `None` when absent or unreadable.
pub fn load_settings<S: PrefStore + ?Sized>(store: &S) -> Option<AlarmSettings> {
    let raw = store.get_string(keys::NOTIFICATION_ALARM_SETTINGS)?;
    let value = decode_record(&raw)?;
    match serde_json::from_value(value) {
        Ok(settings) => Some(settings),
        Err(e) => {
            tracing::warn!(error = %e, "invalid notification alarm settings");
            None
        }
    }
}

pub struct AlertFilter {
    settings: Option<AlarmSettings>,
    window: NightWindow,
}

impl AlertFilter {
    pub fn new(settings: Option<AlarmSettings>, window: NightWindow) -> Self {
        Self { settings, window }
    }

    pub fn from_store<S: PrefStore + ?Sized>(store: &S, config: &AlertsConfig) -> Self {
        Self::new(load_settings(store), config.into())
    }

    /// Whether notifications arriving at `hour` are considered at all.
    pub fn should_process(&self, hour: u32) -> bool {
        match self.settings {
            Some(settings) if settings.enabled => {
                !settings.night_mode_only || self.window.contains(hour)
            }
            _ => false,
        }
    }

    /// Whether a notification's content triggers the alarm.
    pub fn should_alarm(title: &str, text: &str) -> bool {
        format!("{title} {text}").to_lowercase().contains(TRIGGER_WORD)
    }

    /// Both checks together.
    pub fn evaluate(&self, hour: u32, title: &str, text: &str) -> bool {
        let alarm = self.should_process(hour) && Self::should_alarm(title, text);
        if alarm {
            tracing::info!(hour, "notification alarm triggered");
        }
        alarm
    }
}
