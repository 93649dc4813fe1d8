//! TOML-based application configuration.
//!
//! Stores local settings that the companion app does not own:
//! - Effective-day rollover hour
//! - Task list size
//! - Water defaults used when the app has not stored its own
//! - Night window for the notification alarm filter
//! - Default log filter for the CLI
//!
//! Configuration is stored at `<data_dir>/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::day::DEFAULT_ROLLOVER_HOUR;
use crate::error::{ConfigError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayConfig {
    /// Hours before this one belong to the previous effective day.
    #[serde(default = "default_rollover_hour")]
    pub rollover_hour: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TasksConfig {
    #[serde(default = "default_max_display")]
    pub max_display: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaterConfig {
    #[serde(default = "default_goal_ml")]
    pub default_goal_ml: i64,
    #[serde(default = "default_increment_ml")]
    pub default_increment_ml: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertsConfig {
    #[serde(default = "default_night_start")]
    pub night_start_hour: u32,
    /// Inclusive.
    #[serde(default = "default_night_end")]
    pub night_end_hour: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// Application configuration.
///
/// Serialized to/from TOML at `<data_dir>/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub day: DayConfig,
    #[serde(default)]
    pub tasks: TasksConfig,
    #[serde(default)]
    pub water: WaterConfig,
    #[serde(default)]
    pub alerts: AlertsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

// Default functions
fn default_rollover_hour() -> u32 {
    DEFAULT_ROLLOVER_HOUR
}
fn default_max_display() -> usize {
    2
}
fn default_goal_ml() -> i64 {
    1500
}
fn default_increment_ml() -> i64 {
    125
}
fn default_night_start() -> u32 {
    22
}
fn default_night_end() -> u32 {
    8
}
fn default_log_level() -> String {
    "warn".into()
}

impl Default for DayConfig {
    fn default() -> Self {
        Self {
            rollover_hour: default_rollover_hour(),
        }
    }
}

impl Default for TasksConfig {
    fn default() -> Self {
        Self {
            max_display: default_max_display(),
        }
    }
}

impl Default for WaterConfig {
    fn default() -> Self {
        Self {
            default_goal_ml: default_goal_ml(),
            default_increment_ml: default_increment_ml(),
        }
    }
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            night_start_hour: default_night_start(),
            night_end_hour: default_night_end(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() || key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        let n = value
                            .parse::<u64>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?;
                        serde_json::Value::Number(n.into())
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        return Err(invalid("cannot replace a whole section".into()));
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    fn path() -> Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk or return default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    /// Load from an explicit path, writing defaults there when absent.
    pub fn load_from(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
                cfg.validate()?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (key, hour) in [
            ("day.rollover_hour", self.day.rollover_hour),
            ("alerts.night_start_hour", self.alerts.night_start_hour),
            ("alerts.night_end_hour", self.alerts.night_end_hour),
        ] {
            if hour > 23 {
                return Err(ConfigError::InvalidValue {
                    key: key.into(),
                    message: format!("{hour} is not an hour of the day"),
                });
            }
        }
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key without saving.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value does not fit.
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Set a config value by key and persist.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.set_value(key, value)?;
        self.save()
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "using default configuration");
            Self::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.day.rollover_hour, 2);
        assert_eq!(parsed.tasks.max_display, 2);
    }

    #[test]
    fn missing_sections_take_defaults() {
        let cfg: Config = toml::from_str("[water]\ndefault_goal_ml = 2000\n").unwrap();
        assert_eq!(cfg.water.default_goal_ml, 2000);
        assert_eq!(cfg.water.default_increment_ml, 125);
        assert_eq!(cfg.alerts.night_start_hour, 22);
        assert_eq!(cfg.logging.level, "warn");
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("day.rollover_hour").as_deref(), Some("2"));
        assert_eq!(cfg.get("logging.level").as_deref(), Some("warn"));
        assert!(cfg.get("day.missing_key").is_none());
        assert!(cfg.get("").is_none());
    }

    #[test]
    fn set_value_updates_number_and_string() {
        let mut cfg = Config::default();
        cfg.set_value("tasks.max_display", "5").unwrap();
        cfg.set_value("logging.level", "debug").unwrap();
        assert_eq!(cfg.tasks.max_display, 5);
        assert_eq!(cfg.logging.level, "debug");
    }

    #[test]
    fn set_value_rejects_unknown_key_and_bad_values() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set_value("day.nonexistent", "1"),
            Err(crate::error::CoreError::Config(ConfigError::UnknownKey(_)))
        ));
        assert!(cfg.set_value("day.rollover_hour", "soon").is_err());
        assert!(cfg.set_value("day.rollover_hour", "24").is_err());
        assert!(cfg.set_value("day", "3").is_err());
        assert_eq!(cfg.day.rollover_hour, 2);
    }

    #[test]
    fn load_from_writes_defaults_when_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg.day.rollover_hour, 2);
        assert!(path.exists());

        std::fs::write(&path, "[day]\nrollover_hour = 4\n").unwrap();
        assert_eq!(Config::load_from(&path).unwrap().day.rollover_hour, 4);
    }

    #[test]
    fn load_from_rejects_out_of_range_hours() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[alerts]\nnight_start_hour = 30\n").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}
