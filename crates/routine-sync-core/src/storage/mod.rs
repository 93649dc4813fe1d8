mod config;
pub mod database;

pub use config::{AlertsConfig, Config, DayConfig, LoggingConfig, TasksConfig, WaterConfig};
pub use database::SqliteStore;

use std::path::PathBuf;

use crate::error::Result;

/// Returns the data directory, creating it if needed.
///
/// `ROUTINE_SYNC_DATA_DIR` wins when set. Otherwise
/// `~/.config/routine-sync[-dev]/`, with the `-dev` suffix when
/// `ROUTINE_SYNC_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let dir = match std::env::var_os("ROUTINE_SYNC_DATA_DIR") {
        Some(explicit) => PathBuf::from(explicit),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("ROUTINE_SYNC_ENV").unwrap_or_else(|_| "production".to_string());

            if env == "dev" {
                base_dir.join("routine-sync-dev")
            } else {
                base_dir.join("routine-sync")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
