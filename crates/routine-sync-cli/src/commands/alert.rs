//! Notification alarm filter commands for CLI.

use chrono::{Local, Timelike};
use clap::Subcommand;
use routine_sync_core::{AlertFilter, Config, SqliteStore};

use super::CommandResult;

#[derive(Subcommand)]
pub enum AlertAction {
    /// Check whether a notification would raise the alarm
    Check {
        /// Notification title
        title: String,
        /// Notification text
        #[arg(default_value = "")]
        text: String,
        /// Hour of arrival (default: now)
        #[arg(long, value_parser = clap::value_parser!(u32).range(0..24))]
        hour: Option<u32>,
    },
}

pub fn run(action: AlertAction, config: &Config) -> CommandResult {
    match action {
        AlertAction::Check { title, text, hour } => {
            let store = SqliteStore::open()?;
            let filter = AlertFilter::from_store(&store, &config.alerts);
            let hour = hour.unwrap_or_else(|| Local::now().hour());
            if filter.evaluate(hour, &title, &text) {
                println!("alarm");
            } else {
                println!("ignore");
            }
        }
    }
    Ok(())
}
