//! Water intake commands for CLI.

use chrono::Local;
use clap::Subcommand;
use routine_sync_core::{Config, SqliteStore, WaterStatus, WaterTracker};

use super::{print_json, CommandResult};

#[derive(Subcommand)]
pub enum WaterAction {
    /// Show today's intake
    Show {
        #[arg(long)]
        json: bool,
    },
    /// Record one tap's worth of water
    Add {
        #[arg(long)]
        json: bool,
    },
}

pub fn run(action: WaterAction, config: &Config) -> CommandResult {
    let mut water = WaterTracker::new(SqliteStore::open()?, &config.water);
    let now = Local::now();

    match action {
        WaterAction::Show { json } => {
            let status = water.status(&now);
            if json {
                return print_json(&status);
            }
            print_status(&status);
        }
        WaterAction::Add { json } => {
            let update = water.add(&now);
            if json {
                return print_json(&update);
            }
            if update.added_ml > 0 {
                println!("Added {} ml", update.added_ml);
            } else if update.status.goal_reached {
                println!("Goal already reached");
            }
            print_status(&update.status);
        }
    }
    Ok(())
}

fn print_status(status: &WaterStatus) {
    println!(
        "{}: {} / {} ml ({}%)",
        status.date,
        status.intake_ml,
        status.goal_ml,
        status.percent()
    );
}
