//! Battery and flow commands for CLI.

use chrono::Local;
use clap::Subcommand;
use routine_sync_core::{EnergySnapshot, EnergyTracker, SqliteStore};

use super::{print_json, CommandResult};

#[derive(Subcommand)]
pub enum EnergyAction {
    /// Show today's record
    Show {
        #[arg(long)]
        json: bool,
    },
    /// Change the battery level (e.g. 10 or -10)
    Battery {
        #[arg(allow_hyphen_values = true)]
        delta: i64,
    },
    /// Add flow points
    Flow {
        #[arg(default_value = "1")]
        points: i64,
    },
}

pub fn run(action: EnergyAction) -> CommandResult {
    let mut energy = EnergyTracker::new(SqliteStore::open()?);
    let today = Local::now().date_naive();

    let snapshot = match action {
        EnergyAction::Show { json } => {
            let snapshot = energy.snapshot(today);
            if json {
                return print_json(&snapshot);
            }
            snapshot
        }
        EnergyAction::Battery { delta } => energy
            .adjust_battery(today, delta)
            .ok_or("no energy record for today")?,
        EnergyAction::Flow { points } => energy
            .add_flow_points(today, points)
            .ok_or("no energy record for today")?,
    };
    print_snapshot(&snapshot);
    Ok(())
}

fn print_snapshot(snapshot: &EnergySnapshot) {
    if !snapshot.recorded {
        println!("No record for today, showing defaults");
    }
    println!("Battery: {}%", snapshot.battery);
    println!(
        "Flow: {} / {}{}",
        snapshot.flow_points,
        snapshot.flow_goal,
        if snapshot.goal_met() { " (goal met)" } else { "" }
    );
    println!("Streak: {}", snapshot.streak);
}
