//! Routine commands for CLI.

use clap::Subcommand;
use routine_sync_core::routine::ProgressCounts;
use routine_sync_core::{
    Config, EffectiveDay, RoutineHandoff, RoutineTracker, RoutineView, SqliteStore, StepAction,
};

use super::{print_json, CommandResult};

#[derive(Subcommand)]
pub enum RoutineAction {
    /// Show the current routine step
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Complete the current step
    Complete {
        #[arg(long)]
        json: bool,
    },
    /// Move the current step to the back of the queue
    Postpone {
        #[arg(long)]
        json: bool,
    },
    /// Skip the current step
    Skip {
        #[arg(long)]
        json: bool,
    },
    /// Mark the current routine done for today without touching its steps
    SkipRoutine {
        #[arg(long)]
        json: bool,
    },
}

pub fn run(action: RoutineAction, config: &Config) -> CommandResult {
    let day = EffectiveDay::now(config.day.rollover_hour);
    let mut tracker = RoutineTracker::new(SqliteStore::open()?);

    match action {
        RoutineAction::Show { json } => {
            let view = tracker.view(&day);
            if json {
                print_json(&view)?;
            } else {
                print_view(&view);
            }
        }
        RoutineAction::Complete { json } => step(&mut tracker, StepAction::Complete, &day, json)?,
        RoutineAction::Postpone { json } => step(&mut tracker, StepAction::Postpone, &day, json)?,
        RoutineAction::Skip { json } => step(&mut tracker, StepAction::Skip, &day, json)?,
        RoutineAction::SkipRoutine { json } => {
            let handoff = tracker.skip_routine(&day);
            if json {
                print_json(&handoff)?;
            } else {
                match handoff {
                    Some(h) => print_handoff(&h),
                    None => println!("No routine to skip"),
                }
            }
        }
    }
    Ok(())
}

fn step(
    tracker: &mut RoutineTracker<SqliteStore>,
    action: StepAction,
    day: &EffectiveDay,
    json: bool,
) -> CommandResult {
    let outcome = tracker.apply_step(action, day, chrono::Utc::now());
    if json {
        return print_json(&outcome);
    }

    match outcome {
        Some(outcome) => {
            let verb = match outcome.action {
                StepAction::Complete => "completed",
                StepAction::Postpone => "postponed",
                StepAction::Skip => "skipped",
            };
            println!("Step {} {verb}", outcome.step_index + 1);
            print_counts(&outcome.progress.counts());
            match &outcome.handoff {
                Some(h) => print_handoff(h),
                None => print_view(&tracker.view(day)),
            }
        }
        None => println!("No step to act on"),
    }
    Ok(())
}

fn print_view(view: &RoutineView) {
    match view {
        RoutineView::NoRoutine => println!("No routine for today"),
        RoutineView::Step {
            routine,
            index,
            text,
            progress,
        } => {
            println!("{} [{}]", routine.title, routine.id);
            println!("Step {}/{}: {}", index + 1, routine.items.len(), text);
            print_counts(&progress.counts());
        }
        RoutineView::AllStepsDone { routine, progress } => {
            println!("{} [{}]", routine.title, routine.id);
            println!("All steps done");
            print_counts(&progress.counts());
        }
    }
}

fn print_counts(counts: &ProgressCounts) {
    println!(
        "Completed {} / Skipped {} / Postponed {} / Pending {}",
        counts.completed, counts.skipped, counts.postponed, counts.pending
    );
}

fn print_handoff(handoff: &RoutineHandoff) {
    println!("Routine {} finished", handoff.finished);
    match &handoff.next_routine {
        Some(next) => println!("Next routine: {next}"),
        None => println!("No more routines today"),
    }
}
