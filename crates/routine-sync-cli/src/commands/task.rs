//! Task list commands for CLI.

use chrono::Local;
use clap::Subcommand;
use routine_sync_core::{Config, SqliteStore, TaskList};

use super::{print_json, CommandResult};

#[derive(Subcommand)]
pub enum TaskAction {
    /// List pending tasks
    List {
        /// How many to show (default: tasks.max_display)
        #[arg(long)]
        limit: Option<usize>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Mark a task completed
    Complete {
        /// Task ID
        id: String,
    },
}

pub fn run(action: TaskAction, config: &Config) -> CommandResult {
    let mut tasks = TaskList::new(SqliteStore::open()?);

    match action {
        TaskAction::List { limit, json } => {
            let pending = tasks.pending(limit.unwrap_or(config.tasks.max_display));
            if json {
                return print_json(&pending);
            }
            if pending.total_pending == 0 {
                println!("No pending tasks");
                return Ok(());
            }
            for task in &pending.tasks {
                let marker = if task.is_important { "!" } else { " " };
                println!("{marker} {}  {}", task.id, task.title);
            }
            if pending.overflow() > 0 {
                println!("+{} more", pending.overflow());
            }
        }
        TaskAction::Complete { id } => {
            if !tasks.complete(&id, Local::now().naive_local()) {
                return Err(format!("task not found or not saved: {id}").into());
            }
            println!("Task completed: {id}");
        }
    }
    Ok(())
}
