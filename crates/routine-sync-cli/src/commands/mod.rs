pub mod alert;
pub mod config;
pub mod energy;
pub mod prefs;
pub mod routine;
pub mod task;
pub mod water;

use serde::Serialize;

pub type CommandResult = Result<(), Box<dyn std::error::Error>>;

pub fn print_json<T: Serialize>(value: &T) -> CommandResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
