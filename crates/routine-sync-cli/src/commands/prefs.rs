//! Raw preference store commands for CLI.
//!
//! Values are read and written as JSON: strings quoted, numbers and
//! booleans bare, string lists as arrays.

use std::path::PathBuf;

use clap::Subcommand;
use routine_sync_core::prefs::{export_snapshot, import_snapshot};
use routine_sync_core::{PrefStore, PrefValue, SqliteStore};

use super::{print_json, CommandResult};

#[derive(Subcommand)]
pub enum PrefsAction {
    /// Print a value as JSON
    Get {
        /// Full key (e.g. "flutter.routines_count")
        key: String,
    },
    /// Store a JSON value
    Set {
        key: String,
        /// JSON value, e.g. 3, true, "\"text\"" or "[\"a\"]"
        value: String,
    },
    /// Delete a key
    Remove { key: String },
    /// List all keys
    List,
    /// Import a JSON object of key/value pairs
    Import {
        /// Path to the snapshot file
        file: PathBuf,
    },
    /// Print every key and value as one JSON object
    Export,
}

pub fn run(action: PrefsAction) -> CommandResult {
    let mut store = SqliteStore::open()?;

    match action {
        PrefsAction::Get { key } => {
            let value = store
                .get(&key)
                .ok_or_else(|| format!("no such key: {key}"))?;
            println!("{}", value.to_json());
        }
        PrefsAction::Set { key, value } => {
            let json: serde_json::Value = serde_json::from_str(&value)?;
            let pref = PrefValue::from_json(&json)
                .ok_or_else(|| format!("unsupported preference value: {value}"))?;
            store.put(&key, pref)?;
            println!("ok");
        }
        PrefsAction::Remove { key } => {
            store.remove(&key)?;
            println!("ok");
        }
        PrefsAction::List => {
            for key in store.keys() {
                println!("{key}");
            }
        }
        PrefsAction::Import { file } => {
            let content = std::fs::read_to_string(&file)?;
            let snapshot: serde_json::Value = serde_json::from_str(&content)?;
            let written = import_snapshot(&mut store, &snapshot)?;
            println!("Imported {written} preferences");
        }
        PrefsAction::Export => print_json(&export_snapshot(&store))?,
    }
    Ok(())
}
