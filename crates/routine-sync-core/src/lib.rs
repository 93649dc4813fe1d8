//! # Routine Sync Core Library
//!
//! Core logic behind the home-screen routine widget of a companion mobile
//! app. The app owns a flat preference store; this library reads routine
//! definitions from it and advances the current routine one step at a
//! time, writing progress back in the exact layout the app expects.
//! A standalone CLI drives every operation over a local SQLite mirror of
//! that store.
//!
//! ## Architecture
//!
//! - **Preferences**: typed key-value store trait with SQLite and in-memory
//!   backends, plus snapshot import and export
//! - **Routine tracker**: current-routine selection, the complete / postpone /
//!   skip state machine, and hand-off to the next routine
//! - **Side widgets**: task list, water intake, energy record and the
//!   notification alarm filter sharing the same store
//!
//! ## Key Components
//!
//! - [`RoutineTracker`]: step actions and routine hand-off
//! - [`EffectiveDay`]: calendar date shifted by the rollover hour
//! - [`SqliteStore`]: on-disk preference mirror
//! - [`Config`]: local configuration management

pub mod alerts;
pub mod codec;
pub mod day;
pub mod energy;
pub mod error;
pub mod prefs;
pub mod routine;
pub mod storage;
pub mod tasks;
pub mod water;

pub use alerts::{AlarmSettings, AlertFilter, NightWindow};
pub use day::EffectiveDay;
pub use energy::{EnergySnapshot, EnergyTracker};
pub use error::{ConfigError, CoreError, StoreError};
pub use prefs::{MemoryStore, PrefEdit, PrefStore, PrefValue};
pub use routine::{
    DayProgress, Routine, RoutineHandoff, RoutineTracker, RoutineView, StepAction, StepOutcome,
};
pub use storage::{Config, SqliteStore};
pub use tasks::{PendingTasks, TaskEntry, TaskList};
pub use water::{WaterStatus, WaterTracker, WaterUpdate};
