#![forbid(unsafe_code)]

//! Core domain model and prediction logic for the Cadence cycle tracker.
//!
//! This crate provides:
//! - Domain types (period entries, cycle statistics, day classifications)
//! - Cycle statistics and next period/ovulation prediction
//! - Per-day classification and month grid generation
//! - Reminder evaluation
//! - Persistence (JSON entry store, CSV import/export, config)
//!
//! The `stats`, `classify` and `grid` modules are pure: they never touch
//! disk, keep no state, and recompute everything from their arguments.

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod stats;
pub mod classify;
pub mod grid;
pub mod reminders;
pub mod store;
pub mod csv_io;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::Config;
pub use stats::compute_cycle_data;
pub use classify::{classify_day, classify_grid};
pub use grid::generate_grid;
pub use reminders::{upcoming_reminders, Reminder};
pub use store::{JsonFileStore, PeriodStore, WriteLock};
pub use csv_io::{export_csv, import_csv, merge_entries};
