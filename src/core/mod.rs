//! Core functionality for the WPM meter.
//!
//! This module contains:
//! - The rolling-window rate estimator
//! - The persistent cumulative keystroke counter
//! - The meter tying both to a single keystroke path
//! - Periodic autosave of the counter

pub mod autosave;
pub mod counter;
pub mod estimator;
pub mod meter;

// Re-export commonly used types
pub use autosave::{Autosaver, DEFAULT_AUTOSAVE_INTERVAL};
pub use counter::{
    create_shared_counter, default_record_path, read_record, CounterError, CounterStore,
    SharedCounter,
};
pub use estimator::{round_wpm, RateEstimator, WpmSample, DEFAULT_WINDOW, KEYSTROKES_PER_WORD};
pub use meter::{format_thousands, DisplaySink, Meter, MeterReading};
