//! WPM Meter - background typing-speed meter.
//!
//! Measures typing speed in real time from global keystroke events and keeps
//! a lifetime keystroke count that survives restarts.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          WPM Meter                           │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌──────────────┐        │
//! │  │  Collector  │──▶│    Meter    │──▶│ Display sink │        │
//! │  │ (OS hook)   │   │ (12s window)│   │ (on change)  │        │
//! │  └─────────────┘   └─────────────┘   └──────────────┘        │
//! │                           │                                  │
//! │                           ▼                                  │
//! │                    ┌─────────────┐   ┌──────────────┐        │
//! │                    │   Counter   │◀──│  Autosaver   │        │
//! │                    │  (atomic)   │   │  (60s tick)  │        │
//! │                    └─────────────┘   └──────────────┘        │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::time::Instant;
//! use wpm_meter::core::{create_shared_counter, Meter};
//!
//! let counter = create_shared_counter();
//! let mut meter = Meter::new(counter.clone());
//!
//! let reading = meter.record_keystroke(Instant::now());
//! println!("{}", reading.tooltip());
//! ```

pub mod collector;
pub mod config;
pub mod core;
pub mod display;

// Re-export key types at crate root for convenience
pub use collector::{Collector, CollectorConfig, CollectorError, Key, KeystrokeEvent};
pub use config::{Config, ConfigError};
pub use self::core::{
    format_thousands, Autosaver, CounterError, CounterStore, DisplaySink, Meter, MeterReading,
    RateEstimator, SharedCounter, WpmSample,
};
pub use display::TerminalDisplay;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
