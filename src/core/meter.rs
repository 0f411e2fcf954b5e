//! The serialized keystroke path.
//!
//! A [`Meter`] owns the rate estimator and a handle to the shared counter. It
//! is driven from exactly one thread (the event loop) and turns every accepted
//! keystroke into a [`MeterReading`] for the display layer.

use crate::collector::types::KeystrokeEvent;
use crate::core::counter::SharedCounter;
use crate::core::estimator::{round_wpm, RateEstimator};
use std::time::{Duration, Instant};

/// What the display layer needs after each accepted keystroke.
#[derive(Debug, Clone, PartialEq)]
pub struct MeterReading {
    /// Raw WPM estimate
    pub wpm: f64,
    /// WPM rounded to the nearest integer
    pub rounded_wpm: u32,
    /// Lifetime keystroke count
    pub total_keystrokes: u64,
    /// Lifetime count with thousands separators, for tooltip text
    pub total_text: String,
    /// Whether `rounded_wpm` differs from the previous reading
    pub changed: bool,
}

impl MeterReading {
    /// Tooltip-style one-line summary.
    pub fn tooltip(&self) -> String {
        format!("{} WPM | {} keystrokes", self.rounded_wpm, self.total_text)
    }
}

/// Receives readings; rendering lives behind this trait.
pub trait DisplaySink {
    /// Called after every accepted keystroke.
    fn update(&mut self, reading: &MeterReading);
}

/// Estimator plus counter, updated in lockstep.
pub struct Meter {
    estimator: RateEstimator,
    counter: SharedCounter,
    last_rounded: u32,
}

impl Meter {
    /// Create a meter with the default window.
    pub fn new(counter: SharedCounter) -> Self {
        Self::with_estimator(RateEstimator::new(), counter)
    }

    /// Create a meter with a custom window length.
    pub fn with_window(window: Duration, counter: SharedCounter) -> Self {
        Self::with_estimator(RateEstimator::with_window(window), counter)
    }

    fn with_estimator(estimator: RateEstimator, counter: SharedCounter) -> Self {
        Self {
            estimator,
            counter,
            last_rounded: 0,
        }
    }

    /// Account for one accepted keystroke at `now`.
    pub fn record_keystroke(&mut self, now: Instant) -> MeterReading {
        let sample = self.estimator.ingest(now);
        self.counter.increment();

        let rounded = sample.rounded();
        let changed = rounded != self.last_rounded;
        self.last_rounded = rounded;

        let total = self.counter.snapshot();
        MeterReading {
            wpm: sample.wpm,
            rounded_wpm: rounded,
            total_keystrokes: total,
            total_text: format_thousands(total),
            changed,
        }
    }

    /// Account for a collected event, skipping excluded keys.
    pub fn handle_event(&mut self, event: &KeystrokeEvent) -> Option<MeterReading> {
        if !event.is_accepted() {
            return None;
        }
        Some(self.record_keystroke(event.timestamp))
    }

    /// Forget the rolling window. The counter is untouched.
    ///
    /// The last reported value is kept, so the first reading afterwards is
    /// flagged as changed if it differs from what the display still shows.
    pub fn reset_window(&mut self) {
        self.estimator.clear();
    }

    /// Last computed raw WPM.
    pub fn current_wpm(&self) -> f64 {
        self.estimator.current_wpm()
    }

    /// Last computed WPM, rounded.
    pub fn current_rounded_wpm(&self) -> u32 {
        round_wpm(self.estimator.current_wpm())
    }

    /// Shared counter handle.
    pub fn counter(&self) -> &SharedCounter {
        &self.counter
    }
}

/// Format `value` as a decimal string grouped by thousands, e.g. `1,234,567`.
pub fn format_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }

    out
}
