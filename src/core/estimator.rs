//! Sliding-window typing speed estimation.
//!
//! Keystroke instants are kept in a time-bounded window (12 seconds by
//! default). The rate is measured over the span since the oldest retained
//! keystroke rather than over the full window, so the estimate reacts as soon
//! as a burst starts instead of waiting for the window to fill.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Default rolling window length.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(12);

/// Keystrokes per word, the usual typing-speed convention.
pub const KEYSTROKES_PER_WORD: f64 = 5.0;

/// Result of a single ingest.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WpmSample {
    /// Raw words-per-minute estimate
    pub wpm: f64,
    /// Number of keystrokes currently in the window
    pub window_len: usize,
}

impl WpmSample {
    /// WPM rounded to the nearest whole word.
    pub fn rounded(&self) -> u32 {
        round_wpm(self.wpm)
    }
}

/// Round a raw WPM value to the nearest integer for display.
pub fn round_wpm(wpm: f64) -> u32 {
    if wpm.is_finite() && wpm > 0.0 {
        wpm.round() as u32
    } else {
        0
    }
}

/// Rolling-window WPM estimator.
///
/// Not internally synchronized: it must be driven from a single thread.
#[derive(Debug, Clone)]
pub struct RateEstimator {
    window: Duration,
    keystrokes: VecDeque<Instant>,
    last_wpm: f64,
}

impl RateEstimator {
    /// Create an estimator with the default 12 second window.
    pub fn new() -> Self {
        Self::with_window(DEFAULT_WINDOW)
    }

    /// Create an estimator with a custom window length.
    pub fn with_window(window: Duration) -> Self {
        Self {
            window,
            keystrokes: VecDeque::new(),
            last_wpm: 0.0,
        }
    }

    /// Record one keystroke at `now` and return the fresh estimate.
    ///
    /// `now` is always appended at the tail. Entries whose age relative to
    /// `now` is strictly greater than the window are evicted from the head.
    pub fn ingest(&mut self, now: Instant) -> WpmSample {
        self.keystrokes.push_back(now);

        while let Some(&oldest) = self.keystrokes.front() {
            // saturating: an out-of-order `now` earlier than `oldest` has age zero
            if now.saturating_duration_since(oldest) > self.window {
                self.keystrokes.pop_front();
            } else {
                break;
            }
        }

        self.last_wpm = self.compute(now);

        WpmSample {
            wpm: self.last_wpm,
            window_len: self.keystrokes.len(),
        }
    }

    /// Last computed estimate. Does not recompute.
    pub fn current_wpm(&self) -> f64 {
        self.last_wpm
    }

    /// Number of keystrokes currently retained.
    pub fn len(&self) -> usize {
        self.keystrokes.len()
    }

    /// Whether the window is empty.
    pub fn is_empty(&self) -> bool {
        self.keystrokes.is_empty()
    }

    /// Length of the rolling window.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Oldest retained keystroke, if any.
    pub fn oldest(&self) -> Option<Instant> {
        self.keystrokes.front().copied()
    }

    /// Drop all retained keystrokes, e.g. when collection is paused.
    pub fn clear(&mut self) {
        self.keystrokes.clear();
        self.last_wpm = 0.0;
    }

    fn compute(&self, now: Instant) -> f64 {
        if self.keystrokes.len() < 2 {
            return 0.0;
        }

        let Some(&first) = self.keystrokes.front() else {
            return 0.0;
        };

        let elapsed_minutes = now.saturating_duration_since(first).as_secs_f64() / 60.0;
        if elapsed_minutes <= 0.0 {
            return 0.0;
        }

        let words = self.keystrokes.len() as f64 / KEYSTROKES_PER_WORD;
        words / elapsed_minutes
    }
}

impl Default for RateEstimator {
    fn default() -> Self {
        Self::new()
    }
}
