//! Terminal rendering of meter readings.
//!
//! Stands in for a tray icon: a line is written only when the rounded WPM
//! changes, which is the same cadence an icon would be re-rendered at.

use crate::core::meter::{DisplaySink, MeterReading};
use chrono::Local;
use std::io::Write;

/// Writes one line per WPM change.
pub struct TerminalDisplay<W: Write> {
    out: W,
    repaints: u64,
}

impl<W: Write> TerminalDisplay<W> {
    pub fn new(out: W) -> Self {
        Self { out, repaints: 0 }
    }

    /// Number of lines written so far.
    pub fn repaints(&self) -> u64 {
        self.repaints
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl TerminalDisplay<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> DisplaySink for TerminalDisplay<W> {
    fn update(&mut self, reading: &MeterReading) {
        if !reading.changed {
            return;
        }

        let line = format!("[{}] {}", Local::now().format("%H:%M:%S"), reading.tooltip());
        if let Err(e) = writeln!(self.out, "{line}").and_then(|_| self.out.flush()) {
            tracing::warn!("Could not write reading: {e}");
            return;
        }
        self.repaints += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(rounded_wpm: u32, changed: bool) -> MeterReading {
        MeterReading {
            wpm: rounded_wpm as f64,
            rounded_wpm,
            total_keystrokes: 1_500,
            total_text: "1,500".to_string(),
            changed,
        }
    }

    #[test]
    fn test_writes_only_on_change() {
        let mut display = TerminalDisplay::new(Vec::new());

        display.update(&reading(40, true));
        display.update(&reading(40, false));
        display.update(&reading(41, true));

        assert_eq!(display.repaints(), 2);
        let out = String::from_utf8(display.into_inner()).unwrap();
        assert_eq!(out.lines().count(), 2);
        assert!(out.contains("40 WPM | 1,500 keystrokes"));
        assert!(out.contains("41 WPM"));
    }
}
