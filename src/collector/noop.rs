//! Fallback collector for platforms without a global keyboard hook.
//!
//! This exists so the crate (and binary) can build on targets other than
//! Windows and macOS. It never produces events on its own; keystrokes can be
//! fed in through [`NoopCollector::injector`].

use crate::collector::types::KeystrokeEvent;
use crate::collector::CollectorConfig;
use crossbeam_channel::{bounded, Receiver, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Errors that can occur during event collection.
#[derive(Debug)]
pub enum CollectorError {
    AlreadyRunning,
    Stopped,
}

impl std::fmt::Display for CollectorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollectorError::AlreadyRunning => write!(f, "Collector is already running"),
            CollectorError::Stopped => write!(f, "Collector stopped unexpectedly"),
        }
    }
}

impl std::error::Error for CollectorError {}

/// A collector without an OS hook.
pub struct NoopCollector {
    sender: Sender<KeystrokeEvent>,
    receiver: Receiver<KeystrokeEvent>,
    running: Arc<AtomicBool>,
}

impl NoopCollector {
    /// Create a new noop collector.
    pub fn new(config: CollectorConfig) -> Self {
        let (sender, receiver) = bounded(config.channel_capacity);
        Self {
            sender,
            receiver,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Mark the collector as running.
    pub fn start(&mut self) -> Result<(), CollectorError> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(CollectorError::AlreadyRunning);
        }
        tracing::info!("No global keyboard hook on this platform; waiting for injected events");
        Ok(())
    }

    /// Mark the collector as stopped.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Check if the collector is currently running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Fail if the collector has stopped on its own.
    ///
    /// The hook thread clears the running flag when it exits, including when
    /// installation fails after [`start`](Self::start) has returned.
    pub fn ensure_running(&self) -> Result<(), CollectorError> {
        if self.is_running() {
            Ok(())
        } else {
            Err(CollectorError::Stopped)
        }
    }

    /// Get the receiver for keystroke events.
    pub fn receiver(&self) -> &Receiver<KeystrokeEvent> {
        &self.receiver
    }

    /// Try to receive an event without blocking.
    pub fn try_recv(&self) -> Option<KeystrokeEvent> {
        self.receiver.try_recv().ok()
    }

    /// Sender for feeding keystrokes from another source.
    pub fn injector(&self) -> Sender<KeystrokeEvent> {
        self.sender.clone()
    }
}

/// There is no permission gate without an OS hook.
pub fn check_permission() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::types::Key;

    #[test]
    fn test_start_twice_fails() {
        let mut collector = NoopCollector::new(CollectorConfig::default());
        assert!(!collector.is_running());

        collector.start().unwrap();
        assert!(collector.is_running());
        assert!(matches!(
            collector.start(),
            Err(CollectorError::AlreadyRunning)
        ));

        collector.stop();
        assert!(!collector.is_running());
    }

    #[test]
    fn test_ensure_running_reports_stopped_collector() {
        let mut collector = NoopCollector::new(CollectorConfig::default());
        assert!(matches!(
            collector.ensure_running(),
            Err(CollectorError::Stopped)
        ));

        collector.start().unwrap();
        assert!(collector.ensure_running().is_ok());

        // the running flag is what hook threads clear when they exit
        collector.running.store(false, Ordering::SeqCst);
        let err = collector.ensure_running().unwrap_err();
        assert_eq!(err.to_string(), "Collector stopped unexpectedly");
    }

    #[test]
    fn test_injected_events_arrive_in_order() {
        let collector = NoopCollector::new(CollectorConfig::default());
        let injector = collector.injector();

        injector.send(KeystrokeEvent::new(Key::Other(1))).unwrap();
        injector.send(KeystrokeEvent::new(Key::Other(2))).unwrap();

        assert_eq!(collector.try_recv().map(|e| e.key), Some(Key::Other(1)));
        assert_eq!(collector.try_recv().map(|e| e.key), Some(Key::Other(2)));
        assert!(collector.try_recv().is_none());
    }
}
