//! macOS keystroke collection using a CGEvent tap.
//!
//! A listen-only tap on `KeyDown` runs inside a CFRunLoop on its own thread.
//! Requires the Input Monitoring permission.

use crate::collector::types::{Key, KeystrokeEvent};
use crate::collector::CollectorConfig;
use core_foundation::runloop::{kCFRunLoopCommonModes, CFRunLoop};
use core_graphics::event::{
    CGEventTap, CGEventTapLocation, CGEventTapOptions, CGEventTapPlacement, CGEventType,
    CallbackResult, EventField,
};
use crossbeam_channel::{bounded, Receiver, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// The macOS collector.
pub struct MacOSCollector {
    sender: Sender<KeystrokeEvent>,
    receiver: Receiver<KeystrokeEvent>,
    running: Arc<AtomicBool>,
    thread_handle: Option<JoinHandle<()>>,
}

impl MacOSCollector {
    /// Create a new macOS collector.
    pub fn new(config: CollectorConfig) -> Self {
        // Use a bounded channel to prevent unbounded memory growth
        let (sender, receiver) = bounded(config.channel_capacity);

        Self {
            sender,
            receiver,
            running: Arc::new(AtomicBool::new(false)),
            thread_handle: None,
        }
    }

    /// Start the event tap on a background thread.
    pub fn start(&mut self) -> Result<(), CollectorError> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(CollectorError::AlreadyRunning);
        }

        let sender = self.sender.clone();
        let running = self.running.clone();

        let handle = thread::spawn(move || {
            if let Err(e) = run_event_loop(sender, running.clone()) {
                tracing::error!("Event tap loop failed: {e}");
            }
            running.store(false, Ordering::SeqCst);
        });

        self.thread_handle = Some(handle);
        tracing::info!("Event tap thread started");
        Ok(())
    }

    /// Stop the tap and join its thread.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread_handle.take() {
            // The run loop wakes every 100ms to check the flag
            let _ = handle.join();
            tracing::info!("Event tap removed");
        }
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
}

impl Drop for MacOSCollector {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Errors that can occur during event collection.
#[derive(Debug)]
pub enum CollectorError {
    AlreadyRunning,
    Stopped,
    PermissionDenied,
    TapCreationFailed,
    RunLoopSourceFailed,
}

impl std::fmt::Display for CollectorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollectorError::AlreadyRunning => write!(f, "Collector is already running"),
            CollectorError::Stopped => write!(f, "Collector stopped unexpectedly"),
            CollectorError::PermissionDenied => {
                write!(f, "Input Monitoring permission not granted")
            }
            CollectorError::TapCreationFailed => write!(f, "Failed to create CGEvent tap"),
            CollectorError::RunLoopSourceFailed => {
                write!(f, "Failed to create run loop source")
            }
        }
    }
}

impl std::error::Error for CollectorError {}

fn run_event_loop(
    sender: Sender<KeystrokeEvent>,
    running: Arc<AtomicBool>,
) -> Result<(), CollectorError> {
    let tap = CGEventTap::new(
        CGEventTapLocation::Session,
        CGEventTapPlacement::HeadInsertEventTap,
        CGEventTapOptions::ListenOnly,
        vec![CGEventType::KeyDown],
        move |_proxy, event_type, event| {
            if matches!(event_type, CGEventType::KeyDown) {
                let code = event.get_integer_value_field(EventField::KEYBOARD_EVENT_KEYCODE);
                let key = Key::from_macos_keycode(code as u16);
                // Don't block if the channel is full - just drop the event
                let _ = sender.try_send(KeystrokeEvent::new(key));
            }
            CallbackResult::Keep
        },
    )
    .map_err(|_| CollectorError::TapCreationFailed)?;

    let source = tap
        .mach_port()
        .create_runloop_source(0)
        .map_err(|_| CollectorError::RunLoopSourceFailed)?;

    let run_loop = CFRunLoop::get_current();
    unsafe {
        run_loop.add_source(&source, kCFRunLoopCommonModes);
    }

    tap.enable();

    while running.load(Ordering::SeqCst) {
        CFRunLoop::run_in_mode(
            unsafe { kCFRunLoopCommonModes },
            Duration::from_millis(100),
            false,
        );
    }

    // The tap is disabled when dropped
    Ok(())
}

/// Check for Input Monitoring permission by creating a passive tap.
pub fn check_permission() -> bool {
    CGEventTap::new(
        CGEventTapLocation::Session,
        CGEventTapPlacement::HeadInsertEventTap,
        CGEventTapOptions::ListenOnly,
        vec![CGEventType::KeyDown],
        |_proxy, _type, _event| CallbackResult::Keep,
    )
    .is_ok()
}
