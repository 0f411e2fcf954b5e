//! Periodic persistence of the keystroke counter.
//!
//! A single background thread persists the shared counter once per interval.
//! Ticks never overlap: a slow write just delays the next one. Stopping the
//! autosaver joins the thread and performs the final save on the caller's
//! thread.

use crate::core::counter::{CounterError, SharedCounter};
use crossbeam_channel::{bounded, select, tick, Sender};
use std::path::PathBuf;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Default interval between saves.
pub const DEFAULT_AUTOSAVE_INTERVAL: Duration = Duration::from_secs(60);

/// Background saver for a [`SharedCounter`].
pub struct Autosaver {
    counter: SharedCounter,
    path: PathBuf,
    shutdown: Option<Sender<()>>,
    thread_handle: Option<JoinHandle<()>>,
}

impl Autosaver {
    /// Start saving `counter` to `path` every `interval`.
    pub fn start(counter: SharedCounter, path: PathBuf, interval: Duration) -> Self {
        let (shutdown_tx, shutdown_rx) = bounded::<()>(1);

        let thread_counter = counter.clone();
        let thread_path = path.clone();
        let handle = thread::spawn(move || {
            let ticker = tick(interval);
            loop {
                let stop = select! {
                    recv(ticker) -> _ => {
                        if let Err(e) = thread_counter.persist(&thread_path) {
                            tracing::warn!("Autosave failed, retrying next tick: {e}");
                        }
                        false
                    }
                    recv(shutdown_rx) -> _ => true,
                };
                if stop {
                    break;
                }
            }
        });

        tracing::debug!(interval_secs = interval.as_secs(), path = %path.display(), "autosave started");

        Self {
            counter,
            path,
            shutdown: Some(shutdown_tx),
            thread_handle: Some(handle),
        }
    }

    /// Path the counter is saved to.
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Stop the timer and persist one last time.
    pub fn stop(&mut self) -> Result<(), CounterError> {
        self.halt();
        self.counter.persist(&self.path)
    }

    fn halt(&mut self) {
        // dropping the sender disconnects the channel and wakes the thread
        self.shutdown.take();
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Autosaver {
    fn drop(&mut self) {
        if self.thread_handle.is_some() {
            self.halt();
            if let Err(e) = self.counter.persist(&self.path) {
                tracing::warn!("Final save failed: {e}");
            }
        }
    }
}
