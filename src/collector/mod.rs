//! Global keystroke collection.
//!
//! Each platform collector installs an OS-level hook on its own thread and
//! forwards key-downs through a bounded channel. The consumer applies the
//! exclusion filter and does all accounting on its own thread.

pub mod types;

#[cfg(target_os = "macos")]
pub mod macos;

#[cfg(target_os = "windows")]
pub mod windows;

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
pub mod noop;

// Re-export commonly used types
pub use types::{Key, KeystrokeEvent};

#[cfg(target_os = "macos")]
pub use macos::{check_permission, CollectorError, MacOSCollector};

/// Platform-agnostic collector type alias
#[cfg(target_os = "macos")]
pub type Collector = MacOSCollector;

#[cfg(target_os = "windows")]
pub use windows::{check_permission, CollectorError, WindowsCollector};

/// Platform-agnostic collector type alias
#[cfg(target_os = "windows")]
pub type Collector = WindowsCollector;

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
pub use noop::{check_permission, CollectorError, NoopCollector};

/// Platform-agnostic collector type alias
#[cfg(not(any(target_os = "macos", target_os = "windows")))]
pub type Collector = NoopCollector;

/// Collector settings shared by all platforms.
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// Events buffered between the hook thread and the consumer
    pub channel_capacity: usize,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 10_000,
        }
    }
}
