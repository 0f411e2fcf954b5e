//! Keystroke event types and the modifier filter.
//!
//! Platform collectors translate their native key codes into [`Key`]. Only
//! enough detail to apply the exclusion list is kept; everything else is
//! `Other` with the raw code.

use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Platform-neutral key identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    Backspace,
    Shift,
    LeftShift,
    RightShift,
    Control,
    LeftControl,
    RightControl,
    Alt,
    LeftAlt,
    RightAlt,
    CapsLock,
    LeftMeta,
    RightMeta,
    /// Any other key, carrying the platform's raw code
    Other(u32),
}

impl Key {
    /// Whether this key is left out of WPM and keystroke accounting.
    ///
    /// Modifiers, Caps Lock, the OS meta keys and Backspace do not produce
    /// text and would inflate the count.
    pub fn is_excluded(&self) -> bool {
        !matches!(self, Key::Other(_))
    }

    /// Map a Windows virtual-key code.
    pub fn from_windows_vk(vk: u32) -> Self {
        match vk {
            0x08 => Key::Backspace,
            0x10 => Key::Shift,
            0x11 => Key::Control,
            0x12 => Key::Alt,
            0x14 => Key::CapsLock,
            0x5B => Key::LeftMeta,
            0x5C => Key::RightMeta,
            0xA0 => Key::LeftShift,
            0xA1 => Key::RightShift,
            0xA2 => Key::LeftControl,
            0xA3 => Key::RightControl,
            0xA4 => Key::LeftAlt,
            0xA5 => Key::RightAlt,
            other => Key::Other(other),
        }
    }

    /// Map a macOS virtual key code (`kVK_*`).
    pub fn from_macos_keycode(code: u16) -> Self {
        match code {
            0x33 => Key::Backspace,
            0x38 => Key::LeftShift,
            0x3C => Key::RightShift,
            0x3B => Key::LeftControl,
            0x3E => Key::RightControl,
            0x3A => Key::LeftAlt,
            0x3D => Key::RightAlt,
            0x39 => Key::CapsLock,
            0x37 => Key::LeftMeta,
            0x36 => Key::RightMeta,
            other => Key::Other(u32::from(other)),
        }
    }
}

/// A physical key-down delivered by a collector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeystrokeEvent {
    /// Which key went down
    pub key: Key,
    /// When the collector saw it
    pub timestamp: Instant,
}

impl KeystrokeEvent {
    /// Create an event stamped with the current instant.
    pub fn new(key: Key) -> Self {
        Self::at(key, Instant::now())
    }

    /// Create an event with an explicit timestamp.
    pub fn at(key: Key, timestamp: Instant) -> Self {
        Self { key, timestamp }
    }

    /// Whether the event counts toward WPM and the keystroke total.
    pub fn is_accepted(&self) -> bool {
        !self.key.is_excluded()
    }
}
