//! Windows keystroke collection using a low-level keyboard hook.
//!
//! The hook runs on a dedicated thread with its own message loop. The hook
//! callback does nothing but translate the virtual-key code and `try_send` it,
//! so Windows never sees a slow callback (slow low-level hooks are silently
//! removed by the OS).

use crate::collector::types::{Key, KeystrokeEvent};
use crate::collector::CollectorConfig;
use crossbeam_channel::{bounded, Receiver, Sender};
use std::cell::RefCell;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use windows::Win32::Foundation::{HWND, LPARAM, LRESULT, WPARAM};
use windows::Win32::System::Threading::GetCurrentThreadId;
use windows::Win32::UI::WindowsAndMessaging::{
    CallNextHookEx, GetMessageW, PostThreadMessageW, SetWindowsHookExW, UnhookWindowsHookEx,
    HHOOK, KBDLLHOOKSTRUCT, MSG, WH_KEYBOARD_LL, WM_KEYDOWN, WM_QUIT, WM_SYSKEYDOWN,
};

/// The Windows collector.
pub struct WindowsCollector {
    sender: Sender<KeystrokeEvent>,
    receiver: Receiver<KeystrokeEvent>,
    running: Arc<AtomicBool>,
    hook_thread_id: Arc<AtomicU32>,
    thread_handle: Option<JoinHandle<()>>,
}

impl WindowsCollector {
    /// Create a new Windows collector.
    pub fn new(config: CollectorConfig) -> Self {
        // Use a bounded channel to prevent unbounded memory growth
        let (sender, receiver) = bounded(config.channel_capacity);

        Self {
            sender,
            receiver,
            running: Arc::new(AtomicBool::new(false)),
            hook_thread_id: Arc::new(AtomicU32::new(0)),
            thread_handle: None,
        }
    }

    /// Install the hook on a background thread.
    pub fn start(&mut self) -> Result<(), CollectorError> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(CollectorError::AlreadyRunning);
        }

        let sender = self.sender.clone();
        let running = self.running.clone();
        let thread_id = self.hook_thread_id.clone();

        let handle = thread::spawn(move || {
            if let Err(e) = run_hook_loop(sender, thread_id) {
                tracing::error!("Keyboard hook loop failed: {e}");
            }
            running.store(false, Ordering::SeqCst);
        });

        self.thread_handle = Some(handle);
        tracing::info!("Keyboard hook thread started");
        Ok(())
    }

    /// Uninstall the hook and join its thread.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);

        if let Some(handle) = self.thread_handle.take() {
            // GetMessageW blocks, so keep posting WM_QUIT until the loop exits.
            // The thread id is published only once the hook is installed.
            while !handle.is_finished() {
                let thread_id = self.hook_thread_id.load(Ordering::SeqCst);
                if thread_id != 0 {
                    unsafe {
                        let _ = PostThreadMessageW(thread_id, WM_QUIT, WPARAM(0), LPARAM(0));
                    }
                }
                thread::sleep(Duration::from_millis(10));
            }
            let _ = handle.join();
            self.hook_thread_id.store(0, Ordering::SeqCst);
            tracing::info!("Keyboard hook removed");
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

impl Drop for WindowsCollector {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Errors that can occur during event collection.
#[derive(Debug)]
pub enum CollectorError {
    AlreadyRunning,
    Stopped,
    HookInstallationFailed,
}

impl std::fmt::Display for CollectorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollectorError::AlreadyRunning => write!(f, "Collector is already running"),
            CollectorError::Stopped => write!(f, "Collector stopped unexpectedly"),
            CollectorError::HookInstallationFailed => {
                write!(f, "Failed to install Windows keyboard hook")
            }
        }
    }
}

impl std::error::Error for CollectorError {}

// Hook callbacks cannot capture state, so the sender lives in the hook
// thread's thread-local storage.
thread_local! {
    static EVENT_SENDER: RefCell<Option<Sender<KeystrokeEvent>>> = const { RefCell::new(None) };
}

/// Low-level keyboard hook callback.
unsafe extern "system" fn keyboard_hook_proc(
    n_code: i32,
    w_param: WPARAM,
    l_param: LPARAM,
) -> LRESULT {
    if n_code >= 0 && matches!(w_param.0 as u32, WM_KEYDOWN | WM_SYSKEYDOWN) {
        let kb_struct = &*(l_param.0 as *const KBDLLHOOKSTRUCT);
        let event = KeystrokeEvent::new(Key::from_windows_vk(kb_struct.vkCode));

        EVENT_SENDER.with(|sender| {
            if let Some(ref s) = *sender.borrow() {
                // Never block inside the hook
                let _ = s.try_send(event);
            }
        });
    }

    CallNextHookEx(HHOOK::default(), n_code, w_param, l_param)
}

/// Install the hook and pump messages until `WM_QUIT`.
fn run_hook_loop(
    sender: Sender<KeystrokeEvent>,
    thread_id: Arc<AtomicU32>,
) -> Result<(), CollectorError> {
    EVENT_SENDER.with(|s| {
        *s.borrow_mut() = Some(sender);
    });

    unsafe {
        let hook = SetWindowsHookExW(WH_KEYBOARD_LL, Some(keyboard_hook_proc), None, 0)
            .map_err(|_| CollectorError::HookInstallationFailed)?;

        thread_id.store(GetCurrentThreadId(), Ordering::SeqCst);

        let mut msg = MSG::default();
        // > 0: message, 0: WM_QUIT, < 0: error
        while GetMessageW(&mut msg, HWND::default(), 0, 0).0 > 0 {}

        let _ = UnhookWindowsHookEx(hook);
    }

    EVENT_SENDER.with(|s| {
        s.borrow_mut().take();
    });

    Ok(())
}

/// Check whether a low-level keyboard hook can be installed.
pub fn check_permission() -> bool {
    unsafe {
        match SetWindowsHookExW(WH_KEYBOARD_LL, Some(keyboard_hook_proc), None, 0) {
            Ok(hook) => {
                let _ = UnhookWindowsHookEx(hook);
                true
            }
            Err(_) => false,
        }
    }
}
