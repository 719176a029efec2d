//! Windows implementation of event collection using low-level hooks.
//!
//! Captures keyboard and mouse events at the system level through
//! `SetWindowsHookEx` (WH_KEYBOARD_LL / WH_MOUSE_LL). The hook callbacks
//! always pass events on unchanged; this is a passive observer.

use crate::collector::types::{KeyInput, MouseButton, RawInput};
use crate::core::session::Listeners;
use crossbeam_channel::Sender;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use windows::Win32::Foundation::{HWND, LPARAM, LRESULT, WPARAM};
use windows::Win32::UI::WindowsAndMessaging::{
    CallNextHookEx, PeekMessageW, SetWindowsHookExW, UnhookWindowsHookEx, HHOOK, KBDLLHOOKSTRUCT,
    MSG, MSLLHOOKSTRUCT, PM_REMOVE, WH_KEYBOARD_LL, WH_MOUSE_LL, WM_KEYDOWN, WM_LBUTTONDOWN,
    WM_LBUTTONUP, WM_MBUTTONDOWN, WM_MBUTTONUP, WM_MOUSEHWHEEL, WM_MOUSEWHEEL, WM_RBUTTONDOWN,
    WM_RBUTTONUP, WM_SYSKEYDOWN, WM_XBUTTONDOWN, WM_XBUTTONUP,
};

/// Configuration for which event sources to capture.
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    pub capture_keyboard: bool,
    pub capture_mouse: bool,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            capture_keyboard: true,
            capture_mouse: true,
        }
    }
}

/// The Windows event collector using low-level hooks.
pub struct WindowsCollector {
    config: CollectorConfig,
    sender: Sender<RawInput>,
    running: Arc<AtomicBool>,
    thread_handle: Option<JoinHandle<()>>,
}

impl WindowsCollector {
    /// Create a new Windows collector feeding raw input into `sender`.
    pub fn new(config: CollectorConfig, sender: Sender<RawInput>) -> Self {
        Self {
            config,
            sender,
            running: Arc::new(AtomicBool::new(false)),
            thread_handle: None,
        }
    }

    /// Start capturing events in a background thread.
    pub fn start(&mut self) -> Result<(), CollectorError> {
        if self.running.load(Ordering::SeqCst) {
            return Err(CollectorError::AlreadyRunning);
        }

        self.running.store(true, Ordering::SeqCst);

        let sender = self.sender.clone();
        let running = self.running.clone();
        let config = self.config.clone();

        let handle = thread::spawn(move || {
            if let Err(e) = run_hook_loop(sender, running.clone(), config) {
                eprintln!("Hook loop error: {e}");
            }
            running.store(false, Ordering::SeqCst);
        });

        self.thread_handle = Some(handle);
        Ok(())
    }

    /// Stop capturing events. The hook thread exits at its next poll.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }

    /// Check if the collector is currently running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl Drop for WindowsCollector {
    fn drop(&mut self) {
        self.stop();
    }
}

impl Listeners for WindowsCollector {
    fn halt(&mut self) {
        self.stop();
    }
}

/// Errors that can occur during event collection.
#[derive(Debug)]
pub enum CollectorError {
    AlreadyRunning,
    HookInstallationFailed,
}

impl std::fmt::Display for CollectorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollectorError::AlreadyRunning => write!(f, "collector is already running"),
            CollectorError::HookInstallationFailed => {
                write!(f, "failed to install Windows hook")
            }
        }
    }
}

impl std::error::Error for CollectorError {}

// The hook callbacks cannot capture variables; the sender is handed to them
// through a thread-local on the hook thread.
thread_local! {
    static EVENT_SENDER: std::cell::RefCell<Option<Sender<RawInput>>> =
        const { std::cell::RefCell::new(None) };
}

fn send_raw(raw: RawInput) {
    EVENT_SENDER.with(|sender| {
        if let Some(ref s) = *sender.borrow() {
            let _ = s.send(raw);
        }
    });
}

/// Low-level keyboard hook callback. Only press transitions are forwarded
/// (auto-repeat arrives as repeated presses, matching what is tracked).
unsafe extern "system" fn keyboard_hook_proc(
    n_code: i32,
    w_param: WPARAM,
    l_param: LPARAM,
) -> LRESULT {
    if n_code >= 0 {
        let kb_struct = &*(l_param.0 as *const KBDLLHOOKSTRUCT);
        let w_param_u32 = w_param.0 as u32;

        if matches!(w_param_u32, WM_KEYDOWN | WM_SYSKEYDOWN) {
            send_raw(RawInput::Key(key_from_vk(kb_struct.vkCode)));
        }
    }

    CallNextHookEx(HHOOK::default(), n_code, w_param, l_param)
}

/// Low-level mouse hook callback. Button transitions carry the press edge;
/// wheel motions carry the raw signed delta (positive is up).
unsafe extern "system" fn mouse_hook_proc(
    n_code: i32,
    w_param: WPARAM,
    l_param: LPARAM,
) -> LRESULT {
    if n_code >= 0 {
        let mouse_struct = &*(l_param.0 as *const MSLLHOOKSTRUCT);
        let w_param_u32 = w_param.0 as u32;
        let x = mouse_struct.pt.x;
        let y = mouse_struct.pt.y;

        let raw = match w_param_u32 {
            WM_LBUTTONDOWN => Some(RawInput::button_down(x, y, MouseButton::Left)),
            WM_LBUTTONUP => Some(RawInput::button_up(x, y, MouseButton::Left)),
            WM_RBUTTONDOWN => Some(RawInput::button_down(x, y, MouseButton::Right)),
            WM_RBUTTONUP => Some(RawInput::button_up(x, y, MouseButton::Right)),
            WM_MBUTTONDOWN => Some(RawInput::button_down(x, y, MouseButton::Middle)),
            WM_MBUTTONUP => Some(RawInput::button_up(x, y, MouseButton::Middle)),

            WM_XBUTTONDOWN | WM_XBUTTONUP => {
                // High word of mouseData identifies the extra button.
                let index = ((mouse_struct.mouseData >> 16) & 0xFFFF) as u8;
                let button = MouseButton::Other(index);
                if w_param_u32 == WM_XBUTTONDOWN {
                    Some(RawInput::button_down(x, y, button))
                } else {
                    Some(RawInput::button_up(x, y, button))
                }
            }

            WM_MOUSEWHEEL => {
                // High word of mouseData contains the signed wheel delta.
                let delta = ((mouse_struct.mouseData >> 16) & 0xFFFF) as i16;
                Some(RawInput::wheel(x, y, 0, delta as i32))
            }

            WM_MOUSEHWHEEL => {
                let delta = ((mouse_struct.mouseData >> 16) & 0xFFFF) as i16;
                Some(RawInput::wheel(x, y, delta as i32, 0))
            }

            _ => None,
        };

        if let Some(raw) = raw {
            send_raw(raw);
        }
    }

    CallNextHookEx(HHOOK::default(), n_code, w_param, l_param)
}

/// Install the configured hooks and pump messages until stopped.
fn run_hook_loop(
    sender: Sender<RawInput>,
    running: Arc<AtomicBool>,
    config: CollectorConfig,
) -> Result<(), CollectorError> {
    EVENT_SENDER.with(|s| {
        *s.borrow_mut() = Some(sender);
    });

    unsafe {
        let mut hooks: Vec<HHOOK> = Vec::new();

        if config.capture_keyboard {
            match SetWindowsHookExW(WH_KEYBOARD_LL, Some(keyboard_hook_proc), None, 0) {
                Ok(hook) => hooks.push(hook),
                Err(_) => {
                    for hook in hooks {
                        let _ = UnhookWindowsHookEx(hook);
                    }
                    return Err(CollectorError::HookInstallationFailed);
                }
            }
        }

        if config.capture_mouse {
            match SetWindowsHookExW(WH_MOUSE_LL, Some(mouse_hook_proc), None, 0) {
                Ok(hook) => hooks.push(hook),
                Err(_) => {
                    for hook in hooks {
                        let _ = UnhookWindowsHookEx(hook);
                    }
                    return Err(CollectorError::HookInstallationFailed);
                }
            }
        }

        // Low-level hooks need a message loop on the installing thread.
        // Poll instead of blocking in GetMessage so the stop flag is
        // observed promptly.
        let mut msg = MSG::default();
        while running.load(Ordering::SeqCst) {
            while PeekMessageW(&mut msg, HWND::default(), 0, 0, PM_REMOVE).as_bool() {}
            thread::sleep(Duration::from_millis(10));
        }

        for hook in hooks {
            let _ = UnhookWindowsHookEx(hook);
        }
    }

    Ok(())
}

/// Map a Windows virtual-key code to a key identity (reference US layout).
fn key_from_vk(vk: u32) -> KeyInput {
    match vk {
        // Digits and letters map directly.
        0x30..=0x39 => KeyInput::Char((b'0' + (vk - 0x30) as u8) as char),
        0x41..=0x5A => KeyInput::Char((b'a' + (vk - 0x41) as u8) as char),

        // Numpad.
        0x60..=0x69 => KeyInput::Char((b'0' + (vk - 0x60) as u8) as char),
        0x6A => KeyInput::Char('*'),
        0x6B => KeyInput::Char('+'),
        0x6D => KeyInput::Char('-'),
        0x6E => KeyInput::Char('.'),
        0x6F => KeyInput::Char('/'),

        // OEM punctuation (US layout positions).
        0xBA => KeyInput::Char(';'),
        0xBB => KeyInput::Char('='),
        0xBC => KeyInput::Char(','),
        0xBD => KeyInput::Char('-'),
        0xBE => KeyInput::Char('.'),
        0xBF => KeyInput::Char('/'),
        0xC0 => KeyInput::Char('`'),
        0xDB => KeyInput::Char('['),
        0xDC => KeyInput::Char('\\'),
        0xDD => KeyInput::Char(']'),
        0xDE => KeyInput::Char('\''),

        0x08 => KeyInput::Named("Backspace"),
        0x09 => KeyInput::Named("Tab"),
        0x0D => KeyInput::Named("Enter"),
        0x10 => KeyInput::Named("Shift"),
        0x11 => KeyInput::Named("Control"),
        0x12 => KeyInput::Named("Alt"),
        0x13 => KeyInput::Named("Pause"),
        0x14 => KeyInput::Named("CapsLock"),
        0x1B => KeyInput::Named("Escape"),
        0x20 => KeyInput::Named("Space"),
        0x21 => KeyInput::Named("PageUp"),
        0x22 => KeyInput::Named("PageDown"),
        0x23 => KeyInput::Named("End"),
        0x24 => KeyInput::Named("Home"),
        0x25 => KeyInput::Named("Left"),
        0x26 => KeyInput::Named("Up"),
        0x27 => KeyInput::Named("Right"),
        0x28 => KeyInput::Named("Down"),
        0x2C => KeyInput::Named("PrintScreen"),
        0x2D => KeyInput::Named("Insert"),
        0x2E => KeyInput::Named("Delete"),
        0x5B => KeyInput::Named("Windows"),
        0x5C => KeyInput::Named("RightWindows"),
        0x5D => KeyInput::Named("Menu"),
        0x70..=0x7B => match vk - 0x70 {
            0 => KeyInput::Named("F1"),
            1 => KeyInput::Named("F2"),
            2 => KeyInput::Named("F3"),
            3 => KeyInput::Named("F4"),
            4 => KeyInput::Named("F5"),
            5 => KeyInput::Named("F6"),
            6 => KeyInput::Named("F7"),
            7 => KeyInput::Named("F8"),
            8 => KeyInput::Named("F9"),
            9 => KeyInput::Named("F10"),
            10 => KeyInput::Named("F11"),
            _ => KeyInput::Named("F12"),
        },
        0x90 => KeyInput::Named("NumLock"),
        0x91 => KeyInput::Named("ScrollLock"),
        0xA0 => KeyInput::Named("Shift"),
        0xA1 => KeyInput::Named("RightShift"),
        0xA2 => KeyInput::Named("Control"),
        0xA3 => KeyInput::Named("RightControl"),
        0xA4 => KeyInput::Named("Alt"),
        0xA5 => KeyInput::Named("RightAlt"),

        other => KeyInput::Unknown(other),
    }
}

/// Check that low-level hooks can be installed by probing with a temporary
/// keyboard hook.
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

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;

    #[test]
    fn test_collector_creation() {
        let (sender, _receiver) = unbounded();
        let collector = WindowsCollector::new(CollectorConfig::default(), sender);
        assert!(!collector.is_running());
    }

    #[test]
    fn test_vk_mapping() {
        assert_eq!(key_from_vk(0x41), KeyInput::Char('a'));
        assert_eq!(key_from_vk(0x31), KeyInput::Char('1'));
        assert_eq!(key_from_vk(0x10), KeyInput::Named("Shift"));
        assert_eq!(key_from_vk(0x70), KeyInput::Named("F1"));
        assert_eq!(key_from_vk(0xE7), KeyInput::Unknown(0xE7));
    }
}
