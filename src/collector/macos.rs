//! macOS implementation of event collection using a CGEvent tap.
//!
//! Captures keyboard and mouse events at the system level through the Core
//! Graphics event tap API (listen-only; events are never swallowed or
//! modified). Requires Input Monitoring permission.

use crate::collector::types::{KeyInput, MouseButton, RawInput};
use crate::core::session::Listeners;
use core_foundation::runloop::{kCFRunLoopCommonModes, CFRunLoop};
use core_graphics::event::{
    CGEvent, CGEventTap, CGEventTapLocation, CGEventTapOptions, CGEventTapPlacement, CGEventType,
    CallbackResult, EventField,
};
use crossbeam_channel::Sender;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

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

/// The macOS event collector using a CGEvent tap.
pub struct MacOsCollector {
    config: CollectorConfig,
    sender: Sender<RawInput>,
    running: Arc<AtomicBool>,
    thread_handle: Option<JoinHandle<()>>,
}

impl MacOsCollector {
    /// Create a new macOS collector feeding raw input into `sender`.
    pub fn new(config: CollectorConfig, sender: Sender<RawInput>) -> Self {
        Self {
            config,
            sender,
            running: Arc::new(AtomicBool::new(false)),
            thread_handle: None,
        }
    }

    /// Start capturing events in a background thread.
    ///
    /// Returns an error if:
    /// - The collector is already running
    /// - Input Monitoring permission is not granted
    pub fn start(&mut self) -> Result<(), CollectorError> {
        if self.running.load(Ordering::SeqCst) {
            return Err(CollectorError::AlreadyRunning);
        }

        self.running.store(true, Ordering::SeqCst);

        let sender = self.sender.clone();
        let running = self.running.clone();
        let config = self.config.clone();

        let handle = thread::spawn(move || {
            if let Err(e) = run_event_loop(sender, running.clone(), config) {
                eprintln!("Event tap error: {e}");
            }
            running.store(false, Ordering::SeqCst);
        });

        self.thread_handle = Some(handle);
        Ok(())
    }

    /// Stop capturing events. The tap thread exits at its next poll.
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

impl Drop for MacOsCollector {
    fn drop(&mut self) {
        self.stop();
    }
}

impl Listeners for MacOsCollector {
    fn halt(&mut self) {
        self.stop();
    }
}

/// Errors that can occur during event collection.
#[derive(Debug)]
pub enum CollectorError {
    AlreadyRunning,
    PermissionDenied,
    TapCreationFailed,
    RunLoopSourceFailed,
}

impl std::fmt::Display for CollectorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollectorError::AlreadyRunning => write!(f, "collector is already running"),
            CollectorError::PermissionDenied => {
                write!(f, "Input Monitoring permission not granted")
            }
            CollectorError::TapCreationFailed => write!(f, "failed to create CGEvent tap"),
            CollectorError::RunLoopSourceFailed => {
                write!(f, "failed to create run loop source")
            }
        }
    }
}

impl std::error::Error for CollectorError {}

/// Build the list of event types to capture based on configuration.
///
/// Mouse movement is deliberately absent: only key presses, button
/// transitions and wheel motions are tracked.
fn build_event_types(config: &CollectorConfig) -> Vec<CGEventType> {
    let mut types = Vec::new();

    if config.capture_keyboard {
        types.push(CGEventType::KeyDown);
        types.push(CGEventType::FlagsChanged);
    }

    if config.capture_mouse {
        types.push(CGEventType::LeftMouseDown);
        types.push(CGEventType::LeftMouseUp);
        types.push(CGEventType::RightMouseDown);
        types.push(CGEventType::RightMouseUp);
        types.push(CGEventType::OtherMouseDown);
        types.push(CGEventType::OtherMouseUp);
        types.push(CGEventType::ScrollWheel);
    }

    types
}

thread_local! {
    static EVENT_SENDER: std::cell::RefCell<Option<Sender<RawInput>>> =
        const { std::cell::RefCell::new(None) };
}

/// Run the Core Graphics event loop until the running flag clears.
fn run_event_loop(
    sender: Sender<RawInput>,
    running: Arc<AtomicBool>,
    config: CollectorConfig,
) -> Result<(), CollectorError> {
    let event_types = build_event_types(&config);

    // The tap callback cannot capture variables; hand it the sender through
    // a thread-local instead.
    EVENT_SENDER.with(|s| {
        *s.borrow_mut() = Some(sender);
    });

    fn event_callback(
        _proxy: core_graphics::event::CGEventTapProxy,
        event_type: CGEventType,
        event: &CGEvent,
    ) -> CallbackResult {
        EVENT_SENDER.with(|sender_cell| {
            if let Some(ref sender) = *sender_cell.borrow() {
                if let Some(raw) = translate_cg_event(event_type, event) {
                    let _ = sender.send(raw);
                }
            }
        });

        // Return the event unchanged (we are passive observers).
        CallbackResult::Keep
    }

    let tap = CGEventTap::new(
        CGEventTapLocation::Session,
        CGEventTapPlacement::HeadInsertEventTap,
        CGEventTapOptions::ListenOnly,
        event_types,
        event_callback,
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

    // Run the loop in short slices so the stop flag is observed promptly.
    while running.load(Ordering::SeqCst) {
        CFRunLoop::run_in_mode(
            unsafe { kCFRunLoopCommonModes },
            std::time::Duration::from_millis(100),
            false,
        );
    }

    // The tap is disabled when dropped.
    Ok(())
}

/// Translate a CGEvent into the raw-input contract value.
fn translate_cg_event(event_type: CGEventType, event: &CGEvent) -> Option<RawInput> {
    use core_graphics::event::CGEventType::*;

    match event_type {
        KeyDown => {
            let code = event.get_integer_value_field(EventField::KEYBOARD_EVENT_KEYCODE);
            Some(RawInput::Key(key_from_keycode(code as u32)))
        }
        // Modifier transitions arrive as FlagsChanged on both edges; each
        // transition is reported as a press of the named key.
        FlagsChanged => {
            let code = event.get_integer_value_field(EventField::KEYBOARD_EVENT_KEYCODE);
            Some(RawInput::Key(key_from_keycode(code as u32)))
        }

        LeftMouseDown => Some(button_event(event, MouseButton::Left, true)),
        LeftMouseUp => Some(button_event(event, MouseButton::Left, false)),
        RightMouseDown => Some(button_event(event, MouseButton::Right, true)),
        RightMouseUp => Some(button_event(event, MouseButton::Right, false)),
        OtherMouseDown => Some(button_event(event, other_button(event), true)),
        OtherMouseUp => Some(button_event(event, other_button(event), false)),

        ScrollWheel => {
            let (x, y) = location(event);
            // Axis 1 is vertical; positive means the wheel moved up.
            let delta_y = event.get_integer_value_field(EventField::SCROLL_WHEEL_EVENT_DELTA_AXIS_1);
            let delta_x = event.get_integer_value_field(EventField::SCROLL_WHEEL_EVENT_DELTA_AXIS_2);
            Some(RawInput::wheel(x, y, delta_x as i32, delta_y as i32))
        }

        _ => None,
    }
}

fn location(event: &CGEvent) -> (i32, i32) {
    let point = event.location();
    (point.x as i32, point.y as i32)
}

fn button_event(event: &CGEvent, button: MouseButton, pressed: bool) -> RawInput {
    let (x, y) = location(event);
    RawInput::Button {
        x,
        y,
        button,
        pressed,
    }
}

fn other_button(event: &CGEvent) -> MouseButton {
    let number = event.get_integer_value_field(EventField::MOUSE_EVENT_BUTTON_NUMBER);
    match number {
        2 => MouseButton::Middle,
        n => MouseButton::Other(n as u8),
    }
}

/// Map a macOS virtual keycode to a key identity (reference ANSI US layout).
fn key_from_keycode(code: u32) -> KeyInput {
    let ch = match code {
        0 => 'a',
        1 => 's',
        2 => 'd',
        3 => 'f',
        4 => 'h',
        5 => 'g',
        6 => 'z',
        7 => 'x',
        8 => 'c',
        9 => 'v',
        11 => 'b',
        12 => 'q',
        13 => 'w',
        14 => 'e',
        15 => 'r',
        16 => 'y',
        17 => 't',
        18 => '1',
        19 => '2',
        20 => '3',
        21 => '4',
        22 => '6',
        23 => '5',
        24 => '=',
        25 => '9',
        26 => '7',
        27 => '-',
        28 => '8',
        29 => '0',
        30 => ']',
        31 => 'o',
        32 => 'u',
        33 => '[',
        34 => 'i',
        35 => 'p',
        37 => 'l',
        38 => 'j',
        39 => '\'',
        40 => 'k',
        41 => ';',
        42 => '\\',
        43 => ',',
        44 => '/',
        45 => 'n',
        46 => 'm',
        47 => '.',
        50 => '`',
        65 => '.',
        67 => '*',
        69 => '+',
        75 => '/',
        78 => '-',
        81 => '=',
        82 => '0',
        83 => '1',
        84 => '2',
        85 => '3',
        86 => '4',
        87 => '5',
        88 => '6',
        89 => '7',
        91 => '8',
        92 => '9',
        _ => {
            return match code {
                36 => KeyInput::Named("Return"),
                48 => KeyInput::Named("Tab"),
                49 => KeyInput::Named("Space"),
                51 => KeyInput::Named("Backspace"),
                53 => KeyInput::Named("Escape"),
                54 => KeyInput::Named("RightCommand"),
                55 => KeyInput::Named("Command"),
                56 => KeyInput::Named("Shift"),
                57 => KeyInput::Named("CapsLock"),
                58 => KeyInput::Named("Option"),
                59 => KeyInput::Named("Control"),
                60 => KeyInput::Named("RightShift"),
                61 => KeyInput::Named("RightOption"),
                62 => KeyInput::Named("RightControl"),
                63 => KeyInput::Named("Function"),
                76 => KeyInput::Named("Enter"),
                96 => KeyInput::Named("F5"),
                97 => KeyInput::Named("F6"),
                98 => KeyInput::Named("F7"),
                99 => KeyInput::Named("F3"),
                100 => KeyInput::Named("F8"),
                101 => KeyInput::Named("F9"),
                103 => KeyInput::Named("F11"),
                105 => KeyInput::Named("F13"),
                107 => KeyInput::Named("F14"),
                109 => KeyInput::Named("F10"),
                111 => KeyInput::Named("F12"),
                113 => KeyInput::Named("F15"),
                114 => KeyInput::Named("Help"),
                115 => KeyInput::Named("Home"),
                116 => KeyInput::Named("PageUp"),
                117 => KeyInput::Named("Delete"),
                118 => KeyInput::Named("F4"),
                119 => KeyInput::Named("End"),
                120 => KeyInput::Named("F2"),
                121 => KeyInput::Named("PageDown"),
                122 => KeyInput::Named("F1"),
                123 => KeyInput::Named("Left"),
                124 => KeyInput::Named("Right"),
                125 => KeyInput::Named("Down"),
                126 => KeyInput::Named("Up"),
                other => KeyInput::Unknown(other),
            };
        }
    };
    KeyInput::Char(ch)
}

/// Check if the application has Input Monitoring permission.
///
/// macOS provides no direct query; creating a passive tap fails when the
/// permission is missing, which is exactly what this probes.
pub fn check_permission() -> bool {
    let result = CGEventTap::new(
        CGEventTapLocation::Session,
        CGEventTapPlacement::HeadInsertEventTap,
        CGEventTapOptions::ListenOnly,
        vec![CGEventType::KeyDown],
        |_proxy, _type, _event| CallbackResult::Keep,
    );

    result.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;

    #[test]
    fn test_collector_creation() {
        let (sender, _receiver) = unbounded();
        let collector = MacOsCollector::new(CollectorConfig::default(), sender);
        assert!(!collector.is_running());
    }

    #[test]
    fn test_keycode_mapping() {
        assert_eq!(key_from_keycode(0), KeyInput::Char('a'));
        assert_eq!(key_from_keycode(18), KeyInput::Char('1'));
        assert_eq!(key_from_keycode(56), KeyInput::Named("Shift"));
        assert_eq!(key_from_keycode(49), KeyInput::Named("Space"));
        assert_eq!(key_from_keycode(0xFFFF), KeyInput::Unknown(0xFFFF));
    }

    #[test]
    fn test_event_types_respect_config() {
        let keyboard_only = build_event_types(&CollectorConfig {
            capture_keyboard: true,
            capture_mouse: false,
        });
        assert!(keyboard_only
            .iter()
            .any(|t| matches!(t, CGEventType::KeyDown)));
        assert!(!keyboard_only
            .iter()
            .any(|t| matches!(t, CGEventType::ScrollWheel)));
    }
}
