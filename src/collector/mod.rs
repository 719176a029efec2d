//! Input hook collectors: the OS listener layer.
//!
//! Each platform implementation registers low-level hooks for keyboard and
//! mouse events and forwards them, once per physical event, into the
//! session's raw-input channel. The core never talks to the OS directly;
//! it only consumes the channel and halts the collector on stop.

pub mod types;

#[cfg(target_os = "macos")]
pub mod macos;

#[cfg(target_os = "windows")]
pub mod windows;

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
pub mod noop;

// Re-export commonly used types
pub use types::{KeyInput, MouseButton, RawInput};

#[cfg(target_os = "macos")]
pub use macos::{check_permission, CollectorConfig, CollectorError, MacOsCollector};

/// Platform-agnostic collector type alias
#[cfg(target_os = "macos")]
pub type Collector = MacOsCollector;

#[cfg(target_os = "windows")]
pub use windows::{check_permission, CollectorConfig, CollectorError, WindowsCollector};

/// Platform-agnostic collector type alias
#[cfg(target_os = "windows")]
pub type Collector = WindowsCollector;

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
pub use noop::{check_permission, CollectorConfig, CollectorError, NoopCollector};

/// Platform-agnostic collector type alias
#[cfg(not(any(target_os = "macos", target_os = "windows")))]
pub type Collector = NoopCollector;
