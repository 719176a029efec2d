//! inputtrail, an overt local input-activity tracker.
//!
//! This library captures keyboard and mouse activity for one session,
//! appends every event to a plain-text session log, and closes the log
//! with a summary when the session stops (Ctrl+C or inactivity).
//!
//! Everything stays on the local machine; the tool announces itself on
//! start and can print a full disclosure with `inputtrail notice`.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         inputtrail                           │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌───────────┐ channel ┌──────────┐  drain   ┌────────────┐  │
//! │  │ Collector │────────▶│ Recorder │─────────▶│ Flush loop │  │
//! │  │ (OS hooks)│         │ (buffer, │  100 ms  │ (log file) │  │
//! │  └───────────┘         │ counters)│          └────────────┘  │
//! │                        └──────────┘                          │
//! │                              │ idle clock                    │
//! │                              ▼                               │
//! │                      ┌──────────────┐   stop  ┌───────────┐  │
//! │                      │ Idle monitor │────────▶│  Session  │  │
//! │                      └──────────────┘         │ controller│  │
//! │                                               └───────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use inputtrail::{Collector, CollectorConfig, SessionController, LOG_FILE_NAME};
//!
//! let (sender, receiver) = crossbeam_channel::unbounded();
//! let mut collector = Collector::new(CollectorConfig::default(), sender);
//! let mut session = SessionController::new(LOG_FILE_NAME, receiver).expect("open log");
//!
//! collector.start().expect("start hooks");
//! let summary = session.start(&mut collector).expect("session");
//! println!("{}", summary.render_console());
//! ```

pub mod collector;
pub mod config;
pub mod core;
pub mod logfile;

// Re-export key types at crate root for convenience
pub use collector::{check_permission, Collector, CollectorConfig, CollectorError};
pub use collector::{KeyInput, MouseButton, RawInput};
pub use config::{Config, SourceConfig, LOG_FILE_NAME};
pub use core::{
    EventCounts, EventKind, EventRecorder, Listeners, SessionController, SessionError,
    SessionHandle, SessionSummary, TrackedEvent, IDLE_TIMEOUT,
};
pub use logfile::SessionLog;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Disclosure that can be displayed to users before or instead of tracking.
pub const TRACKING_NOTICE: &str = r#"
====================================================================
 INPUTTRAIL - TRACKING NOTICE
====================================================================

 This tool records ALL input activity for the current session:

   * every key press, including the characters typed
   * every mouse button press, with pointer coordinates
   * every scroll motion, with direction and coordinates

 WHERE IT GOES:
   A plain-text session log ('savedinput.txt') in the working
   directory. Nothing is transmitted anywhere; the log stays on
   this machine.

 WHEN IT STOPS:
   Press Ctrl+C, or leave the machine idle for 30 seconds. A
   summary is appended to the log and printed to the console.

 Only run this tool on sessions whose owner has agreed to be
 recorded.

====================================================================
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracking_notice_contents() {
        assert!(TRACKING_NOTICE.contains("TRACKING NOTICE"));
        assert!(TRACKING_NOTICE.contains("every key press"));
        assert!(TRACKING_NOTICE.contains(LOG_FILE_NAME));
    }
}
