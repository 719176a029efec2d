//! Core pipeline for inputtrail.
//!
//! This module contains:
//! - The tracked-event model and its log-line rendering
//! - The recorder holding the buffer, counters and idle clock
//! - The session lifecycle with its flush and idle loops

pub mod event;
pub mod recorder;
pub mod session;

// Re-export commonly used types
pub use event::{EventKind, TrackedEvent, TIMESTAMP_FORMAT};
pub use recorder::{EventCounts, EventRecorder};
pub use session::{
    Listeners, SessionController, SessionError, SessionHandle, SessionSummary, FLUSH_INTERVAL,
    IDLE_CHECK_INTERVAL, IDLE_TIMEOUT,
};
