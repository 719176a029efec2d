//! The tracked-event value that ends up in the session log.

use chrono::{DateTime, Local};

/// Timestamp format used throughout the session log (second resolution,
/// local wall-clock time).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Classification of a recorded input event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// A character-producing key press.
    Key,
    /// A non-character key press (modifier, function key, unrecognized key).
    SpecialKey,
    /// A mouse button press edge.
    Click,
    /// A mouse wheel motion.
    Scroll,
}

impl EventKind {
    /// The label used for this kind in the session log.
    pub fn label(&self) -> &'static str {
        match self {
            EventKind::Key => "KEY",
            EventKind::SpecialKey => "SPECIAL_KEY",
            EventKind::Click => "CLICK",
            EventKind::Scroll => "SCROLL",
        }
    }
}

/// One recorded input event.
///
/// Immutable once created; serialized to a single log line exactly once by
/// a flush, then discarded.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedEvent {
    /// Wall-clock time at which the event was recorded.
    pub timestamp: DateTime<Local>,
    pub kind: EventKind,
    /// Human-readable detail: the character, key name, or button/direction
    /// plus coordinates.
    pub detail: String,
}

impl TrackedEvent {
    /// Create an event stamped with the current local time.
    pub fn new(kind: EventKind, detail: String) -> Self {
        Self::at(Local::now(), kind, detail)
    }

    /// Create an event with an explicit timestamp.
    pub fn at(timestamp: DateTime<Local>, kind: EventKind, detail: String) -> Self {
        Self {
            timestamp,
            kind,
            detail,
        }
    }

    /// Render the event as one session-log line (without trailing newline):
    /// `[YYYY-MM-DD HH:MM:SS] KIND: detail`.
    pub fn render(&self) -> String {
        format!(
            "[{}] {}: {}",
            self.timestamp.format(TIMESTAMP_FORMAT),
            self.kind.label(),
            self.detail
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_kind_labels() {
        assert_eq!(EventKind::Key.label(), "KEY");
        assert_eq!(EventKind::SpecialKey.label(), "SPECIAL_KEY");
        assert_eq!(EventKind::Click.label(), "CLICK");
        assert_eq!(EventKind::Scroll.label(), "SCROLL");
    }

    #[test]
    fn test_render_is_deterministic() {
        let ts = Local.with_ymd_and_hms(2024, 3, 5, 14, 30, 9).unwrap();
        let event = TrackedEvent::at(ts, EventKind::Click, "Left at (10, 20)".to_string());
        assert_eq!(event.render(), "[2024-03-05 14:30:09] CLICK: Left at (10, 20)");
    }

    #[test]
    fn test_render_key_line() {
        let ts = Local.with_ymd_and_hms(2024, 3, 5, 14, 30, 10).unwrap();
        let event = TrackedEvent::at(ts, EventKind::Key, "a".to_string());
        assert_eq!(event.render(), "[2024-03-05 14:30:10] KEY: a");
    }
}
