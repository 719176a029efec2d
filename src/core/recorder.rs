//! Event recording: buffer, counters and the idle clock.
//!
//! All producer-visible state lives behind a single mutex so that an event
//! append, its counter bump and the last-activity update happen as one unit.
//! Draining swaps the buffer for an empty one under the same lock, so no
//! event is ever duplicated across drains or lost between them.

use crate::collector::types::{KeyInput, RawInput};
use crate::core::event::{EventKind, TrackedEvent};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Running totals for the session, incremented at record time (never at
/// flush time).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventCounts {
    pub keys: u64,
    pub clicks: u64,
    pub scrolls: u64,
}

impl EventCounts {
    pub fn total(&self) -> u64 {
        self.keys + self.clicks + self.scrolls
    }
}

struct RecorderState {
    buffer: Vec<TrackedEvent>,
    counts: EventCounts,
    last_activity: Instant,
}

/// Turns raw input events into buffered [`TrackedEvent`]s.
///
/// Safe to share across threads; recording never fails visibly to the
/// caller.
pub struct EventRecorder {
    state: Mutex<RecorderState>,
}

impl EventRecorder {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(RecorderState {
                buffer: Vec::new(),
                counts: EventCounts::default(),
                last_activity: Instant::now(),
            }),
        }
    }

    /// Record one raw input event.
    ///
    /// Button releases are ignored entirely: no event line, no counter
    /// change, no idle-clock reset. An unrecognized key degrades to a
    /// `SPECIAL_KEY` record instead of being dropped.
    pub fn record(&self, raw: RawInput) {
        let (kind, detail) = match raw {
            RawInput::Key(KeyInput::Char(c)) => (EventKind::Key, c.to_string()),
            RawInput::Key(KeyInput::Named(name)) => (EventKind::SpecialKey, name.to_string()),
            RawInput::Key(KeyInput::Unknown(code)) => {
                (EventKind::SpecialKey, format!("unknown(0x{code:x})"))
            }
            RawInput::Button { pressed: false, .. } => return,
            RawInput::Button {
                x, y, button, ..
            } => (EventKind::Click, format!("{button} at ({x}, {y})")),
            RawInput::Wheel { x, y, delta_y, .. } => {
                // Zero vertical delta ties to "down".
                let direction = if delta_y > 0 { "up" } else { "down" };
                (EventKind::Scroll, format!("{direction} at ({x}, {y})"))
            }
        };

        let event = TrackedEvent::new(kind, detail);
        let mut state = self.state.lock().expect("recorder state poisoned");
        state.buffer.push(event);
        match kind {
            EventKind::Key | EventKind::SpecialKey => state.counts.keys += 1,
            EventKind::Click => state.counts.clicks += 1,
            EventKind::Scroll => state.counts.scrolls += 1,
        }
        state.last_activity = Instant::now();
    }

    /// Atomically take all buffered events, leaving the buffer empty.
    pub fn drain(&self) -> Vec<TrackedEvent> {
        let mut state = self.state.lock().expect("recorder state poisoned");
        std::mem::take(&mut state.buffer)
    }

    /// Current counter values.
    pub fn counts(&self) -> EventCounts {
        self.state.lock().expect("recorder state poisoned").counts
    }

    /// Time elapsed since the last recorded event (or since creation).
    pub fn idle_for(&self) -> Duration {
        self.state
            .lock()
            .expect("recorder state poisoned")
            .last_activity
            .elapsed()
    }

    /// Number of events currently buffered and not yet flushed.
    pub fn buffered(&self) -> usize {
        self.state.lock().expect("recorder state poisoned").buffer.len()
    }
}

impl Default for EventRecorder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::types::MouseButton;
    use std::sync::Arc;

    #[test]
    fn test_counts_per_kind() {
        let recorder = EventRecorder::new();
        recorder.record(RawInput::key_char('a'));
        recorder.record(RawInput::key_named("Shift"));
        recorder.record(RawInput::button_down(1, 2, MouseButton::Left));
        recorder.record(RawInput::wheel(3, 4, 0, 1));

        let counts = recorder.counts();
        assert_eq!(counts.keys, 2);
        assert_eq!(counts.clicks, 1);
        assert_eq!(counts.scrolls, 1);
        assert_eq!(counts.total(), 4);
        assert_eq!(recorder.buffered(), 4);
    }

    #[test]
    fn test_release_is_not_recorded() {
        let recorder = EventRecorder::new();
        recorder.record(RawInput::button_up(1, 2, MouseButton::Left));

        assert_eq!(recorder.counts(), EventCounts::default());
        assert_eq!(recorder.buffered(), 0);
    }

    #[test]
    fn test_unknown_key_degrades_to_special() {
        let recorder = EventRecorder::new();
        recorder.record(RawInput::Key(KeyInput::Unknown(0xE7)));

        let events = recorder.drain();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::SpecialKey);
        assert_eq!(events[0].detail, "unknown(0xe7)");
        // Counted as a key press even when unrecognized.
        assert_eq!(recorder.counts().keys, 1);
    }

    #[test]
    fn test_scroll_direction_and_zero_tie() {
        let recorder = EventRecorder::new();
        recorder.record(RawInput::wheel(10, 20, 0, 2));
        recorder.record(RawInput::wheel(10, 20, 0, -2));
        recorder.record(RawInput::wheel(10, 20, 1, 0));

        let events = recorder.drain();
        assert_eq!(events[0].detail, "up at (10, 20)");
        assert_eq!(events[1].detail, "down at (10, 20)");
        // A zero vertical delta falls through to "down".
        assert_eq!(events[2].detail, "down at (10, 20)");
    }

    #[test]
    fn test_drain_empties_and_never_duplicates() {
        let recorder = EventRecorder::new();
        recorder.record(RawInput::key_char('x'));
        recorder.record(RawInput::key_char('y'));

        let first = recorder.drain();
        assert_eq!(first.len(), 2);
        assert!(recorder.drain().is_empty());
        // Counters are unaffected by draining.
        assert_eq!(recorder.counts().keys, 2);
    }

    #[test]
    fn test_order_preserved() {
        let recorder = EventRecorder::new();
        for c in ['a', 'b', 'c'] {
            recorder.record(RawInput::key_char(c));
        }
        let details: Vec<String> = recorder.drain().into_iter().map(|e| e.detail).collect();
        assert_eq!(details, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_recording_resets_idle_clock() {
        let recorder = EventRecorder::new();
        std::thread::sleep(Duration::from_millis(50));
        assert!(recorder.idle_for() >= Duration::from_millis(50));

        recorder.record(RawInput::key_char('a'));
        assert!(recorder.idle_for() < Duration::from_millis(50));
    }

    #[test]
    fn test_concurrent_recording_loses_nothing() {
        let recorder = Arc::new(EventRecorder::new());
        let mut handles = Vec::new();
        for _ in 0..4 {
            let recorder = recorder.clone();
            handles.push(std::thread::spawn(move || {
                for _ in 0..250 {
                    recorder.record(RawInput::key_char('k'));
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(recorder.counts().keys, 1000);
        assert_eq!(recorder.drain().len(), 1000);
    }
}
