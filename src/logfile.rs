//! The append-only, UTF-8 session log file.
//!
//! Layout: a header block (session label, start timestamp, separator), one
//! line per event, and a summary block on stop. Writers hold the file for
//! the whole session; every append is a single write followed by a flush.

use crate::core::event::{TrackedEvent, TIMESTAMP_FORMAT};
use crate::core::session::SessionSummary;
use chrono::{DateTime, Local};
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

fn separator() -> String {
    "=".repeat(50)
}

/// Writer for one session's log file.
pub struct SessionLog {
    path: PathBuf,
    file: File,
}

impl SessionLog {
    /// Create (truncating) the log file. Failing here is fatal to the
    /// session: nothing is tracked if nothing can be saved.
    pub fn create(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        let file = File::create(&path)?;
        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the session header block.
    pub fn write_header(&mut self, started: DateTime<Local>) -> io::Result<()> {
        let block = format!(
            "Input Tracking Session - {}\n{}\n\n",
            started.format(TIMESTAMP_FORMAT),
            separator()
        );
        self.file.write_all(block.as_bytes())?;
        self.file.flush()
    }

    /// Append one line per event, in order, as a single write.
    pub fn append_events(&mut self, events: &[TrackedEvent]) -> io::Result<()> {
        if events.is_empty() {
            return Ok(());
        }
        let mut block = String::with_capacity(events.len() * 48);
        for event in events {
            block.push_str(&event.render());
            block.push('\n');
        }
        self.file.write_all(block.as_bytes())?;
        self.file.flush()
    }

    /// Append the closing summary block.
    pub fn append_summary(&mut self, summary: &SessionSummary) -> io::Result<()> {
        self.file.write_all(summary.render_log().as_bytes())?;
        self.file.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::event::EventKind;
    use crate::core::recorder::EventCounts;
    use chrono::TimeZone;

    fn test_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("inputtrail-log-{}-{}.txt", name, std::process::id()))
    }

    #[test]
    fn test_full_log_layout() {
        let path = test_path("layout");
        let started = Local.with_ymd_and_hms(2024, 3, 5, 14, 30, 0).unwrap();

        let mut log = SessionLog::create(&path).unwrap();
        log.write_header(started).unwrap();
        log.append_events(&[
            TrackedEvent::at(
                started + chrono::Duration::seconds(1),
                EventKind::Key,
                "a".to_string(),
            ),
            TrackedEvent::at(
                started + chrono::Duration::seconds(2),
                EventKind::Click,
                "Left at (10, 20)".to_string(),
            ),
        ])
        .unwrap();
        log.append_summary(&SessionSummary {
            started,
            ended: started + chrono::Duration::seconds(4),
            counts: EventCounts {
                keys: 1,
                clicks: 1,
                scrolls: 0,
            },
        })
        .unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();

        let expected_head = format!(
            "Input Tracking Session - 2024-03-05 14:30:00\n{}\n\n\
             [2024-03-05 14:30:01] KEY: a\n\
             [2024-03-05 14:30:02] CLICK: Left at (10, 20)\n",
            "=".repeat(50)
        );
        assert!(contents.starts_with(&expected_head));
        assert!(contents.contains("Duration: 4.0 seconds"));
    }

    #[test]
    fn test_append_empty_is_noop() {
        let path = test_path("empty");
        let mut log = SessionLog::create(&path).unwrap();
        log.append_events(&[]).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert!(contents.is_empty());
    }

    #[test]
    fn test_create_on_bad_path_fails() {
        // A directory is not a writable log file target.
        assert!(SessionLog::create(std::env::temp_dir()).is_err());
    }
}
