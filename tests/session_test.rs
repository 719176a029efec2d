//! End-to-end tests for the tracking session through the public API.

use crossbeam_channel::unbounded;
use inputtrail::{MouseButton, RawInput, SessionController};
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

fn test_log_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("inputtrail-e2e-{}-{}.txt", name, std::process::id()))
}

#[test]
fn test_session_records_and_summarizes() {
    let path = test_log_path("scenario");
    let (sender, receiver) = unbounded();
    let mut session = SessionController::new(&path, receiver).expect("open log");
    let handle = session.handle();

    let feeder = thread::spawn(move || {
        sender.send(RawInput::key_char('a')).unwrap();
        sender
            .send(RawInput::button_down(10, 20, MouseButton::Left))
            .unwrap();
        sender.send(RawInput::wheel(30, 40, 0, 1)).unwrap();
        // A release-only transition must leave no trace.
        sender
            .send(RawInput::button_up(10, 20, MouseButton::Left))
            .unwrap();

        // Let at least one periodic flush happen before stopping.
        thread::sleep(Duration::from_millis(300));
        handle.stop();
    });

    let summary = session.start(&mut ()).expect("session");
    feeder.join().unwrap();

    let contents = std::fs::read_to_string(&path).expect("read log");
    std::fs::remove_file(&path).ok();

    // Header block.
    assert!(contents.starts_with("Input Tracking Session - "));
    assert!(contents.contains(&"=".repeat(50)));

    // Exactly the three qualifying events, in arrival order.
    let event_lines: Vec<&str> = contents.lines().filter(|l| l.starts_with('[')).collect();
    assert_eq!(event_lines.len(), 3);
    assert!(event_lines[0].ends_with("KEY: a"));
    assert!(event_lines[1].ends_with("CLICK: Left at (10, 20)"));
    assert!(event_lines[2].ends_with("SCROLL: up at (30, 40)"));

    // One summary block with the final counters.
    assert_eq!(contents.matches("Tracking Summary").count(), 1);
    assert!(contents.contains("Total Keys Pressed: 1"));
    assert!(contents.contains("Total Mouse Clicks: 1"));
    assert!(contents.contains("Total Mouse Scrolls: 1"));

    assert_eq!(summary.counts.keys, 1);
    assert_eq!(summary.counts.clicks, 1);
    assert_eq!(summary.counts.scrolls, 1);
    assert_eq!(summary.counts.total(), 3);
}

#[test]
fn test_sequential_stops_are_idempotent() {
    let path = test_log_path("idempotent");
    let (sender, receiver) = unbounded();
    let mut session = SessionController::new(&path, receiver).expect("open log");
    let handle = session.handle();

    sender.send(RawInput::key_char('q')).unwrap();
    handle.stop();
    handle.stop();

    let summary = session.start(&mut ()).expect("session");
    assert!(handle.is_stopped());
    assert_eq!(summary.counts.keys, 1);

    let contents = std::fs::read_to_string(&path).expect("read log");
    std::fs::remove_file(&path).ok();
    assert_eq!(contents.matches("Tracking Summary").count(), 1);
}
