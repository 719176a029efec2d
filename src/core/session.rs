//! Session lifecycle: start, periodic flush and idle checks, stop.
//!
//! A session runs five kinds of threads: the platform hook thread(s)
//! producing raw input, a pump that is the sole consumer of the event
//! channel, the flush loop, the idle monitor, and the calling thread
//! blocked in the wait loop. Stop requests (idle detection, Ctrl+C, tests)
//! all go through [`SessionHandle::stop`], which flips the shared
//! cancellation token exactly once; finalization then runs in the wait
//! loop's context after every other thread has ceased.

use crate::collector::types::RawInput;
use crate::core::event::TIMESTAMP_FORMAT;
use crate::core::recorder::{EventCounts, EventRecorder};
use crate::logfile::SessionLog;
use chrono::{DateTime, Local};
use crossbeam_channel::{Receiver, RecvTimeoutError};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use tracing::{debug, error, info};

/// Cadence of the flush loop. Bounds both memory growth and the data-loss
/// window on a crash.
pub const FLUSH_INTERVAL: Duration = Duration::from_millis(100);

/// Cadence of the idle monitor.
pub const IDLE_CHECK_INTERVAL: Duration = Duration::from_secs(1);

/// Inactivity span after which the session stops itself. Fixed policy, not
/// user-tunable.
pub const IDLE_TIMEOUT: Duration = Duration::from_secs(30);

/// How often the pump wakes to check for cancellation while the channel is
/// quiet.
const PUMP_POLL: Duration = Duration::from_millis(50);

/// How often the wait loop re-checks the cancellation token.
const WAIT_POLL: Duration = Duration::from_millis(100);

/// Timing policy for a session's periodic tasks. Fixed in production;
/// shortened by tests.
#[derive(Debug, Clone, Copy)]
struct SessionPolicy {
    flush_interval: Duration,
    idle_check_interval: Duration,
    idle_timeout: Duration,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            flush_interval: FLUSH_INTERVAL,
            idle_check_interval: IDLE_CHECK_INTERVAL,
            idle_timeout: IDLE_TIMEOUT,
        }
    }
}

/// Cooperative cancellation token observed by every periodic task.
#[derive(Clone)]
struct ShutdownToken(Arc<AtomicBool>);

impl ShutdownToken {
    fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Cloneable handle that can request the session to stop.
///
/// Safe to invoke concurrently from the idle monitor, a Ctrl+C handler and
/// anything else: exactly one caller performs the transition, the rest
/// observe the stopped state and return.
#[derive(Clone)]
pub struct SessionHandle {
    stopped: Arc<AtomicBool>,
    token: ShutdownToken,
}

impl SessionHandle {
    /// Request the session to stop. Idempotent; a no-op once stopped.
    pub fn stop(&self) {
        if !self.stopped.swap(true, Ordering::SeqCst) {
            self.token.cancel();
        }
    }

    /// Whether a stop has been requested.
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

/// Shutdown seam for the OS listener layer.
///
/// The session calls `halt()` once after a stop has been requested and
/// before the final flush, guaranteeing the hooks have ceased producing by
/// the time the last events are persisted.
pub trait Listeners {
    fn halt(&mut self);
}

/// For sessions without live hooks (tests, replay-free dry runs).
impl Listeners for () {
    fn halt(&mut self) {}
}

/// Errors surfaced by the session lifecycle.
#[derive(Debug)]
pub enum SessionError {
    /// `start()` was called on a session that already ran.
    AlreadyStarted,
    /// The session log could not be written. Fatal: the session does not
    /// keep running while pretending data is being saved.
    Log(std::io::Error),
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::AlreadyStarted => write!(f, "session was already started"),
            SessionError::Log(e) => write!(f, "session log failure: {e}"),
        }
    }
}

impl std::error::Error for SessionError {}

/// Final account of a session, written to the log and mirrored on the
/// console.
#[derive(Debug, Clone)]
pub struct SessionSummary {
    pub started: DateTime<Local>,
    pub ended: DateTime<Local>,
    pub counts: EventCounts,
}

impl SessionSummary {
    /// Session duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        (self.ended - self.started).num_milliseconds() as f64 / 1000.0
    }

    /// The summary block appended to the session log.
    pub fn render_log(&self) -> String {
        format!(
            "\n{}\nTracking Summary\nStart Time: {}\nEnd Time: {}\nDuration: {:.1} seconds\n\
             Total Keys Pressed: {}\nTotal Mouse Clicks: {}\nTotal Mouse Scrolls: {}\n",
            "=".repeat(50),
            self.started.format(TIMESTAMP_FORMAT),
            self.ended.format(TIMESTAMP_FORMAT),
            self.duration_secs(),
            self.counts.keys,
            self.counts.clicks,
            self.counts.scrolls,
        )
    }

    /// The short form printed to the console on stop.
    pub fn render_console(&self) -> String {
        format!(
            "Duration: {:.1} seconds\nKeys pressed: {}\nMouse clicks: {}\nMouse scrolls: {}",
            self.duration_secs(),
            self.counts.keys,
            self.counts.clicks,
            self.counts.scrolls,
        )
    }
}

/// Owns the session state and drives it from start to stop.
pub struct SessionController {
    recorder: Arc<EventRecorder>,
    log: Arc<Mutex<SessionLog>>,
    events: Receiver<RawInput>,
    handle: SessionHandle,
    policy: SessionPolicy,
    started: bool,
}

impl SessionController {
    /// Create a controller writing to `log_path` and consuming raw input
    /// from `events`. Creating (truncating) the log file happens here, so a
    /// session that could not persist anything never starts.
    pub fn new(
        log_path: impl Into<PathBuf>,
        events: Receiver<RawInput>,
    ) -> Result<Self, SessionError> {
        Self::with_policy(log_path, events, SessionPolicy::default())
    }

    fn with_policy(
        log_path: impl Into<PathBuf>,
        events: Receiver<RawInput>,
        policy: SessionPolicy,
    ) -> Result<Self, SessionError> {
        let log = SessionLog::create(log_path).map_err(SessionError::Log)?;
        Ok(Self {
            recorder: Arc::new(EventRecorder::new()),
            log: Arc::new(Mutex::new(log)),
            events,
            handle: SessionHandle {
                stopped: Arc::new(AtomicBool::new(false)),
                token: ShutdownToken::new(),
            },
            policy,
            started: false,
        })
    }

    /// Handle for requesting a stop from another thread (idle monitor does
    /// this internally; Ctrl+C handlers and tests use it externally).
    pub fn handle(&self) -> SessionHandle {
        self.handle.clone()
    }

    /// Run the session to completion.
    ///
    /// Writes the log header, spawns the pump, flush loop and idle monitor,
    /// then blocks until a stop is requested. On the way out it halts
    /// `listeners`, joins every worker, performs the final drain and flush,
    /// and appends the summary block. Returns the summary for the console.
    pub fn start(&mut self, listeners: &mut impl Listeners) -> Result<SessionSummary, SessionError> {
        if self.started {
            return Err(SessionError::AlreadyStarted);
        }
        self.started = true;

        let started_at = Local::now();
        {
            let mut log = self.log.lock().expect("log writer poisoned");
            log.write_header(started_at).map_err(SessionError::Log)?;
        }
        info!("tracking session started");

        // A flush failure is parked here for the finalizer; the flush loop
        // cannot return it across threads itself.
        let fatal: Arc<Mutex<Option<std::io::Error>>> = Arc::new(Mutex::new(None));

        let pump = {
            let recorder = self.recorder.clone();
            let events = self.events.clone();
            let token = self.handle.token.clone();
            thread::spawn(move || pump_loop(&recorder, &events, &token))
        };

        let flusher = {
            let recorder = self.recorder.clone();
            let log = self.log.clone();
            let token = self.handle.token.clone();
            let handle = self.handle.clone();
            let fatal = fatal.clone();
            let interval = self.policy.flush_interval;
            thread::spawn(move || flush_loop(&recorder, &log, &token, &handle, &fatal, interval))
        };

        let idler = {
            let recorder = self.recorder.clone();
            let token = self.handle.token.clone();
            let handle = self.handle.clone();
            let policy = self.policy;
            thread::spawn(move || idle_loop(&recorder, &token, &handle, policy))
        };

        // Main wait loop: nothing to do but watch for cancellation.
        while !self.handle.token.is_cancelled() {
            thread::sleep(WAIT_POLL);
        }

        // Shutdown order matters: hooks first, so nothing new is produced;
        // then the workers; then whatever is still queued; then the final
        // flush and the summary.
        listeners.halt();
        let _ = pump.join();
        let _ = flusher.join();
        let _ = idler.join();

        while let Ok(raw) = self.events.try_recv() {
            self.recorder.record(raw);
        }

        if let Some(e) = fatal.lock().expect("fatal slot poisoned").take() {
            error!("session aborted: log became unwritable");
            return Err(SessionError::Log(e));
        }

        let remaining = self.recorder.drain();
        let summary = {
            let mut log = self.log.lock().expect("log writer poisoned");
            log.append_events(&remaining).map_err(SessionError::Log)?;
            let summary = SessionSummary {
                started: started_at,
                ended: Local::now(),
                counts: self.recorder.counts(),
            };
            log.append_summary(&summary).map_err(SessionError::Log)?;
            summary
        };

        info!(
            keys = summary.counts.keys,
            clicks = summary.counts.clicks,
            scrolls = summary.counts.scrolls,
            "tracking session stopped"
        );
        Ok(summary)
    }
}

/// Sole consumer of the raw-input channel. Keeps hook callbacks decoupled
/// from recording, so producers never block on the recorder lock.
fn pump_loop(recorder: &EventRecorder, events: &Receiver<RawInput>, token: &ShutdownToken) {
    loop {
        if token.is_cancelled() {
            break;
        }
        match events.recv_timeout(PUMP_POLL) {
            Ok(raw) => recorder.record(raw),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    // Record whatever was already queued when the stop was requested.
    while let Ok(raw) = events.try_recv() {
        recorder.record(raw);
    }
    debug!("recorder pump stopped");
}

/// Periodically drains the buffer into the session log.
fn flush_loop(
    recorder: &EventRecorder,
    log: &Mutex<SessionLog>,
    token: &ShutdownToken,
    handle: &SessionHandle,
    fatal: &Mutex<Option<std::io::Error>>,
    interval: Duration,
) {
    loop {
        thread::sleep(interval);
        if token.is_cancelled() {
            break;
        }
        let events = recorder.drain();
        if events.is_empty() {
            continue;
        }
        debug!(count = events.len(), "flushing buffered events");
        let result = log
            .lock()
            .expect("log writer poisoned")
            .append_events(&events);
        if let Err(e) = result {
            error!("cannot append to session log: {e}");
            *fatal.lock().expect("fatal slot poisoned") = Some(e);
            handle.stop();
            break;
        }
    }
    debug!("flush loop stopped");
}

/// Watches the idle clock and stops the session after the fixed timeout.
fn idle_loop(
    recorder: &EventRecorder,
    token: &ShutdownToken,
    handle: &SessionHandle,
    policy: SessionPolicy,
) {
    loop {
        thread::sleep(policy.idle_check_interval);
        if token.is_cancelled() {
            break;
        }
        let idle = recorder.idle_for();
        if idle > policy.idle_timeout {
            info!(idle_ms = idle.as_millis() as u64, "idle threshold exceeded");
            println!(
                "\nNo activity for {} seconds. Stopping tracking...",
                policy.idle_timeout.as_secs()
            );
            handle.stop();
            break;
        }
    }
    debug!("idle monitor stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::types::{MouseButton, RawInput};
    use crossbeam_channel::{unbounded, Sender};
    use std::path::PathBuf;

    fn test_log_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("inputtrail-session-{}-{}.txt", name, std::process::id()))
    }

    fn quick_policy() -> SessionPolicy {
        SessionPolicy {
            flush_interval: Duration::from_millis(20),
            idle_check_interval: Duration::from_millis(20),
            idle_timeout: Duration::from_secs(600),
        }
    }

    fn run_session(
        name: &str,
        policy: SessionPolicy,
        feed: impl FnOnce(&Sender<RawInput>, &SessionHandle) + Send + 'static,
    ) -> (PathBuf, SessionSummary) {
        let path = test_log_path(name);
        let (sender, receiver) = unbounded();
        let mut session = SessionController::with_policy(&path, receiver, policy).unwrap();
        let handle = session.handle();

        let feeder = thread::spawn(move || feed(&sender, &handle));
        let summary = session.start(&mut ()).unwrap();
        feeder.join().unwrap();
        (path, summary)
    }

    #[test]
    fn test_events_flow_to_log_in_order() {
        let (path, summary) = run_session("order", quick_policy(), |sender, handle| {
            sender.send(RawInput::key_char('a')).unwrap();
            sender.send(RawInput::button_down(10, 20, MouseButton::Left)).unwrap();
            sender.send(RawInput::wheel(5, 6, 0, 3)).unwrap();
            // Give the periodic flush a couple of cycles.
            thread::sleep(Duration::from_millis(100));
            handle.stop();
        });

        let contents = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();

        let event_lines: Vec<&str> = contents
            .lines()
            .filter(|l| l.starts_with('['))
            .collect();
        assert_eq!(event_lines.len(), 3);
        assert!(event_lines[0].contains("KEY: a"));
        assert!(event_lines[1].contains("CLICK: Left at (10, 20)"));
        assert!(event_lines[2].contains("SCROLL: up at (5, 6)"));

        assert_eq!(summary.counts.keys, 1);
        assert_eq!(summary.counts.clicks, 1);
        assert_eq!(summary.counts.scrolls, 1);
        assert_eq!(contents.matches("Tracking Summary").count(), 1);
    }

    #[test]
    fn test_events_before_stop_are_never_lost() {
        // Stop immediately after sending, without waiting for a flush tick:
        // the final drain must still persist every event.
        let (path, summary) = run_session("no-loss", quick_policy(), |sender, handle| {
            for _ in 0..100 {
                sender.send(RawInput::key_char('k')).unwrap();
            }
            handle.stop();
        });

        let contents = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(summary.counts.keys, 100);
        assert_eq!(contents.lines().filter(|l| l.starts_with('[')).count(), 100);
    }

    #[test]
    fn test_stop_twice_writes_one_summary() {
        let (path, _) = run_session("double-stop", quick_policy(), |sender, handle| {
            sender.send(RawInput::key_char('x')).unwrap();
            let other = handle.clone();
            let racer = thread::spawn(move || other.stop());
            handle.stop();
            racer.join().unwrap();
            handle.stop();
        });

        let contents = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(contents.matches("Tracking Summary").count(), 1);
        assert_eq!(contents.matches("Input Tracking Session").count(), 1);
    }

    #[test]
    fn test_idle_timeout_stops_session() {
        let policy = SessionPolicy {
            flush_interval: Duration::from_millis(20),
            idle_check_interval: Duration::from_millis(20),
            idle_timeout: Duration::from_millis(80),
        };
        // No events, no explicit stop: the idle monitor must end the session.
        let (path, summary) = run_session("idle", policy, |_sender, _handle| {});

        let contents = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(summary.counts.total(), 0);
        assert_eq!(contents.matches("Tracking Summary").count(), 1);
    }

    #[test]
    fn test_start_twice_is_rejected() {
        let path = test_log_path("restart");
        let (sender, receiver) = unbounded();
        let mut session = SessionController::with_policy(&path, receiver, quick_policy()).unwrap();
        let handle = session.handle();

        handle.stop();
        session.start(&mut ()).unwrap();
        drop(sender);

        match session.start(&mut ()) {
            Err(SessionError::AlreadyStarted) => {}
            other => panic!("expected AlreadyStarted, got {other:?}"),
        }
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_summary_rendering() {
        use chrono::TimeZone;
        let started = Local.with_ymd_and_hms(2024, 3, 5, 14, 30, 0).unwrap();
        let summary = SessionSummary {
            started,
            ended: started + chrono::Duration::seconds(4),
            counts: EventCounts {
                keys: 1,
                clicks: 1,
                scrolls: 1,
            },
        };

        let block = summary.render_log();
        assert!(block.contains("Tracking Summary"));
        assert!(block.contains("Start Time: 2024-03-05 14:30:00"));
        assert!(block.contains("End Time: 2024-03-05 14:30:04"));
        assert!(block.contains("Duration: 4.0 seconds"));
        assert!(block.contains("Total Keys Pressed: 1"));
        assert!(block.contains("Total Mouse Clicks: 1"));
        assert!(block.contains("Total Mouse Scrolls: 1"));

        let console = summary.render_console();
        assert!(console.contains("Duration: 4.0 seconds"));
        assert!(console.contains("Keys pressed: 1"));
    }
}
