//! Fallback (noop) implementation of event collection.
//!
//! This exists so the crate (and binary) can compile and the core pipeline
//! can be exercised on platforms without a hook implementation. It never
//! emits events.

use crate::collector::types::RawInput;
use crate::core::session::Listeners;
use crossbeam_channel::Sender;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Configuration for which event sources to capture.
///
/// Accepted on unsupported platforms, but no system events are captured.
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

/// Errors that can occur during event collection.
#[derive(Debug)]
pub enum CollectorError {
    AlreadyRunning,
}

impl std::fmt::Display for CollectorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollectorError::AlreadyRunning => write!(f, "collector is already running"),
        }
    }
}

impl std::error::Error for CollectorError {}

/// A collector that never emits events.
pub struct NoopCollector {
    _config: CollectorConfig,
    _sender: Sender<RawInput>,
    running: Arc<AtomicBool>,
}

impl NoopCollector {
    /// Create a new noop collector feeding `sender` (never, in practice).
    pub fn new(config: CollectorConfig, sender: Sender<RawInput>) -> Self {
        Self {
            _config: config,
            _sender: sender,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Start capturing events. Here this only marks the collector running.
    pub fn start(&mut self) -> Result<(), CollectorError> {
        if self.running.load(Ordering::SeqCst) {
            return Err(CollectorError::AlreadyRunning);
        }
        self.running.store(true, Ordering::SeqCst);
        Ok(())
    }

    /// Stop capturing events.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Check if the collector is currently running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl Listeners for NoopCollector {
    fn halt(&mut self) {
        self.stop();
    }
}

/// No hook permission gate exists on unsupported platforms.
pub fn check_permission() -> bool {
    true
}
