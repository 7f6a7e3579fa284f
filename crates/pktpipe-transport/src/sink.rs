//! Injected error reporting.
//!
//! Components never reach for a process-wide logger. Each one holds a
//! [`SharedSink`] given at construction and reports operator-facing failures
//! through it.

use std::sync::{Arc, Mutex};

/// Receives formatted error lines. Must never fail or panic.
pub trait ErrorSink: Send + Sync {
    fn error(&self, message: &str);
}

/// Shared handle to an error sink.
pub type SharedSink = Arc<dyn ErrorSink>;

/// Forwards error lines to `tracing` at ERROR level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl ErrorSink for TracingSink {
    fn error(&self, message: &str) {
        tracing::error!(target: "pktpipe", "{message}");
    }
}

/// Keeps every error line in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Snapshot of the recorded lines.
    pub fn lines(&self) -> Vec<String> {
        match self.lines.lock() {
            Ok(lines) => lines.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lines().is_empty()
    }
}

impl ErrorSink for MemorySink {
    fn error(&self, message: &str) {
        let mut lines = match self.lines.lock() {
            Ok(lines) => lines,
            Err(poisoned) => poisoned.into_inner(),
        };
        lines.push(message.to_string());
    }
}

/// The sink used when none is injected.
pub fn default_sink() -> SharedSink {
    Arc::new(TracingSink)
}
