//! DiagnosticSink implementations.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::ports::DiagnosticSink;

/// Forwards diagnostics to `tracing` at TRACE level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn record(&self, tag: &str, message: &str) {
        trace!(tag, "{message}");
    }
}

/// Drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl DiagnosticSink for NoopSink {
    fn record(&self, _tag: &str, _message: &str) {}
}

/// One recorded diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SinkRecord {
    pub tag: String,
    pub message: String,
    pub recorded_at: DateTime<Utc>,
}

/// Keeps diagnostics in memory so they can be inspected later.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<SinkRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far.
    pub fn records(&self) -> Vec<SinkRecord> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().map(|records| records.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DiagnosticSink for MemorySink {
    fn record(&self, tag: &str, message: &str) {
        // a poisoned lock must not fail the caller
        if let Ok(mut records) = self.records.lock() {
            records.push(SinkRecord {
                tag: tag.to_string(),
                message: message.to_string(),
                recorded_at: Utc::now(),
            });
        }
    }
}
