use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Snapshot of dispatcher activity.
///
/// Every accepted dispatch settles into exactly one of `delivered`, `skipped`,
/// `failed` or `undeliverable`.
///
/// - `skipped`: continuation suppressed because the owner was inactive (not an error)
/// - `failed`: background task panicked (also when the failure was forwarded
///   by `execute_catching`)
/// - `undeliverable`: main context was closed when the result was ready, or
///   the executor dropped the task without running it
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchCounts {
    pub submitted: u64,
    pub delivered: u64,
    pub skipped: u64,
    pub failed: u64,
    pub undeliverable: u64,
}

/// Live counters shared between the dispatcher and its in-flight jobs.
#[derive(Debug, Default)]
pub struct DispatchCounters {
    submitted: AtomicU64,
    delivered: AtomicU64,
    skipped: AtomicU64,
    failed: AtomicU64,
    undeliverable: AtomicU64,
}

impl DispatchCounters {
    pub fn snapshot(&self) -> DispatchCounts {
        DispatchCounts {
            submitted: self.submitted.load(Ordering::Acquire),
            delivered: self.delivered.load(Ordering::Acquire),
            skipped: self.skipped.load(Ordering::Acquire),
            failed: self.failed.load(Ordering::Acquire),
            undeliverable: self.undeliverable.load(Ordering::Acquire),
        }
    }

    pub(crate) fn record_submitted(&self) {
        self.submitted.fetch_add(1, Ordering::Release);
    }

    /// Undo `record_submitted` when the executor refused the job.
    pub(crate) fn record_rejected(&self) {
        self.submitted.fetch_sub(1, Ordering::Release);
    }

    pub(crate) fn record_delivered(&self) {
        self.delivered.fetch_add(1, Ordering::Release);
    }

    pub(crate) fn record_skipped(&self) {
        self.skipped.fetch_add(1, Ordering::Release);
    }

    pub(crate) fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Release);
    }

    pub(crate) fn record_undeliverable(&self) {
        self.undeliverable.fetch_add(1, Ordering::Release);
    }
}
