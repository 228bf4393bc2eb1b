//! Process-wide ingestion counters.
//!
//! Producers bump `received`/`queued`, the accumulator bumps
//! `written`/`errors`. Counters only grow. Snapshots are advisory: they are
//! not taken atomically across counters.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

#[derive(Debug, Default)]
pub struct Stats {
    received: AtomicU64,
    queued: AtomicU64,
    written: AtomicU64,
    errors: AtomicU64,
}

/// Point-in-time view served by the stats endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub received: u64,
    pub queued: u64,
    pub written: u64,
    pub errors: u64,
    pub queue_depth: usize,
}

impl Stats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_received(&self) {
        self.received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_queued(&self) {
        self.queued.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_written(&self, records: u64) {
        self.written.fetch_add(records, Ordering::Relaxed);
    }

    pub fn record_errors(&self, records: u64) {
        self.errors.fetch_add(records, Ordering::Relaxed);
    }

    pub fn snapshot(&self, queue_depth: usize) -> StatsSnapshot {
        StatsSnapshot {
            received: self.received.load(Ordering::Relaxed),
            queued: self.queued.load(Ordering::Relaxed),
            written: self.written.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            queue_depth,
        }
    }
}
