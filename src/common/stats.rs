//! Uniform statistics snapshot surface shared by every component.

use std::sync::atomic::{AtomicU64, Ordering};

/// Read-only counters snapshot exposed by every component.
#[derive(Debug, Clone, Copy, Default, serde::Serialize)]
pub struct StatsSnapshot {
    pub messages_in: u64,
    pub messages_out: u64,
    pub dropped: u64,
    pub errors: u64,
    pub latency_min_ns: u64,
    pub latency_avg_ns: u64,
    pub latency_max_ns: u64,
    pub latency_p95_ns: u64,
    pub latency_p99_ns: u64,
    pub uptime_ns: u64,
}

/// Atomic counter block components embed to build a [`StatsSnapshot`].
///
/// Writes use relaxed ordering (any thread may bump a counter mid-flight);
/// reads that build a snapshot use acquire, so a reader never observes a
/// counter bump without the write it was paired with.
#[derive(Debug, Default)]
pub struct StatsCounters {
    pub messages_in: AtomicU64,
    pub messages_out: AtomicU64,
    pub dropped: AtomicU64,
    pub errors: AtomicU64,
}

impl StatsCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_in(&self) {
        self.messages_in.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_out(&self) {
        self.messages_out.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> (u64, u64, u64, u64) {
        (
            self.messages_in.load(Ordering::Acquire),
            self.messages_out.load(Ordering::Acquire),
            self.dropped.load(Ordering::Acquire),
            self.errors.load(Ordering::Acquire),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let c = StatsCounters::new();
        c.record_in();
        c.record_in();
        c.record_out();
        c.record_dropped();
        c.record_error();
        assert_eq!(c.snapshot(), (2, 1, 1, 1));
    }
}
