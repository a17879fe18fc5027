//! Per-queue counters shared by every lock-free queue variant.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct QueueStats {
    pub enqueues: AtomicU64,
    pub dequeues: AtomicU64,
    pub failed_enqueues: AtomicU64,
    pub failed_dequeues: AtomicU64,
    pub spins: AtomicU64,
}

impl QueueStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&self) {
        self.enqueues.store(0, Ordering::Relaxed);
        self.dequeues.store(0, Ordering::Relaxed);
        self.failed_enqueues.store(0, Ordering::Relaxed);
        self.failed_dequeues.store(0, Ordering::Relaxed);
        self.spins.store(0, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> QueueStatsSnapshot {
        QueueStatsSnapshot {
            enqueues: self.enqueues.load(Ordering::Relaxed),
            dequeues: self.dequeues.load(Ordering::Relaxed),
            failed_enqueues: self.failed_enqueues.load(Ordering::Relaxed),
            failed_dequeues: self.failed_dequeues.load(Ordering::Relaxed),
            spins: self.spins.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueStatsSnapshot {
    pub enqueues: u64,
    pub dequeues: u64,
    pub failed_enqueues: u64,
    pub failed_dequeues: u64,
    pub spins: u64,
}
