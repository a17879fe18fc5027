//! Backpressure controller counters.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct BackpressureStats {
    pub items_received: AtomicU64,
    pub items_processed: AtomicU64,
    pub items_dropped: AtomicU64,
    pub items_sampled_out: AtomicU64,
    pub throttle_events: AtomicU64,
    pub block_events: AtomicU64,
    pub total_throttle_ns: AtomicU64,
    pub total_block_ns: AtomicU64,
    pub pressure_changes: AtomicU64,
}

impl BackpressureStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drop_rate(&self) -> f64 {
        let total = self.items_received.load(Ordering::Relaxed);
        let dropped = self.items_dropped.load(Ordering::Relaxed);
        if total > 0 {
            dropped as f64 / total as f64 * 100.0
        } else {
            0.0
        }
    }

    pub fn throughput_factor(&self) -> f64 {
        let received = self.items_received.load(Ordering::Relaxed);
        let processed = self.items_processed.load(Ordering::Relaxed);
        if received > 0 {
            processed as f64 / received as f64
        } else {
            1.0
        }
    }

    pub fn reset(&self) {
        self.items_received.store(0, Ordering::Relaxed);
        self.items_processed.store(0, Ordering::Relaxed);
        self.items_dropped.store(0, Ordering::Relaxed);
        self.items_sampled_out.store(0, Ordering::Relaxed);
        self.throttle_events.store(0, Ordering::Relaxed);
        self.block_events.store(0, Ordering::Relaxed);
        self.total_throttle_ns.store(0, Ordering::Relaxed);
        self.total_block_ns.store(0, Ordering::Relaxed);
        self.pressure_changes.store(0, Ordering::Relaxed);
    }
}
