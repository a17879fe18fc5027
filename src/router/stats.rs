//! Router-wide statistics: message counters plus an HDR histogram of
//! ingest-to-dispatch latency.

use crate::common::StatsSnapshot;
use hdrhistogram::Histogram;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

pub struct RouterStats {
    messages_in: AtomicU64,
    messages_out: AtomicU64,
    dropped: AtomicU64,
    errors: AtomicU64,
    latency: Mutex<Histogram<u64>>,
    start: Instant,
}

impl RouterStats {
    pub fn new() -> Self {
        RouterStats {
            messages_in: AtomicU64::new(0),
            messages_out: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
            errors: AtomicU64::new(0),
            latency: Mutex::new(Histogram::<u64>::new(3).expect("3 significant figures is valid")),
            start: Instant::now(),
        }
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

    pub fn record_latency_ns(&self, ns: u64) {
        let _ = self.latency.lock().record(ns);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let h = self.latency.lock();
        let has_samples = h.len() > 0;
        StatsSnapshot {
            messages_in: self.messages_in.load(Ordering::Acquire),
            messages_out: self.messages_out.load(Ordering::Acquire),
            dropped: self.dropped.load(Ordering::Acquire),
            errors: self.errors.load(Ordering::Acquire),
            latency_min_ns: if has_samples { h.min() } else { 0 },
            latency_avg_ns: h.mean() as u64,
            latency_max_ns: if has_samples { h.max() } else { 0 },
            latency_p95_ns: h.value_at_quantile(0.95),
            latency_p99_ns: h.value_at_quantile(0.99),
            uptime_ns: self.start.elapsed().as_nanos() as u64,
        }
    }

    pub fn reset(&self) {
        self.messages_in.store(0, Ordering::Relaxed);
        self.messages_out.store(0, Ordering::Relaxed);
        self.dropped.store(0, Ordering::Relaxed);
        self.errors.store(0, Ordering::Relaxed);
        self.latency.lock().reset();
    }
}

impl Default for RouterStats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_reflects_recorded_counters() {
        let stats = RouterStats::new();
        stats.record_in();
        stats.record_in();
        stats.record_out();
        stats.record_dropped();
        stats.record_latency_ns(1_000);
        stats.record_latency_ns(3_000);
        let snap = stats.snapshot();
        assert_eq!(snap.messages_in, 2);
        assert_eq!(snap.messages_out, 1);
        assert_eq!(snap.dropped, 1);
        assert_eq!(snap.latency_max_ns, 3_000);
    }

    #[test]
    fn idle_stats_report_zero_latency() {
        let stats = RouterStats::new();
        let snap = stats.snapshot();
        assert_eq!(snap.latency_min_ns, 0);
        assert_eq!(snap.latency_max_ns, 0);
    }
}
