//! Scheduler monitoring counters.

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchedulerStatsSnapshot {
    pub scheduled: u64,
    pub dispatched: u64,
    pub missed_deadlines: u64,
    pub avg_latency_ns: f64,
    pub min_latency_ns: i64,
    pub max_latency_ns: i64,
}

#[derive(Debug)]
pub struct SchedulerStats {
    scheduled: AtomicU64,
    dispatched: AtomicU64,
    missed_deadlines: AtomicU64,
    total_latency_ns: AtomicI64,
    min_latency_ns: AtomicI64,
    max_latency_ns: AtomicI64,
}

impl Default for SchedulerStats {
    fn default() -> Self {
        SchedulerStats {
            scheduled: AtomicU64::new(0),
            dispatched: AtomicU64::new(0),
            missed_deadlines: AtomicU64::new(0),
            total_latency_ns: AtomicI64::new(0),
            min_latency_ns: AtomicI64::new(i64::MAX),
            max_latency_ns: AtomicI64::new(0),
        }
    }
}

impl SchedulerStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_scheduled(&self) {
        self.scheduled.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_dispatch(&self, latency_ns: i64, missed_deadline: bool) {
        self.dispatched.fetch_add(1, Ordering::Relaxed);
        if missed_deadline {
            self.missed_deadlines.fetch_add(1, Ordering::Relaxed);
        }
        self.total_latency_ns.fetch_add(latency_ns, Ordering::Relaxed);
        self.min_latency_ns.fetch_min(latency_ns, Ordering::Relaxed);
        self.max_latency_ns.fetch_max(latency_ns, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> SchedulerStatsSnapshot {
        let dispatched = self.dispatched.load(Ordering::Relaxed);
        let total = self.total_latency_ns.load(Ordering::Relaxed);
        let min = self.min_latency_ns.load(Ordering::Relaxed);
        SchedulerStatsSnapshot {
            scheduled: self.scheduled.load(Ordering::Relaxed),
            dispatched,
            missed_deadlines: self.missed_deadlines.load(Ordering::Relaxed),
            avg_latency_ns: if dispatched > 0 {
                total as f64 / dispatched as f64
            } else {
                0.0
            },
            min_latency_ns: if dispatched > 0 { min } else { 0 },
            max_latency_ns: self.max_latency_ns.load(Ordering::Relaxed),
        }
    }

    pub fn reset(&self) {
        self.scheduled.store(0, Ordering::Relaxed);
        self.dispatched.store(0, Ordering::Relaxed);
        self.missed_deadlines.store(0, Ordering::Relaxed);
        self.total_latency_ns.store(0, Ordering::Relaxed);
        self.min_latency_ns.store(i64::MAX, Ordering::Relaxed);
        self.max_latency_ns.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_reports_zero_latency_bounds_when_idle() {
        let stats = SchedulerStats::new();
        let snap = stats.snapshot();
        assert_eq!(snap.min_latency_ns, 0);
        assert_eq!(snap.max_latency_ns, 0);
    }

    #[test]
    fn record_dispatch_tracks_missed_deadlines() {
        let stats = SchedulerStats::new();
        stats.record_dispatch(100, false);
        stats.record_dispatch(500, true);
        let snap = stats.snapshot();
        assert_eq!(snap.dispatched, 2);
        assert_eq!(snap.missed_deadlines, 1);
        assert_eq!(snap.min_latency_ns, 100);
        assert_eq!(snap.max_latency_ns, 500);
    }
}
