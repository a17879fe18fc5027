//! Rule engine monitoring counters.

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

#[derive(Debug)]
pub struct RuleEngineStats {
    pub total_evaluations: AtomicU64,
    pub total_matches: AtomicU64,
    pub cache_hits: AtomicU64,
    pub cache_misses: AtomicU64,
    pub min_eval_time_ns: AtomicI64,
    pub max_eval_time_ns: AtomicI64,
    pub total_eval_time_ns: AtomicI64,
}

impl Default for RuleEngineStats {
    fn default() -> Self {
        RuleEngineStats {
            total_evaluations: AtomicU64::new(0),
            total_matches: AtomicU64::new(0),
            cache_hits: AtomicU64::new(0),
            cache_misses: AtomicU64::new(0),
            min_eval_time_ns: AtomicI64::new(i64::MAX),
            max_eval_time_ns: AtomicI64::new(0),
            total_eval_time_ns: AtomicI64::new(0),
        }
    }
}

impl RuleEngineStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_evaluation(&self, elapsed_ns: i64, matched: bool) {
        self.total_evaluations.fetch_add(1, Ordering::Relaxed);
        if matched {
            self.total_matches.fetch_add(1, Ordering::Relaxed);
        }
        self.total_eval_time_ns
            .fetch_add(elapsed_ns, Ordering::Relaxed);
        self.min_eval_time_ns.fetch_min(elapsed_ns, Ordering::Relaxed);
        self.max_eval_time_ns.fetch_max(elapsed_ns, Ordering::Relaxed);
    }

    pub fn avg_eval_time_ns(&self) -> f64 {
        let count = self.total_evaluations.load(Ordering::Relaxed);
        if count > 0 {
            self.total_eval_time_ns.load(Ordering::Relaxed) as f64 / count as f64
        } else {
            0.0
        }
    }

    pub fn match_rate(&self) -> f64 {
        let evals = self.total_evaluations.load(Ordering::Relaxed);
        if evals > 0 {
            self.total_matches.load(Ordering::Relaxed) as f64 / evals as f64 * 100.0
        } else {
            0.0
        }
    }

    pub fn reset(&self) {
        self.total_evaluations.store(0, Ordering::Relaxed);
        self.total_matches.store(0, Ordering::Relaxed);
        self.cache_hits.store(0, Ordering::Relaxed);
        self.cache_misses.store(0, Ordering::Relaxed);
        self.min_eval_time_ns.store(i64::MAX, Ordering::Relaxed);
        self.max_eval_time_ns.store(0, Ordering::Relaxed);
        self.total_eval_time_ns.store(0, Ordering::Relaxed);
    }
}
