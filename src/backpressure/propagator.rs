//! Pressure propagation across a multi-stage pipeline.

use super::config::PressureLevel;
use super::controller::BackpressureController;
use super::stats::BackpressureStats;
use parking_lot::Mutex;
use std::sync::atomic::Ordering;
use std::sync::Arc;

#[derive(Default)]
pub struct PressurePropagator {
    stages: Mutex<Vec<Arc<BackpressureController>>>,
}

impl PressurePropagator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_stage(&self, controller: Arc<BackpressureController>) {
        self.stages.lock().push(controller);
    }

    pub fn max_pressure(&self) -> PressureLevel {
        self.stages
            .lock()
            .iter()
            .map(|s| s.pressure_level())
            .max()
            .unwrap_or(PressureLevel::None)
    }

    pub fn is_critical(&self) -> bool {
        self.max_pressure() >= PressureLevel::Critical
    }

    pub fn aggregate_stats(&self, total: &BackpressureStats) {
        for stage in self.stages.lock().iter() {
            let s = stage.stats();
            total
                .items_received
                .fetch_add(s.items_received.load(Ordering::Relaxed), Ordering::Relaxed);
            total.items_processed.fetch_add(
                s.items_processed.load(Ordering::Relaxed),
                Ordering::Relaxed,
            );
            total
                .items_dropped
                .fetch_add(s.items_dropped.load(Ordering::Relaxed), Ordering::Relaxed);
            total.throttle_events.fetch_add(
                s.throttle_events.load(Ordering::Relaxed),
                Ordering::Relaxed,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backpressure::config::BackpressureConfig;

    #[test]
    fn max_pressure_across_stages() {
        let propagator = PressurePropagator::new();
        let a = Arc::new(BackpressureController::new(BackpressureConfig::default()));
        let b = Arc::new(BackpressureController::new(BackpressureConfig::default()));
        b.update_queue(96, 100);
        b.should_accept();
        propagator.add_stage(a);
        propagator.add_stage(b);
        assert_eq!(propagator.max_pressure(), PressureLevel::Critical);
        assert!(propagator.is_critical());
    }

    #[test]
    fn no_stages_reports_none() {
        let propagator = PressurePropagator::new();
        assert_eq!(propagator.max_pressure(), PressureLevel::None);
    }
}
