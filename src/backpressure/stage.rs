//! Backpressure-wrapped pipeline stage.

use super::config::BackpressureConfig;
use super::controller::BackpressureController;
use std::time::Instant;

/// Wraps a processing closure with automatic accept/drop/throttle
/// handling and latency feedback into the controller's sensor.
pub struct BackpressureStage<I, O, F>
where
    F: Fn(&I) -> Option<O>,
{
    controller: BackpressureController,
    processor: F,
    _marker: std::marker::PhantomData<(I, O)>,
}

impl<I, O, F> BackpressureStage<I, O, F>
where
    F: Fn(&I) -> Option<O>,
{
    pub fn new(config: BackpressureConfig, processor: F) -> Self {
        BackpressureStage {
            controller: BackpressureController::new(config),
            processor,
            _marker: std::marker::PhantomData,
        }
    }

    pub fn process(&self, input: &I) -> Option<O> {
        if !self.controller.should_accept() {
            self.controller.item_dropped();
            return None;
        }

        let start = Instant::now();
        let result = (self.processor)(input);
        self.controller
            .update_latency(start.elapsed().as_nanos() as i64);

        if result.is_some() {
            self.controller.item_processed();
        } else {
            self.controller.item_dropped();
        }

        result
    }

    pub fn update_queue(&self, current: usize, capacity: usize) {
        self.controller.update_queue(current, capacity);
    }

    pub fn controller(&self) -> &BackpressureController {
        &self.controller
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn processes_when_not_under_pressure() {
        let stage = BackpressureStage::new(BackpressureConfig::default(), |x: &i32| Some(x * 2));
        assert_eq!(stage.process(&21), Some(42));
        assert_eq!(stage.controller().stats().items_processed.load(std::sync::atomic::Ordering::Relaxed), 1);
    }

    #[test]
    fn drops_when_processor_returns_none() {
        let stage = BackpressureStage::new(BackpressureConfig::default(), |_: &i32| None::<i32>);
        assert_eq!(stage.process(&1), None);
        assert_eq!(stage.controller().stats().items_dropped.load(std::sync::atomic::Ordering::Relaxed), 1);
    }
}
