//! Backpressure DROP_NEWEST: with the queue at capacity, new items are
//! rejected while the earlier ones stay counted as accepted.

use ipb_core::backpressure::{BackpressureConfig, BackpressureController, BackpressureStrategy};

#[test]
fn pushing_past_capacity_drops_the_newest_items() {
    let config = BackpressureConfig {
        strategy: BackpressureStrategy::DropNewest,
        low_watermark: 0.5,
        high_watermark: 0.8,
        critical_watermark: 0.95,
        hysteresis_ns: 0,
        ..BackpressureConfig::default()
    };
    let controller = BackpressureController::new(config);
    let capacity = 4usize;

    let mut accepted = 0usize;
    let mut rejected = 0usize;
    for queued in 0..6 {
        // The sixth push queued so far is already at 5/4 = over capacity;
        // the sensor sees the fill level before this item is admitted.
        controller.update_queue(queued, capacity);
        if controller.should_accept() {
            accepted += 1;
        } else {
            // `should_accept` already recorded the drop for DropNewest;
            // `item_dropped` is for drops the caller decides on its own
            // (e.g. a rate-limiter rejection), not reached here.
            rejected += 1;
        }
    }

    assert_eq!(accepted, 4);
    assert_eq!(rejected, 2);
    assert_eq!(controller.stats().items_dropped.load(std::sync::atomic::Ordering::Relaxed), 2);
}
