//! Failover: a flaky primary sink fails over to a backup, then gets
//! excluded from selection after three consecutive failures.

use ipb_core::registry::{SinkRegistry, SinkStrategy};
use ipb_core::{BridgeError, DataPoint, DataSink, Result, Value};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

struct FlakySink {
    id: String,
    fail_next: AtomicBool,
    received: Mutex<Vec<DataPoint>>,
}

impl FlakySink {
    fn new(id: &str) -> Arc<Self> {
        Arc::new(FlakySink {
            id: id.to_string(),
            fail_next: AtomicBool::new(false),
            received: Mutex::new(Vec::new()),
        })
    }
}

impl DataSink for FlakySink {
    fn id(&self) -> &str {
        &self.id
    }
    fn start(&self) -> Result<()> {
        Ok(())
    }
    fn stop(&self) {}
    fn is_running(&self) -> bool {
        true
    }
    fn is_healthy(&self) -> bool {
        true
    }
    fn send(&self, data_point: DataPoint) -> Result<()> {
        if self.fail_next.swap(false, Ordering::Relaxed) {
            return Err(BridgeError::ConnectionFailed(format!("{} unavailable", self.id)));
        }
        self.received.lock().push(data_point);
        Ok(())
    }
}

#[test]
fn failing_primary_fails_over_to_backup() {
    let registry = SinkRegistry::new();
    let a = FlakySink::new("a");
    let b = FlakySink::new("b");
    a.fail_next.store(true, Ordering::Relaxed);
    registry.register("a", a.clone(), 1, true, 0).unwrap();
    registry.register("b", b.clone(), 1, false, 1).unwrap();

    let targets = vec!["a".to_string(), "b".to_string()];
    let point = DataPoint::new("x", Value::I32(1));
    registry
        .send_with(&targets, point.clone(), SinkStrategy::Failover)
        .unwrap();

    assert_eq!(b.received.lock().as_slice(), [point]);
    assert!(registry.stats().failover_events.load(Ordering::Relaxed) >= 1);
    assert!(registry.stats().failed_sends.load(Ordering::Relaxed) >= 1);
}

#[test]
fn three_consecutive_failures_mark_a_sink_unhealthy() {
    let registry = SinkRegistry::new();
    let flaky = FlakySink::new("flaky");
    registry.register("flaky", flaky.clone(), 1, true, 0).unwrap();
    let targets = vec!["flaky".to_string()];

    for _ in 0..3 {
        flaky.fail_next.store(true, Ordering::Relaxed);
        assert!(registry.send(&targets, DataPoint::new("x", Value::Empty)).is_err());
    }

    let err = registry
        .send(&targets, DataPoint::new("x", Value::Empty))
        .unwrap_err();
    assert!(matches!(err, BridgeError::NotFound(_)));
}
