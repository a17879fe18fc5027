//! Simple route: a pattern rule forwards a matching point to its one
//! target sink exactly once.

use ipb_core::rule_engine::RuleBuilder;
use ipb_core::{DataPoint, DataSink, Result, Router, RouterConfig, Value};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

struct RecordingSink {
    received: Mutex<Vec<DataPoint>>,
}

impl DataSink for RecordingSink {
    fn id(&self) -> &str {
        "s"
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
        self.received.lock().push(data_point);
        Ok(())
    }
}

fn wait_until(mut cond: impl FnMut() -> bool) {
    for _ in 0..200 {
        if cond() {
            return;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    assert!(cond(), "condition never became true");
}

#[test]
fn sensors_pattern_route_forwards_exactly_once() {
    let router = Router::new(RouterConfig::default());
    router.initialize().unwrap();

    let sink = Arc::new(RecordingSink {
        received: Mutex::new(Vec::new()),
    });
    router.add_sink("s", sink.clone(), 1, true, 0).unwrap();
    router.add_rule(
        RuleBuilder::new()
            .name("r")
            .match_pattern("sensors/*")
            .route_to("s")
            .build(),
    );

    router.start().unwrap();
    let sent = DataPoint::new("sensors/temp", Value::F64(25.5));
    assert!(router.route(sent.clone()).is_ok());
    wait_until(|| !sink.received.lock().is_empty());
    router.stop();

    let received = sink.received.lock();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0], sent);
    assert_eq!(router.stats().messages_out, 1);
}
