//! Sink registry: load-balanced, health-aware dispatch to
//! registered [`DataSink`]s.

use super::health::HealthTracker;
use crate::common::DataPoint;
use crate::error::{BridgeError, Result};
use crate::interfaces::DataSink;
use parking_lot::RwLock;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkStrategy {
    RoundRobin,
    LeastLoaded,
    Weighted,
    Random,
    HashByAddress,
    Failover,
    Broadcast,
    Quorum(usize),
}

#[derive(Debug, Clone)]
pub struct SinkRegistryConfig {
    pub default_strategy: SinkStrategy,
    pub unhealthy_threshold: u32,
    pub recovery_threshold: u32,
}

impl Default for SinkRegistryConfig {
    fn default() -> Self {
        SinkRegistryConfig {
            default_strategy: SinkStrategy::RoundRobin,
            unhealthy_threshold: 3,
            recovery_threshold: 2,
        }
    }
}

#[derive(Debug, Default)]
pub struct SinkRegistryStats {
    pub total_sends: AtomicU64,
    pub successful_sends: AtomicU64,
    pub failed_sends: AtomicU64,
    pub failover_events: AtomicU64,
}

struct SinkEntry {
    id: String,
    sink: Arc<dyn DataSink>,
    weight: u32,
    priority: u32,
    is_primary: bool,
    enabled: AtomicBool,
    health: HealthTracker,
    in_flight: AtomicU64,
    weighted_credit: AtomicI64,
}

pub struct SinkRegistry {
    entries: RwLock<Vec<Arc<SinkEntry>>>,
    rr_cursor: AtomicUsize,
    config: SinkRegistryConfig,
    stats: SinkRegistryStats,
}

impl SinkRegistry {
    pub fn new() -> Self {
        Self::with_config(SinkRegistryConfig::default())
    }

    pub fn with_config(config: SinkRegistryConfig) -> Self {
        SinkRegistry {
            entries: RwLock::new(Vec::new()),
            rr_cursor: AtomicUsize::new(0),
            config,
            stats: SinkRegistryStats::default(),
        }
    }

    pub fn register(
        &self,
        id: impl Into<String>,
        sink: Arc<dyn DataSink>,
        weight: u32,
        is_primary: bool,
        priority: u32,
    ) -> Result<()> {
        let id = id.into();
        let mut entries = self.entries.write();
        if entries.iter().any(|e| e.id == id) {
            return Err(BridgeError::AlreadyExists(id));
        }
        entries.push(Arc::new(SinkEntry {
            id,
            sink,
            weight: weight.max(1),
            priority,
            is_primary,
            enabled: AtomicBool::new(true),
            health: HealthTracker::new(
                self.config.unhealthy_threshold,
                self.config.recovery_threshold,
            ),
            in_flight: AtomicU64::new(0),
            weighted_credit: AtomicI64::new(0),
        }));
        Ok(())
    }

    /// Removes the sink, stopping it first. If it was the round-robin
    /// cursor's current target, advances the cursor past the gap.
    pub fn unregister(&self, id: &str) -> bool {
        let mut entries = self.entries.write();
        let Some(idx) = entries.iter().position(|e| e.id == id) else {
            return false;
        };
        let len = entries.len();
        if len > 0 && self.rr_cursor.load(Ordering::Relaxed) % len == idx {
            self.rr_cursor.fetch_add(1, Ordering::Relaxed);
        }
        let entry = entries.remove(idx);
        entry.sink.stop();
        true
    }

    pub fn set_enabled(&self, id: &str, enabled: bool) -> bool {
        let entries = self.entries.read();
        match entries.iter().find(|e| e.id == id) {
            Some(e) => {
                e.enabled.store(enabled, Ordering::Relaxed);
                true
            }
            None => false,
        }
    }

    pub fn sink_count(&self) -> usize {
        self.entries.read().len()
    }

    pub fn stats(&self) -> &SinkRegistryStats {
        &self.stats
    }

    pub fn health_of(&self, id: &str) -> Option<super::health::HealthState> {
        self.entries
            .read()
            .iter()
            .find(|e| e.id == id)
            .map(|e| e.health.state())
    }

    /// Selects and invokes sinks among `target_ids` using the registry's
    /// default strategy.
    pub fn send(&self, target_ids: &[String], data_point: DataPoint) -> Result<()> {
        self.send_with(target_ids, data_point, self.config.default_strategy)
    }

    pub fn send_with(
        &self,
        target_ids: &[String],
        data_point: DataPoint,
        strategy: SinkStrategy,
    ) -> Result<()> {
        let eligible: Vec<Arc<SinkEntry>> = {
            let entries = self.entries.read();
            entries
                .iter()
                .filter(|e| {
                    target_ids.iter().any(|t| t == &e.id)
                        && e.enabled.load(Ordering::Relaxed)
                        && e.health.is_eligible()
                })
                .cloned()
                .collect()
        };
        if eligible.is_empty() {
            return Err(BridgeError::NotFound(
                "no eligible sink among target_ids".into(),
            ));
        }

        match strategy {
            SinkStrategy::RoundRobin => {
                let idx = self.rr_cursor.fetch_add(1, Ordering::Relaxed) % eligible.len();
                self.invoke(&eligible[idx], data_point)
            }
            SinkStrategy::LeastLoaded => {
                let entry = eligible
                    .iter()
                    .min_by_key(|e| (e.in_flight.load(Ordering::Relaxed), e.id.clone()))
                    .expect("eligible is non-empty");
                self.invoke(entry, data_point)
            }
            SinkStrategy::Weighted => {
                let entry = self.pick_weighted(&eligible);
                self.invoke(&entry, data_point)
            }
            SinkStrategy::Random => {
                use rand::Rng;
                let idx = rand::thread_rng().gen_range(0..eligible.len());
                self.invoke(&eligible[idx], data_point)
            }
            SinkStrategy::HashByAddress => {
                let mut hasher = DefaultHasher::new();
                data_point.address().hash(&mut hasher);
                let idx = (hasher.finish() as usize) % eligible.len();
                self.invoke(&eligible[idx], data_point)
            }
            SinkStrategy::Failover => self.send_failover(&eligible, data_point),
            SinkStrategy::Broadcast => self.send_broadcast(&eligible, data_point, 1),
            SinkStrategy::Quorum(k) => self.send_broadcast(&eligible, data_point, k),
        }
    }

    fn pick_weighted(&self, eligible: &[Arc<SinkEntry>]) -> Arc<SinkEntry> {
        // Smooth weighted round-robin (the nginx algorithm): every entry's
        // credit grows by its weight each round; the entry with the
        // largest credit is picked and docked the total weight.
        let total_weight: i64 = eligible.iter().map(|e| e.weight as i64).sum();
        let mut best: Option<&Arc<SinkEntry>> = None;
        let mut best_credit = i64::MIN;
        for entry in eligible {
            let credit = entry.weighted_credit.fetch_add(entry.weight as i64, Ordering::Relaxed)
                + entry.weight as i64;
            if credit > best_credit {
                best_credit = credit;
                best = Some(entry);
            }
        }
        let winner = best.expect("eligible is non-empty").clone();
        winner
            .weighted_credit
            .fetch_sub(total_weight, Ordering::Relaxed);
        winner
    }

    fn send_failover(&self, eligible: &[Arc<SinkEntry>], data_point: DataPoint) -> Result<()> {
        let mut ordered: Vec<&Arc<SinkEntry>> = eligible.iter().collect();
        ordered.sort_by_key(|e| e.priority);
        let mut last_err = None;
        for (i, entry) in ordered.iter().enumerate() {
            match self.invoke(entry, data_point.clone()) {
                Ok(()) => return Ok(()),
                Err(e) => {
                    if i > 0 {
                        self.stats.failover_events.fetch_add(1, Ordering::Relaxed);
                    }
                    last_err = Some(e);
                }
            }
        }
        Err(last_err.unwrap_or_else(|| BridgeError::ConnectionFailed("all sinks failed".into())))
    }

    fn send_broadcast(
        &self,
        eligible: &[Arc<SinkEntry>],
        data_point: DataPoint,
        required_successes: usize,
    ) -> Result<()> {
        let mut successes = 0usize;
        let mut last_err = None;
        for entry in eligible {
            match self.invoke(entry, data_point.clone()) {
                Ok(()) => successes += 1,
                Err(e) => last_err = Some(e),
            }
        }
        if successes >= required_successes.max(1) {
            Ok(())
        } else {
            Err(last_err.unwrap_or_else(|| {
                BridgeError::ConnectionFailed(format!(
                    "quorum not reached: {successes}/{required_successes}"
                ))
            }))
        }
    }

    /// Invokes a single entry's sink, tracking in-flight count, health, and
    /// registry-wide stats. The sink `Arc` was already cloned out from
    /// under the registry lock by the caller, so this never holds it.
    fn invoke(&self, entry: &Arc<SinkEntry>, data_point: DataPoint) -> Result<()> {
        entry.in_flight.fetch_add(1, Ordering::Relaxed);
        self.stats.total_sends.fetch_add(1, Ordering::Relaxed);
        let sink = Arc::clone(&entry.sink);
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| sink.send(data_point)))
            .unwrap_or_else(|payload| Err(BridgeError::from_panic(&*payload)));
        entry.in_flight.fetch_sub(1, Ordering::Relaxed);
        match &result {
            Ok(()) => {
                entry.health.record_success();
                self.stats.successful_sends.fetch_add(1, Ordering::Relaxed);
            }
            Err(_) => {
                entry.health.record_failure();
                self.stats.failed_sends.fetch_add(1, Ordering::Relaxed);
            }
        }
        result
    }
}

impl Default for SinkRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Value;
    use parking_lot::Mutex;

    struct RecordingSink {
        id: String,
        received: Mutex<Vec<String>>,
        fail_next: AtomicBool,
    }

    impl RecordingSink {
        fn new(id: &str) -> Arc<Self> {
            Arc::new(RecordingSink {
                id: id.to_string(),
                received: Mutex::new(Vec::new()),
                fail_next: AtomicBool::new(false),
            })
        }
    }

    impl DataSink for RecordingSink {
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
                return Err(BridgeError::ConnectionFailed("forced failure".into()));
            }
            self.received.lock().push(data_point.address().to_string());
            Ok(())
        }
    }

    fn dp(addr: &str) -> DataPoint {
        DataPoint::new(addr, Value::Empty)
    }

    #[test]
    fn register_rejects_duplicate_ids() {
        let registry = SinkRegistry::new();
        registry
            .register("a", RecordingSink::new("a"), 1, true, 0)
            .unwrap();
        let err = registry
            .register("a", RecordingSink::new("a"), 1, true, 0)
            .unwrap_err();
        assert!(matches!(err, BridgeError::AlreadyExists(_)));
    }

    #[test]
    fn round_robin_alternates_across_eligible_sinks() {
        let registry = SinkRegistry::with_config(SinkRegistryConfig {
            default_strategy: SinkStrategy::RoundRobin,
            ..Default::default()
        });
        let a = RecordingSink::new("a");
        let b = RecordingSink::new("b");
        registry.register("a", a.clone(), 1, false, 0).unwrap();
        registry.register("b", b.clone(), 1, false, 0).unwrap();

        let targets = vec!["a".to_string(), "b".to_string()];
        for i in 0..4 {
            registry.send(&targets, dp(&format!("x{i}"))).unwrap();
        }
        assert_eq!(a.received.lock().len() + b.received.lock().len(), 4);
        assert_eq!(a.received.lock().len(), 2);
        assert_eq!(b.received.lock().len(), 2);
    }

    #[test]
    fn failover_tries_next_priority_on_failure() {
        let registry = SinkRegistry::new();
        let primary = RecordingSink::new("primary");
        let backup = RecordingSink::new("backup");
        primary.fail_next.store(true, Ordering::Relaxed);
        registry
            .register("primary", primary.clone(), 1, true, 0)
            .unwrap();
        registry
            .register("backup", backup.clone(), 1, false, 10)
            .unwrap();

        let targets = vec!["primary".to_string(), "backup".to_string()];
        registry
            .send_with(&targets, dp("x"), SinkStrategy::Failover)
            .unwrap();
        assert_eq!(backup.received.lock().len(), 1);
        assert_eq!(registry.stats().failover_events.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn three_failures_exclude_a_sink_from_future_selection() {
        let registry = SinkRegistry::new();
        let flaky = RecordingSink::new("flaky");
        registry.register("flaky", flaky.clone(), 1, true, 0).unwrap();
        let targets = vec!["flaky".to_string()];

        for _ in 0..3 {
            flaky.fail_next.store(true, Ordering::Relaxed);
            assert!(registry.send(&targets, dp("x")).is_err());
        }
        let err = registry.send(&targets, dp("x")).unwrap_err();
        assert!(matches!(err, BridgeError::NotFound(_)));
    }

    #[test]
    fn broadcast_succeeds_if_any_sink_accepts() {
        let registry = SinkRegistry::new();
        let a = RecordingSink::new("a");
        let b = RecordingSink::new("b");
        a.fail_next.store(true, Ordering::Relaxed);
        registry.register("a", a.clone(), 1, false, 0).unwrap();
        registry.register("b", b.clone(), 1, false, 0).unwrap();

        let targets = vec!["a".to_string(), "b".to_string()];
        registry
            .send_with(&targets, dp("x"), SinkStrategy::Broadcast)
            .unwrap();
        assert_eq!(b.received.lock().len(), 1);
    }

    #[test]
    fn unregister_advances_cursor_past_removed_entry() {
        let registry = SinkRegistry::new();
        registry
            .register("a", RecordingSink::new("a"), 1, false, 0)
            .unwrap();
        registry
            .register("b", RecordingSink::new("b"), 1, false, 0)
            .unwrap();
        assert!(registry.unregister("a"));
        assert_eq!(registry.sink_count(), 1);
    }
}
