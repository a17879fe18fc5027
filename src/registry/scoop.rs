//! Scoop registry: symmetric to the sink registry on the
//! collector side, with read strategies and subscription fan-in.

use super::health::HealthTracker;
use crate::common::DataPoint;
use crate::error::{BridgeError, Result};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

/// Implemented by protocol drivers that can be polled on demand, in
/// addition to (or instead of) pushing via `DataSource::set_callback`.
/// Grounded on the original `IProtocolSourceBase::read`/`subscribe` pair.
pub trait Scoop: Send + Sync {
    fn id(&self) -> &str;
    fn read(&self) -> Result<Vec<DataPoint>>;
    fn connect(&self) -> Result<()>;
    fn disconnect(&self);
    fn is_connected(&self) -> bool;

    fn subscribe(&self, _callback: Box<dyn Fn(Vec<DataPoint>) + Send + Sync>) -> Result<()> {
        Err(BridgeError::NotImplemented("subscribe".into()))
    }
    fn unsubscribe(&self) {}

    fn add_address(&self, _address: &str) -> Result<()> {
        Err(BridgeError::NotImplemented("add_address".into()))
    }
    fn remove_address(&self, _address: &str) -> Result<()> {
        Err(BridgeError::NotImplemented("remove_address".into()))
    }
    fn addresses(&self) -> Vec<String> {
        Vec::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadStrategy {
    PrimaryOnly,
    Failover,
    RoundRobin,
    BroadcastMerge,
    FastestResponse,
    Quorum(usize),
}

#[derive(Debug, Clone)]
pub struct ScoopRegistryConfig {
    pub default_strategy: ReadStrategy,
    pub unhealthy_threshold: u32,
    pub recovery_threshold: u32,
}

impl Default for ScoopRegistryConfig {
    fn default() -> Self {
        ScoopRegistryConfig {
            default_strategy: ReadStrategy::Failover,
            unhealthy_threshold: 3,
            recovery_threshold: 2,
        }
    }
}

#[derive(Debug, Default)]
pub struct ScoopRegistryStats {
    pub total_reads: AtomicU64,
    pub successful_reads: AtomicU64,
    pub failed_reads: AtomicU64,
    pub failover_events: AtomicU64,
}

struct ScoopEntry {
    id: String,
    scoop: Arc<dyn Scoop>,
    priority: u32,
    is_primary: bool,
    enabled: AtomicBool,
    health: HealthTracker,
}

/// Fans the callbacks of several scoops into one `(points, source_id)`
/// stream; cancels every underlying subscription when dropped.
pub struct AggregatedSubscription {
    scoops: Vec<Arc<dyn Scoop>>,
    active: Arc<AtomicBool>,
}

impl AggregatedSubscription {
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    pub fn source_count(&self) -> usize {
        self.scoops.len()
    }

    pub fn cancel(&self) {
        if self.active.swap(false, Ordering::AcqRel) {
            for scoop in &self.scoops {
                scoop.unsubscribe();
            }
        }
    }
}

impl Drop for AggregatedSubscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

pub struct ScoopRegistry {
    entries: RwLock<Vec<Arc<ScoopEntry>>>,
    rr_cursor: AtomicUsize,
    config: ScoopRegistryConfig,
    stats: ScoopRegistryStats,
}

impl ScoopRegistry {
    pub fn new() -> Self {
        Self::with_config(ScoopRegistryConfig::default())
    }

    pub fn with_config(config: ScoopRegistryConfig) -> Self {
        ScoopRegistry {
            entries: RwLock::new(Vec::new()),
            rr_cursor: AtomicUsize::new(0),
            config,
            stats: ScoopRegistryStats::default(),
        }
    }

    pub fn register(
        &self,
        id: impl Into<String>,
        scoop: Arc<dyn Scoop>,
        is_primary: bool,
        priority: u32,
    ) -> Result<()> {
        let id = id.into();
        let mut entries = self.entries.write();
        if entries.iter().any(|e| e.id == id) {
            return Err(BridgeError::AlreadyExists(id));
        }
        entries.push(Arc::new(ScoopEntry {
            id,
            scoop,
            priority,
            is_primary,
            enabled: AtomicBool::new(true),
            health: HealthTracker::new(
                self.config.unhealthy_threshold,
                self.config.recovery_threshold,
            ),
        }));
        Ok(())
    }

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
        entry.scoop.disconnect();
        true
    }

    pub fn scoop_count(&self) -> usize {
        self.entries.read().len()
    }

    pub fn stats(&self) -> &ScoopRegistryStats {
        &self.stats
    }

    pub fn connect_all(&self) {
        for entry in self.entries.read().iter() {
            let _ = entry.scoop.connect();
        }
    }

    pub fn disconnect_all(&self) {
        for entry in self.entries.read().iter() {
            entry.scoop.disconnect();
        }
    }

    pub fn addresses(&self, id: &str) -> Vec<String> {
        self.entries
            .read()
            .iter()
            .find(|e| e.id == id)
            .map(|e| e.scoop.addresses())
            .unwrap_or_default()
    }

    pub fn add_address(&self, ids: &[String], address: &str) -> Result<()> {
        let entries = self.entries.read();
        for id in ids {
            if let Some(entry) = entries.iter().find(|e| &e.id == id) {
                entry.scoop.add_address(address)?;
            }
        }
        Ok(())
    }

    pub fn remove_address(&self, ids: &[String], address: &str) -> Result<()> {
        let entries = self.entries.read();
        for id in ids {
            if let Some(entry) = entries.iter().find(|e| &e.id == id) {
                entry.scoop.remove_address(address)?;
            }
        }
        Ok(())
    }

    pub fn read_from(&self, scoop_ids: &[String]) -> Result<Vec<DataPoint>> {
        self.read_with(scoop_ids, self.config.default_strategy)
    }

    pub fn read_with(&self, scoop_ids: &[String], strategy: ReadStrategy) -> Result<Vec<DataPoint>> {
        self.stats.total_reads.fetch_add(1, Ordering::Relaxed);
        let eligible: Vec<Arc<ScoopEntry>> = {
            let entries = self.entries.read();
            entries
                .iter()
                .filter(|e| {
                    scoop_ids.iter().any(|id| id == &e.id)
                        && e.enabled.load(Ordering::Relaxed)
                        && e.health.is_eligible()
                })
                .cloned()
                .collect()
        };
        if eligible.is_empty() {
            self.stats.failed_reads.fetch_add(1, Ordering::Relaxed);
            return Err(BridgeError::NotFound(
                "no eligible scoop among scoop_ids".into(),
            ));
        }

        let result = match strategy {
            ReadStrategy::PrimaryOnly => {
                let entry = eligible
                    .iter()
                    .find(|e| e.is_primary)
                    .or_else(|| eligible.first())
                    .expect("eligible is non-empty");
                self.read_one(entry)
            }
            ReadStrategy::RoundRobin => {
                let idx = self.rr_cursor.fetch_add(1, Ordering::Relaxed) % eligible.len();
                self.read_one(&eligible[idx])
            }
            ReadStrategy::Failover => self.read_failover(&eligible),
            ReadStrategy::BroadcastMerge => self.read_merged(&eligible, 1),
            ReadStrategy::Quorum(k) => self.read_merged(&eligible, k),
            ReadStrategy::FastestResponse => self.read_fastest(&eligible),
        };

        match &result {
            Ok(_) => {
                self.stats.successful_reads.fetch_add(1, Ordering::Relaxed);
            }
            Err(_) => {
                self.stats.failed_reads.fetch_add(1, Ordering::Relaxed);
            }
        }
        result
    }

    fn read_one(&self, entry: &Arc<ScoopEntry>) -> Result<Vec<DataPoint>> {
        let result = entry.scoop.read();
        match &result {
            Ok(_) => entry.health.record_success(),
            Err(_) => entry.health.record_failure(),
        }
        result
    }

    fn read_failover(&self, eligible: &[Arc<ScoopEntry>]) -> Result<Vec<DataPoint>> {
        let mut ordered: Vec<&Arc<ScoopEntry>> = eligible.iter().collect();
        ordered.sort_by_key(|e| e.priority);
        let mut last_err = None;
        for (i, entry) in ordered.iter().enumerate() {
            match self.read_one(entry) {
                Ok(points) => return Ok(points),
                Err(e) => {
                    if i > 0 {
                        self.stats.failover_events.fetch_add(1, Ordering::Relaxed);
                    }
                    last_err = Some(e);
                }
            }
        }
        Err(last_err.unwrap_or_else(|| BridgeError::ConnectionFailed("all scoops failed".into())))
    }

    fn read_merged(&self, eligible: &[Arc<ScoopEntry>], required_successes: usize) -> Result<Vec<DataPoint>> {
        let mut merged = Vec::new();
        let mut successes = 0usize;
        let mut last_err = None;
        for entry in eligible {
            match self.read_one(entry) {
                Ok(points) => {
                    successes += 1;
                    merged.extend(points);
                }
                Err(e) => last_err = Some(e),
            }
        }
        if successes >= required_successes.max(1) {
            Ok(merged)
        } else {
            Err(last_err.unwrap_or_else(|| {
                BridgeError::ConnectionFailed(format!(
                    "quorum not reached: {successes}/{required_successes}"
                ))
            }))
        }
    }

    fn read_fastest(&self, eligible: &[Arc<ScoopEntry>]) -> Result<Vec<DataPoint>> {
        let (tx, rx) = crossbeam::channel::unbounded();
        for entry in eligible {
            let tx = tx.clone();
            let entry = Arc::clone(entry);
            std::thread::spawn(move || {
                let result = entry.scoop.read();
                match &result {
                    Ok(_) => entry.health.record_success(),
                    Err(_) => entry.health.record_failure(),
                }
                let _ = tx.send(result);
            });
        }
        drop(tx);
        for _ in 0..eligible.len() {
            match rx.recv() {
                Ok(Ok(points)) => return Ok(points),
                Ok(Err(_)) => continue,
                Err(_) => break,
            }
        }
        Err(BridgeError::ConnectionFailed("no scoop responded".into()))
    }

    /// Subscribes to `scoop_ids`, fanning their callbacks into one
    /// `(points, source_id)` stream via `on_data`.
    pub fn subscribe(
        &self,
        scoop_ids: &[String],
        on_data: Arc<dyn Fn(Vec<DataPoint>, String) + Send + Sync>,
    ) -> Result<AggregatedSubscription> {
        let entries = self.entries.read();
        let active = Arc::new(AtomicBool::new(true));
        let mut scoops = Vec::new();
        for id in scoop_ids {
            if let Some(entry) = entries.iter().find(|e| &e.id == id) {
                let scoop = Arc::clone(&entry.scoop);
                let callback = Arc::clone(&on_data);
                let source_id = id.clone();
                let active = Arc::clone(&active);
                scoop.subscribe(Box::new(move |points| {
                    if active.load(Ordering::Acquire) {
                        callback(points, source_id.clone());
                    }
                }))?;
                scoops.push(scoop);
            }
        }
        Ok(AggregatedSubscription { scoops, active })
    }
}

impl Default for ScoopRegistry {
    fn default() -> Self {
        Self::new()
    }
}
