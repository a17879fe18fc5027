//! Router: the public entry point that binds `DataSource`
//! producers to `DataSink` consumers via the rule engine, scheduler, and
//! sink/scoop registries.

pub mod config;
pub mod state;
pub mod stats;

pub use config::RouterConfig;
pub use state::RouterState;
pub use stats::RouterStats;

use crate::common::{DataPoint, StatsSnapshot, Timestamp};
use crate::error::{BridgeError, Result};
use crate::interfaces::DataSink;
use crate::interfaces::DataSource;
use crate::rate_limit::TokenBucket;
use crate::registry::scoop::Scoop;
use crate::registry::{ScoopRegistry, SinkRegistry};
use crate::rule_engine::{RoutingRule, RuleEngine};
use crate::scheduler::{DispatchFn, EdfScheduler, FlushFn};
use parking_lot::{Mutex, RwLock};
use state::StateCell;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Orchestrates ingestion (`route`), rule evaluation, EDF scheduling, and
/// sink dispatch behind a single state machine. Built as an `Arc<Router>`
/// so registered `DataSource`s can hold a strong reference and call back
/// into `route` from their own driver thread.
pub struct Router {
    instance_id: String,
    state: StateCell,
    watchdog_enabled: bool,
    watchdog_timeout: Duration,
    last_watchdog_feed_ns: AtomicI64,
    drop_on_sink_error: bool,
    queue_capacity: usize,

    rule_engine: RuleEngine,
    sink_registry: Arc<SinkRegistry>,
    scoop_registry: Arc<ScoopRegistry>,
    rate_limiter: TokenBucket,
    backpressure: crate::backpressure::BackpressureController,
    scheduler_config: crate::scheduler::SchedulerConfig,
    scheduler: Mutex<Option<EdfScheduler>>,
    sources: RwLock<HashMap<String, Arc<dyn DataSource>>>,
    stats: Arc<RouterStats>,
}

impl Router {
    pub fn new(config: RouterConfig) -> Arc<Router> {
        let mut scheduler_config = config.scheduler;
        scheduler_config.capacity.get_or_insert(config.queue_capacity);
        Arc::new(Router {
            instance_id: config.instance_id,
            state: StateCell::new(RouterState::Stopped),
            watchdog_enabled: config.watchdog_enabled,
            watchdog_timeout: config.watchdog_timeout,
            last_watchdog_feed_ns: AtomicI64::new(0),
            drop_on_sink_error: config.drop_on_sink_error,
            queue_capacity: config.queue_capacity,
            rule_engine: RuleEngine::with_config(config.rule_engine),
            sink_registry: Arc::new(SinkRegistry::with_config(config.sink_registry)),
            scoop_registry: Arc::new(ScoopRegistry::with_config(config.scoop_registry)),
            rate_limiter: TokenBucket::new(config.rate_limit),
            backpressure: crate::backpressure::BackpressureController::new(config.backpressure),
            scheduler_config,
            scheduler: Mutex::new(None),
            sources: RwLock::new(HashMap::new()),
            stats: Arc::new(RouterStats::new()),
        })
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    pub fn state(&self) -> RouterState {
        self.state.get()
    }

    pub fn rules(&self) -> &RuleEngine {
        &self.rule_engine
    }

    pub fn sinks(&self) -> &SinkRegistry {
        &self.sink_registry
    }

    pub fn scoops(&self) -> &ScoopRegistry {
        &self.scoop_registry
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub fn add_rule(&self, rule: RoutingRule) -> u32 {
        self.rule_engine.add_rule(rule)
    }

    /// `STOPPED -> INITIALIZING -> (STOPPED | ERROR)`. Validates
    /// configuration that can only be checked once every field is in
    /// place; currently only the watchdog timeout.
    pub fn initialize(&self) -> Result<()> {
        if !self.state.transition(RouterState::Stopped, RouterState::Initializing) {
            return Err(BridgeError::InvalidState(format!(
                "initialize requires STOPPED, found {}",
                self.state.get()
            )));
        }
        if self.watchdog_enabled && self.watchdog_timeout.is_zero() {
            self.state.set(RouterState::Error);
            return Err(BridgeError::InvalidArgument(
                "watchdog_timeout must be non-zero when the watchdog is enabled".into(),
            ));
        }
        self.state.set(RouterState::Stopped);
        Ok(())
    }

    /// `STOPPED -> RUNNING`. Spawns the scheduler's worker pool and starts
    /// every registered source.
    pub fn start(&self) -> Result<()> {
        if !self.state.transition(RouterState::Stopped, RouterState::Running) {
            return Err(BridgeError::InvalidState(format!(
                "start requires STOPPED, found {}",
                self.state.get()
            )));
        }

        let sink_registry = Arc::clone(&self.sink_registry);
        let drop_on_sink_error = self.drop_on_sink_error;
        let stats = Arc::clone(&self.stats);
        let dispatch: DispatchFn = Arc::new(move |dp, targets| {
            if targets.is_empty() {
                return;
            }
            match sink_registry.send(targets, dp) {
                Ok(()) => stats.record_out(),
                Err(e) => {
                    if drop_on_sink_error {
                        debug!("dropping after sink send failure: {}", e);
                    } else {
                        warn!("sink send failed: {}", e);
                    }
                }
            }
        });
        let flush: FlushFn = Arc::new(|| {});
        let scheduler = EdfScheduler::start(self.scheduler_config.clone(), dispatch, flush);
        *self.scheduler.lock() = Some(scheduler);

        for source in self.sources.read().values() {
            if let Err(e) = source.start() {
                error!("source {} failed to start: {}", source.id(), e);
            }
        }

        self.feed_watchdog();
        Ok(())
    }

    pub fn pause(&self) -> Result<()> {
        if self.state.transition(RouterState::Running, RouterState::Paused) {
            Ok(())
        } else {
            Err(BridgeError::InvalidState(format!(
                "pause requires RUNNING, found {}",
                self.state.get()
            )))
        }
    }

    pub fn resume(&self) -> Result<()> {
        if self.state.transition(RouterState::Paused, RouterState::Running) {
            Ok(())
        } else {
            Err(BridgeError::InvalidState(format!(
                "resume requires PAUSED, found {}",
                self.state.get()
            )))
        }
    }

    /// Any state -> `SHUTDOWN` -> `STOPPED`. Stops every source, drains and
    /// joins the scheduler, then returns to `STOPPED` so the router can be
    /// started again.
    pub fn stop(&self) {
        self.state.set(RouterState::ShuttingDown);

        for source in self.sources.read().values() {
            source.stop();
        }
        if let Some(scheduler) = self.scheduler.lock().take() {
            scheduler.shutdown();
        }

        self.state.set(RouterState::Stopped);
    }

    pub fn feed_watchdog(&self) {
        self.last_watchdog_feed_ns
            .store(Timestamp::now().nanoseconds(), Ordering::Release);
    }

    /// Inert scheduler hook reserved for a future pull-model extension;
    /// performs watchdog bookkeeping and always returns `false`.
    pub fn tick(&self) -> bool {
        if self.watchdog_enabled && self.state.get() == RouterState::Running {
            let last_feed = Timestamp::from_nanos(self.last_watchdog_feed_ns.load(Ordering::Acquire));
            if Timestamp::now().saturating_duration_since(last_feed) > self.watchdog_timeout {
                error!("watchdog timeout exceeded for router {}", self.instance_id);
                self.state.set(RouterState::Error);
            }
        }
        false
    }

    /// Registers a push-based source: installs a callback that calls
    /// `route` for every point the source produces, then starts it if the
    /// router is already running.
    pub fn add_source(self: &Arc<Self>, id: impl Into<String>, source: Arc<dyn DataSource>) {
        let router = Arc::clone(self);
        source.set_callback(Box::new(move |dp| {
            let _ = router.route(dp);
        }));
        if self.state.get() == RouterState::Running {
            if let Err(e) = source.start() {
                error!("source {} failed to start: {}", source.id(), e);
            }
        }
        self.sources.write().insert(id.into(), source);
    }

    pub fn remove_source(&self, id: &str) -> bool {
        match self.sources.write().remove(id) {
            Some(source) => {
                source.stop();
                true
            }
            None => false,
        }
    }

    pub fn add_sink(
        &self,
        id: impl Into<String>,
        sink: Arc<dyn DataSink>,
        weight: u32,
        is_primary: bool,
        priority: u32,
    ) -> Result<()> {
        self.sink_registry.register(id, sink, weight, is_primary, priority)
    }

    pub fn remove_sink(&self, id: &str) -> bool {
        self.sink_registry.unregister(id)
    }

    pub fn add_scoop(
        &self,
        id: impl Into<String>,
        scoop: Arc<dyn Scoop>,
        is_primary: bool,
        priority: u32,
    ) -> Result<()> {
        self.scoop_registry.register(id, scoop, is_primary, priority)
    }

    pub fn remove_scoop(&self, id: &str) -> bool {
        self.scoop_registry.unregister(id)
    }

    /// Synchronous entry point: admission via the rate limiter, pressure
    /// check via the backpressure controller, rule match, then a single
    /// scheduler task carrying the deduplicated union of matched sink ids.
    ///
    /// `Err(InvalidState)` means the router isn't in a state that accepts
    /// traffic; `Err(BufferOverflow)` means the point was rejected by
    /// admission control (rate limiter, backpressure, or a full scheduler
    /// queue) rather than a lifecycle problem. `Ok(())` covers both a
    /// scheduled point and one that matched no rule -- the latter isn't a
    /// failure, there's simply nothing to forward.
    pub fn route(&self, dp: DataPoint) -> Result<()> {
        match self.state.get() {
            RouterState::Running => {}
            RouterState::Paused => {
                self.stats.record_dropped();
                return Err(BridgeError::InvalidState("router is paused".into()));
            }
            other => {
                self.stats.record_error();
                return Err(BridgeError::InvalidState(format!(
                    "route requires RUNNING, found {other}"
                )));
            }
        }

        if !self.rate_limiter.try_acquire(1) {
            self.stats.record_dropped();
            return Err(BridgeError::BufferOverflow("rate limit exceeded".into()));
        }
        let pending = self.scheduler.lock().as_ref().map_or(0, |s| s.pending());
        self.backpressure.update_queue(pending, self.queue_capacity);
        if !self.backpressure.should_accept() {
            // `should_accept` already records the drop against its own
            // stats for every strategy that can return false here; only
            // the router-wide counter needs bumping.
            self.stats.record_dropped();
            return Err(BridgeError::BufferOverflow(
                "backpressure controller rejected the point".into(),
            ));
        }

        self.stats.record_in();
        let ingest_ts = dp.timestamp();
        let results = self.rule_engine.evaluate(&dp);
        if results.is_empty() {
            self.backpressure.item_processed();
            return Ok(());
        }

        let mut target_ids = Vec::new();
        for result in &results {
            for id in &result.target_ids {
                if !target_ids.contains(id) {
                    target_ids.push(id.clone());
                }
            }
        }
        let priority = results.iter().filter_map(|r| r.priority).max();

        let scheduled = match self.scheduler.lock().as_ref() {
            Some(scheduler) => scheduler.schedule(dp, target_ids, priority, None),
            None => Err(BridgeError::InvalidState("scheduler is not running".into())),
        };

        self.backpressure.item_processed();
        let latency_ns = Timestamp::now().saturating_duration_since(ingest_ts).as_nanos() as u64;
        self.stats.record_latency_ns(latency_ns);
        self.backpressure.update_latency(latency_ns as i64);
        scheduled
    }

    pub fn route_batch(&self, data_points: Vec<DataPoint>) -> usize {
        let mut scheduled = 0;
        for dp in data_points {
            if self.route(dp).is_ok() {
                scheduled += 1;
            }
        }
        scheduled
    }
}
