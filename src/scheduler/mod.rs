//! Earliest-deadline-first task scheduler.
//!
//! A bounded pool of worker threads repeatedly pops the queued `DataPoint`
//! with the nearest deadline and hands it to a caller-supplied dispatch
//! function (the router's sink fan-out). A missed deadline does not drop
//! the task -- it still dispatches, and the miss is only counted, unless a
//! fatal configuration error intervenes (this crate has no such
//! configuration).

mod queue;
pub mod config;
pub mod stats;
pub mod task;

pub use config::SchedulerConfig;
pub use stats::{SchedulerStats, SchedulerStatsSnapshot};
pub use task::ScheduledTask;

use crate::common::{DataPoint, Timestamp};
use crate::error::{BridgeError, Result};
use crate::rule_engine::RulePriority;
use queue::EdfQueue;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Once};
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::warn;

/// Sink-dispatch callback invoked by a worker thread for each popped task.
pub type DispatchFn = Arc<dyn Fn(DataPoint, &[String]) + Send + Sync>;
/// Invoked exactly once, after the queue has drained to empty during
/// shutdown and before any worker thread exits.
pub type FlushFn = Arc<dyn Fn() + Send + Sync>;

pub struct EdfScheduler {
    queue: Arc<EdfQueue>,
    stats: Arc<SchedulerStats>,
    config: SchedulerConfig,
    next_seq: AtomicU64,
    shutdown: Arc<AtomicBool>,
    workers: Vec<JoinHandle<()>>,
}

impl EdfScheduler {
    /// Spawns `config.worker_count` worker threads.
    pub fn start(config: SchedulerConfig, dispatch: DispatchFn, flush: FlushFn) -> Self {
        let queue = Arc::new(EdfQueue::new(config.capacity));
        let stats = Arc::new(SchedulerStats::new());
        let shutdown = Arc::new(AtomicBool::new(false));
        let flush_once = Arc::new(Once::new());

        let workers = (0..config.worker_count.max(1))
            .map(|i| {
                let queue = Arc::clone(&queue);
                let stats = Arc::clone(&stats);
                let shutdown = Arc::clone(&shutdown);
                let dispatch = Arc::clone(&dispatch);
                let flush = Arc::clone(&flush);
                let flush_once = Arc::clone(&flush_once);
                let poll_interval = config.poll_interval;
                let core = config
                    .cpu_affinity
                    .as_ref()
                    .filter(|ids| !ids.is_empty())
                    .map(|ids| ids[i % ids.len()]);
                std::thread::spawn(move || {
                    if let Some(core) = core {
                        pin_to_core(core);
                    }
                    worker_loop(queue, stats, shutdown, dispatch, flush, flush_once, poll_interval)
                })
            })
            .collect();

        EdfScheduler {
            queue,
            stats,
            config,
            next_seq: AtomicU64::new(0),
            shutdown,
            workers,
        }
    }

    /// Enqueues `data_point` for dispatch to `target_sink_ids`. If
    /// `deadline` is `None` it defaults to `enqueue_time +
    /// default_deadline_offset`, except when `priority` is at least
    /// [`RulePriority::Realtime`], in which case the deadline is the
    /// enqueue time itself (immediate). Fails with `InvalidState` if the
    /// scheduler is shutting down, or `BufferOverflow` if the queue is at
    /// `config.capacity`.
    pub fn schedule(
        &self,
        data_point: DataPoint,
        target_sink_ids: Vec<String>,
        priority: Option<RulePriority>,
        deadline: Option<Timestamp>,
    ) -> Result<()> {
        if self.shutdown.load(Ordering::Acquire) {
            return Err(BridgeError::InvalidState("scheduler is shutting down".into()));
        }
        let enqueue_time = Timestamp::now();
        let deadline = deadline.unwrap_or_else(|| {
            let immediate = priority.map(|p| p >= RulePriority::Realtime).unwrap_or(false);
            if immediate {
                enqueue_time
            } else {
                enqueue_time + self.config.default_deadline_offset
            }
        });
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        self.queue
            .try_push(ScheduledTask::new(data_point, target_sink_ids, enqueue_time, deadline, seq))
            .map_err(|_| BridgeError::BufferOverflow("scheduler queue is at capacity".into()))?;
        self.stats.record_scheduled();
        Ok(())
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn stats(&self) -> SchedulerStatsSnapshot {
        self.stats.snapshot()
    }

    /// Stops accepting new tasks, waits for every queued task to drain
    /// (dispatched by the workers themselves), then joins the pool. The
    /// `flush` callback given to [`start`] runs exactly once, after the
    /// last task drains and before the last worker exits.
    pub fn shutdown(mut self) {
        self.do_shutdown();
    }

    fn do_shutdown(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

impl Drop for EdfScheduler {
    fn drop(&mut self) {
        self.do_shutdown();
    }
}

#[allow(clippy::too_many_arguments)]
fn worker_loop(
    queue: Arc<EdfQueue>,
    stats: Arc<SchedulerStats>,
    shutdown: Arc<AtomicBool>,
    dispatch: DispatchFn,
    flush: FlushFn,
    flush_once: Arc<Once>,
    poll_interval: Duration,
) {
    loop {
        match queue.pop_wait(poll_interval) {
            Some(task) => dispatch_task(task, &stats, &dispatch),
            None => {
                if shutdown.load(Ordering::Acquire) && queue.is_empty() {
                    flush_once.call_once(|| flush());
                    break;
                }
            }
        }
    }
}

fn pin_to_core(core_id: usize) {
    let ids = core_affinity::get_core_ids().unwrap_or_default();
    match ids.into_iter().find(|id| id.id == core_id) {
        Some(id) => {
            if !core_affinity::set_for_current(id) {
                warn!("failed to pin scheduler worker to core {}", core_id);
            }
        }
        None => warn!("core {} not available for scheduler worker pinning", core_id),
    }
}

fn dispatch_task(task: ScheduledTask, stats: &SchedulerStats, dispatch: &DispatchFn) {
    let ScheduledTask {
        data_point,
        target_sink_ids,
        enqueue_time,
        deadline,
        ..
    } = task;

    let missed = Timestamp::now() > deadline;
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        dispatch(data_point, &target_sink_ids)
    }));
    if let Err(payload) = result {
        let err = crate::error::BridgeError::from_panic(&*payload);
        warn!("sink dispatch panicked: {}", err);
    }

    let latency_ns = Timestamp::now().saturating_duration_since(enqueue_time).as_nanos() as i64;
    stats.record_dispatch(latency_ns, missed);
}
