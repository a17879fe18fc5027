//! Scheduler configuration.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub worker_count: usize,
    /// Added to `enqueue_time` to produce a deadline when the caller does
    /// not supply one.
    pub default_deadline_offset: Duration,
    /// How long a worker blocks on an empty queue before re-checking for
    /// shutdown. Bounds shutdown latency without busy-polling.
    pub poll_interval: Duration,
    /// One core id per worker thread, assigned round-robin if there are
    /// fewer ids than workers. `None` leaves placement to the OS scheduler.
    pub cpu_affinity: Option<Vec<usize>>,
    /// Reserved for a future real-time scheduling class; core pinning is
    /// the only placement control actually implemented today.
    pub realtime_priority: Option<i32>,
    /// Maximum number of tasks the queue holds at once. `None` is
    /// unbounded; `schedule` rejects new tasks once a `Some` capacity is
    /// reached rather than growing the heap without limit.
    pub capacity: Option<usize>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        SchedulerConfig {
            worker_count: num_cpus::get().max(1),
            default_deadline_offset: Duration::from_millis(100),
            poll_interval: Duration::from_millis(50),
            cpu_affinity: None,
            realtime_priority: None,
            capacity: None,
        }
    }
}
