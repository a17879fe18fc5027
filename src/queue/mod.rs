//! Lock-free bounded queues: SPSC, MPSC, and MPMC variants
//! sharing the same sequence-counter cell design, plus a runtime-sized
//! MPMC for configuration-driven capacities.

pub mod bounded_mpmc;
pub mod mpmc;
pub mod mpsc;
pub mod spsc;
pub mod stats;

pub use bounded_mpmc::BoundedMpmcQueue;
pub use mpmc::MpmcQueue;
pub use mpsc::MpscQueue;
pub use spsc::SpscQueue;
pub use stats::{QueueStats, QueueStatsSnapshot};
