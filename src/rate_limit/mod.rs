//! Rate limiting: token bucket, sliding window, adaptive, and
//! hierarchical strategies sharing a common `try_acquire`/`acquire`
//! contract, plus a process-wide named registry.

pub mod adaptive;
pub mod config;
pub mod guard;
pub mod hierarchical;
pub mod registry;
pub mod sliding_window;
pub mod stats;
pub mod token_bucket;

pub use adaptive::AdaptiveRateLimiter;
pub use config::RateLimitConfig;
pub use guard::RateLimitGuard;
pub use hierarchical::HierarchicalRateLimiter;
pub use registry::RateLimiterRegistry;
pub use sliding_window::{SlidingWindowLimiter, WINDOW_SLOTS};
pub use stats::{RateLimiterStats, RateLimiterStatsSnapshot};
pub use token_bucket::TokenBucket;
