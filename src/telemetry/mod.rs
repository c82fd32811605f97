//! Per-pool counters for monitoring executor behavior.

pub mod metrics;

pub use metrics::{ExecutorStats, PoolStats, PoolStatsSnapshot};
