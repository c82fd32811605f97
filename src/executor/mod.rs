//! Task execution infrastructure.
//!
//! This module provides the work-item model, the worker pools that run it,
//! and the result handles callers use to observe outcomes.

pub mod handle;
pub mod panic_handler;
pub mod pool;
pub mod task;
pub(crate) mod worker;

pub use handle::ResultHandle;
pub use panic_handler::PanicInfo;
pub use pool::{PoolState, WorkerPool};
pub use task::{Importance, PoolKind, TaskError, TaskId, TaskResult, WorkItem};

pub(crate) use task::{Job, RunContext};
