//! Tandem - dual-priority task execution
//!
//! An executor with two independently sized worker pools: a *bulk* pool for
//! best-effort work and a *critical* pool for work that must not be silently
//! dropped. On shutdown, queued bulk work is abandoned while queued critical
//! work is pulled back and run to completion on the thread that shuts the
//! executor down.
//!
//! # Quick Start
//!
//! ```no_run
//! use tandem_rs::prelude::*;
//!
//! let executor = Executor::with_defaults()?;
//!
//! // fire-and-forget, best effort
//! executor.submit(WorkItem::non_critical_fn(|| println!("refresh cache")));
//!
//! // must run even if shutdown starts before a worker picks it up
//! let saved = executor.submit_with_handle(WorkItem::critical(|| {
//!     Ok::<_, TaskError>("session saved")
//! }));
//!
//! let report = executor.disable()?;
//! println!("drained {} critical task(s)", report.drained_critical);
//! println!("{:?}", saved.join());
//! # Ok::<(), tandem_rs::Error>(())
//! ```
//!
//! # Features
//!
//! - **Importance routing**: items carry an [`Importance`] tag; dispatch is a
//!   plain match, no type tests
//! - **Failure isolation**: errors and panics inside work items are reported
//!   to an [`ErrorSink`], never to the submitter and never fatal to a worker
//! - **Drain-and-run shutdown**: unstarted critical items run in submission
//!   order during [`Executor::disable`]
//! - **Bounded shutdown**: in-flight work gets a fixed grace period, then the
//!   pools are forced down; an [`Interrupter`] can abort the wait
//! - **Restartable**: [`Executor::enable`] replaces stopped pools

// Lint configuration
#![warn(missing_debug_implementations)]

pub mod config;
pub mod error;
pub mod executor;
pub mod prelude;
pub mod runtime;
pub mod shutdown;
pub mod sink;
pub mod telemetry;
pub mod util;

// Re-export key types at crate root
pub use config::{Config, ConfigBuilder};
pub use error::{Error, Result};
pub use executor::{Importance, PoolKind, PoolState, ResultHandle, TaskError, TaskResult, WorkItem};
pub use runtime::Executor;
pub use shutdown::{Interrupter, ShutdownReport};
pub use sink::{ErrorRecord, ErrorSink, NullSink, Reporter, Severity, StatusLog, TracingSink};
pub use telemetry::{ExecutorStats, PoolStatsSnapshot};
