pub use crate::config::{Config, ConfigBuilder};
pub use crate::error::{Error, Result};
pub use crate::executor::{Importance, PoolKind, PoolState, ResultHandle, TaskError, TaskResult, WorkItem};
pub use crate::runtime::Executor;
pub use crate::shutdown::{Interrupter, ShutdownReport};
pub use crate::sink::{ErrorRecord, ErrorSink, Reporter, Severity, StatusLog};
