use crate::error::{Error, Result};
use crate::executor::PoolKind;
use std::time::Duration;

/// Worker count of the bulk pool when none is configured.
pub const DEFAULT_BULK_WORKERS: usize = 6;

/// Worker count of the critical pool when none is configured.
pub const DEFAULT_CRITICAL_WORKERS: usize = 2;

/// How long `disable()` waits for in-flight work before forcing the pools down.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(1);

const MAX_WORKERS: usize = 1024;

#[derive(Debug, Clone)]
pub struct Config {
    pub bulk_workers: usize,
    pub critical_workers: usize,
    pub shutdown_timeout: Duration,

    /// Granularity at which a blocked shutdown wait notices an interrupt.
    pub interrupt_poll_interval: Duration,

    pub thread_name_prefix: String,
    pub stack_size: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bulk_workers: DEFAULT_BULK_WORKERS,
            critical_workers: DEFAULT_CRITICAL_WORKERS,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
            interrupt_poll_interval: Duration::from_millis(10),
            thread_name_prefix: "tandem".to_string(),
            stack_size: None,
        }
    }
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    pub fn validate(&self) -> Result<()> {
        for (kind, n) in [
            (PoolKind::Bulk, self.bulk_workers),
            (PoolKind::Critical, self.critical_workers),
        ] {
            if n == 0 {
                return Err(Error::config(format!("{} workers must be > 0", kind)));
            }
            if n > MAX_WORKERS {
                return Err(Error::config(format!(
                    "{} workers too large (max {})",
                    kind, MAX_WORKERS
                )));
            }
        }

        if self.shutdown_timeout.is_zero() {
            return Err(Error::config("shutdown_timeout must be > 0"));
        }

        if self.interrupt_poll_interval.is_zero() {
            return Err(Error::config("interrupt_poll_interval must be > 0"));
        }

        if self.thread_name_prefix.trim().is_empty() {
            return Err(Error::config("thread_name_prefix must not be empty"));
        }

        Ok(())
    }

    /// Worker count for the given pool.
    pub fn workers(&self, kind: PoolKind) -> usize {
        match kind {
            PoolKind::Bulk => self.bulk_workers,
            PoolKind::Critical => self.critical_workers,
        }
    }
}

#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn bulk_workers(mut self, n: usize) -> Self {
        self.config.bulk_workers = n;
        self
    }

    pub fn critical_workers(mut self, n: usize) -> Self {
        self.config.critical_workers = n;
        self
    }

    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.config.shutdown_timeout = timeout;
        self
    }

    pub fn interrupt_poll_interval(mut self, interval: Duration) -> Self {
        self.config.interrupt_poll_interval = interval;
        self
    }

    pub fn thread_name_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.config.thread_name_prefix = prefix.into();
        self
    }

    pub fn stack_size(mut self, size: usize) -> Self {
        self.config.stack_size = Some(size);
        self
    }

    pub fn build(self) -> Result<Config> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_sizing() {
        let config = Config::default();
        assert_eq!(config.workers(PoolKind::Bulk), 6);
        assert_eq!(config.workers(PoolKind::Critical), 2);
        assert_eq!(config.shutdown_timeout, Duration::from_secs(1));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_overrides() {
        let config = Config::builder()
            .bulk_workers(3)
            .critical_workers(1)
            .shutdown_timeout(Duration::from_millis(250))
            .thread_name_prefix("plan")
            .stack_size(512 * 1024)
            .build()
            .unwrap();

        assert_eq!(config.bulk_workers, 3);
        assert_eq!(config.critical_workers, 1);
        assert_eq!(config.shutdown_timeout, Duration::from_millis(250));
        assert_eq!(config.thread_name_prefix, "plan");
        assert_eq!(config.stack_size, Some(512 * 1024));
    }

    #[test]
    fn test_rejects_empty_pools() {
        assert!(Config::builder().bulk_workers(0).build().is_err());
        assert!(Config::builder().critical_workers(0).build().is_err());
        assert!(Config::builder().critical_workers(4096).build().is_err());
    }

    #[test]
    fn test_rejects_zero_timeout_and_blank_prefix() {
        assert!(Config::builder()
            .shutdown_timeout(Duration::ZERO)
            .build()
            .is_err());
        assert!(Config::builder().thread_name_prefix("  ").build().is_err());
    }
}
