use super::Runtime;
use super::config::RuntimeConfig;

use std::env;
use std::time::Duration;

/// Environment variable overriding the number of worker threads.
const WORKER_THREADS_ENV: &str = "CONCORD_WORKER_THREADS";

/// Environment variable overriding the blocking pool's thread limit.
const MAX_BLOCKING_THREADS_ENV: &str = "CONCORD_MAX_BLOCKING_THREADS";

/// Builder for configuring and creating a runtime.
///
/// `RuntimeBuilder` allows customizing runtime parameters before
/// constructing the runtime: the number of executor worker threads,
/// thread naming, and the blocking pool used by [`abide`](crate::abide).
///
/// A runtime with a single worker thread is a strictly cooperative,
/// single-threaded scheduler: a task runs until it reaches a suspension
/// point and is never preempted.
///
/// # Examples
///
/// ```rust,ignore
/// let runtime = RuntimeBuilder::new()
///     .worker_threads(1)
///     .max_blocking_threads(8)
///     .build();
/// ```
pub struct RuntimeBuilder {
    config: RuntimeConfig,
}

impl RuntimeBuilder {
    /// Creates a new `RuntimeBuilder` with default configuration.
    ///
    /// By default, the number of worker threads is set to the number
    /// of available logical CPUs, falling back to `1` if unavailable.
    pub fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
        }
    }

    /// Creates a builder from the defaults, overridden by
    /// `CONCORD_WORKER_THREADS` and `CONCORD_MAX_BLOCKING_THREADS` when
    /// they hold a positive integer.
    pub fn from_env() -> Self {
        let mut builder = Self::new();

        if let Some(n) = read_env(WORKER_THREADS_ENV) {
            builder = builder.worker_threads(n);
        }

        if let Some(n) = read_env(MAX_BLOCKING_THREADS_ENV) {
            builder = builder.max_blocking_threads(n);
        }

        builder
    }

    /// Sets the number of worker threads used by the runtime.
    ///
    /// # Panics
    ///
    /// Panics if `n == 0`.
    pub fn worker_threads(mut self, n: usize) -> Self {
        assert!(n > 0, "worker_threads must be > 0");

        self.config.worker_threads = n;
        self
    }

    /// Sets the prefix used to name runtime threads.
    pub fn thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.thread_name_prefix = prefix.into();
        self
    }

    /// Sets the number of blocking threads kept alive while idle.
    pub fn min_blocking_threads(mut self, n: usize) -> Self {
        self.config.blocking.min_threads = n;
        self
    }

    /// Sets the maximum number of blocking threads.
    pub fn max_blocking_threads(mut self, n: usize) -> Self {
        self.config.blocking.max_threads = n;
        self
    }

    /// Sets how long an idle blocking thread lingers before retiring.
    pub fn blocking_keep_alive(mut self, keep_alive: Duration) -> Self {
        self.config.blocking.keep_alive = keep_alive;
        self
    }

    /// Returns the configuration as currently set.
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Builds the runtime with the configured options.
    ///
    /// This starts the timer reactor, the blocking pool, and the executor.
    pub fn build(mut self) -> Runtime {
        self.config.blocking.normalize();
        Runtime::new(self.config)
    }
}

impl Default for RuntimeBuilder {
    /// Creates a default `RuntimeBuilder`.
    fn default() -> Self {
        Self::new()
    }
}

fn read_env(key: &str) -> Option<usize> {
    let value = env::var(key).ok()?;

    match value.trim().parse::<usize>() {
        Ok(n) if n > 0 => Some(n),
        _ => {
            tracing::warn!(key, value = %value, "ignoring invalid runtime setting");
            None
        }
    }
}
