use std::thread;
use std::time::Duration;

/// Configuration for the blocking pool.
///
/// Blocking threads are spawned lazily, up to `max_threads`, and retire
/// after sitting idle for `keep_alive` as long as more than `min_threads`
/// remain.
#[derive(Debug, Clone)]
pub struct BlockingPoolConfig {
    /// Number of threads kept alive even when idle.
    pub min_threads: usize,

    /// Upper bound on concurrently running blocking threads.
    pub max_threads: usize,

    /// How long an idle thread waits for new work before retiring.
    pub keep_alive: Duration,
}

impl BlockingPoolConfig {
    /// Normalizes the configuration so that `1 <= max_threads` and
    /// `min_threads <= max_threads`.
    pub fn normalize(&mut self) {
        if self.max_threads == 0 {
            self.max_threads = 1;
        }

        if self.max_threads < self.min_threads {
            self.max_threads = self.min_threads;
        }
    }
}

impl Default for BlockingPoolConfig {
    fn default() -> Self {
        Self {
            min_threads: 0,
            max_threads: 64,
            keep_alive: Duration::from_secs(10),
        }
    }
}

/// Concrete values driving runtime behavior.
///
/// Most users build a runtime through
/// [`RuntimeBuilder`](crate::RuntimeBuilder) rather than filling this in
/// directly.
///
/// | Field | Default |
/// |-------|---------|
/// | `worker_threads` | available CPU parallelism |
/// | `thread_name_prefix` | `"concord"` |
/// | `blocking.min_threads` | 0 |
/// | `blocking.max_threads` | 64 |
/// | `blocking.keep_alive` | 10 s |
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Number of executor worker threads.
    pub worker_threads: usize,

    /// Prefix for the names of every thread the runtime spawns.
    pub thread_name_prefix: String,

    /// Blocking pool settings.
    pub blocking: BlockingPoolConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        let worker_threads = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);

        Self {
            worker_threads,
            thread_name_prefix: String::from("concord"),
            blocking: BlockingPoolConfig::default(),
        }
    }
}
