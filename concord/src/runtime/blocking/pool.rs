use crate::runtime::config::BlockingPoolConfig;

use parking_lot::{Condvar, Mutex, MutexGuard};

use std::collections::VecDeque;
use std::io;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::thread;

/// Shared handle to the blocking pool.
pub(crate) type BlockingHandle = Arc<BlockingPool>;

type Job = Box<dyn FnOnce() + Send + 'static>;

struct PoolState {
    queue: VecDeque<Job>,

    /// Threads currently alive.
    threads: usize,

    /// Threads waiting for a job.
    idle: usize,

    shutdown: bool,

    /// Suffix of the next thread name.
    next_id: usize,
}

/// Elastic pool of threads running blocking work on behalf of tasks.
///
/// Threads are started lazily, one per submitted job until
/// `max_threads` is reached, after which jobs queue up. A thread idle
/// for longer than `keep_alive` exits as long as more than
/// `min_threads` remain.
///
/// Threads are never joined: a job may legitimately block forever (a
/// scope whose exit is never requested), so shutdown only stops the
/// idle ones and lets busy ones finish on their own.
pub(crate) struct BlockingPool {
    state: Mutex<PoolState>,
    condvar: Condvar,
    config: BlockingPoolConfig,
    prefix: String,
}

impl BlockingPool {
    pub(crate) fn new(config: BlockingPoolConfig, prefix: &str) -> BlockingHandle {
        Arc::new(Self {
            state: Mutex::new(PoolState {
                queue: VecDeque::new(),
                threads: 0,
                idle: 0,
                shutdown: false,
                next_id: 0,
            }),
            condvar: Condvar::new(),
            config,
            prefix: prefix.to_owned(),
        })
    }

    /// Queues `job` for execution on a blocking thread.
    ///
    /// Returns an error if the pool has been shut down or if no thread is
    /// alive and a new one could not be started.
    pub(crate) fn spawn<F>(self: &Arc<Self>, job: F) -> io::Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        let mut state = self.state.lock();

        if state.shutdown {
            return Err(io::Error::other("blocking pool is shut down"));
        }

        state.queue.push_back(Box::new(job));

        if state.idle > 0 {
            self.condvar.notify_one();
            return Ok(());
        }

        if state.threads < self.config.max_threads {
            if let Err(err) = self.start_thread(&mut state) {
                if state.threads == 0 {
                    state.queue.pop_back();
                    return Err(err);
                }

                tracing::warn!(error = %err, "failed to start blocking thread; job queued");
            }
        }

        Ok(())
    }

    /// Stops accepting jobs and wakes idle threads so they exit.
    ///
    /// Jobs already queued are still run by the threads that remain.
    pub(crate) fn shutdown(&self) {
        let mut state = self.state.lock();
        state.shutdown = true;
        self.condvar.notify_all();

        tracing::debug!(
            threads = state.threads,
            queued = state.queue.len(),
            "blocking pool shutting down"
        );
    }

    fn start_thread(self: &Arc<Self>, state: &mut PoolState) -> io::Result<()> {
        let id = state.next_id;
        let pool = self.clone();

        thread::Builder::new()
            .name(format!("{}-blocking-{id}", self.prefix))
            .spawn(move || pool.run())?;

        state.next_id += 1;
        state.threads += 1;

        tracing::trace!(thread = id, threads = state.threads, "blocking thread started");

        Ok(())
    }

    fn run(&self) {
        let mut state = self.state.lock();

        loop {
            if let Some(job) = state.queue.pop_front() {
                MutexGuard::unlocked(&mut state, || {
                    if catch_unwind(AssertUnwindSafe(job)).is_err() {
                        tracing::error!("blocking job panicked");
                    }
                });
                continue;
            }

            if state.shutdown {
                break;
            }

            state.idle += 1;
            let timed_out = self
                .condvar
                .wait_for(&mut state, self.config.keep_alive)
                .timed_out();
            state.idle -= 1;

            if timed_out && state.queue.is_empty() && state.threads > self.config.min_threads {
                break;
            }
        }

        state.threads -= 1;
        tracing::trace!(threads = state.threads, "blocking thread exited");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::mpsc;
    use std::time::Duration;

    fn config(max_threads: usize) -> BlockingPoolConfig {
        BlockingPoolConfig {
            min_threads: 0,
            max_threads,
            keep_alive: Duration::from_millis(20),
        }
    }

    #[test]
    fn runs_jobs_on_named_threads() {
        let pool = BlockingPool::new(config(2), "pool-test");
        let (tx, rx) = mpsc::channel();

        pool.spawn(move || {
            let name = thread::current().name().map(str::to_owned);
            tx.send(name).unwrap();
        })
        .unwrap();

        let name = rx.recv_timeout(Duration::from_secs(5)).unwrap().unwrap();
        assert!(name.starts_with("pool-test-blocking-"));

        pool.shutdown();
    }

    #[test]
    fn queues_jobs_beyond_max_threads() {
        let pool = BlockingPool::new(config(1), "pool-test");
        let (tx, rx) = mpsc::channel();

        for i in 0..4 {
            let tx = tx.clone();
            pool.spawn(move || tx.send(i).unwrap()).unwrap();
        }

        let got: Vec<_> = (0..4)
            .map(|_| rx.recv_timeout(Duration::from_secs(5)).unwrap())
            .collect();
        assert_eq!(got, vec![0, 1, 2, 3]);
        assert!(pool.state.lock().threads <= 1);

        pool.shutdown();
    }

    #[test]
    fn survives_panicking_jobs() {
        let pool = BlockingPool::new(config(1), "pool-test");
        let (tx, rx) = mpsc::channel();

        pool.spawn(|| panic!("boom")).unwrap();
        pool.spawn(move || tx.send(()).unwrap()).unwrap();

        rx.recv_timeout(Duration::from_secs(5)).unwrap();
        pool.shutdown();
    }

    #[test]
    fn rejects_jobs_after_shutdown() {
        let pool = BlockingPool::new(config(1), "pool-test");
        pool.shutdown();

        assert!(pool.spawn(|| {}).is_err());
    }

    #[test]
    fn idle_threads_retire_after_keep_alive() {
        let pool = BlockingPool::new(config(1), "pool-test");
        let (tx, rx) = mpsc::channel();

        pool.spawn(move || tx.send(()).unwrap()).unwrap();
        rx.recv_timeout(Duration::from_secs(5)).unwrap();

        thread::sleep(Duration::from_millis(200));
        assert_eq!(pool.state.lock().threads, 0);
    }
}
