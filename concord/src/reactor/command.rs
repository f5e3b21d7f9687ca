use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::task::Waker;
use std::time::Instant;

/// Requests sent to the reactor thread.
pub(crate) enum Command {
    /// Wake `waker` once `deadline` is reached, unless `cancelled` is set
    /// first.
    SetTimer {
        deadline: Instant,
        waker: Waker,
        cancelled: Arc<AtomicBool>,
    },
    /// Stop the reactor thread. Pending timers are dropped unfired.
    Shutdown,
}
