use parking_lot::{Condvar, Mutex};

/// One-shot flag a blocking thread can sleep on.
///
/// Once set, a `Signal` stays set; every current and future
/// [`wait`](Self::wait) returns immediately.
pub(crate) struct Signal {
    set: Mutex<bool>,
    condvar: Condvar,
}

impl Signal {
    pub(crate) const fn new() -> Self {
        Self {
            set: Mutex::new(false),
            condvar: Condvar::new(),
        }
    }

    pub(crate) fn set(&self) {
        let mut set = self.set.lock();
        *set = true;
        self.condvar.notify_all();
    }

    pub(crate) fn is_set(&self) -> bool {
        *self.set.lock()
    }

    /// Blocks the calling thread until the signal is set.
    pub(crate) fn wait(&self) {
        let mut set = self.set.lock();
        while !*set {
            self.condvar.wait(&mut set);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;
    use std::thread;

    #[test]
    fn wait_returns_once_set_from_another_thread() {
        let signal = Arc::new(Signal::new());
        let waiter = {
            let signal = signal.clone();
            thread::spawn(move || signal.wait())
        };

        assert!(!signal.is_set());
        signal.set();
        waiter.join().unwrap();

        assert!(signal.is_set());
        signal.wait();
    }
}
