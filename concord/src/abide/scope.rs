use crate::error::{AbideError, BoxError, SyncError};
use crate::runtime::blocking::{CompletionCell, Signal};
use crate::runtime::context::current_handle;
use crate::sync::{BoundedSemaphore, Condition, Lock, Semaphore};

use parking_lot::{ArcMutexGuard, Mutex, RawMutex};

use std::convert::Infallible;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

/// A resource entered and exited from a task.
///
/// `enter` acquires the resource and `exit` gives it back. `exit`
/// receives the error that ended the scope, if any.
///
/// The synchronization primitives implement it through shared
/// references: entering a `&Lock` acquires it, exiting releases it.
pub trait CooperativeScope {
    /// Value produced by entering the scope.
    type Output;

    type Error;

    fn enter(&mut self) -> impl Future<Output = Result<Self::Output, Self::Error>> + Send;

    fn exit(
        &mut self,
        cause: Option<BoxError>,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

/// A resource whose enter and exit block the calling thread.
///
/// Wrapped in a [`ThreadScope`], both run on a blocking-pool thread,
/// always the same one, and in that order. `exit` is only called if
/// `enter` succeeded.
pub trait BlockingScope: Send + 'static {
    type Output: Send + 'static;

    type Error: std::error::Error + Send + Sync + 'static;

    fn enter(&mut self) -> Result<Self::Output, Self::Error>;

    fn exit(&mut self, cause: Option<BoxError>) -> Result<(), Self::Error>;
}

/// A thread-level mutex held from `enter` to `exit`.
///
/// Lets a `parking_lot` mutex shared with plain threads be held across a
/// task's scope:
///
/// ```rust,ignore
/// let shared = Arc::new(parking_lot::Mutex::new(()));
///
/// let mut scope = abide(Blocking(ThreadLock::new(shared.clone())));
/// scope.enter().await?;
/// // plain threads calling `shared.lock()` block here
/// scope.exit(None).await?;
/// ```
pub struct ThreadLock<T> {
    mutex: Arc<Mutex<T>>,
    guard: Option<ArcMutexGuard<RawMutex, T>>,
}

impl<T> ThreadLock<T> {
    pub fn new(mutex: Arc<Mutex<T>>) -> Self {
        Self { mutex, guard: None }
    }
}

impl<T: Send + 'static> BlockingScope for ThreadLock<T> {
    type Output = ();
    type Error = Infallible;

    fn enter(&mut self) -> Result<(), Infallible> {
        self.guard = Some(self.mutex.lock_arc());
        Ok(())
    }

    fn exit(&mut self, _cause: Option<BoxError>) -> Result<(), Infallible> {
        self.guard = None;
        Ok(())
    }
}

macro_rules! lock_scope {
    ($($ty:ty),* $(,)?) => {$(
        impl CooperativeScope for &$ty {
            type Output = ();
            type Error = SyncError;

            fn enter(&mut self) -> impl Future<Output = Result<(), SyncError>> + Send {
                let scope = *self;
                async move { scope.acquire().await }
            }

            fn exit(
                &mut self,
                _cause: Option<BoxError>,
            ) -> impl Future<Output = Result<(), SyncError>> + Send {
                let scope = *self;
                async move { scope.release() }
            }
        }
    )*};
}

lock_scope!(Lock, Semaphore, BoundedSemaphore, Condition);

/// Lifecycle of a [`ThreadScope`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeState {
    /// Not entered yet.
    Idle,
    /// Waiting for the blocking thread to finish `enter`.
    Entering,
    /// `enter` succeeded; the blocking thread waits for `exit`.
    Entered,
    /// Waiting for the blocking thread to finish `exit`.
    Exiting,
    /// `exit` has run, or has been arranged to run.
    Exited,
    /// The task was interrupted while entering; exit runs on its own if
    /// enter succeeds.
    CancelledDuringEnter,
    /// `enter` failed; `exit` is never called.
    EnterFailed,
}

struct Shared<M: BlockingScope> {
    entry_signal: Signal,
    exit_signal: Signal,
    exit_args: Mutex<Option<BoxError>>,
    entry_cell: CompletionCell<Result<M::Output, AbideError>>,
    exit_cell: CompletionCell<Result<(), AbideError>>,
}

/// Adapts a [`BlockingScope`] into a [`CooperativeScope`].
///
/// Entering submits one job to the blocking pool. The job runs the
/// manager's `enter`, reports back, then parks until the task asks for
/// `exit`, runs it and reports again. The task is suspended, never
/// blocked, while the job works.
///
/// If the task is interrupted while entering, the adapter still arranges
/// a clean exit: should `enter` eventually succeed on the blocking thread,
/// `exit` runs there exactly once with no cause. Dropping an adapter that
/// was entered but not exited does the same.
///
/// # Examples
///
/// ```rust,ignore
/// let shared = Arc::new(parking_lot::Mutex::new(()));
/// let mut scope = ThreadScope::new(ThreadLock::new(shared.clone()));
///
/// scope.enter().await?;
/// // the thread-level mutex is held here
/// scope.exit(None).await?;
/// ```
pub struct ThreadScope<M: BlockingScope> {
    manager: Option<M>,
    state: ScopeState,
    shared: Arc<Shared<M>>,
}

impl<M: BlockingScope> ThreadScope<M> {
    pub fn new(manager: M) -> Self {
        Self {
            manager: Some(manager),
            state: ScopeState::Idle,
            shared: Arc::new(Shared {
                entry_signal: Signal::new(),
                exit_signal: Signal::new(),
                exit_args: Mutex::new(None),
                entry_cell: CompletionCell::new(),
                exit_cell: CompletionCell::new(),
            }),
        }
    }

    pub fn state(&self) -> ScopeState {
        self.state
    }

    /// Runs the manager's `enter` on a blocking thread and returns its
    /// value.
    ///
    /// # Panics
    ///
    /// Panics if called outside the context of a running runtime.
    pub async fn enter(&mut self) -> Result<M::Output, AbideError> {
        if self.state != ScopeState::Idle {
            return Err(AbideError::InvalidState {
                op: "enter",
                state: self.state,
            });
        }

        let Some(manager) = self.manager.take() else {
            return Err(AbideError::InvalidState {
                op: "enter",
                state: self.state,
            });
        };

        let handle = current_handle().expect("ThreadScope entered outside of a runtime");
        let shared = self.shared.clone();

        if let Err(err) = handle.blocking.spawn(move || run_scope(manager, shared)) {
            self.state = ScopeState::EnterFailed;
            return Err(AbideError::Operation(Box::new(err)));
        }

        self.transition(ScopeState::Entering);

        let shared = self.shared.clone();
        let entered = shared.entry_cell.wait(Some(&shared.entry_signal)).await;

        match entered {
            Ok(Ok(value)) => {
                self.transition(ScopeState::Entered);
                Ok(value)
            }
            Err(AbideError::Interrupted(interrupt)) => {
                self.arrange_exit();
                self.transition(ScopeState::CancelledDuringEnter);
                Err(AbideError::Interrupted(interrupt))
            }
            Ok(Err(err)) | Err(err) => {
                self.transition(ScopeState::EnterFailed);
                Err(err)
            }
        }
    }

    /// Runs the manager's `exit` on the blocking thread that entered it.
    pub async fn exit(&mut self, cause: Option<BoxError>) -> Result<(), AbideError> {
        if self.state != ScopeState::Entered {
            return Err(AbideError::InvalidState {
                op: "exit",
                state: self.state,
            });
        }

        self.transition(ScopeState::Exiting);
        *self.shared.exit_args.lock() = cause;

        let shared = self.shared.clone();
        let exited = shared.exit_cell.wait(Some(&shared.exit_signal)).await;

        self.transition(ScopeState::Exited);

        match exited {
            Ok(outcome) => outcome,
            Err(err) => {
                // The exit signal is raised by then; the job finishes alone.
                shared.exit_cell.observe(log_late_exit);
                Err(err)
            }
        }
    }

    /// Makes the blocking job exit cleanly without anyone waiting for it.
    fn arrange_exit(&self) {
        *self.shared.exit_args.lock() = None;
        self.shared.exit_cell.observe(log_late_exit);
        self.shared.exit_signal.set();
        // Lets a job that never saw the entry signal start, so that it enters
        // and exits like any other.
        self.shared.entry_signal.set();

        tracing::warn!(state = ?self.state, "scope abandoned before exit; exiting on its own");
    }

    fn transition(&mut self, state: ScopeState) {
        tracing::debug!(from = ?self.state, to = ?state, "scope transition");
        self.state = state;
    }
}

impl<M: BlockingScope> Drop for ThreadScope<M> {
    fn drop(&mut self) {
        if matches!(self.state, ScopeState::Entering | ScopeState::Entered) {
            self.arrange_exit();
        }
    }
}

impl<M: BlockingScope> CooperativeScope for ThreadScope<M> {
    type Output = M::Output;
    type Error = AbideError;

    fn enter(&mut self) -> impl Future<Output = Result<M::Output, AbideError>> + Send {
        ThreadScope::enter(self)
    }

    fn exit(
        &mut self,
        cause: Option<BoxError>,
    ) -> impl Future<Output = Result<(), AbideError>> + Send {
        ThreadScope::exit(self, cause)
    }
}

fn log_late_exit(outcome: Result<(), AbideError>) {
    tracing::debug!(?outcome, "abandoned scope exited");
}

/// Body of the blocking job behind a [`ThreadScope`].
fn run_scope<M: BlockingScope>(mut manager: M, shared: Arc<Shared<M>>) {
    // Raised by the entering task, or by `arrange_exit` if it went away
    // first. Enter runs either way, and exit follows a successful enter.
    shared.entry_signal.wait();

    let entered = match catch_unwind(AssertUnwindSafe(|| manager.enter())) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(AbideError::Operation(Box::new(err))),
        Err(payload) => Err(AbideError::from_panic(payload)),
    };

    let failed = entered.is_err();

    if let Err(err) = shared.entry_cell.resolve(entered) {
        tracing::error!(%err, "scope entry reported twice");
    }

    if failed {
        return;
    }

    shared.exit_signal.wait();
    let cause = shared.exit_args.lock().take();

    let exited = match catch_unwind(AssertUnwindSafe(|| manager.exit(cause))) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(err)) => Err(AbideError::Operation(Box::new(err))),
        Err(payload) => Err(AbideError::from_panic(payload)),
    };

    if let Err(err) = shared.exit_cell.resolve(exited) {
        tracing::error!(%err, "scope exit reported twice");
    }
}
