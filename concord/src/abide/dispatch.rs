use super::adapter::{RunInThread, run_in_thread};
use super::scope::{BlockingScope, CooperativeScope, ThreadScope};

/// An operation [`abide`] knows how to run.
///
/// Implemented by the four wrappers below, one per execution path. What
/// the caller gets back depends on the wrapper:
///
/// | wrapper | operation | returns |
/// |---|---|---|
/// | [`Coroutine`] | `FnOnce() -> impl Future` | the future, as is |
/// | [`Scoped`] | a [`CooperativeScope`] | the scope, as is |
/// | [`Blocking`] | a [`BlockingScope`] | a [`ThreadScope`] around it |
/// | [`Call`] | a blocking `FnOnce() -> T` | a [`RunInThread`] future |
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not an operation `abide` can run",
    label = "unrecognized operation",
    note = "wrap it in `Coroutine`, `Scoped`, `Blocking` or `Call` to say how it should run"
)]
pub trait Abide {
    type Output;

    fn abide(self) -> Self::Output;
}

/// An async callable, called right away.
#[derive(Debug, Clone, Copy)]
pub struct Coroutine<F>(pub F);

/// A scope that already cooperates with the scheduler.
#[derive(Debug, Clone, Copy)]
pub struct Scoped<S>(pub S);

/// A scope whose enter and exit block their thread.
#[derive(Debug, Clone, Copy)]
pub struct Blocking<M>(pub M);

/// A blocking callable, run on the blocking pool.
#[derive(Debug, Clone, Copy)]
pub struct Call<F>(pub F);

impl<F, Fut> Abide for Coroutine<F>
where
    F: FnOnce() -> Fut,
    Fut: Future,
{
    type Output = Fut;

    fn abide(self) -> Fut {
        (self.0)()
    }
}

impl<S: CooperativeScope> Abide for Scoped<S> {
    type Output = S;

    fn abide(self) -> S {
        self.0
    }
}

impl<M: BlockingScope> Abide for Blocking<M> {
    type Output = ThreadScope<M>;

    fn abide(self) -> ThreadScope<M> {
        ThreadScope::new(self.0)
    }
}

impl<F, T> Abide for Call<F>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    type Output = RunInThread<F, T>;

    fn abide(self) -> RunInThread<F, T> {
        run_in_thread(self.0)
    }
}

/// Makes the scheduler abide by the execution requirements of `op`.
///
/// Async code runs as is; blocking code is moved to the blocking pool so
/// that it never stalls a worker thread. This lets the same call site
/// work with a task-level primitive or a thread-level one:
///
/// ```rust,ignore
/// // a task-level lock
/// let mut scope = abide(Scoped(&lock));
/// scope.enter().await?;
/// scope.exit(None).await?;
///
/// // a thread-level lock shared with plain threads
/// let mut scope = abide(Blocking(ThreadLock::new(Arc::clone(&thread_lock))));
/// scope.enter().await?;
/// scope.exit(None).await?;
///
/// // a blocking call
/// let n = abide(Call(move || queue.recv())).await?;
/// ```
pub fn abide<O: Abide>(op: O) -> O::Output {
    op.abide()
}
