use crate::runtime::task::Task;

use std::sync::Arc;
use std::task::{Wake, Waker};

impl<T: Send + 'static> Wake for Task<T> {
    fn wake(self: Arc<Self>) {
        Task::wake(self);
    }

    fn wake_by_ref(self: &Arc<Self>) {
        Task::wake(self.clone());
    }
}

/// Creates a [`Waker`] that reschedules `task` when woken.
///
/// The waker holds a strong reference to the task, so a task parked in a
/// wait queue stays alive until it is resumed or its waiter is removed.
pub(crate) fn make_waker<T: Send + 'static>(task: Arc<Task<T>>) -> Waker {
    Waker::from(task)
}
