mod common;

use common::settle;
use concord::error::SyncError;
use concord::sync::{Condition, Lock};
use concord::task::{self, Interrupt};
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex as StdMutex;

#[concord::test]
async fn wait_and_notify_require_the_lock() {
    let cond = Condition::new();

    assert_eq!(cond.wait().await, Err(SyncError::WaitUnacquired));
    assert_eq!(cond.notify(1), Err(SyncError::NotifyUnacquired));
    assert_eq!(cond.notify_all(), Err(SyncError::NotifyUnacquired));
    assert_eq!(cond.release(), Err(SyncError::NotAcquired));
}

#[concord::test(worker_threads = 1)]
async fn wait_reacquires_after_notify() {
    common::init_tracing();

    let cond = Arc::new(Condition::new());

    let waiter = task::spawn({
        let cond = cond.clone();
        async move {
            cond.acquire().await.unwrap();
            let outcome = cond.wait().await;
            let held = cond.locked();
            cond.release().unwrap();
            (outcome, held)
        }
    });
    settle().await;
    assert!(!cond.locked(), "waiting releases the lock");
    assert_eq!(cond.waiters(), 1);

    cond.acquire().await.unwrap();
    cond.notify_one().unwrap();
    assert_eq!(cond.waiters(), 0);
    cond.release().unwrap();

    assert_eq!(waiter.await, (Ok(()), true));
}

#[concord::test(worker_threads = 1)]
async fn notify_wakes_at_most_n_in_order() {
    let cond = Arc::new(Condition::new());
    let order = Arc::new(StdMutex::new(Vec::new()));

    let handles: Vec<_> = (0..3)
        .map(|id| {
            let cond = cond.clone();
            let order = order.clone();
            task::spawn(async move {
                let _guard = cond.lock().await.unwrap();
                cond.wait().await.unwrap();
                order.lock().unwrap().push(id);
            })
        })
        .collect();
    settle().await;
    assert_eq!(cond.waiters(), 3);

    {
        let _guard = cond.lock().await.unwrap();
        cond.notify(2).unwrap();
    }
    settle().await;
    assert_eq!(*order.lock().unwrap(), vec![0, 1]);
    assert_eq!(cond.waiters(), 1);

    {
        let _guard = cond.lock().await.unwrap();
        cond.notify_all().unwrap();
    }

    for handle in handles {
        handle.await;
    }
    assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
}

#[concord::test(worker_threads = 1)]
async fn cancelled_wait_reacquires_before_returning() {
    let cond = Arc::new(Condition::new());

    let waiter = task::spawn({
        let cond = cond.clone();
        async move {
            cond.acquire().await.unwrap();
            let outcome = cond.wait().await;
            let held = cond.locked();
            cond.release().unwrap();
            (outcome, held)
        }
    });
    settle().await;

    // Hold the lock so the cancelled waiter has to queue for it.
    cond.acquire().await.unwrap();
    waiter.cancel();
    settle().await;
    assert!(!waiter.is_finished(), "reacquiring cannot be interrupted");

    cond.release().unwrap();

    let (outcome, held) = waiter.await;
    assert_eq!(outcome, Err(SyncError::Interrupted(Interrupt::Cancelled)));
    assert!(held);
    assert!(!cond.locked());
}

#[concord::test(worker_threads = 1)]
async fn wait_for_returns_first_satisfied_value() {
    let lock = Arc::new(Lock::new());
    let cond = Arc::new(Condition::with_lock(lock.clone()));
    let queue = Arc::new(StdMutex::new(VecDeque::new()));

    let consumer = task::spawn({
        let cond = cond.clone();
        let queue = queue.clone();
        async move {
            let _guard = cond.lock().await.unwrap();
            cond.wait_for(|| queue.lock().unwrap().pop_front())
                .await
                .unwrap()
        }
    });
    settle().await;

    for item in ["first", "second"] {
        let _guard = lock.lock().await.unwrap();
        queue.lock().unwrap().push_back(item);
        cond.notify_one().unwrap();
    }

    assert_eq!(consumer.await, "first");
    assert_eq!(queue.lock().unwrap().len(), 1);
    assert!(Arc::ptr_eq(cond.inner(), &lock));
}
