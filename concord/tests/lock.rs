mod common;

use common::settle;
use concord::error::SyncError;
use concord::sync::{Lock, Mutex};
use concord::task::{self, Interrupt};
use concord::time::timeout;
use std::future::{Future, poll_fn};
use std::pin::{Pin, pin};
use std::sync::Arc;
use std::sync::Mutex as StdMutex;
use std::task::Poll;
use std::time::Duration;

async fn poll_once<F: Future>(mut future: Pin<&mut F>) -> Poll<F::Output> {
    poll_fn(|cx| Poll::Ready(future.as_mut().poll(cx))).await
}

#[concord::test]
async fn acquire_and_release_uncontended() {
    let lock = Lock::new();
    assert!(!lock.locked());

    assert_eq!(lock.acquire().await, Ok(()));
    assert!(lock.locked());

    assert_eq!(lock.release(), Ok(()));
    assert!(!lock.locked());
}

#[concord::test]
async fn releasing_an_unheld_lock_is_a_contract_violation() {
    let lock = Lock::new();

    let err = lock.release().unwrap_err();
    assert_eq!(err, SyncError::NotAcquired);
    assert!(err.is_contract_violation());
}

#[concord::test(worker_threads = 1)]
async fn waiters_are_served_in_fifo_order() {
    common::init_tracing();

    let lock = Arc::new(Lock::new());
    let order = Arc::new(StdMutex::new(Vec::new()));

    lock.acquire().await.unwrap();

    let handles: Vec<_> = (0..4)
        .map(|id| {
            let lock = lock.clone();
            let order = order.clone();
            task::spawn(async move {
                lock.acquire().await.unwrap();
                order.lock().unwrap().push(id);
                concord::yield_now().await;
                lock.release().unwrap();
            })
        })
        .collect();

    settle().await;
    assert_eq!(lock.waiters(), 4);

    lock.release().unwrap();

    for handle in handles {
        handle.await;
    }

    assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 3]);
    assert!(!lock.locked());
}

#[concord::test(worker_threads = 1)]
async fn release_hands_off_without_unlocking() {
    let lock = Arc::new(Lock::new());
    let order = Arc::new(StdMutex::new(Vec::new()));

    lock.acquire().await.unwrap();

    let b = task::spawn({
        let lock = lock.clone();
        let order = order.clone();
        async move {
            lock.acquire().await.unwrap();
            order.lock().unwrap().push("b");
            lock.release().unwrap();
        }
    });
    settle().await;

    lock.release().unwrap();
    assert!(lock.locked(), "the lock goes straight to the waiter");
    assert_eq!(lock.waiters(), 0);

    // Arrives after the hand-off, so it must queue behind `b`.
    let c = task::spawn({
        let lock = lock.clone();
        let order = order.clone();
        async move {
            lock.acquire().await.unwrap();
            order.lock().unwrap().push("c");
            lock.release().unwrap();
        }
    });

    b.await;
    c.await;

    assert_eq!(*order.lock().unwrap(), vec!["b", "c"]);
    assert!(!lock.locked());
}

#[concord::test(worker_threads = 1)]
async fn cancelled_acquire_does_not_take_the_lock() {
    let lock = Arc::new(Lock::new());
    lock.acquire().await.unwrap();

    let handle = task::spawn({
        let lock = lock.clone();
        async move { lock.acquire().await }
    });
    settle().await;
    assert_eq!(lock.waiters(), 1);

    handle.cancel();
    assert_eq!(
        handle.await,
        Err(SyncError::Interrupted(Interrupt::Cancelled))
    );
    assert_eq!(lock.waiters(), 0);

    lock.release().unwrap();
    assert!(!lock.locked());
}

#[concord::test]
async fn dropped_waiter_passes_the_lock_on() {
    let lock = Lock::new();
    lock.acquire().await.unwrap();

    {
        let mut pending = pin!(lock.acquire());
        assert!(poll_once(pending.as_mut()).await.is_pending());
        assert_eq!(lock.waiters(), 1);

        lock.release().unwrap();
        assert!(lock.locked());
    }

    assert!(!lock.locked(), "a hand-off nobody observed must not leak the lock");
    assert_eq!(lock.waiters(), 0);
}

#[concord::test]
async fn timed_out_acquire_leaves_the_queue() {
    let lock = Lock::new();
    lock.acquire().await.unwrap();

    let result = timeout(Duration::from_millis(10), lock.acquire()).await;
    assert!(result.is_err());
    assert_eq!(lock.waiters(), 0);

    lock.release().unwrap();
    assert!(!lock.locked());
}

#[concord::test]
async fn guard_releases_on_drop() {
    let lock = Lock::new();

    {
        let _guard = lock.lock().await.unwrap();
        assert!(lock.locked());
    }

    assert!(!lock.locked());
}

#[concord::test]
async fn mutex_serializes_increments() {
    let counter = Arc::new(Mutex::new(0u32));

    let handles: Vec<_> = (0..50)
        .map(|_| {
            let counter = counter.clone();
            task::spawn(async move {
                let mut guard = counter.lock().await.unwrap();
                let value = *guard;
                concord::yield_now().await;
                *guard = value + 1;
            })
        })
        .collect();

    for handle in handles {
        handle.await;
    }

    assert_eq!(*counter.lock().await.unwrap(), 50);
    assert!(!counter.is_locked());
}

#[concord::test]
async fn mutex_into_inner_and_get_mut() {
    let mut mutex = Mutex::new(vec![1]);
    mutex.get_mut().push(2);

    assert_eq!(mutex.into_inner(), vec![1, 2]);
}
