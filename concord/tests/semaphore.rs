mod common;

use common::settle;
use concord::error::SyncError;
use concord::sync::{BoundedSemaphore, Event, Semaphore};
use concord::task;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

#[concord::test]
async fn balanced_acquire_release_restores_permits() {
    let sem = Semaphore::new(3);

    for _ in 0..3 {
        sem.acquire().await.unwrap();
    }
    assert!(sem.locked());
    assert_eq!(sem.value(), 0);

    for _ in 0..3 {
        sem.release().unwrap();
    }
    assert_eq!(sem.value(), 3);
    assert!(!sem.locked());
}

#[concord::test]
async fn default_semaphore_has_one_permit() {
    let sem = Semaphore::default();
    assert_eq!(sem.value(), 1);

    let permit = sem.permit().await.unwrap();
    assert!(sem.locked());
    drop(permit);

    assert_eq!(sem.value(), 1);
}

#[concord::test(worker_threads = 1)]
async fn release_hands_the_permit_to_the_third_acquirer() {
    common::init_tracing();

    let sem = Arc::new(Semaphore::new(2));
    let acquired = Arc::new(AtomicUsize::new(0));
    let done = Arc::new(Event::new());

    let handles: Vec<_> = (0..3)
        .map(|_| {
            let sem = sem.clone();
            let acquired = acquired.clone();
            let done = done.clone();
            task::spawn(async move {
                sem.acquire().await.unwrap();
                acquired.fetch_add(1, Ordering::SeqCst);
                done.wait().await.unwrap();
            })
        })
        .collect();

    settle().await;
    assert_eq!(acquired.load(Ordering::SeqCst), 2);
    assert_eq!(sem.waiters(), 1);
    assert_eq!(sem.value(), 0);

    sem.release().unwrap();
    assert_eq!(sem.value(), 0, "the permit goes to the waiter, not the pool");

    settle().await;
    assert_eq!(acquired.load(Ordering::SeqCst), 3);
    assert_eq!(sem.waiters(), 0);

    done.set();
    for handle in handles {
        handle.await;
    }
}

#[concord::test]
async fn bounded_semaphore_rejects_extra_release() {
    let sem = BoundedSemaphore::new(2);

    let err = sem.release().unwrap_err();
    assert_eq!(err, SyncError::BoundExceeded);
    assert!(err.is_bound_violation());
    assert!(!err.is_contract_violation());
    assert_eq!(sem.value(), 2);

    sem.acquire().await.unwrap();
    sem.release().unwrap();
    assert_eq!(sem.release(), Err(SyncError::BoundExceeded));
    assert_eq!(sem.value(), sem.bound());
}

#[concord::test]
async fn zero_bounded_semaphore_always_rejects_release() {
    let sem = BoundedSemaphore::new(0);

    assert!(sem.locked());
    assert_eq!(sem.release(), Err(SyncError::BoundExceeded));
    assert_eq!(sem.value(), 0);
}

#[concord::test]
async fn bounded_permit_returns_within_bound() {
    let sem = BoundedSemaphore::new(1);

    {
        let _permit = sem.permit().await.unwrap();
        assert_eq!(sem.value(), 0);
    }

    assert_eq!(sem.value(), 1);
}

#[concord::test(worker_threads = 1)]
async fn cancelled_acquire_keeps_the_count() {
    let sem = Arc::new(Semaphore::new(0));

    let handle = task::spawn({
        let sem = sem.clone();
        async move { sem.acquire().await }
    });
    settle().await;

    handle.cancel();
    assert!(handle.await.is_err());
    assert_eq!(sem.waiters(), 0);

    sem.release().unwrap();
    assert_eq!(sem.value(), 1);
}

#[concord::test]
async fn concurrency_never_exceeds_permits() {
    let sem = Arc::new(Semaphore::new(3));
    let inside = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..30)
        .map(|_| {
            let sem = sem.clone();
            let inside = inside.clone();
            let peak = peak.clone();
            task::spawn(async move {
                let _permit = sem.permit().await.unwrap();
                let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                concord::yield_now().await;
                inside.fetch_sub(1, Ordering::SeqCst);
            })
        })
        .collect();

    for handle in handles {
        handle.await;
    }

    assert!(peak.load(Ordering::SeqCst) <= 3);
    assert_eq!(sem.value(), 3);
}
