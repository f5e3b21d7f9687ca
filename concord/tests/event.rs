mod common;

use common::settle;
use concord::error::SyncError;
use concord::sync::Event;
use concord::task::{self, Interrupt};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

#[concord::test]
async fn wait_after_set_returns_immediately() {
    let event = Event::new();
    assert!(!event.is_set());

    event.set();
    assert!(event.is_set());
    assert_eq!(event.wait().await, Ok(()));
    assert_eq!(event.waiters(), 0);
}

#[concord::test(worker_threads = 1)]
async fn set_wakes_every_waiter() {
    common::init_tracing();

    let event = Arc::new(Event::new());
    let woken = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..5)
        .map(|_| {
            let event = event.clone();
            let woken = woken.clone();
            task::spawn(async move {
                event.wait().await.unwrap();
                woken.fetch_add(1, Ordering::SeqCst);
            })
        })
        .collect();

    settle().await;
    assert_eq!(event.waiters(), 5);
    assert_eq!(woken.load(Ordering::SeqCst), 0);

    event.set();
    assert_eq!(event.waiters(), 0);

    for handle in handles {
        handle.await;
    }
    assert_eq!(woken.load(Ordering::SeqCst), 5);
}

#[concord::test(worker_threads = 1)]
async fn clear_only_affects_later_waits() {
    let event = Arc::new(Event::new());

    let early = task::spawn({
        let event = event.clone();
        async move { event.wait().await }
    });
    settle().await;

    event.set();
    event.clear();
    assert!(!event.is_set());

    assert_eq!(early.await, Ok(()));

    let late = task::spawn({
        let event = event.clone();
        async move { event.wait().await }
    });
    settle().await;
    assert!(!late.is_finished());
    assert_eq!(event.waiters(), 1);

    event.set();
    assert_eq!(late.await, Ok(()));
}

#[concord::test(worker_threads = 1)]
async fn cancelled_waiter_leaves_the_queue() {
    let event = Arc::new(Event::new());

    let handle = task::spawn({
        let event = event.clone();
        async move { event.wait().await }
    });
    settle().await;
    assert_eq!(event.waiters(), 1);

    handle.cancel();
    assert_eq!(
        handle.await,
        Err(SyncError::Interrupted(Interrupt::Cancelled))
    );
    assert_eq!(event.waiters(), 0);
}

#[concord::test(worker_threads = 1)]
async fn resume_wins_over_simultaneous_cancel() {
    let event = Arc::new(Event::new());

    let handle = task::spawn({
        let event = event.clone();
        async move {
            let outcome = event.wait().await;
            (outcome, task::is_interrupt_pending())
        }
    });
    settle().await;

    event.set();
    handle.cancel();

    let (outcome, still_pending) = handle.await;
    assert_eq!(outcome, Ok(()));
    assert!(still_pending, "the cancellation is kept for the next suspension");
}

#[concord::test]
async fn debug_shows_state() {
    let event = Event::new();
    event.set();

    assert_eq!(format!("{event:?}"), "Event { set: true, waiters: 0 }");
}
