#![allow(dead_code)]

use std::sync::Once;
use std::time::{Duration, Instant};

use concord::time::sleep;
use tracing_subscriber::EnvFilter;

/// Installs a test subscriber honouring `RUST_LOG`, once per test binary.
pub fn init_tracing() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Lets every runnable task on a single-worker runtime run until it
/// suspends.
pub async fn settle() {
    for _ in 0..16 {
        concord::yield_now().await;
    }
}

/// Polls `condition` until it holds, failing the test after two seconds.
pub async fn eventually(what: &str, mut condition: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(2);

    while !condition() {
        assert!(Instant::now() < deadline, "timed out waiting for {what}");
        sleep(Duration::from_millis(5)).await;
    }
}
