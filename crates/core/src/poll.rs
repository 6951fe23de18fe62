//! Bounded polling on the tokio timer.

use std::time::Duration;

use tokio::time::{Instant, sleep};

/// Re-evaluates `predicate` every `interval` until it holds or `timeout` elapses.
///
/// The first check happens after one interval. Returns `true` on the first
/// successful check and `false` on timeout. Dropping the future cancels the
/// wait.
pub async fn poll_until<F>(mut predicate: F, interval: Duration, timeout: Duration) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = Instant::now() + timeout;

    loop {
        let now = Instant::now();
        if now >= deadline {
            return false;
        }

        sleep(interval.min(deadline - now)).await;

        if predicate() {
            return true;
        }
    }
}
