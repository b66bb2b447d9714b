use tokio::time::{interval, Duration};

use crate::limiter::login_attempts::LoginAttemptTracker;

const PURGE_EVERY: Duration = Duration::from_secs(10 * 60);
/// Counters untouched for this long are forgotten.
const IDLE_AFTER: Duration = Duration::from_secs(60 * 60);

pub async fn start_lockout_purge_task(attempts: LoginAttemptTracker) {
    let mut interval = interval(PURGE_EVERY);

    loop {
        interval.tick().await;

        let purged = attempts.purge_stale(IDLE_AFTER);
        if purged > 0 {
            tracing::info!(purged, remaining = attempts.tracked(), "Purged stale login counters");
        }
    }
}
