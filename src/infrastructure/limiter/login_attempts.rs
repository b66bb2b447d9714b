use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use dashmap::DashMap;
use parking_lot::Mutex;

pub const DEFAULT_MAX_FAILURES: u32 = 5;
pub const DEFAULT_LOCK_DURATION: Duration = Duration::from_secs(5 * 60);
pub const DEFAULT_MAX_TRACKED: usize = 10_000;

/// Bucket for attempts against usernames that do not exist, so made-up names
/// share one counter per client IP.
pub const UNKNOWN_USER: &str = "*";

/// Retry hint when the remaining attempts are all reserved by requests in flight.
const IN_FLIGHT_RETRY_SECS: u64 = 1;

#[derive(Debug)]
struct AttemptState {
    failures: u32,
    in_flight: u32,
    locked_until: Option<Instant>,
    last_seen: Instant,
}

impl AttemptState {
    fn new(now: Instant) -> Self {
        AttemptState {
            failures: 0,
            in_flight: 0,
            locked_until: None,
            last_seen: now,
        }
    }

    /// Seconds left on an active lock, rounded up.
    fn remaining_lock(&self, now: Instant) -> Option<u64> {
        let until = self.locked_until?;
        if until > now {
            let left = until.duration_since(now);
            Some(left.as_secs() + u64::from(left.subsec_nanos() > 0))
        } else {
            None
        }
    }

    fn is_idle(&self, now: Instant, idle: Duration) -> bool {
        self.in_flight == 0
            && self.remaining_lock(now).is_none()
            && now.duration_since(self.last_seen) > idle
    }
}

/// Counts consecutive failed logins per (username, client IP) pair and locks the
/// pair once the limit is reached.
///
/// Every attempt takes an [`AttemptPermit`] before the password is checked. The
/// permit counts against the limit until it is settled, so concurrent guesses
/// cannot get past the lock.
#[derive(Clone)]
pub struct LoginAttemptTracker {
    map: Arc<DashMap<String, Arc<Mutex<AttemptState>>>>,
    max_failures: u32,
    lock_duration: Duration,
    max_tracked: usize,
}

impl Default for LoginAttemptTracker {
    fn default() -> Self {
        LoginAttemptTracker::new(DEFAULT_MAX_FAILURES, DEFAULT_LOCK_DURATION)
    }
}

impl LoginAttemptTracker {
    pub fn new(max_failures: u32, lock_duration: Duration) -> Self {
        LoginAttemptTracker {
            map: Arc::new(DashMap::new()),
            max_failures: max_failures.max(1),
            lock_duration,
            max_tracked: DEFAULT_MAX_TRACKED,
        }
    }

    pub fn with_max_tracked(mut self, max_tracked: usize) -> Self {
        self.max_tracked = max_tracked.max(1);
        self
    }

    fn key(username: &str, ip: &str) -> String {
        format!("{}|{}", username.trim().to_lowercase(), ip)
    }

    /// Reserves one attempt for the pair. `Err(seconds)` while the pair is locked,
    /// or while the remaining attempts are held by requests still in flight.
    pub fn begin(&self, username: &str, ip: &str) -> Result<AttemptPermit, u64> {
        let key = Self::key(username, ip);
        if !self.map.contains_key(&key) && self.map.len() >= self.max_tracked {
            self.make_room();
        }

        let now = Instant::now();
        // The shard stays write-locked until the reservation is recorded, so a
        // concurrent purge cannot detach the state from the map.
        let entry = self
            .map
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(AttemptState::new(now))));
        let state = entry.value().clone();
        {
            let mut guard = state.lock();
            guard.last_seen = now;
            if let Some(seconds) = guard.remaining_lock(now) {
                return Err(seconds);
            }
            if guard.locked_until.take().is_some() {
                guard.failures = 0;
            }
            if guard.failures + guard.in_flight >= self.max_failures {
                return Err(IN_FLIGHT_RETRY_SECS);
            }
            guard.in_flight += 1;
        }
        drop(entry);

        Ok(AttemptPermit {
            key,
            state,
            max_failures: self.max_failures,
            lock_duration: self.lock_duration,
            settled: false,
        })
    }

    /// Drops idle entries first, then the oldest unlocked ones, until a new key fits.
    fn make_room(&self) {
        let now = Instant::now();
        self.map.retain(|_, state| !state.lock().is_idle(now, Duration::ZERO));
        if self.map.len() < self.max_tracked {
            return;
        }

        let oldest = self
            .map
            .iter()
            .filter_map(|entry| {
                let state = entry.value().lock();
                (state.in_flight == 0 && state.remaining_lock(now).is_none())
                    .then(|| (state.last_seen, entry.key().clone()))
            })
            .min();
        if let Some((_, key)) = oldest {
            self.map.remove(&key);
        } else {
            tracing::warn!(tracked = self.map.len(), "Login tracker full of locked entries");
        }
    }

    /// Drops entries that are unlocked, have nothing in flight and have been
    /// idle for longer than `idle`.
    pub fn purge_stale(&self, idle: Duration) -> usize {
        let now = Instant::now();
        let before = self.map.len();
        self.map.retain(|_, state| !state.lock().is_idle(now, idle));
        before.saturating_sub(self.map.len())
    }

    pub fn tracked(&self) -> usize {
        self.map.len()
    }
}

/// A reserved login attempt. Settle it with [`fail`](Self::fail) or
/// [`succeed`](Self::succeed); dropping it unsettled releases the reservation
/// without counting a failure.
#[derive(Debug)]
pub struct AttemptPermit {
    key: String,
    state: Arc<Mutex<AttemptState>>,
    max_failures: u32,
    lock_duration: Duration,
    settled: bool,
}

impl AttemptPermit {
    /// Counts the failure. Returns the lock length in seconds if it locked the pair.
    pub fn fail(mut self) -> Option<u64> {
        self.settled = true;
        let now = Instant::now();
        let mut state = self.state.lock();
        state.in_flight = state.in_flight.saturating_sub(1);
        state.last_seen = now;

        if let Some(seconds) = state.remaining_lock(now) {
            return Some(seconds);
        }

        state.failures += 1;
        if state.failures < self.max_failures {
            return None;
        }
        state.locked_until = Some(now + self.lock_duration);
        state.failures = 0;
        tracing::warn!(
            key = %self.key,
            lock_secs = self.lock_duration.as_secs(),
            "Login locked after repeated failures"
        );
        state.remaining_lock(now)
    }

    pub fn succeed(mut self) {
        self.settled = true;
        let mut state = self.state.lock();
        state.in_flight = state.in_flight.saturating_sub(1);
        state.failures = 0;
        state.last_seen = Instant::now();
    }
}

impl Drop for AttemptPermit {
    fn drop(&mut self) {
        if !self.settled {
            let mut state = self.state.lock();
            state.in_flight = state.in_flight.saturating_sub(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fail(tracker: &LoginAttemptTracker, username: &str, ip: &str) -> Option<u64> {
        tracker.begin(username, ip).unwrap().fail()
    }

    #[test]
    fn locks_after_max_failures_and_reports_retry_after() {
        let tracker = LoginAttemptTracker::new(3, Duration::from_secs(60));
        assert_eq!(fail(&tracker, "admin", "1.1.1.1"), None);
        assert_eq!(fail(&tracker, "admin", "1.1.1.1"), None);

        let locked = fail(&tracker, "Admin", "1.1.1.1");
        assert_eq!(locked, Some(60));

        let retry = tracker.begin("admin", "1.1.1.1").unwrap_err();
        assert!(retry > 0 && retry <= 60);
    }

    #[test]
    fn in_flight_attempts_count_against_the_limit() {
        let tracker = LoginAttemptTracker::new(3, Duration::from_secs(60));
        let held: Vec<_> = (0..3).map(|_| tracker.begin("admin", "ip").unwrap()).collect();

        assert_eq!(tracker.begin("admin", "ip").unwrap_err(), IN_FLIGHT_RETRY_SECS);

        let outcomes: Vec<_> = held.into_iter().map(AttemptPermit::fail).collect();
        assert_eq!(outcomes.iter().filter(|o| o.is_some()).count(), 1);
        assert!(tracker.begin("admin", "ip").unwrap_err() > IN_FLIGHT_RETRY_SECS);
    }

    #[test]
    fn concurrent_guesses_never_exceed_the_limit() {
        let tracker = LoginAttemptTracker::new(5, Duration::from_secs(60));
        let barrier = Arc::new(std::sync::Barrier::new(16));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let tracker = tracker.clone();
                let barrier = barrier.clone();
                std::thread::spawn(move || {
                    barrier.wait();
                    let permit = tracker.begin("admin", "ip").ok()?;
                    std::thread::sleep(Duration::from_millis(20));
                    permit.fail();
                    Some(())
                })
            })
            .collect();

        let evaluated = handles
            .into_iter()
            .filter_map(|h| h.join().unwrap())
            .count();
        assert!(evaluated <= 5, "{evaluated} guesses were evaluated");
    }

    #[test]
    fn dropped_permit_releases_without_counting() {
        let tracker = LoginAttemptTracker::new(1, Duration::from_secs(60));
        drop(tracker.begin("admin", "ip").unwrap());

        assert_eq!(fail(&tracker, "admin", "ip"), Some(60));
    }

    #[test]
    fn lock_is_scoped_to_username_and_ip() {
        let tracker = LoginAttemptTracker::new(1, Duration::from_secs(60));
        fail(&tracker, "admin", "1.1.1.1");

        assert!(tracker.begin("admin", "1.1.1.1").is_err());
        assert!(tracker.begin("admin", "2.2.2.2").is_ok());
        assert!(tracker.begin("other", "1.1.1.1").is_ok());
    }

    #[test]
    fn success_resets_the_counter() {
        let tracker = LoginAttemptTracker::new(2, Duration::from_secs(60));
        fail(&tracker, "admin", "ip");
        tracker.begin("admin", "ip").unwrap().succeed();

        assert_eq!(fail(&tracker, "admin", "ip"), None);
        assert!(tracker.begin("admin", "ip").is_ok());
    }

    #[test]
    fn expired_lock_allows_new_attempts() {
        let tracker = LoginAttemptTracker::new(1, Duration::from_millis(20));
        fail(&tracker, "admin", "ip");
        assert!(tracker.begin("admin", "ip").is_err());

        std::thread::sleep(Duration::from_millis(40));
        assert!(tracker.begin("admin", "ip").is_ok());
    }

    #[test]
    fn purge_keeps_locked_entries() {
        let tracker = LoginAttemptTracker::new(1, Duration::from_secs(60));
        fail(&tracker, "locked", "ip");
        let idle = LoginAttemptTracker::new(5, Duration::from_secs(60));
        fail(&idle, "idle", "ip");

        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(tracker.purge_stale(Duration::ZERO), 0);
        assert_eq!(idle.purge_stale(Duration::ZERO), 1);
        assert_eq!(idle.tracked(), 0);
    }

    #[test]
    fn tracked_entries_are_capped_but_locks_survive() {
        let tracker = LoginAttemptTracker::new(1, Duration::from_secs(60)).with_max_tracked(3);
        fail(&tracker, "admin", "ip");

        for i in 0..10 {
            drop(tracker.begin(&format!("user{i}"), "ip"));
        }

        assert!(tracker.tracked() <= 3);
        assert!(tracker.begin("admin", "ip").is_err());
    }
}
