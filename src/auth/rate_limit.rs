use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

const MAX_ATTEMPTS: usize = 5;
const WINDOW_SECS: u64 = 900; // 15 minutes

/// Storage backend for recorded attempts. The limiter never touches a
/// process-global map directly; a multi-instance deployment can swap in a
/// shared store without changing the callers.
pub trait AttemptStore: Send + Sync {
    /// Drop attempts older than `cutoff` and return how many remain.
    fn prune_and_count(&self, key: IpAddr, cutoff: Instant) -> usize;
    fn record(&self, key: IpAddr, at: Instant);
    fn clear(&self, key: IpAddr);
}

/// In-memory attempt store, suitable for a single server process.
#[derive(Default)]
pub struct MemoryAttemptStore {
    attempts: Mutex<HashMap<IpAddr, Vec<Instant>>>,
}

impl AttemptStore for MemoryAttemptStore {
    fn prune_and_count(&self, key: IpAddr, cutoff: Instant) -> usize {
        let mut map = self.attempts.lock().unwrap_or_else(|e| e.into_inner());
        match map.get_mut(&key) {
            Some(timestamps) => {
                timestamps.retain(|t| *t > cutoff);
                timestamps.len()
            }
            None => 0,
        }
    }

    fn record(&self, key: IpAddr, at: Instant) {
        let mut map = self.attempts.lock().unwrap_or_else(|e| e.into_inner());
        map.entry(key).or_default().push(at);
    }

    fn clear(&self, key: IpAddr) {
        let mut map = self.attempts.lock().unwrap_or_else(|e| e.into_inner());
        map.remove(&key);
    }
}

/// Fixed-window login rate limiter keyed by client IP.
#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn AttemptStore>,
    max_attempts: usize,
    window: Duration,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::with_store(Arc::new(MemoryAttemptStore::default()))
    }

    pub fn with_store(store: Arc<dyn AttemptStore>) -> Self {
        Self {
            store,
            max_attempts: MAX_ATTEMPTS,
            window: Duration::from_secs(WINDOW_SECS),
        }
    }

    /// Check if the given IP is rate-limited. Returns true if blocked.
    /// Also lazily prunes stale entries for the checked IP.
    pub fn is_blocked(&self, ip: IpAddr) -> bool {
        let cutoff = Instant::now() - self.window;
        self.store.prune_and_count(ip, cutoff) >= self.max_attempts
    }

    /// Record a failed login attempt for the given IP.
    pub fn record_failure(&self, ip: IpAddr) {
        self.store.record(ip, Instant::now());
    }

    /// Clear all recorded attempts for the given IP (call on successful login).
    pub fn clear(&self, ip: IpAddr) {
        self.store.clear(ip);
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}
