//! Fixed-window rate limiting.
//!
//! Admission control for the interactive auth endpoints and the webhook
//! router. Counting is fixed-window: the counter for a key resets at fixed
//! boundaries rather than sliding. The clock and the counter store are
//! injected so tests run against a deterministic clock and deployments can
//! swap in a shared store without touching call sites.
//!
//! The in-memory store is a known single-process scaling limit: a
//! multi-process deployment must replace it with an external
//! atomic-increment-capable store via the [`RateLimitStore`] seam.
//!
//! # Example
//!
//! ```rust
//! use biolink_gateway::limiter::{RateLimiter, RateLimitPolicy};
//!
//! let limiter = RateLimiter::new(RateLimitPolicy::new(5, 60_000));
//! assert!(limiter.is_allowed("203.0.113.7"));
//! assert_eq!(limiter.remaining_attempts("203.0.113.7"), 4);
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Policy knobs for one limiter instance.
///
/// The gateway instantiates distinct limiters for different concerns: a
/// strict one for auth attempts, higher per-topic limits for webhooks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RateLimitPolicy {
    /// Maximum allowed requests per window.
    pub max_attempts: u32,
    /// Window length in milliseconds.
    pub window_ms: u64,
}

impl RateLimitPolicy {
    /// Creates a new policy.
    #[must_use]
    pub const fn new(max_attempts: u32, window_ms: u64) -> Self {
        Self {
            max_attempts,
            window_ms,
        }
    }
}

/// A time source for the limiter.
///
/// Injected so tests can advance time deterministically instead of sleeping
/// against real timers.
pub trait Clock: Send + Sync {
    /// Current time as milliseconds since the Unix epoch.
    fn now_ms(&self) -> u64;
}

/// The production clock, backed by [`SystemTime`].
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }
}

/// Counter storage for the limiter.
///
/// All operations take the current time so an entry whose window has closed
/// is treated as absent.
pub trait RateLimitStore: Send + Sync {
    /// Atomically applies the fixed-window admission rule for `key`.
    ///
    /// On first observation, or when `now_ms` has passed the stored reset
    /// time, the entry restarts with count 1 and a fresh window and the
    /// request is allowed. Otherwise the request is allowed (and counted)
    /// only while the count is below `policy.max_attempts`; a denied
    /// request does not increment.
    fn check_and_increment(&self, key: &str, now_ms: u64, policy: RateLimitPolicy) -> bool;

    /// Returns the count recorded within the key's current window (0 if the
    /// entry is absent or its window has closed).
    fn attempts(&self, key: &str, now_ms: u64) -> u32;

    /// Returns the end of the key's current window, if one is open.
    fn reset_at(&self, key: &str, now_ms: u64) -> Option<u64>;

    /// Removes entries whose window closed before `now_ms - retain_ms`.
    fn sweep(&self, now_ms: u64, retain_ms: u64);
}

#[derive(Clone, Copy, Debug)]
struct WindowEntry {
    count: u32,
    reset_at_ms: u64,
}

/// The default in-memory store: a mutex-guarded map of window entries.
///
/// The check-and-increment runs under a single lock acquisition with no
/// await points, so it is atomic with respect to concurrent requests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, WindowEntry>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, WindowEntry>> {
        // Admission control must never panic; a poisoned map is still usable
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl RateLimitStore for MemoryStore {
    fn check_and_increment(&self, key: &str, now_ms: u64, policy: RateLimitPolicy) -> bool {
        let mut entries = self.lock();
        match entries.get_mut(key) {
            Some(entry) if now_ms < entry.reset_at_ms => {
                if entry.count >= policy.max_attempts {
                    false
                } else {
                    entry.count += 1;
                    true
                }
            }
            _ => {
                entries.insert(
                    key.to_string(),
                    WindowEntry {
                        count: 1,
                        reset_at_ms: now_ms + policy.window_ms,
                    },
                );
                true
            }
        }
    }

    fn attempts(&self, key: &str, now_ms: u64) -> u32 {
        self.lock()
            .get(key)
            .filter(|entry| now_ms < entry.reset_at_ms)
            .map_or(0, |entry| entry.count)
    }

    fn reset_at(&self, key: &str, now_ms: u64) -> Option<u64> {
        self.lock()
            .get(key)
            .filter(|entry| now_ms < entry.reset_at_ms)
            .map(|entry| entry.reset_at_ms)
    }

    fn sweep(&self, now_ms: u64, retain_ms: u64) {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, entry| entry.reset_at_ms.saturating_add(retain_ms) > now_ms);
        let removed = before - entries.len();
        if removed > 0 {
            tracing::debug!(removed, remaining = entries.len(), "rate limit sweep");
        }
    }
}

/// A fixed-window rate limiter over an injected clock and store.
///
/// All methods are pure admission control: they never panic and never block
/// beyond the store's internal lock.
pub struct RateLimiter {
    policy: RateLimitPolicy,
    clock: Arc<dyn Clock>,
    store: Box<dyn RateLimitStore>,
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

// Verify RateLimiter is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<RateLimiter>();
};

impl RateLimiter {
    /// Creates a limiter with the system clock and an in-memory store.
    #[must_use]
    pub fn new(policy: RateLimitPolicy) -> Self {
        Self::with_parts(policy, Arc::new(SystemClock), Box::new(MemoryStore::new()))
    }

    /// Creates a limiter with an explicit clock and store.
    #[must_use]
    pub fn with_parts(
        policy: RateLimitPolicy,
        clock: Arc<dyn Clock>,
        store: Box<dyn RateLimitStore>,
    ) -> Self {
        Self {
            policy,
            clock,
            store,
        }
    }

    /// Returns this limiter's policy.
    #[must_use]
    pub const fn policy(&self) -> RateLimitPolicy {
        self.policy
    }

    /// Applies the admission rule for `identifier` and records the attempt.
    ///
    /// Returns `true` if the request is allowed. A denied request is not
    /// counted against the window.
    #[must_use]
    pub fn is_allowed(&self, identifier: &str) -> bool {
        self.store
            .check_and_increment(identifier, self.clock.now_ms(), self.policy)
    }

    /// Returns how many further attempts the current window admits.
    ///
    /// A key with no open window has the full budget available.
    #[must_use]
    pub fn remaining_attempts(&self, identifier: &str) -> u32 {
        let used = self.store.attempts(identifier, self.clock.now_ms());
        self.policy.max_attempts.saturating_sub(used)
    }

    /// Returns the time until the key's current window resets.
    ///
    /// Zero if the key has no open window.
    #[must_use]
    pub fn time_until_reset(&self, identifier: &str) -> Duration {
        let now = self.clock.now_ms();
        self.store
            .reset_at(identifier, now)
            .map_or(Duration::ZERO, |reset_at| {
                Duration::from_millis(reset_at.saturating_sub(now))
            })
    }

    /// Removes entries whose window closed more than one window-length ago.
    ///
    /// Call periodically to bound memory growth.
    pub fn sweep(&self) {
        self.store
            .sweep(self.clock.now_ms(), self.policy.window_ms);
    }
}
