//! Integration tests for the fixed-window rate limiter, driven through the
//! public clock/store seams.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use biolink_gateway::limiter::{Clock, MemoryStore, RateLimitPolicy, RateLimiter};

#[derive(Debug, Default)]
struct ManualClock {
    now_ms: AtomicU64,
}

impl ManualClock {
    fn advance(&self, ms: u64) {
        self.now_ms.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now_ms.load(Ordering::SeqCst)
    }
}

fn limiter(policy: RateLimitPolicy) -> (RateLimiter, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::default());
    let limiter = RateLimiter::with_parts(policy, clock.clone(), Box::new(MemoryStore::new()));
    (limiter, clock)
}

#[test]
fn five_per_minute_sequence() {
    let (limiter, clock) = limiter(RateLimitPolicy::new(5, 60_000));

    // Six calls within the window: five allowed, the sixth denied
    let within_window: Vec<bool> = (0..6).map(|_| limiter.is_allowed("x")).collect();
    assert_eq!(
        within_window,
        vec![true, true, true, true, true, false]
    );

    // A seventh call after the window elapses is allowed again
    clock.advance(60_000);
    assert!(limiter.is_allowed("x"));
}

#[test]
fn remaining_attempts_and_reset_track_the_window() {
    let (limiter, clock) = limiter(RateLimitPolicy::new(5, 60_000));

    assert_eq!(limiter.remaining_attempts("ip-1"), 5);
    assert_eq!(limiter.time_until_reset("ip-1"), Duration::ZERO);

    assert!(limiter.is_allowed("ip-1"));
    assert!(limiter.is_allowed("ip-1"));
    assert_eq!(limiter.remaining_attempts("ip-1"), 3);

    clock.advance(45_000);
    assert_eq!(
        limiter.time_until_reset("ip-1"),
        Duration::from_millis(15_000)
    );

    clock.advance(15_000);
    assert_eq!(limiter.remaining_attempts("ip-1"), 5);
}

#[test]
fn distinct_limiter_instances_do_not_interfere() {
    // The gateway runs a strict limiter for auth and relaxed ones per topic
    let (auth_limiter, _clock_a) = limiter(RateLimitPolicy::new(5, 60_000));
    let (hook_limiter, _clock_b) = limiter(RateLimitPolicy::new(120, 60_000));

    for _ in 0..5 {
        assert!(auth_limiter.is_allowed("203.0.113.7"));
    }
    assert!(!auth_limiter.is_allowed("203.0.113.7"));

    // Same identifier under the webhook limiter still has budget
    assert!(hook_limiter.is_allowed("203.0.113.7"));
}

#[test]
fn sweep_bounds_the_store_without_changing_admission() {
    let (limiter, clock) = limiter(RateLimitPolicy::new(2, 1_000));

    for key in ["a", "b", "c"] {
        assert!(limiter.is_allowed(key));
    }

    // Entries whose window closed more than one window-length ago drop out
    clock.advance(5_000);
    limiter.sweep();

    for key in ["a", "b", "c"] {
        assert_eq!(limiter.remaining_attempts(key), 2);
        assert!(limiter.is_allowed(key));
    }
}
