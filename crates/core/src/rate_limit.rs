//! In-process token-bucket rate limiter.
//!
//! Bounds write frequency per `(user, route)` key. Buckets are created lazily
//! at full capacity and are never expired -- acceptable for a single-process
//! deployment. A horizontally-scaled deployment should swap the map for a
//! shared counter store behind the same `allow` contract.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::types::DbId;

/// A single key's bucket: remaining tokens plus the refill reference point.
struct TokenBucket {
    tokens: u32,
    last_refill_ms: u64,
}

/// Keyed token-bucket rate limiter.
///
/// Thread-safe via an interior `Mutex`; designed to be wrapped in `Arc` and
/// shared across all request handlers in the process.
#[derive(Default)]
pub struct RateLimiter {
    buckets: Mutex<HashMap<String, TokenBucket>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self {
            buckets: Mutex::new(HashMap::new()),
        }
    }

    /// Consume one token for `key`, refilling elapsed whole windows first.
    ///
    /// Returns `true` if the call is allowed, `false` if the bucket is empty.
    /// Never errors: this is a pure in-memory decision.
    pub fn allow(&self, key: &str, capacity: u32, window_ms: u64) -> bool {
        self.allow_at(key, capacity, window_ms, now_ms())
    }

    /// [`allow`](Self::allow) with an explicit clock, so tests can drive
    /// window boundaries without sleeping.
    pub fn allow_at(&self, key: &str, capacity: u32, window_ms: u64, now_ms: u64) -> bool {
        // A poisoned lock means another request panicked mid-update; the
        // bucket mutation below is single-step, so the data is still sound.
        let mut buckets = match self.buckets.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let bucket = buckets.entry(key.to_string()).or_insert(TokenBucket {
            tokens: capacity,
            last_refill_ms: now_ms,
        });

        // Refill one token per fully elapsed window, capped at capacity.
        // The reference point advances by whole windows rather than resetting
        // to `now`, so partial windows are not silently discarded.
        let elapsed = now_ms.saturating_sub(bucket.last_refill_ms);
        if elapsed > window_ms {
            let windows = elapsed / window_ms;
            let refill = u32::try_from(windows).unwrap_or(u32::MAX);
            bucket.tokens = bucket.tokens.saturating_add(refill).min(capacity);
            bucket.last_refill_ms += windows * window_ms;
        }

        if bucket.tokens == 0 {
            return false;
        }
        bucket.tokens -= 1;
        true
    }
}

/// Build the bucket key for a user and logical route name.
///
/// Distinct routes and users never share a bucket.
pub fn rate_limit_key(user_id: DbId, route: &str) -> String {
    format!("{user_id}:{route}")
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
