// Cache freshness policy.
// Decides whether a cached snapshot captured at a timestamp is still usable at "now".

use chrono::{DateTime, Duration, Utc};

/// Maximum age of a cached snapshot, in minutes.
pub const MAX_CACHE_AGE_MINUTES: i64 = 30;

/// Freshness rule for cached exchange rates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    max_age: Duration,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            max_age: Duration::minutes(MAX_CACHE_AGE_MINUTES),
        }
    }
}

impl CachePolicy {
    pub fn with_max_age(max_age: Duration) -> Self {
        Self { max_age }
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    /// Fresh iff `now < timestamp + max_age`. The boundary itself is stale.
    pub fn is_fresh(&self, timestamp: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        match timestamp.checked_add_signed(self.max_age) {
            Some(expires_at) => now < expires_at,
            None => false,
        }
    }
}

/// Freshness check against the default 30 minute window.
pub fn is_fresh(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    CachePolicy::default().is_fresh(timestamp, now)
}
