//! Snapshot expiry policy
//!
//! The stores never expire anything themselves; loaders that care about
//! staleness ask the policy whether a snapshot's timestamp is still usable.

use chrono::{DateTime, Duration, Utc};

/// Number of days a cached feed snapshot stays usable
pub const MAX_CACHE_AGE_DAYS: i64 = 7;

/// Decides whether a snapshot is still fresh enough to serve
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedCachePolicy {
    max_age: Duration,
}

impl Default for FeedCachePolicy {
    fn default() -> Self {
        Self {
            max_age: Duration::days(MAX_CACHE_AGE_DAYS),
        }
    }
}

impl FeedCachePolicy {
    /// Policy with a custom maximum age
    pub fn with_max_age(max_age: Duration) -> Self {
        Self { max_age }
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    /// True if a snapshot taken at `timestamp` is usable at `now`
    ///
    /// A snapshot exactly `max_age` old is already expired.
    pub fn validate(&self, timestamp: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        match timestamp.checked_add_signed(self.max_age) {
            Some(expires_at) => now < expires_at,
            None => true,
        }
    }
}
