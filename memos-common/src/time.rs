//! Timestamp utilities

use chrono::{DateTime, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Whole seconds elapsed since `start`, clamped at zero
pub fn seconds_since(start: DateTime<Utc>) -> u64 {
    now().signed_duration_since(start).num_seconds().max(0) as u64
}

/// Whether a record created at `created_at` is older than `ttl` at instant `at`
pub fn is_expired(created_at: DateTime<Utc>, ttl: std::time::Duration, at: DateTime<Utc>) -> bool {
    match chrono::Duration::from_std(ttl) {
        Ok(ttl) => at.signed_duration_since(created_at) > ttl,
        // A TTL too large for chrono never expires
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_now_returns_recent_timestamp() {
        let timestamp = now();
        assert!(timestamp.timestamp() > 946_684_800); // 2000-01-01 00:00:00 UTC
        assert!(timestamp.timestamp() < 4_102_444_800); // 2100-01-01 00:00:00 UTC
    }

    #[test]
    fn test_seconds_since_never_negative() {
        let future = now() + chrono::Duration::seconds(60);
        assert_eq!(seconds_since(future), 0);

        let past = now() - chrono::Duration::seconds(5);
        assert!(seconds_since(past) >= 5);
    }

    #[test]
    fn test_is_expired_boundaries() {
        let created = now();
        let ttl = Duration::from_secs(30 * 60);

        assert!(!is_expired(created, ttl, created));
        assert!(!is_expired(created, ttl, created + chrono::Duration::minutes(30)));
        assert!(is_expired(created, ttl, created + chrono::Duration::minutes(31)));
    }

    #[test]
    fn test_is_expired_huge_ttl() {
        let created = now();
        assert!(!is_expired(created, Duration::MAX, created + chrono::Duration::days(365)));
    }
}
