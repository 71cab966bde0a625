//! Timestamp utilities

use chrono::{DateTime, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Convert milliseconds to a chrono duration
pub fn millis_to_duration(millis: u64) -> chrono::Duration {
    chrono::Duration::milliseconds(millis.min(i64::MAX as u64) as i64)
}

/// Fractional minutes elapsed between `since` and `now`
///
/// Returns 0.0 when `now` is earlier than `since` (clock adjustments).
pub fn elapsed_minutes(since: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let elapsed_ms = (now - since).num_milliseconds();
    if elapsed_ms <= 0 {
        return 0.0;
    }
    elapsed_ms as f64 / 60_000.0
}

/// Whole seconds elapsed between `since` and `now`, floored at zero
pub fn elapsed_seconds(since: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - since).num_seconds().max(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_now_returns_valid_timestamp() {
        let timestamp = now();
        // Should be a reasonable timestamp (after year 2000)
        assert!(timestamp.timestamp() > 946_684_800);
    }

    #[tokio::test]
    async fn test_now_successive_calls_advance() {
        let time1 = now();
        tokio::time::sleep(Duration::from_millis(10)).await;
        let time2 = now();
        assert!(time2 > time1);
    }

    #[test]
    fn test_millis_to_duration_zero() {
        assert_eq!(millis_to_duration(0), chrono::Duration::zero());
    }

    #[test]
    fn test_millis_to_duration_one_second() {
        assert_eq!(millis_to_duration(1000), chrono::Duration::seconds(1));
    }

    #[test]
    fn test_millis_to_duration_saturates() {
        // Should not panic on out-of-range values
        let duration = millis_to_duration(u64::MAX);
        assert!(duration > chrono::Duration::days(365));
    }

    #[test]
    fn test_elapsed_minutes_ten_minutes() {
        let start = now();
        let later = start + chrono::Duration::minutes(10);
        assert!((elapsed_minutes(start, later) - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_elapsed_minutes_fractional() {
        let start = now();
        let later = start + chrono::Duration::seconds(90);
        assert!((elapsed_minutes(start, later) - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_elapsed_minutes_never_negative() {
        let start = now();
        let earlier = start - chrono::Duration::minutes(3);
        assert_eq!(elapsed_minutes(start, earlier), 0.0);
    }

    #[test]
    fn test_elapsed_seconds_floors() {
        let start = now();
        let later = start + chrono::Duration::milliseconds(2_999);
        assert_eq!(elapsed_seconds(start, later), 2);
        assert_eq!(elapsed_seconds(later, start), 0);
    }
}
