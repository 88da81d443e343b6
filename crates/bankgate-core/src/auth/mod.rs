//! Authentication state kept in the session store.
//!
//! This module provides:
//! - `SessionGuard`: lazy expiry checks for the login session and OTP challenge
//! - `Session` / `OtpChallenge`: typed views over the stored entries
//! - `LoginForm`: client-side validation before the login exchange
//!
//! Both lifecycles share one time-to-live of 0.167 hours.

pub mod guard;
pub mod login;
pub mod otp;
pub mod session;

pub use guard::{Checkpoint, GuardFailure, GuardOutcome, GuardTargets, Redirect, SessionGuard};
pub use login::{LoginError, LoginForm};
pub use otp::OtpChallenge;
pub use session::Session;

/// Time-to-live for both the login session and the OTP challenge,
/// 0.167 hours expressed in milliseconds.
pub const TRUST_TTL_MS: i64 = 601_200;

/// Store keys owned by the guard.
pub mod keys {
    pub const USER_ID: &str = "userID";
    pub const LOGIN_TIMESTAMP: &str = "timestamp";
    pub const OTP_TIMESTAMP: &str = "OTP";
}

/// A guard-owned entry as found in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stored<T> {
    Absent,
    Present(T),
    /// The entry exists but its timestamp is missing or unparseable.
    Invalid(String),
}

/// Whether `elapsed_ms` has run past the trust window. Equal is still valid.
pub(crate) fn is_past_ttl(elapsed_ms: i64) -> bool {
    elapsed_ms > TRUST_TTL_MS
}

/// Milliseconds from `since` to `now`, or `None` when the difference does
/// not fit in an `i64`.
pub(crate) fn elapsed_since(now_millis: i64, since: i64) -> Option<i64> {
    now_millis.checked_sub(since)
}

/// Whole seconds left in the trust window, never negative.
pub(crate) fn seconds_left(elapsed_ms: i64) -> i64 {
    TRUST_TTL_MS.saturating_sub(elapsed_ms).max(0) / 1000
}

/// Epoch milliseconds; values before the epoch are rejected.
pub(crate) fn parse_timestamp(raw: &str) -> Option<i64> {
    raw.trim().parse::<i64>().ok().filter(|ts| *ts >= 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trust_ttl_is_point_167_hours() {
        assert_eq!(TRUST_TTL_MS, (0.167_f64 * 60.0 * 60.0 * 1000.0).round() as i64);
    }

    #[test]
    fn test_is_past_ttl_boundary() {
        assert!(!is_past_ttl(0));
        assert!(!is_past_ttl(TRUST_TTL_MS));
        assert!(is_past_ttl(TRUST_TTL_MS + 1));
        // Timestamps from the future never count as expired
        assert!(!is_past_ttl(-5_000));
    }

    #[test]
    fn test_parse_timestamp() {
        assert_eq!(parse_timestamp("1700000000000"), Some(1_700_000_000_000));
        assert_eq!(parse_timestamp(" 42 "), Some(42));
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("NaN"), None);
        assert_eq!(parse_timestamp("12.5"), None);
        assert_eq!(parse_timestamp("-1"), None);
        assert_eq!(parse_timestamp(&i64::MIN.to_string()), None);
        assert_eq!(parse_timestamp(&i64::MAX.to_string()), Some(i64::MAX));
    }

    #[test]
    fn test_elapsed_since_overflow() {
        assert_eq!(elapsed_since(10_000, 4_000), Some(6_000));
        assert_eq!(elapsed_since(0, i64::MIN), None);
        assert_eq!(elapsed_since(-2, i64::MAX), None);
        assert_eq!(elapsed_since(1_000, i64::MAX), Some(1_000 - i64::MAX));
    }

    #[test]
    fn test_seconds_left() {
        assert_eq!(seconds_left(0), 601);
        assert_eq!(seconds_left(1_200), 600);
        assert_eq!(seconds_left(700_000), 0);
        assert_eq!(seconds_left(i64::MIN + 1), i64::MAX / 1000);
    }
}
