use super::{elapsed_since, is_past_ttl, keys, parse_timestamp, seconds_left, Stored};
use crate::store::{SessionStore, StoreError};

/// Marker that a one-time-passcode flow was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OtpChallenge {
    /// Epoch milliseconds of issuance.
    pub issued_at: i64,
}

impl OtpChallenge {
    pub fn load<S: SessionStore + ?Sized>(store: &S) -> Result<Stored<OtpChallenge>, StoreError> {
        Ok(match store.get(keys::OTP_TIMESTAMP)? {
            None => Stored::Absent,
            Some(raw) => match parse_timestamp(&raw) {
                Some(issued_at) => Stored::Present(OtpChallenge { issued_at }),
                None => Stored::Invalid(raw),
            },
        })
    }

    /// Milliseconds since `issued_at`, `None` if the difference overflows.
    pub fn elapsed_ms(&self, now_millis: i64) -> Option<i64> {
        elapsed_since(now_millis, self.issued_at)
    }

    /// An elapsed time that cannot be computed counts as expired.
    pub fn is_expired(&self, now_millis: i64) -> bool {
        self.elapsed_ms(now_millis).map_or(true, is_past_ttl)
    }

    /// Seconds remaining until expiry (for display)
    pub fn seconds_until_expiry(&self, now_millis: i64) -> i64 {
        self.elapsed_ms(now_millis).map_or(0, seconds_left)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn test_load_otp_challenge() {
        assert_eq!(OtpChallenge::load(&MemoryStore::new()).unwrap(), Stored::Absent);

        let store = MemoryStore::with_entries([("OTP", "5000")]);
        assert_eq!(
            OtpChallenge::load(&store).unwrap(),
            Stored::Present(OtpChallenge { issued_at: 5000 })
        );

        let store = MemoryStore::with_entries([("OTP", "null")]);
        assert_eq!(
            OtpChallenge::load(&store).unwrap(),
            Stored::Invalid("null".to_string())
        );
    }

    #[test]
    fn test_otp_expiry() {
        let challenge = OtpChallenge { issued_at: 10_000 };
        assert!(!challenge.is_expired(10_000 + 601_200));
        assert!(challenge.is_expired(10_000 + 601_201));
        assert_eq!(challenge.seconds_until_expiry(10_000), 601);

        let overflowing = OtpChallenge { issued_at: i64::MIN };
        assert!(overflowing.is_expired(1));
        assert_eq!(overflowing.seconds_until_expiry(1), 0);
    }
}
