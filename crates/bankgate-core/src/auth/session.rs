use super::{elapsed_since, is_past_ttl, keys, parse_timestamp, seconds_left, Stored};
use crate::store::{SessionStore, StoreError};

/// Proof that a user completed the primary login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
    /// Epoch milliseconds of the login.
    pub login_at: i64,
}

impl Session {
    /// Read the session from `store`.
    ///
    /// The timestamp is only read when a user ID is present.
    pub fn load<S: SessionStore + ?Sized>(store: &S) -> Result<Stored<Session>, StoreError> {
        let Some(user_id) = store.get(keys::USER_ID)? else {
            return Ok(Stored::Absent);
        };

        match store.get(keys::LOGIN_TIMESTAMP)? {
            Some(raw) => match parse_timestamp(&raw) {
                Some(login_at) => Ok(Stored::Present(Session { user_id, login_at })),
                None => Ok(Stored::Invalid(raw)),
            },
            None => Ok(Stored::Invalid(String::new())),
        }
    }

    /// Milliseconds since `login_at`, `None` if the difference overflows.
    pub fn elapsed_ms(&self, now_millis: i64) -> Option<i64> {
        elapsed_since(now_millis, self.login_at)
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
    fn test_load_absent_without_user_id() {
        // A stray timestamp without a user is still no session
        let store = MemoryStore::with_entries([("timestamp", "1000")]);
        assert_eq!(Session::load(&store).unwrap(), Stored::Absent);
    }

    #[test]
    fn test_load_present() {
        let store = MemoryStore::with_entries([("userID", "u1"), ("timestamp", "1000")]);
        assert_eq!(
            Session::load(&store).unwrap(),
            Stored::Present(Session {
                user_id: "u1".to_string(),
                login_at: 1000,
            })
        );
    }

    #[test]
    fn test_load_invalid_timestamp() {
        let missing = MemoryStore::with_entries([("userID", "u1")]);
        assert_eq!(Session::load(&missing).unwrap(), Stored::Invalid(String::new()));

        let garbage = MemoryStore::with_entries([("userID", "u1"), ("timestamp", "soon")]);
        assert_eq!(
            Session::load(&garbage).unwrap(),
            Stored::Invalid("soon".to_string())
        );
    }

    #[test]
    fn test_load_rejects_pre_epoch_timestamp() {
        let min = i64::MIN.to_string();
        let store = MemoryStore::with_entries([("userID", "u1"), ("timestamp", min.as_str())]);
        assert_eq!(Session::load(&store).unwrap(), Stored::Invalid(min));
    }

    #[test]
    fn test_overflowing_elapsed_counts_as_expired() {
        let session = Session {
            user_id: "u1".to_string(),
            login_at: i64::MIN,
        };
        assert_eq!(session.elapsed_ms(0), None);
        assert!(session.is_expired(0));
        assert_eq!(session.seconds_until_expiry(0), 0);
    }

    #[test]
    fn test_session_expiry_helpers() {
        let session = Session {
            user_id: "u1".to_string(),
            login_at: 0,
        };
        assert!(!session.is_expired(601_200));
        assert!(session.is_expired(601_201));
        assert_eq!(session.seconds_until_expiry(1_200), 600);
        assert_eq!(session.seconds_until_expiry(700_000), 0);
    }
}
