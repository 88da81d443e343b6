//! Lazy expiry enforcement for the login session and the OTP challenge.
//!
//! Nothing here runs on a timer. A session or challenge can sit expired in
//! the store indefinitely; it is only cleared the next time a protected view
//! consults the guard. Every check either lets the view proceed or returns a
//! redirect, which the caller must treat as terminal.

use thiserror::Error;
use tracing::{debug, info, warn};

use super::{keys, OtpChallenge, Session, Stored};
use crate::clock::{Clock, SystemClock};
use crate::store::{SessionStore, StoreError};

/// Path of the OTP entry view, relative to the application root.
const OTP_ENTRY_PATH: &str = "/authentication/OTP.html";

/// Path of the landing view after a successful login.
const HOMEPAGE_PATH: &str = "/user/homepage.html";

/// Why a guard check refused the current view.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GuardFailure {
    #[error("No session found")]
    MissingSession,

    #[error("Session expired {elapsed_ms} ms after login")]
    ExpiredSession { elapsed_ms: i64 },

    #[error("Session has a user but no valid login timestamp ({raw:?})")]
    InvalidSession { raw: String },

    #[error("No OTP challenge found")]
    MissingOtpChallenge,

    #[error("OTP challenge expired {elapsed_ms} ms after issue")]
    ExpiredOtpChallenge { elapsed_ms: i64 },

    #[error("OTP challenge has an invalid timestamp ({raw:?})")]
    InvalidOtpChallenge { raw: String },

    #[error("Session store unavailable: {0}")]
    StoreUnavailable(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub target: String,
    pub reason: GuardFailure,
}

/// Result of a guard check. A redirect ends the current view.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    Proceed,
    Redirect(Redirect),
}

impl GuardOutcome {
    pub fn is_proceed(&self) -> bool {
        matches!(self, GuardOutcome::Proceed)
    }

    pub fn redirect(&self) -> Option<&Redirect> {
        match self {
            GuardOutcome::Proceed => None,
            GuardOutcome::Redirect(r) => Some(r),
        }
    }
}

/// The views the guard can send the user to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardTargets {
    /// Landing view after the session is gone.
    pub root: String,
    /// View where the user enters a one-time passcode.
    pub otp_entry: String,
    /// Landing view after a successful login.
    pub homepage: String,
}

impl GuardTargets {
    pub fn from_domain(domain_url: &str) -> Self {
        let root = domain_url.trim_end_matches('/');
        Self {
            root: root.to_string(),
            otp_entry: format!("{}{}", root, OTP_ENTRY_PATH),
            homepage: format!("{}{}", root, HOMEPAGE_PATH),
        }
    }

    /// The redirect for a check whose store could not be read at all.
    ///
    /// Used both when a read fails mid-check and when the store cannot be
    /// opened in the first place, so the view fails closed either way.
    pub fn store_unavailable(&self, checkpoint: Checkpoint, error: &StoreError) -> GuardOutcome {
        let target = match checkpoint {
            Checkpoint::Session => &self.root,
            Checkpoint::OtpChallenge => &self.otp_entry,
        };
        GuardOutcome::Redirect(Redirect {
            target: target.clone(),
            reason: GuardFailure::StoreUnavailable(error.to_string()),
        })
    }
}

/// Which guard check a view runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Checkpoint {
    Session,
    OtpChallenge,
}

pub struct SessionGuard<S, C = SystemClock> {
    store: S,
    clock: C,
    targets: GuardTargets,
}

impl<S: SessionStore> SessionGuard<S, SystemClock> {
    pub fn new(store: S, targets: GuardTargets) -> Self {
        Self::with_clock(store, SystemClock, targets)
    }
}

impl<S: SessionStore, C: Clock> SessionGuard<S, C> {
    pub fn with_clock(store: S, clock: C, targets: GuardTargets) -> Self {
        Self {
            store,
            clock,
            targets,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn targets(&self) -> &GuardTargets {
        &self.targets
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// Gate a protected view on the login session.
    ///
    /// Without a user ID the timestamp is never read and nothing is mutated.
    /// An expired or malformed session clears the whole store.
    pub fn enforce_session(&mut self) -> GuardOutcome {
        let session = match Session::load(&self.store) {
            Ok(Stored::Present(session)) => session,
            Ok(Stored::Absent) => {
                debug!("No session, redirecting to root");
                return self.to_root(GuardFailure::MissingSession);
            }
            Ok(Stored::Invalid(raw)) => {
                warn!(raw = %raw, "Session has no usable login timestamp");
                self.clear_store();
                return self.to_root(GuardFailure::InvalidSession { raw });
            }
            Err(e) => {
                warn!(error = %e, "Failed to read session");
                return self.targets.store_unavailable(Checkpoint::Session, &e);
            }
        };

        let Some(elapsed_ms) = session.elapsed_ms(self.clock.now_millis()) else {
            warn!(login_at = session.login_at, "Session age out of range");
            self.clear_store();
            return self.to_root(GuardFailure::InvalidSession {
                raw: session.login_at.to_string(),
            });
        };
        if super::is_past_ttl(elapsed_ms) {
            info!(user_id = %session.user_id, elapsed_ms, "Session expired");
            self.clear_store();
            return self.to_root(GuardFailure::ExpiredSession { elapsed_ms });
        }

        GuardOutcome::Proceed
    }

    /// Record a successful login exchange for `user_id`.
    ///
    /// The timestamp is written first and rolled back if the user ID cannot
    /// be stored, so the store never holds half a session.
    pub fn establish_session(&mut self, user_id: &str) -> Result<Session, StoreError> {
        let login_at = self.clock.now_millis();
        self.store
            .set(keys::LOGIN_TIMESTAMP, &login_at.to_string())?;

        if let Err(e) = self.store.set(keys::USER_ID, user_id) {
            if let Err(rollback) = self.store.remove(keys::LOGIN_TIMESTAMP) {
                warn!(error = %rollback, "Failed to roll back login timestamp");
            }
            return Err(e);
        }

        info!(user_id = %user_id, "Session established");
        Ok(Session {
            user_id: user_id.to_string(),
            login_at,
        })
    }

    /// Explicit logout. Clears everything in the store.
    pub fn end_session(&mut self) -> Result<(), StoreError> {
        self.store.clear()?;
        info!("Session ended");
        Ok(())
    }

    pub fn session(&self) -> Result<Stored<Session>, StoreError> {
        Session::load(&self.store)
    }

    // =========================================================================
    // OTP challenge
    // =========================================================================

    /// Start an OTP challenge now, replacing any earlier one.
    pub fn issue_otp_challenge(&mut self) -> Result<OtpChallenge, StoreError> {
        let issued_at = self.clock.now_millis();
        self.store.set(keys::OTP_TIMESTAMP, &issued_at.to_string())?;
        debug!(issued_at, "OTP challenge issued");
        Ok(OtpChallenge { issued_at })
    }

    /// Gate an OTP-protected view on a live challenge.
    ///
    /// Only the challenge entry is ever removed here; the session is left
    /// alone. A missing challenge redirects without an expiry check.
    pub fn enforce_otp_challenge(&mut self) -> GuardOutcome {
        let challenge = match OtpChallenge::load(&self.store) {
            Ok(Stored::Present(challenge)) => challenge,
            Ok(Stored::Absent) => {
                debug!("No OTP challenge, redirecting to OTP entry");
                return self.to_otp_entry(GuardFailure::MissingOtpChallenge);
            }
            Ok(Stored::Invalid(raw)) => {
                warn!(raw = %raw, "OTP challenge has no usable timestamp");
                self.remove_otp_challenge();
                return self.to_otp_entry(GuardFailure::InvalidOtpChallenge { raw });
            }
            Err(e) => {
                warn!(error = %e, "Failed to read OTP challenge");
                return self.targets.store_unavailable(Checkpoint::OtpChallenge, &e);
            }
        };

        let Some(elapsed_ms) = challenge.elapsed_ms(self.clock.now_millis()) else {
            warn!(issued_at = challenge.issued_at, "OTP challenge age out of range");
            self.remove_otp_challenge();
            return self.to_otp_entry(GuardFailure::InvalidOtpChallenge {
                raw: challenge.issued_at.to_string(),
            });
        };
        if super::is_past_ttl(elapsed_ms) {
            info!(elapsed_ms, "OTP challenge expired");
            self.remove_otp_challenge();
            return self.to_otp_entry(GuardFailure::ExpiredOtpChallenge { elapsed_ms });
        }

        GuardOutcome::Proceed
    }

    /// Drop the challenge after the passcode was verified.
    /// An absent challenge is fine.
    pub fn consume_otp_challenge(&mut self) -> Result<(), StoreError> {
        self.store.remove(keys::OTP_TIMESTAMP)?;
        debug!("OTP challenge consumed");
        Ok(())
    }

    pub fn otp_challenge(&self) -> Result<Stored<OtpChallenge>, StoreError> {
        OtpChallenge::load(&self.store)
    }

    pub fn now_millis(&self) -> i64 {
        self.clock.now_millis()
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    // Redirect still happens if clearing fails; the view must not load.
    fn clear_store(&mut self) {
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "Failed to clear session store");
        }
    }

    fn remove_otp_challenge(&mut self) {
        if let Err(e) = self.store.remove(keys::OTP_TIMESTAMP) {
            warn!(error = %e, "Failed to remove OTP challenge");
        }
    }

    fn to_root(&self, reason: GuardFailure) -> GuardOutcome {
        GuardOutcome::Redirect(Redirect {
            target: self.targets.root.clone(),
            reason,
        })
    }

    fn to_otp_entry(&self, reason: GuardFailure) -> GuardOutcome {
        GuardOutcome::Redirect(Redirect {
            target: self.targets.otp_entry.clone(),
            reason,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
