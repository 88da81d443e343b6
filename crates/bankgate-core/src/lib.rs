//! Core library for bankgate.
//!
//! Guards protected banking views with a client-held login session and a
//! one-time-passcode challenge, both of which expire 0.167 hours after they
//! are created. Expiry is detected lazily on each check and answered with a
//! redirect rather than an error.

pub mod api;
pub mod auth;
pub mod clock;
pub mod config;
pub mod store;

pub use auth::{
    Checkpoint, GuardFailure, GuardOutcome, GuardTargets, Redirect, SessionGuard, TRUST_TTL_MS,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use store::{FileStore, MemoryStore, SessionStore, StoreError};
