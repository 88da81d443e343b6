//! REST client for the banking API.
//!
//! Only the login exchange lives here. Account, card, payee and other
//! resource calls are plain request/response glue and are not wrapped.

pub mod client;
pub mod error;

pub use client::AuthClient;
pub use error::ApiError;
