//! Client for the banking API's login exchange.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{header, Client};
use tracing::{debug, warn};

use crate::auth::LoginForm;

use super::ApiError;

/// Path of the login endpoint, relative to the API base URL.
const LOGIN_PATH: &str = "/api/user/login";

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct AuthClient {
    client: Client,
    base_url: String,
}

impl AuthClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn login_url(&self) -> String {
        format!("{}{}", self.base_url, LOGIN_PATH)
    }

    /// Exchange user ID and PIN for a login.
    ///
    /// The form is validated before anything is sent. Success carries no
    /// body; the caller records the session itself.
    pub async fn login(&self, form: &LoginForm) -> Result<()> {
        form.validate()?;

        let url = self.login_url();
        debug!(url = %url, user_id = %form.user_id(), "Sending login request");

        let response = self
            .client
            .post(&url)
            .header(header::ACCEPT, "application/json")
            .form(&[("userID", form.user_id()), ("PIN", form.pin())])
            .send()
            .await
            .map_err(ApiError::from)
            .context("Failed to send login request")?;

        Self::check_response(response).await?;
        Ok(())
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, "Login rejected");
            Err(ApiError::from_status(status, &body).into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::LoginError;

    #[test]
    fn test_login_url_strips_trailing_slash() {
        let client = AuthClient::new("http://localhost:8080/").unwrap();
        assert_eq!(client.login_url(), "http://localhost:8080/api/user/login");
    }

    #[tokio::test]
    async fn test_login_validates_before_sending() {
        // Nothing listens here; validation must fail before a request is made
        let client = AuthClient::new("http://127.0.0.1:9").unwrap();

        let err = client.login(&LoginForm::new("", "1234")).await.unwrap_err();
        assert_eq!(err.downcast_ref::<LoginError>(), Some(&LoginError::BlankUserId));

        let err = client.login(&LoginForm::new("u1", "")).await.unwrap_err();
        assert_eq!(err.downcast_ref::<LoginError>(), Some(&LoginError::BlankPin));
    }
}
