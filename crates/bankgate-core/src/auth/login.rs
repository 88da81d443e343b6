use std::fmt;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoginError {
    #[error("User ID cannot be blank")]
    BlankUserId,

    #[error("PIN cannot be blank")]
    BlankPin,
}

/// Credentials collected from the login form.
#[derive(Clone)]
pub struct LoginForm {
    user_id: String,
    pin: String,
}

impl LoginForm {
    pub fn new(user_id: impl Into<String>, pin: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            pin: pin.into(),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn pin(&self) -> &str {
        &self.pin
    }

    /// Checked in field order, so a blank user ID is reported first.
    pub fn validate(&self) -> Result<(), LoginError> {
        if self.user_id.is_empty() {
            return Err(LoginError::BlankUserId);
        }
        if self.pin.is_empty() {
            return Err(LoginError::BlankPin);
        }
        Ok(())
    }
}

impl fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginForm")
            .field("user_id", &self.user_id)
            .field("pin", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_login_form() {
        assert_eq!(LoginForm::new("u1", "1234").validate(), Ok(()));
        assert_eq!(LoginForm::new("", "1234").validate(), Err(LoginError::BlankUserId));
        assert_eq!(LoginForm::new("u1", "").validate(), Err(LoginError::BlankPin));
        // User ID is checked before PIN
        assert_eq!(LoginForm::new("", "").validate(), Err(LoginError::BlankUserId));
    }

    #[test]
    fn test_login_error_messages() {
        assert_eq!(LoginError::BlankUserId.to_string(), "User ID cannot be blank");
        assert_eq!(LoginError::BlankPin.to_string(), "PIN cannot be blank");
    }

    #[test]
    fn test_debug_redacts_pin() {
        let debug = format!("{:?}", LoginForm::new("u1", "9876"));
        assert!(debug.contains("u1"));
        assert!(!debug.contains("9876"));
    }
}
