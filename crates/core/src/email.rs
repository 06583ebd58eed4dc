//! Normalized email addresses.
//!
//! Emails are trimmed and lower-cased at the boundary so that lookups and the
//! store's uniqueness constraint agree regardless of how the user typed them.

use std::fmt;

use serde::Serialize;
use validator::ValidateEmail;

use crate::error::CoreError;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// Normalize and validate a user-supplied address.
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        let normalized = raw.trim().to_lowercase();
        if normalized.is_empty() {
            return Err(CoreError::Validation("Email is required".into()));
        }
        if !normalized.validate_email() {
            return Err(CoreError::Validation("Email address is not valid".into()));
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
