//! Email address value object.
//!
//! The email doubles as the unique account identifier, so normalization
//! happens once at the boundary: input is trimmed and lowercased before
//! validation, and every later comparison uses the canonical form.

use kernel::error::app_error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fmt;

const MAX_EMAIL_LENGTH: usize = 254;

/// Validated, canonicalized email address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// Parse and canonicalize an email address.
    ///
    /// Trims surrounding whitespace and lowercases before validating, so
    /// `" Alice@Example.COM "` and `"alice@example.com"` are the same account.
    pub fn new(raw: impl AsRef<str>) -> AppResult<Self> {
        let canonical = raw.as_ref().trim().to_lowercase();

        if canonical.is_empty() {
            return Err(AppError::bad_request("Email must not be empty"));
        }
        if canonical.len() > MAX_EMAIL_LENGTH {
            return Err(AppError::bad_request("Email is too long"));
        }

        let Some((local, domain)) = canonical.split_once('@') else {
            return Err(AppError::bad_request("Email must contain '@'"));
        };
        if local.is_empty() || domain.is_empty() {
            return Err(AppError::bad_request("Email has an empty local or domain part"));
        }
        if domain.contains('@') || !domain.contains('.') {
            return Err(AppError::bad_request("Email domain is not valid"));
        }
        if canonical.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(AppError::bad_request("Email contains invalid characters"));
        }

        Ok(Self(canonical))
    }

    /// Reconstruct from a stored value that was canonicalized on the way in.
    pub fn from_db(value: String) -> Self {
        Self(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonicalizes_case_and_whitespace() {
        let a = Email::new("  Alice@Example.COM ").unwrap();
        let b = Email::new("alice@example.com").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "alice@example.com");
    }

    #[test]
    fn test_rejects_missing_at() {
        assert!(Email::new("alice.example.com").is_err());
    }

    #[test]
    fn test_rejects_empty_parts() {
        assert!(Email::new("@example.com").is_err());
        assert!(Email::new("alice@").is_err());
        assert!(Email::new("").is_err());
        assert!(Email::new("   ").is_err());
    }

    #[test]
    fn test_rejects_dotless_domain() {
        assert!(Email::new("alice@localhost").is_err());
    }

    #[test]
    fn test_rejects_inner_whitespace() {
        assert!(Email::new("al ice@example.com").is_err());
    }
}
