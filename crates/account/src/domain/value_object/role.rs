//! Role value object.
//!
//! Roles are plain names. The two built-in roles cover the current
//! authorization model; additional roles can be created through
//! `RoleRepository::ensure` without any schema change.

use kernel::error::app_error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fmt;

const MAX_ROLE_LENGTH: usize = 64;

/// Named role granted to accounts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(String);

impl Role {
    pub const ADMIN: &'static str = "Admin";
    pub const CUSTOMER: &'static str = "Customer";

    pub fn new(name: impl AsRef<str>) -> AppResult<Self> {
        let name = name.as_ref().trim();
        if name.is_empty() {
            return Err(AppError::bad_request("Role name must not be empty"));
        }
        if name.len() > MAX_ROLE_LENGTH {
            return Err(AppError::bad_request("Role name is too long"));
        }
        Ok(Self(name.to_string()))
    }

    pub fn admin() -> Self {
        Self(Self::ADMIN.to_string())
    }

    pub fn customer() -> Self {
        Self(Self::CUSTOMER.to_string())
    }

    pub fn from_db(value: String) -> Self {
        Self(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_admin(&self) -> bool {
        self.0 == Self::ADMIN
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_roles() {
        assert!(Role::admin().is_admin());
        assert!(!Role::customer().is_admin());
        assert_eq!(Role::admin().as_str(), "Admin");
    }

    #[test]
    fn test_rejects_blank_name() {
        assert!(Role::new("   ").is_err());
    }

    #[test]
    fn test_trims_name() {
        assert_eq!(Role::new(" Support ").unwrap().as_str(), "Support");
    }
}
