//! Account entity.
//!
//! The `security_stamp` is the credential-state version of an account. It
//! rotates whenever something security-relevant changes (password set,
//! email confirmed), which invalidates every outstanding single-use token
//! derived from the previous stamp. Conditional store updates compare the
//! stamp read at load time, so two racing credential changes cannot both
//! win.

use crate::domain::value_object::Email;
use chrono::{DateTime, Utc};
use kernel::id::AccountId;
use platform::password::HashedPassword;
use uuid::Uuid;

/// Registered account with credential and profile state.
#[derive(Debug, Clone)]
pub struct Account {
    pub account_id: AccountId,
    pub email: Email,
    pub password_hash: HashedPassword,
    pub security_stamp: Uuid,
    pub email_confirmed: bool,
    pub first_name: String,
    pub last_name: String,
    pub address: Option<String>,
    pub phone_number: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Mutable profile fields, grouped for registration and profile updates.
#[derive(Debug, Clone)]
pub struct Profile {
    pub first_name: String,
    pub last_name: String,
    pub address: Option<String>,
    pub phone_number: Option<String>,
}

impl Account {
    /// Create a new, unconfirmed account.
    pub fn new(email: Email, password_hash: HashedPassword, profile: Profile) -> Self {
        let now = Utc::now();
        Self {
            account_id: AccountId::new(),
            email,
            password_hash,
            security_stamp: Uuid::new_v4(),
            email_confirmed: false,
            first_name: profile.first_name,
            last_name: profile.last_name,
            address: profile.address,
            phone_number: profile.phone_number,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Mark the email as confirmed and rotate the security stamp, consuming
    /// the confirmation token that proved mailbox control.
    pub fn confirm_email(&mut self) {
        self.email_confirmed = true;
        self.rotate_security_stamp();
    }

    /// Replace the password hash and rotate the security stamp, consuming
    /// any outstanding reset token.
    pub fn set_password(&mut self, password_hash: HashedPassword) {
        self.password_hash = password_hash;
        self.rotate_security_stamp();
    }

    /// Update profile fields. Leaves the security stamp untouched since no
    /// credential state changed.
    pub fn update_profile(&mut self, profile: Profile) {
        self.first_name = profile.first_name;
        self.last_name = profile.last_name;
        self.address = profile.address;
        self.phone_number = profile.phone_number;
        self.updated_at = Utc::now();
    }

    fn rotate_security_stamp(&mut self) {
        self.security_stamp = Uuid::new_v4();
        self.updated_at = Utc::now();
    }
}
