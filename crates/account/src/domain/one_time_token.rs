//! Single-use account tokens (email confirmation, password reset).
//!
//! Tokens are derived, not stored. The MAC binds the account id, the
//! purpose, the account's current security stamp and an expiry instant:
//!
//! ```text
//! <expires_at_ms>.<base64url(HMAC-SHA256(secret, id|purpose|stamp|expires_at_ms))>
//! ```
//!
//! Consumption is implicit: the operation that accepts the token rotates
//! the security stamp, after which the same token (and any sibling issued
//! under the old stamp) no longer verifies. No token table, no cleanup job.

use crate::domain::entity::Account;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::time::Duration;

type HmacSha256 = Hmac<Sha256>;

/// What a single-use token authorizes. The purpose is mixed into the MAC,
/// so a confirmation token can never be replayed as a reset token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenPurpose {
    ConfirmEmail,
    ResetPassword,
}

impl TokenPurpose {
    pub const fn as_str(&self) -> &'static str {
        match self {
            TokenPurpose::ConfirmEmail => "confirm_email",
            TokenPurpose::ResetPassword => "reset_password",
        }
    }
}

/// Issues and verifies single-use tokens for one deployment secret.
#[derive(Clone)]
pub struct OneTimeTokenService {
    secret: [u8; 32],
}

impl OneTimeTokenService {
    pub fn new(secret: [u8; 32]) -> Self {
        Self { secret }
    }

    /// Issue a token bound to the account's current security stamp.
    pub fn issue(&self, account: &Account, purpose: TokenPurpose, ttl: Duration) -> String {
        let expires_at_ms = chrono::Utc::now().timestamp_millis() + ttl.as_millis() as i64;
        let mac = self.compute_mac(account, purpose, expires_at_ms);
        format!(
            "{}.{}",
            expires_at_ms,
            platform::crypto::to_base64_url(&mac)
        )
    }

    /// Verify a token against the account's current state.
    ///
    /// Returns `false` for malformed input, expiry, purpose mismatch, a
    /// different account, or a stamp that has rotated since issuance. The
    /// caller cannot tell which; all failures look the same.
    pub fn verify(&self, account: &Account, purpose: TokenPurpose, token: &str) -> bool {
        let Some((expiry_part, sig_part)) = token.split_once('.') else {
            return false;
        };
        let Ok(expires_at_ms) = expiry_part.parse::<i64>() else {
            return false;
        };
        if expires_at_ms < chrono::Utc::now().timestamp_millis() {
            return false;
        }
        let Ok(presented) = platform::crypto::from_base64_url(sig_part) else {
            return false;
        };
        let expected = self.compute_mac(account, purpose, expires_at_ms);
        platform::crypto::constant_time_eq(&expected, &presented)
    }

    fn compute_mac(&self, account: &Account, purpose: TokenPurpose, expires_at_ms: i64) -> Vec<u8> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .expect("HMAC can take key of any size");
        mac.update(account.account_id.to_string().as_bytes());
        mac.update(b"|");
        mac.update(purpose.as_str().as_bytes());
        mac.update(b"|");
        mac.update(account.security_stamp.to_string().as_bytes());
        mac.update(b"|");
        mac.update(expires_at_ms.to_string().as_bytes());
        mac.finalize().into_bytes().to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::Profile;
    use crate::domain::value_object::Email;

    fn service() -> OneTimeTokenService {
        OneTimeTokenService::new([7u8; 32])
    }

    fn account(email: &str) -> Account {
        let hash = platform::password::ClearTextPassword::new("pw123456".to_string())
            .unwrap()
            .hash(None)
            .unwrap();
        Account::new(
            Email::new(email).unwrap(),
            hash,
            Profile {
                first_name: "Alice".to_string(),
                last_name: "Smith".to_string(),
                address: None,
                phone_number: None,
            },
        )
    }

    #[test]
    fn test_issue_then_verify() {
        let svc = service();
        let acct = account("alice@example.com");
        let token = svc.issue(&acct, TokenPurpose::ConfirmEmail, Duration::from_secs(3600));
        assert!(svc.verify(&acct, TokenPurpose::ConfirmEmail, &token));
    }

    #[test]
    fn test_purpose_mismatch_fails() {
        let svc = service();
        let acct = account("alice@example.com");
        let token = svc.issue(&acct, TokenPurpose::ConfirmEmail, Duration::from_secs(3600));
        assert!(!svc.verify(&acct, TokenPurpose::ResetPassword, &token));
    }

    #[test]
    fn test_other_account_fails() {
        let svc = service();
        let alice = account("alice@example.com");
        let bob = account("bob@example.com");
        let token = svc.issue(&alice, TokenPurpose::ConfirmEmail, Duration::from_secs(3600));
        assert!(!svc.verify(&bob, TokenPurpose::ConfirmEmail, &token));
    }

    #[test]
    fn test_stamp_rotation_consumes_token() {
        let svc = service();
        let mut acct = account("alice@example.com");
        let token = svc.issue(&acct, TokenPurpose::ConfirmEmail, Duration::from_secs(3600));
        acct.confirm_email();
        assert!(!svc.verify(&acct, TokenPurpose::ConfirmEmail, &token));
    }

    #[test]
    fn test_expired_token_fails() {
        let svc = service();
        let acct = account("alice@example.com");
        let token = svc.issue(&acct, TokenPurpose::ResetPassword, Duration::from_secs(0));
        std::thread::sleep(Duration::from_millis(5));
        assert!(!svc.verify(&acct, TokenPurpose::ResetPassword, &token));
    }

    #[test]
    fn test_tampered_token_fails() {
        let svc = service();
        let acct = account("alice@example.com");
        let token = svc.issue(&acct, TokenPurpose::ConfirmEmail, Duration::from_secs(3600));
        let mut tampered = token.clone();
        tampered.push('A');
        assert!(!svc.verify(&acct, TokenPurpose::ConfirmEmail, &tampered));
        assert!(!svc.verify(&acct, TokenPurpose::ConfirmEmail, "garbage"));
    }

    #[test]
    fn test_different_secret_fails() {
        let svc = service();
        let other = OneTimeTokenService::new([9u8; 32]);
        let acct = account("alice@example.com");
        let token = svc.issue(&acct, TokenPurpose::ConfirmEmail, Duration::from_secs(3600));
        assert!(!other.verify(&acct, TokenPurpose::ConfirmEmail, &token));
    }
}
