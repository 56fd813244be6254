//! Check Session Use Case
//!
//! Validates a session artifact from the cookie and resolves the current
//! account. Counterpart of `sign_in`'s `generate_session_token`.

use std::sync::Arc;

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::application::config::AccountConfig;
use crate::domain::entity::Account;
use crate::domain::repository::AccountRepository;
use crate::error::{AccountError, AccountResult};
use kernel::id::AccountId;

/// Check session use case
pub struct CheckSessionUseCase<R>
where
    R: AccountRepository,
{
    repo: Arc<R>,
    config: Arc<AccountConfig>,
}

impl<R> CheckSessionUseCase<R>
where
    R: AccountRepository,
{
    pub fn new(repo: Arc<R>, config: Arc<AccountConfig>) -> Self {
        Self { repo, config }
    }

    /// Validate the artifact and load the account it names.
    ///
    /// A signed artifact for a since-deleted account fails the same way a
    /// forged one does.
    pub async fn execute(&self, session_token: &str) -> AccountResult<Account> {
        let account_id = verify_session_token(&self.config.session_secret, session_token)
            .ok_or(AccountError::SessionInvalid)?;

        self.repo
            .find_by_id(&account_id)
            .await?
            .ok_or(AccountError::SessionInvalid)
    }
}

/// Verify signature and expiry of a session artifact; return the account id
/// it was minted for.
pub(crate) fn verify_session_token(secret: &[u8; 32], token: &str) -> Option<AccountId> {
    let mut parts = token.splitn(3, '.');
    let id_part = parts.next()?;
    let expiry_part = parts.next()?;
    let sig_part = parts.next()?;

    let expires_at_ms: i64 = expiry_part.parse().ok()?;
    if expires_at_ms < chrono::Utc::now().timestamp_millis() {
        return None;
    }

    let mut mac = Hmac::<Sha256>::new_from_slice(secret)
        .expect("HMAC can take key of any size");
    mac.update(id_part.as_bytes());
    mac.update(b".");
    mac.update(expiry_part.as_bytes());
    let expected = mac.finalize().into_bytes();

    let presented = platform::crypto::from_base64_url(sig_part).ok()?;
    if !platform::crypto::constant_time_eq(&expected, &presented) {
        return None;
    }

    AccountId::parse(id_part).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::sign_in::generate_session_token;

    #[test]
    fn test_roundtrip() {
        let secret = [3u8; 32];
        let id = AccountId::new();
        let exp = chrono::Utc::now().timestamp_millis() + 60_000;
        let token = generate_session_token(&secret, &id.to_string(), exp);
        assert_eq!(verify_session_token(&secret, &token), Some(id));
    }

    #[test]
    fn test_expired_artifact_rejected() {
        let secret = [3u8; 32];
        let id = AccountId::new();
        let exp = chrono::Utc::now().timestamp_millis() - 1;
        let token = generate_session_token(&secret, &id.to_string(), exp);
        assert_eq!(verify_session_token(&secret, &token), None);
    }

    #[test]
    fn test_tampered_artifact_rejected() {
        let secret = [3u8; 32];
        let id = AccountId::new();
        let exp = chrono::Utc::now().timestamp_millis() + 60_000;
        let token = generate_session_token(&secret, &id.to_string(), exp);

        // extend the expiry without re-signing
        let mut parts: Vec<&str> = token.splitn(3, '.').collect();
        let bumped = (exp + 1_000_000).to_string();
        parts[1] = &bumped;
        let forged = parts.join(".");
        assert_eq!(verify_session_token(&secret, &forged), None);

        assert_eq!(verify_session_token(&[4u8; 32], &token), None);
        assert_eq!(verify_session_token(&secret, "not-a-token"), None);
    }
}
