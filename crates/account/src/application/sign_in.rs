//! Sign In Use Case
//!
//! Verifies interactive credentials and mints a signed session artifact.
//!
//! The artifact is self-contained: `<account_id>.<expires_at_ms>.<sig>`
//! where `sig` is base64url(HMAC-SHA256(session_secret, account_id +
//! "." + expires_at_ms)). There is no server-side session row; validity
//! is signature plus expiry.

use std::sync::Arc;

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::application::config::AccountConfig;
use crate::domain::repository::AccountRepository;
use crate::domain::value_object::Email;
use crate::error::{AccountError, AccountResult};
use platform::password::ClearTextPassword;

/// Sign in input
pub struct SignInInput {
    pub email: String,
    pub password: String,
    pub remember_me: bool,
}

/// Sign in output
pub struct SignInOutput {
    pub account_id: String,
    pub email: String,
    /// Signed session artifact for the session cookie
    pub session_token: String,
    pub expires_at_ms: i64,
}

/// Sign in use case
pub struct SignInUseCase<R>
where
    R: AccountRepository,
{
    repo: Arc<R>,
    config: Arc<AccountConfig>,
}

impl<R> SignInUseCase<R>
where
    R: AccountRepository,
{
    pub fn new(repo: Arc<R>, config: Arc<AccountConfig>) -> Self {
        Self { repo, config }
    }

    pub async fn execute(&self, input: SignInInput) -> AccountResult<SignInOutput> {
        // Any malformed identifier is just a failed credential; never reveal
        // whether the account exists
        let email = Email::new(&input.email).map_err(|_| AccountError::InvalidCredentials)?;

        let account = self
            .repo
            .find_by_email(&email)
            .await?
            .ok_or(AccountError::InvalidCredentials)?;

        let password = ClearTextPassword::new(input.password)
            .map_err(|_| AccountError::InvalidCredentials)?;
        if !account
            .password_hash
            .verify(&password, self.config.pepper())
        {
            return Err(AccountError::InvalidCredentials);
        }

        // Checked only after the password verified, so this response is not
        // an enumeration oracle
        if self.config.require_confirmed_email && !account.email_confirmed {
            return Err(AccountError::AccountNotConfirmed);
        }

        let ttl_ms = if input.remember_me {
            self.config.session_ttl_long_ms()
        } else {
            self.config.session_ttl_short_ms()
        };
        let expires_at_ms = chrono::Utc::now().timestamp_millis() + ttl_ms;

        let session_token =
            generate_session_token(&self.config.session_secret, &account.account_id.to_string(), expires_at_ms);

        tracing::info!(
            account_id = %account.account_id,
            remember_me = input.remember_me,
            "Account signed in"
        );

        Ok(SignInOutput {
            account_id: account.account_id.to_string(),
            email: account.email.to_string(),
            session_token,
            expires_at_ms,
        })
    }
}

/// Generate a signed session artifact of the form `id.expires_at_ms.sig`
pub(crate) fn generate_session_token(secret: &[u8; 32], account_id: &str, expires_at_ms: i64) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret)
        .expect("HMAC can take key of any size");
    mac.update(account_id.as_bytes());
    mac.update(b".");
    mac.update(expires_at_ms.to_string().as_bytes());
    let signature = platform::crypto::to_base64_url(&mac.finalize().into_bytes());
    format!("{account_id}.{expires_at_ms}.{signature}")
}
