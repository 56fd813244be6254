//! Recover Password Use Cases
//!
//! Two halves of the unauthenticated reset flow. The request half answers
//! identically whether or not the email is registered, so it cannot be
//! used to probe for accounts. The complete half verifies the reset token
//! and installs the new password, consuming the token via stamp rotation.

use std::sync::Arc;

use crate::application::config::AccountConfig;
use crate::domain::one_time_token::{OneTimeTokenService, TokenPurpose};
use crate::domain::repository::{AccountRepository, Notifier};
use crate::domain::value_object::Email;
use crate::error::{AccountError, AccountResult};
use platform::password::ClearTextPassword;

/// Request reset use case
pub struct RequestResetUseCase<R, N>
where
    R: AccountRepository,
    N: Notifier,
{
    repo: Arc<R>,
    notifier: Arc<N>,
    config: Arc<AccountConfig>,
}

impl<R, N> RequestResetUseCase<R, N>
where
    R: AccountRepository,
    N: Notifier,
{
    pub fn new(repo: Arc<R>, notifier: Arc<N>, config: Arc<AccountConfig>) -> Self {
        Self {
            repo,
            notifier,
            config,
        }
    }

    /// Request a reset link. Always succeeds; an unknown or malformed email
    /// is logged and silently dropped.
    pub async fn execute(&self, raw_email: &str) -> AccountResult<()> {
        let Ok(email) = Email::new(raw_email) else {
            tracing::debug!("Password reset requested for malformed email");
            return Ok(());
        };

        let Some(account) = self.repo.find_by_email(&email).await? else {
            tracing::debug!("Password reset requested for unknown email");
            return Ok(());
        };

        let tokens = OneTimeTokenService::new(self.config.token_secret);
        let token = tokens.issue(&account, TokenPurpose::ResetPassword, self.config.reset_token_ttl);
        let link = format!(
            "{}/reset-password?token={}",
            self.config.public_base_url, token
        );
        let body = format!(
            "<h1>Password Reset</h1>\
             To reset your password, please click this link: \
             <a href=\"{link}\">Reset Password</a>"
        );

        if let Err(e) = self
            .notifier
            .send(account.email.as_str(), "Password Reset", &body)
            .await
        {
            tracing::warn!(
                account_id = %account.account_id,
                error = %e,
                "Failed to send reset mail"
            );
        }

        tracing::info!(account_id = %account.account_id, "Password reset requested");
        Ok(())
    }
}

/// Complete reset input
pub struct CompleteResetInput {
    pub email: String,
    pub token: String,
    pub new_password: String,
}

/// Complete reset use case
pub struct CompleteResetUseCase<R>
where
    R: AccountRepository,
{
    repo: Arc<R>,
    config: Arc<AccountConfig>,
}

impl<R> CompleteResetUseCase<R>
where
    R: AccountRepository,
{
    pub fn new(repo: Arc<R>, config: Arc<AccountConfig>) -> Self {
        Self { repo, config }
    }

    pub async fn execute(&self, input: CompleteResetInput) -> AccountResult<()> {
        // Unknown email fails exactly like a bad token
        let email = Email::new(&input.email).map_err(|_| AccountError::InvalidToken)?;
        let account = self
            .repo
            .find_by_email(&email)
            .await?
            .ok_or(AccountError::InvalidToken)?;

        let tokens = OneTimeTokenService::new(self.config.token_secret);
        if !tokens.verify(&account, TokenPurpose::ResetPassword, &input.token) {
            return Err(AccountError::InvalidToken);
        }

        let new_password = ClearTextPassword::new(input.new_password)?;
        let new_hash = new_password.hash(self.config.pepper())?;

        let expected_stamp = account.security_stamp;
        let mut account = account;
        account.set_password(new_hash);

        if !self.repo.update(&account, &expected_stamp).await? {
            return Err(AccountError::InvalidToken);
        }

        tracing::info!(account_id = %account.account_id, "Password reset completed");
        Ok(())
    }
}
