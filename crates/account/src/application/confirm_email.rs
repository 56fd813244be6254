//! Confirm Email Use Case
//!
//! Flips an account to the confirmed state after verifying the single-use
//! confirmation token. The stamp-conditioned update both consumes the token
//! and serializes racing confirmations: the loser re-verifies against a
//! rotated stamp and fails with InvalidToken.

use std::sync::Arc;

use crate::application::config::AccountConfig;
use crate::domain::one_time_token::{OneTimeTokenService, TokenPurpose};
use crate::domain::repository::AccountRepository;
use crate::error::{AccountError, AccountResult};
use kernel::id::AccountId;

/// Confirm email input
pub struct ConfirmEmailInput {
    pub account_id: AccountId,
    pub token: String,
}

/// Confirm email use case
pub struct ConfirmEmailUseCase<R>
where
    R: AccountRepository,
{
    repo: Arc<R>,
    config: Arc<AccountConfig>,
}

impl<R> ConfirmEmailUseCase<R>
where
    R: AccountRepository,
{
    pub fn new(repo: Arc<R>, config: Arc<AccountConfig>) -> Self {
        Self { repo, config }
    }

    pub async fn execute(&self, input: ConfirmEmailInput) -> AccountResult<()> {
        let account = self
            .repo
            .find_by_id(&input.account_id)
            .await?
            .ok_or(AccountError::NotFound)?;

        let tokens = OneTimeTokenService::new(self.config.token_secret);
        if !tokens.verify(&account, TokenPurpose::ConfirmEmail, &input.token) {
            return Err(AccountError::InvalidToken);
        }

        let expected_stamp = account.security_stamp;
        let mut account = account;
        account.confirm_email();

        if !self.repo.update(&account, &expected_stamp).await? {
            // Stamp moved between verify and write; the token is spent
            return Err(AccountError::InvalidToken);
        }

        tracing::info!(account_id = %account.account_id, "Email confirmed");
        Ok(())
    }
}
