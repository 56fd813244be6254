//! Change Password Use Case
//!
//! Authenticated password change: requires the current password, then
//! replaces the hash and rotates the security stamp.

use std::sync::Arc;

use crate::application::config::AccountConfig;
use crate::domain::repository::AccountRepository;
use crate::error::{AccountError, AccountResult};
use kernel::id::AccountId;
use platform::password::ClearTextPassword;

/// Change password input
pub struct ChangePasswordInput {
    pub account_id: AccountId,
    pub old_password: String,
    pub new_password: String,
}

/// Change password use case
pub struct ChangePasswordUseCase<R>
where
    R: AccountRepository,
{
    repo: Arc<R>,
    config: Arc<AccountConfig>,
}

impl<R> ChangePasswordUseCase<R>
where
    R: AccountRepository,
{
    pub fn new(repo: Arc<R>, config: Arc<AccountConfig>) -> Self {
        Self { repo, config }
    }

    pub async fn execute(&self, input: ChangePasswordInput) -> AccountResult<()> {
        let account = self
            .repo
            .find_by_id(&input.account_id)
            .await?
            .ok_or(AccountError::NotFound)?;

        let old_password = ClearTextPassword::new(input.old_password)
            .map_err(|_| AccountError::InvalidCredentials)?;
        if !account
            .password_hash
            .verify(&old_password, self.config.pepper())
        {
            return Err(AccountError::InvalidCredentials);
        }

        // The new password goes through the full policy
        let new_password = ClearTextPassword::new(input.new_password)?;
        let new_hash = new_password.hash(self.config.pepper())?;

        let expected_stamp = account.security_stamp;
        let mut account = account;
        account.set_password(new_hash);

        if !self.repo.update(&account, &expected_stamp).await? {
            return Err(AccountError::Internal(
                "Account was modified concurrently".to_string(),
            ));
        }

        tracing::info!(account_id = %account.account_id, "Password changed");
        Ok(())
    }
}
