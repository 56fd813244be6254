//! Update Profile Use Case
//!
//! Replaces an account's profile fields. No credential state changes, so
//! the security stamp stays put and outstanding tokens remain valid.

use std::sync::Arc;

use crate::domain::entity::Profile;
use crate::domain::repository::AccountRepository;
use crate::error::{AccountError, AccountResult};
use kernel::id::AccountId;

/// Update profile input
pub struct UpdateProfileInput {
    pub account_id: AccountId,
    pub first_name: String,
    pub last_name: String,
    pub address: Option<String>,
    pub phone_number: Option<String>,
}

/// Update profile use case
pub struct UpdateProfileUseCase<R>
where
    R: AccountRepository,
{
    repo: Arc<R>,
}

impl<R> UpdateProfileUseCase<R>
where
    R: AccountRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn execute(&self, input: UpdateProfileInput) -> AccountResult<()> {
        let first_name = input.first_name.trim().to_string();
        let last_name = input.last_name.trim().to_string();
        if first_name.is_empty() || last_name.is_empty() {
            return Err(AccountError::Validation(
                "First and last name must not be empty".to_string(),
            ));
        }

        let profile = Profile {
            first_name,
            last_name,
            address: input.address,
            phone_number: input.phone_number,
        };

        // A concurrent credential change can rotate the stamp under us. The
        // profile write touches no credential state, so re-read and retry
        // once instead of surfacing the lost race.
        for _ in 0..2 {
            let account = self
                .repo
                .find_by_id(&input.account_id)
                .await?
                .ok_or(AccountError::NotFound)?;

            let expected_stamp = account.security_stamp;
            let mut account = account;
            account.update_profile(profile.clone());

            if self.repo.update(&account, &expected_stamp).await? {
                tracing::info!(account_id = %account.account_id, "Profile updated");
                return Ok(());
            }
        }

        Err(AccountError::Internal(
            "Account was modified concurrently".to_string(),
        ))
    }
}
