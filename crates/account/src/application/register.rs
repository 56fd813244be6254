//! Register Use Case
//!
//! Creates a new account in the unconfirmed state and dispatches the
//! email-confirmation message.

use std::sync::Arc;

use crate::application::config::AccountConfig;
use crate::domain::entity::{Account, Profile};
use crate::domain::one_time_token::{OneTimeTokenService, TokenPurpose};
use crate::domain::repository::{AccountRepository, Notifier};
use crate::domain::value_object::Email;
use crate::error::{AccountError, AccountResult};
use platform::password::ClearTextPassword;

/// Registration input
pub struct RegisterInput {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub address: Option<String>,
    pub phone_number: Option<String>,
}

/// Registration output
pub struct RegisterOutput {
    pub account_id: String,
    pub email: String,
}

/// Register use case
pub struct RegisterUseCase<R, N>
where
    R: AccountRepository,
    N: Notifier,
{
    repo: Arc<R>,
    notifier: Arc<N>,
    config: Arc<AccountConfig>,
}

impl<R, N> RegisterUseCase<R, N>
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

    pub async fn execute(&self, input: RegisterInput) -> AccountResult<RegisterOutput> {
        // Validate and canonicalize email
        let email = Email::new(&input.email)?;

        // Early duplicate check; the unique index still catches races
        if self.repo.find_by_email(&email).await?.is_some() {
            return Err(AccountError::DuplicateAccount);
        }

        // Validate and hash password
        let password = ClearTextPassword::new(input.password)?;
        let password_hash = password.hash(self.config.pepper())?;

        let first_name = input.first_name.trim().to_string();
        let last_name = input.last_name.trim().to_string();
        if first_name.is_empty() || last_name.is_empty() {
            return Err(AccountError::Validation(
                "First and last name must not be empty".to_string(),
            ));
        }

        let account = Account::new(
            email,
            password_hash,
            Profile {
                first_name,
                last_name,
                address: input.address,
                phone_number: input.phone_number,
            },
        );

        // Persist; a lost duplicate race surfaces here as DuplicateAccount
        self.repo.insert(&account).await?;

        // Confirmation token is bound to the freshly inserted state
        let tokens = OneTimeTokenService::new(self.config.token_secret);
        let token = tokens.issue(&account, TokenPurpose::ConfirmEmail, self.config.confirm_token_ttl);
        let link = format!(
            "{}/api/account/confirm-email?accountId={}&token={}",
            self.config.public_base_url, account.account_id, token
        );
        let body = format!(
            "<h1>Email Confirmation</h1>\
             To finish activating your account, please click this link: \
             <a href=\"{link}\">Confirm Email</a>"
        );

        // Best-effort delivery; a mail failure never rolls back the account
        if let Err(e) = self
            .notifier
            .send(account.email.as_str(), "Email Confirmation", &body)
            .await
        {
            tracing::warn!(
                account_id = %account.account_id,
                error = %e,
                "Failed to send confirmation mail"
            );
        }

        tracing::info!(
            account_id = %account.account_id,
            email = %account.email,
            "Account registered"
        );

        Ok(RegisterOutput {
            account_id: account.account_id.to_string(),
            email: account.email.to_string(),
        })
    }
}
