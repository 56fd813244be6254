//! Issue API Token Use Case
//!
//! Exchanges email + password for a signed bearer token (HS256 JWT).
//!
//! Unlike interactive sign-in, this path does not require a confirmed
//! email: API clients authenticate with the raw credential and skip the
//! mailbox-control gate.

use std::sync::Arc;

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::config::AccountConfig;
use crate::domain::repository::AccountRepository;
use crate::domain::value_object::Email;
use crate::error::{AccountError, AccountResult};
use platform::password::ClearTextPassword;

/// Claims carried in a bearer token
#[derive(Debug, Serialize, Deserialize)]
pub struct BearerClaims {
    /// Canonical account email
    pub sub: String,
    /// Fresh per-issuance id; two tokens for the same account differ here
    pub jti: String,
    pub iss: String,
    pub aud: String,
    /// Issued-at (seconds since epoch)
    pub iat: i64,
    /// Expiry (seconds since epoch)
    pub exp: i64,
}

/// Issue token input
pub struct IssueTokenInput {
    pub email: String,
    pub password: String,
}

/// Issue token output
pub struct IssueTokenOutput {
    pub token: String,
    /// Expiry (seconds since epoch)
    pub expiration: i64,
}

/// Issue API token use case
pub struct IssueTokenUseCase<R>
where
    R: AccountRepository,
{
    repo: Arc<R>,
    config: Arc<AccountConfig>,
}

impl<R> IssueTokenUseCase<R>
where
    R: AccountRepository,
{
    pub fn new(repo: Arc<R>, config: Arc<AccountConfig>) -> Self {
        Self { repo, config }
    }

    pub async fn execute(&self, input: IssueTokenInput) -> AccountResult<IssueTokenOutput> {
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

        let now = chrono::Utc::now().timestamp();
        let exp = now + self.config.bearer_ttl.as_secs() as i64;
        let claims = BearerClaims {
            sub: account.email.to_string(),
            jti: Uuid::new_v4().to_string(),
            iss: self.config.bearer_issuer.clone(),
            aud: self.config.bearer_audience.clone(),
            iat: now,
            exp,
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.config.bearer_key.as_bytes()),
        )
        .map_err(|e| AccountError::Internal(e.to_string()))?;

        tracing::info!(account_id = %account.account_id, "API token issued");

        Ok(IssueTokenOutput {
            token,
            expiration: exp,
        })
    }
}

/// Validate a bearer token's signature, expiry, issuer and audience.
pub fn validate_bearer_token(config: &AccountConfig, token: &str) -> AccountResult<BearerClaims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[&config.bearer_issuer]);
    validation.set_audience(&[&config.bearer_audience]);

    let data = decode::<BearerClaims>(
        token,
        &DecodingKey::from_secret(config.bearer_key.as_bytes()),
        &validation,
    )
    .map_err(|_| AccountError::SessionInvalid)?;

    Ok(data.claims)
}
