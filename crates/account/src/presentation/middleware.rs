//! Authentication and Authorization Gates
//!
//! Resolves the calling account from either credential carrier and gates
//! privileged handlers on the Admin role. Handlers call these before
//! running any use case, so authorization failures happen before side
//! effects.

use axum::http::{header, HeaderMap};
use std::sync::Arc;

use crate::application::config::AccountConfig;
use crate::application::{validate_bearer_token, CheckSessionUseCase};
use crate::domain::entity::Account;
use crate::domain::repository::{AccountRepository, RoleRepository};
use crate::domain::value_object::{Email, Role};
use crate::error::{AccountError, AccountResult};

/// Resolve the calling account from the request headers.
///
/// A bearer token in `Authorization` wins over the session cookie; both
/// carriers resolve to the same account model, so downstream code never
/// cares which one was presented.
pub async fn authenticate<R>(
    store: &Arc<R>,
    config: &Arc<AccountConfig>,
    headers: &HeaderMap,
) -> AccountResult<Account>
where
    R: AccountRepository + Clone + Send + Sync + 'static,
{
    if let Some(token) = extract_bearer(headers) {
        let claims = validate_bearer_token(config, &token)?;
        let email = Email::new(&claims.sub).map_err(|_| AccountError::SessionInvalid)?;
        return store
            .find_by_email(&email)
            .await?
            .ok_or(AccountError::SessionInvalid);
    }

    let token = platform::cookie::extract_cookie(headers, &config.session_cookie_name)
        .ok_or(AccountError::SessionInvalid)?;

    let use_case = CheckSessionUseCase::new(store.clone(), config.clone());
    use_case.execute(&token).await
}

/// Resolve the caller and require the Admin role.
///
/// An authenticated non-admin gets `Forbidden`, distinct from the
/// `SessionInvalid` an unauthenticated caller gets.
pub async fn require_admin<R>(
    store: &Arc<R>,
    config: &Arc<AccountConfig>,
    headers: &HeaderMap,
) -> AccountResult<Account>
where
    R: AccountRepository + RoleRepository + Clone + Send + Sync + 'static,
{
    let account = authenticate(store, config, headers).await?;

    if !store.has_role(&account.account_id, &Role::admin()).await? {
        return Err(AccountError::Forbidden);
    }

    Ok(account)
}

fn extract_bearer(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    value
        .strip_prefix("Bearer ")
        .map(|token| token.trim().to_string())
}
