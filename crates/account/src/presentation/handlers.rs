//! HTTP Handlers

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use std::sync::Arc;

use crate::application::config::AccountConfig;
use crate::application::{
    AdminUseCase, ChangePasswordInput, ChangePasswordUseCase, CompleteResetInput,
    CompleteResetUseCase, ConfirmEmailInput, ConfirmEmailUseCase, IssueTokenInput,
    IssueTokenUseCase, RegisterInput, RegisterUseCase, RequestResetUseCase, SignInInput,
    SignInUseCase, UpdateProfileInput, UpdateProfileUseCase,
};
use crate::domain::repository::{AccountRepository, Notifier, RoleRepository};
use crate::domain::value_object::Role;
use crate::error::{AccountError, AccountResult};
use crate::presentation::dto::{
    AccountListItem, ChangePasswordRequest, ConfirmEmailQuery, ConfirmEmailRequest, LoginRequest,
    LoginResponse, RecoverPasswordRequest, RegisterRequest, RegisterResponse, ResetPasswordRequest,
    RoleRequest, SessionStatusResponse, TokenRequest, TokenResponse, UpdateProfileRequest,
};
use crate::presentation::middleware::{authenticate, require_admin};
use kernel::id::AccountId;

/// Shared state for account handlers
#[derive(Clone)]
pub struct AccountAppState<R, N>
where
    R: AccountRepository + RoleRepository + Clone + Send + Sync + 'static,
    N: Notifier + Clone + Send + Sync + 'static,
{
    pub store: Arc<R>,
    pub notifier: Arc<N>,
    pub config: Arc<AccountConfig>,
}

// ============================================================================
// Register
// ============================================================================

/// POST /account/register
pub async fn register<R, N>(
    State(state): State<AccountAppState<R, N>>,
    Json(req): Json<RegisterRequest>,
) -> AccountResult<impl IntoResponse>
where
    R: AccountRepository + RoleRepository + Clone + Send + Sync + 'static,
    N: Notifier + Clone + Send + Sync + 'static,
{
    let use_case = RegisterUseCase::new(
        state.store.clone(),
        state.notifier.clone(),
        state.config.clone(),
    );

    let input = RegisterInput {
        email: req.email,
        password: req.password,
        first_name: req.first_name,
        last_name: req.last_name,
        address: req.address,
        phone_number: req.phone_number,
    };

    let output = use_case.execute(input).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            account_id: output.account_id,
            email: output.email,
        }),
    ))
}

// ============================================================================
// Confirm Email
// ============================================================================

/// POST /account/confirm-email
pub async fn confirm_email<R, N>(
    State(state): State<AccountAppState<R, N>>,
    Json(req): Json<ConfirmEmailRequest>,
) -> AccountResult<StatusCode>
where
    R: AccountRepository + RoleRepository + Clone + Send + Sync + 'static,
    N: Notifier + Clone + Send + Sync + 'static,
{
    run_confirm_email(&state, &req.account_id, req.token).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /account/confirm-email (the link carried in the confirmation mail)
pub async fn confirm_email_link<R, N>(
    State(state): State<AccountAppState<R, N>>,
    Query(query): Query<ConfirmEmailQuery>,
) -> AccountResult<StatusCode>
where
    R: AccountRepository + RoleRepository + Clone + Send + Sync + 'static,
    N: Notifier + Clone + Send + Sync + 'static,
{
    run_confirm_email(&state, &query.account_id, query.token).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn run_confirm_email<R, N>(
    state: &AccountAppState<R, N>,
    account_id: &str,
    token: String,
) -> AccountResult<()>
where
    R: AccountRepository + RoleRepository + Clone + Send + Sync + 'static,
    N: Notifier + Clone + Send + Sync + 'static,
{
    // An id that does not parse cannot name an account, same outcome as a
    // resolved-but-missing one
    let account_id = AccountId::parse(account_id).map_err(|_| AccountError::NotFound)?;

    let use_case = ConfirmEmailUseCase::new(state.store.clone(), state.config.clone());
    use_case.execute(ConfirmEmailInput { account_id, token }).await
}

// ============================================================================
// Login / Logout / Status
// ============================================================================

/// POST /account/login
pub async fn login<R, N>(
    State(state): State<AccountAppState<R, N>>,
    Json(req): Json<LoginRequest>,
) -> AccountResult<impl IntoResponse>
where
    R: AccountRepository + RoleRepository + Clone + Send + Sync + 'static,
    N: Notifier + Clone + Send + Sync + 'static,
{
    let use_case = SignInUseCase::new(state.store.clone(), state.config.clone());

    let remember_me = req.remember_me;
    let input = SignInInput {
        email: req.email,
        password: req.password,
        remember_me,
    };

    let output = use_case.execute(input).await?;

    // Cookie Max-Age must match remember_me
    let cookie = build_session_cookie(&state.config, &output.session_token, remember_me);

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(LoginResponse {
            account_id: output.account_id,
            email: output.email,
            expires_at_ms: output.expires_at_ms,
        }),
    ))
}

/// POST /account/logout
///
/// Clears the cookie. The artifact itself is stateless, so there is
/// nothing server-side to revoke.
pub async fn logout<R, N>(
    State(state): State<AccountAppState<R, N>>,
) -> AccountResult<impl IntoResponse>
where
    R: AccountRepository + RoleRepository + Clone + Send + Sync + 'static,
    N: Notifier + Clone + Send + Sync + 'static,
{
    let cookie = build_clear_cookie(&state.config);
    Ok((StatusCode::NO_CONTENT, [(header::SET_COOKIE, cookie)]))
}

/// GET /account/status
pub async fn session_status<R, N>(
    State(state): State<AccountAppState<R, N>>,
    headers: HeaderMap,
) -> AccountResult<Json<SessionStatusResponse>>
where
    R: AccountRepository + RoleRepository + Clone + Send + Sync + 'static,
    N: Notifier + Clone + Send + Sync + 'static,
{
    match authenticate(&state.store, &state.config, &headers).await {
        Ok(account) => {
            let is_admin = state
                .store
                .has_role(&account.account_id, &Role::admin())
                .await?;
            Ok(Json(SessionStatusResponse {
                authenticated: true,
                account_id: Some(account.account_id.to_string()),
                email: Some(account.email.to_string()),
                is_admin: Some(is_admin),
            }))
        }
        Err(AccountError::SessionInvalid) => Ok(Json(SessionStatusResponse {
            authenticated: false,
            account_id: None,
            email: None,
            is_admin: None,
        })),
        Err(e) => Err(e),
    }
}

// ============================================================================
// API Tokens
// ============================================================================

/// POST /tokens
pub async fn create_token<R, N>(
    State(state): State<AccountAppState<R, N>>,
    Json(req): Json<TokenRequest>,
) -> AccountResult<impl IntoResponse>
where
    R: AccountRepository + RoleRepository + Clone + Send + Sync + 'static,
    N: Notifier + Clone + Send + Sync + 'static,
{
    let use_case = IssueTokenUseCase::new(state.store.clone(), state.config.clone());

    // This endpoint answers 400, not 401, on a bad credential; the message
    // stays generic either way
    let output = use_case
        .execute(IssueTokenInput {
            email: req.email,
            password: req.password,
        })
        .await
        .map_err(|e| match e {
            AccountError::InvalidCredentials => {
                AccountError::Validation("Invalid email or password".to_string())
            }
            other => other,
        })?;

    Ok((
        StatusCode::CREATED,
        Json(TokenResponse {
            token: output.token,
            expiration: output.expiration,
        }),
    ))
}

// ============================================================================
// Passwords
// ============================================================================

/// POST /account/password/change (requires authentication)
pub async fn change_password<R, N>(
    State(state): State<AccountAppState<R, N>>,
    headers: HeaderMap,
    Json(req): Json<ChangePasswordRequest>,
) -> AccountResult<StatusCode>
where
    R: AccountRepository + RoleRepository + Clone + Send + Sync + 'static,
    N: Notifier + Clone + Send + Sync + 'static,
{
    let caller = authenticate(&state.store, &state.config, &headers).await?;

    let use_case = ChangePasswordUseCase::new(state.store.clone(), state.config.clone());
    use_case
        .execute(ChangePasswordInput {
            account_id: caller.account_id,
            old_password: req.old_password,
            new_password: req.new_password,
        })
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /account/password/recover
///
/// Always answers 204 so the response carries no account-existence signal.
pub async fn recover_password<R, N>(
    State(state): State<AccountAppState<R, N>>,
    Json(req): Json<RecoverPasswordRequest>,
) -> AccountResult<StatusCode>
where
    R: AccountRepository + RoleRepository + Clone + Send + Sync + 'static,
    N: Notifier + Clone + Send + Sync + 'static,
{
    let use_case = RequestResetUseCase::new(
        state.store.clone(),
        state.notifier.clone(),
        state.config.clone(),
    );
    use_case.execute(&req.email).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /account/password/reset
pub async fn reset_password<R, N>(
    State(state): State<AccountAppState<R, N>>,
    Json(req): Json<ResetPasswordRequest>,
) -> AccountResult<StatusCode>
where
    R: AccountRepository + RoleRepository + Clone + Send + Sync + 'static,
    N: Notifier + Clone + Send + Sync + 'static,
{
    let use_case = CompleteResetUseCase::new(state.store.clone(), state.config.clone());
    use_case
        .execute(CompleteResetInput {
            email: req.email,
            token: req.token,
            new_password: req.new_password,
        })
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Profile
// ============================================================================

/// POST /account/profile (requires authentication)
pub async fn update_profile<R, N>(
    State(state): State<AccountAppState<R, N>>,
    headers: HeaderMap,
    Json(req): Json<UpdateProfileRequest>,
) -> AccountResult<StatusCode>
where
    R: AccountRepository + RoleRepository + Clone + Send + Sync + 'static,
    N: Notifier + Clone + Send + Sync + 'static,
{
    let caller = authenticate(&state.store, &state.config, &headers).await?;

    let use_case = UpdateProfileUseCase::new(state.store.clone());
    use_case
        .execute(UpdateProfileInput {
            account_id: caller.account_id,
            first_name: req.first_name,
            last_name: req.last_name,
            address: req.address,
            phone_number: req.phone_number,
        })
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Administration (requires the Admin role)
// ============================================================================

/// GET /accounts
pub async fn list_accounts<R, N>(
    State(state): State<AccountAppState<R, N>>,
    headers: HeaderMap,
) -> AccountResult<Json<Vec<AccountListItem>>>
where
    R: AccountRepository + RoleRepository + Clone + Send + Sync + 'static,
    N: Notifier + Clone + Send + Sync + 'static,
{
    require_admin(&state.store, &state.config, &headers).await?;

    let use_case = AdminUseCase::new(state.store.clone());
    let summaries = use_case.list_accounts().await?;

    let items = summaries
        .into_iter()
        .map(|s| AccountListItem {
            account_id: s.account.account_id.to_string(),
            email: s.account.email.to_string(),
            first_name: s.account.first_name,
            last_name: s.account.last_name,
            email_confirmed: s.account.email_confirmed,
            is_admin: s.is_admin,
        })
        .collect();

    Ok(Json(items))
}

/// POST /accounts/{id}/role/grant
pub async fn grant_role<R, N>(
    State(state): State<AccountAppState<R, N>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(req): Json<RoleRequest>,
) -> AccountResult<StatusCode>
where
    R: AccountRepository + RoleRepository + Clone + Send + Sync + 'static,
    N: Notifier + Clone + Send + Sync + 'static,
{
    require_admin(&state.store, &state.config, &headers).await?;

    let account_id = AccountId::parse(&id).map_err(|_| AccountError::NotFound)?;
    let role = Role::new(&req.role)?;

    let use_case = AdminUseCase::new(state.store.clone());
    use_case.grant_role(&account_id, &role).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /accounts/{id}/role/revoke
pub async fn revoke_role<R, N>(
    State(state): State<AccountAppState<R, N>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(req): Json<RoleRequest>,
) -> AccountResult<StatusCode>
where
    R: AccountRepository + RoleRepository + Clone + Send + Sync + 'static,
    N: Notifier + Clone + Send + Sync + 'static,
{
    require_admin(&state.store, &state.config, &headers).await?;

    let account_id = AccountId::parse(&id).map_err(|_| AccountError::NotFound)?;
    let role = Role::new(&req.role)?;

    let use_case = AdminUseCase::new(state.store.clone());
    use_case.revoke_role(&account_id, &role).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /accounts/{id}
pub async fn delete_account<R, N>(
    State(state): State<AccountAppState<R, N>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> AccountResult<StatusCode>
where
    R: AccountRepository + RoleRepository + Clone + Send + Sync + 'static,
    N: Notifier + Clone + Send + Sync + 'static,
{
    require_admin(&state.store, &state.config, &headers).await?;

    let account_id = AccountId::parse(&id).map_err(|_| AccountError::NotFound)?;

    let use_case = AdminUseCase::new(state.store.clone());
    use_case.delete_account(&account_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Helper Functions
// ============================================================================

fn build_session_cookie(config: &AccountConfig, token: &str, remember_me: bool) -> String {
    let max_age = if remember_me {
        config.session_ttl_long.as_secs()
    } else {
        config.session_ttl_short.as_secs()
    };

    config.cookie_config().build_set_cookie(token, max_age)
}

fn build_clear_cookie(config: &AccountConfig) -> String {
    config.cookie_config().build_delete_cookie()
}
