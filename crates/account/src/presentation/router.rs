//! Account Router

use axum::{
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;

use crate::application::config::AccountConfig;
use crate::domain::repository::{AccountRepository, Notifier, RoleRepository};
use crate::infra::postgres::PgAccountStore;
use crate::infra::LogNotifier;
use crate::presentation::handlers::{self, AccountAppState};

/// Create the account router with the PostgreSQL store
pub fn account_router(store: PgAccountStore, config: AccountConfig) -> Router {
    account_router_generic(store, LogNotifier, config)
}

/// Create a generic account router for any store and notifier
pub fn account_router_generic<R, N>(store: R, notifier: N, config: AccountConfig) -> Router
where
    R: AccountRepository + RoleRepository + Clone + Send + Sync + 'static,
    N: Notifier + Clone + Send + Sync + 'static,
{
    let state = AccountAppState {
        store: Arc::new(store),
        notifier: Arc::new(notifier),
        config: Arc::new(config),
    };

    Router::new()
        .route("/account/register", post(handlers::register::<R, N>))
        .route(
            "/account/confirm-email",
            post(handlers::confirm_email::<R, N>).get(handlers::confirm_email_link::<R, N>),
        )
        .route("/account/login", post(handlers::login::<R, N>))
        .route("/account/logout", post(handlers::logout::<R, N>))
        .route("/account/status", get(handlers::session_status::<R, N>))
        .route("/account/profile", post(handlers::update_profile::<R, N>))
        .route(
            "/account/password/change",
            post(handlers::change_password::<R, N>),
        )
        .route(
            "/account/password/recover",
            post(handlers::recover_password::<R, N>),
        )
        .route(
            "/account/password/reset",
            post(handlers::reset_password::<R, N>),
        )
        .route("/tokens", post(handlers::create_token::<R, N>))
        .route("/accounts", get(handlers::list_accounts::<R, N>))
        .route("/accounts/{id}/role/grant", post(handlers::grant_role::<R, N>))
        .route(
            "/accounts/{id}/role/revoke",
            post(handlers::revoke_role::<R, N>),
        )
        .route("/accounts/{id}", delete(handlers::delete_account::<R, N>))
        .with_state(state)
}
