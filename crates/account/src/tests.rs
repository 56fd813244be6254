//! End-to-end scenario tests against the in-memory store.
//!
//! These exercise the use cases the way the HTTP layer drives them,
//! including the failure paths a client could mine for account existence.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use kernel::id::AccountId;
use uuid::Uuid;

use crate::application::{
    validate_bearer_token, AccountConfig, AdminUseCase, ChangePasswordInput,
    ChangePasswordUseCase, CompleteResetInput, CompleteResetUseCase, ConfirmEmailInput,
    ConfirmEmailUseCase, IssueTokenInput, IssueTokenUseCase, RegisterInput, RegisterUseCase,
    RequestResetUseCase, SignInInput, SignInUseCase, UpdateProfileInput, UpdateProfileUseCase,
};
use crate::domain::entity::Account;
use crate::domain::one_time_token::{OneTimeTokenService, TokenPurpose};
use crate::domain::repository::{AccountRepository, RoleRepository};
use crate::domain::value_object::{Email, Role};
use crate::error::{AccountError, AccountResult};
use crate::infra::memory::{InMemoryAccountStore, RecordingNotifier};
use crate::presentation::dto::{ConfirmEmailRequest, LoginRequest};
use crate::presentation::handlers::{confirm_email, login, AccountAppState};

struct Harness {
    store: Arc<InMemoryAccountStore>,
    notifier: Arc<RecordingNotifier>,
    config: Arc<AccountConfig>,
}

impl Harness {
    fn new() -> Self {
        Self {
            store: Arc::new(InMemoryAccountStore::new()),
            notifier: Arc::new(RecordingNotifier::new()),
            config: Arc::new(AccountConfig::development()),
        }
    }

    async fn register(&self, email: &str, password: &str) -> Result<String, AccountError> {
        let use_case = RegisterUseCase::new(
            self.store.clone(),
            self.notifier.clone(),
            self.config.clone(),
        );
        let output = use_case
            .execute(RegisterInput {
                email: email.to_string(),
                password: password.to_string(),
                first_name: "Alice".to_string(),
                last_name: "Smith".to_string(),
                address: None,
                phone_number: None,
            })
            .await?;
        Ok(output.account_id)
    }

    async fn account(&self, email: &str) -> Account {
        self.store
            .find_by_email(&Email::new(email).unwrap())
            .await
            .unwrap()
            .expect("account should exist")
    }

    /// Mint a token exactly as the registration/reset mails would carry it.
    fn mint_token(&self, account: &Account, purpose: TokenPurpose) -> String {
        let tokens = OneTimeTokenService::new(self.config.token_secret);
        let ttl = match purpose {
            TokenPurpose::ConfirmEmail => self.config.confirm_token_ttl,
            TokenPurpose::ResetPassword => self.config.reset_token_ttl,
        };
        tokens.issue(account, purpose, ttl)
    }

    async fn confirm(&self, email: &str) -> Result<(), AccountError> {
        let account = self.account(email).await;
        let token = self.mint_token(&account, TokenPurpose::ConfirmEmail);
        let use_case = ConfirmEmailUseCase::new(self.store.clone(), self.config.clone());
        use_case
            .execute(ConfirmEmailInput {
                account_id: account.account_id,
                token,
            })
            .await
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<String, AccountError> {
        let use_case = SignInUseCase::new(self.store.clone(), self.config.clone());
        let output = use_case
            .execute(SignInInput {
                email: email.to_string(),
                password: password.to_string(),
                remember_me: false,
            })
            .await?;
        Ok(output.session_token)
    }

    fn state(&self) -> AccountAppState<InMemoryAccountStore, RecordingNotifier> {
        AccountAppState {
            store: self.store.clone(),
            notifier: self.notifier.clone(),
            config: self.config.clone(),
        }
    }
}

/// Delegating store whose conditional writes report a stale security stamp
/// a fixed number of times before landing.
#[derive(Clone)]
struct ContendedStore {
    inner: Arc<InMemoryAccountStore>,
    stale_writes: Arc<AtomicUsize>,
}

impl AccountRepository for ContendedStore {
    async fn insert(&self, account: &Account) -> AccountResult<()> {
        self.inner.insert(account).await
    }

    async fn find_by_id(&self, account_id: &AccountId) -> AccountResult<Option<Account>> {
        self.inner.find_by_id(account_id).await
    }

    async fn find_by_email(&self, email: &Email) -> AccountResult<Option<Account>> {
        self.inner.find_by_email(email).await
    }

    async fn update(&self, account: &Account, expected_stamp: &Uuid) -> AccountResult<bool> {
        if self.stale_writes.load(Ordering::SeqCst) > 0 {
            self.stale_writes.fetch_sub(1, Ordering::SeqCst);
            return Ok(false);
        }
        self.inner.update(account, expected_stamp).await
    }

    async fn delete(&self, account_id: &AccountId) -> AccountResult<bool> {
        self.inner.delete(account_id).await
    }

    async fn list_all(&self) -> AccountResult<Vec<Account>> {
        self.inner.list_all().await
    }
}

// ============================================================================
// Registration
// ============================================================================

#[tokio::test]
async fn test_register_creates_unconfirmed_account_and_sends_mail() {
    let h = Harness::new();
    h.register("alice@example.com", "pw123456").await.unwrap();

    let account = h.account("alice@example.com").await;
    assert!(!account.email_confirmed);

    let sent = h.notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "alice@example.com");
    assert_eq!(sent[0].subject, "Email Confirmation");
    assert!(sent[0].html_body.contains(&account.account_id.to_string()));
}

#[tokio::test]
async fn test_duplicate_email_is_case_insensitive() {
    let h = Harness::new();
    h.register("alice@example.com", "pw123456").await.unwrap();

    let err = h.register("  ALICE@Example.COM ", "pw123456").await;
    assert!(matches!(err, Err(AccountError::DuplicateAccount)));
}

#[tokio::test]
async fn test_concurrent_duplicate_registration_has_one_winner() {
    let h = Harness::new();
    let (a, b) = tokio::join!(
        h.register("race@example.com", "pw123456"),
        h.register("race@example.com", "pw123456"),
    );
    let successes = [&a, &b].iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1, "exactly one racer may create the account");
    for r in [a, b] {
        if let Err(e) = r {
            assert!(matches!(e, AccountError::DuplicateAccount));
        }
    }
}

#[tokio::test]
async fn test_register_rejects_short_password() {
    let h = Harness::new();
    let err = h.register("alice@example.com", "pw1").await;
    assert!(matches!(err, Err(AccountError::PasswordPolicy(_))));
}

// ============================================================================
// Email confirmation
// ============================================================================

#[tokio::test]
async fn test_confirm_then_replay_fails() {
    let h = Harness::new();
    h.register("alice@example.com", "pw123456").await.unwrap();

    let account = h.account("alice@example.com").await;
    let token = h.mint_token(&account, TokenPurpose::ConfirmEmail);

    let use_case = ConfirmEmailUseCase::new(h.store.clone(), h.config.clone());
    use_case
        .execute(ConfirmEmailInput {
            account_id: account.account_id,
            token: token.clone(),
        })
        .await
        .unwrap();

    assert!(h.account("alice@example.com").await.email_confirmed);

    // Same token again: the stamp has moved, so it is spent
    let replay = use_case
        .execute(ConfirmEmailInput {
            account_id: account.account_id,
            token,
        })
        .await;
    assert!(matches!(replay, Err(AccountError::InvalidToken)));
}

#[tokio::test]
async fn test_concurrent_confirmation_has_one_winner() {
    let h = Harness::new();
    h.register("alice@example.com", "pw123456").await.unwrap();

    let account = h.account("alice@example.com").await;
    let token = h.mint_token(&account, TokenPurpose::ConfirmEmail);

    let use_case = ConfirmEmailUseCase::new(h.store.clone(), h.config.clone());
    let (a, b) = tokio::join!(
        use_case.execute(ConfirmEmailInput {
            account_id: account.account_id,
            token: token.clone(),
        }),
        use_case.execute(ConfirmEmailInput {
            account_id: account.account_id,
            token: token.clone(),
        }),
    );

    // The stamp rotates exactly once, so one redeemer spends the token and
    // the other sees it as dead
    let successes = [&a, &b].iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1, "exactly one redeemer may spend the token");
    for r in [a, b] {
        if let Err(e) = r {
            assert!(matches!(e, AccountError::InvalidToken));
        }
    }
    assert!(h.account("alice@example.com").await.email_confirmed);
}

#[tokio::test]
async fn test_confirm_with_malformed_account_id_is_not_found() {
    let h = Harness::new();
    h.register("alice@example.com", "pw123456").await.unwrap();

    let result = confirm_email(
        State(h.state()),
        Json(ConfirmEmailRequest {
            account_id: "not-a-uuid".to_string(),
            token: "whatever".to_string(),
        }),
    )
    .await;
    assert!(matches!(result, Err(AccountError::NotFound)));
}

#[tokio::test]
async fn test_confirm_with_foreign_token_fails() {
    let h = Harness::new();
    h.register("alice@example.com", "pw123456").await.unwrap();
    h.register("bob@example.com", "pw123456").await.unwrap();

    let alice = h.account("alice@example.com").await;
    let bob = h.account("bob@example.com").await;
    let bobs_token = h.mint_token(&bob, TokenPurpose::ConfirmEmail);

    let use_case = ConfirmEmailUseCase::new(h.store.clone(), h.config.clone());
    let result = use_case
        .execute(ConfirmEmailInput {
            account_id: alice.account_id,
            token: bobs_token,
        })
        .await;
    assert!(matches!(result, Err(AccountError::InvalidToken)));
}

// ============================================================================
// Interactive login
// ============================================================================

#[tokio::test]
async fn test_login_requires_confirmed_email() {
    let h = Harness::new();
    h.register("alice@example.com", "pw123456").await.unwrap();

    let before = h.sign_in("alice@example.com", "pw123456").await;
    assert!(matches!(before, Err(AccountError::AccountNotConfirmed)));

    h.confirm("alice@example.com").await.unwrap();

    let after = h.sign_in("alice@example.com", "pw123456").await;
    assert!(after.is_ok());
}

#[tokio::test]
async fn test_login_failures_do_not_reveal_account_existence() {
    let h = Harness::new();
    h.register("alice@example.com", "pw123456").await.unwrap();
    h.confirm("alice@example.com").await.unwrap();

    let unknown = h.sign_in("nobody@example.com", "pw123456").await;
    let wrong_pw = h.sign_in("alice@example.com", "wrong-password").await;

    assert!(matches!(unknown, Err(AccountError::InvalidCredentials)));
    assert!(matches!(wrong_pw, Err(AccountError::InvalidCredentials)));
}

#[tokio::test]
async fn test_login_sets_session_cookie_with_short_ttl() {
    let h = Harness::new();
    h.register("alice@example.com", "pw123456").await.unwrap();
    h.confirm("alice@example.com").await.unwrap();

    let response = login(
        State(h.state()),
        Json(LoginRequest {
            email: "alice@example.com".to_string(),
            password: "pw123456".to_string(),
            remember_me: false,
        }),
    )
    .await
    .into_response();

    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .expect("login must set the session cookie")
        .to_string();
    assert!(cookie.starts_with(&format!("{}=", h.config.session_cookie_name)));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains(&format!("Max-Age={}", h.config.session_ttl_short.as_secs())));
}

#[tokio::test]
async fn test_login_accepts_uncanonical_email_form() {
    let h = Harness::new();
    h.register("alice@example.com", "pw123456").await.unwrap();
    h.confirm("alice@example.com").await.unwrap();

    assert!(h.sign_in(" Alice@EXAMPLE.com ", "pw123456").await.is_ok());
}

// ============================================================================
// API tokens
// ============================================================================

#[tokio::test]
async fn test_api_token_does_not_require_confirmation() {
    let h = Harness::new();
    h.register("alice@example.com", "pw123456").await.unwrap();

    // Interactive login is blocked, the API path is not
    assert!(matches!(
        h.sign_in("alice@example.com", "pw123456").await,
        Err(AccountError::AccountNotConfirmed)
    ));

    let use_case = IssueTokenUseCase::new(h.store.clone(), h.config.clone());
    let output = use_case
        .execute(IssueTokenInput {
            email: "alice@example.com".to_string(),
            password: "pw123456".to_string(),
        })
        .await
        .unwrap();

    let claims = validate_bearer_token(&h.config, &output.token).unwrap();
    assert_eq!(claims.sub, "alice@example.com");
    assert_eq!(claims.exp, output.expiration);
}

#[tokio::test]
async fn test_repeated_issuance_yields_distinct_tokens() {
    let h = Harness::new();
    h.register("alice@example.com", "pw123456").await.unwrap();

    let use_case = IssueTokenUseCase::new(h.store.clone(), h.config.clone());
    let input = || IssueTokenInput {
        email: "alice@example.com".to_string(),
        password: "pw123456".to_string(),
    };
    let first = use_case.execute(input()).await.unwrap();
    let second = use_case.execute(input()).await.unwrap();

    let jti_a = validate_bearer_token(&h.config, &first.token).unwrap().jti;
    let jti_b = validate_bearer_token(&h.config, &second.token).unwrap().jti;
    assert_ne!(jti_a, jti_b);
}

#[tokio::test]
async fn test_api_token_rejects_bad_credentials() {
    let h = Harness::new();
    h.register("alice@example.com", "pw123456").await.unwrap();

    let use_case = IssueTokenUseCase::new(h.store.clone(), h.config.clone());
    let result = use_case
        .execute(IssueTokenInput {
            email: "alice@example.com".to_string(),
            password: "wrong-password".to_string(),
        })
        .await;
    assert!(matches!(result, Err(AccountError::InvalidCredentials)));
}

// ============================================================================
// Password change and recovery
// ============================================================================

#[tokio::test]
async fn test_change_password_requires_current_password() {
    let h = Harness::new();
    h.register("alice@example.com", "pw123456").await.unwrap();
    h.confirm("alice@example.com").await.unwrap();
    let account = h.account("alice@example.com").await;

    let use_case = ChangePasswordUseCase::new(h.store.clone(), h.config.clone());

    let bad = use_case
        .execute(ChangePasswordInput {
            account_id: account.account_id,
            old_password: "wrong-password".to_string(),
            new_password: "newpass99".to_string(),
        })
        .await;
    assert!(matches!(bad, Err(AccountError::InvalidCredentials)));

    use_case
        .execute(ChangePasswordInput {
            account_id: account.account_id,
            old_password: "pw123456".to_string(),
            new_password: "newpass99".to_string(),
        })
        .await
        .unwrap();

    assert!(matches!(
        h.sign_in("alice@example.com", "pw123456").await,
        Err(AccountError::InvalidCredentials)
    ));
    assert!(h.sign_in("alice@example.com", "newpass99").await.is_ok());
}

#[tokio::test]
async fn test_recover_for_unknown_email_is_silent() {
    let h = Harness::new();
    let use_case =
        RequestResetUseCase::new(h.store.clone(), h.notifier.clone(), h.config.clone());

    use_case.execute("nobody@example.com").await.unwrap();
    use_case.execute("not even an email").await.unwrap();
    assert!(h.notifier.sent().is_empty());
}

#[tokio::test]
async fn test_reset_flow_installs_new_password_and_spends_token() {
    let h = Harness::new();
    h.register("alice@example.com", "pw123456").await.unwrap();
    h.confirm("alice@example.com").await.unwrap();

    let account = h.account("alice@example.com").await;
    let token = h.mint_token(&account, TokenPurpose::ResetPassword);

    let use_case = CompleteResetUseCase::new(h.store.clone(), h.config.clone());
    use_case
        .execute(CompleteResetInput {
            email: "alice@example.com".to_string(),
            token: token.clone(),
            new_password: "newpass99".to_string(),
        })
        .await
        .unwrap();

    assert!(h.sign_in("alice@example.com", "newpass99").await.is_ok());
    assert!(matches!(
        h.sign_in("alice@example.com", "pw123456").await,
        Err(AccountError::InvalidCredentials)
    ));

    // The reset token died with the stamp rotation
    let replay = use_case
        .execute(CompleteResetInput {
            email: "alice@example.com".to_string(),
            token,
            new_password: "another99".to_string(),
        })
        .await;
    assert!(matches!(replay, Err(AccountError::InvalidToken)));
}

#[tokio::test]
async fn test_reset_with_unknown_email_looks_like_bad_token() {
    let h = Harness::new();
    let use_case = CompleteResetUseCase::new(h.store.clone(), h.config.clone());
    let result = use_case
        .execute(CompleteResetInput {
            email: "nobody@example.com".to_string(),
            token: "whatever".to_string(),
            new_password: "newpass99".to_string(),
        })
        .await;
    assert!(matches!(result, Err(AccountError::InvalidToken)));
}

// ============================================================================
// Profile
// ============================================================================

#[tokio::test]
async fn test_update_profile_keeps_tokens_valid() {
    let h = Harness::new();
    h.register("alice@example.com", "pw123456").await.unwrap();

    let account = h.account("alice@example.com").await;
    let token = h.mint_token(&account, TokenPurpose::ConfirmEmail);

    let use_case = UpdateProfileUseCase::new(h.store.clone());
    use_case
        .execute(UpdateProfileInput {
            account_id: account.account_id,
            first_name: "Alicia".to_string(),
            last_name: "Smith".to_string(),
            address: Some("1 Main St".to_string()),
            phone_number: None,
        })
        .await
        .unwrap();

    let updated = h.account("alice@example.com").await;
    assert_eq!(updated.first_name, "Alicia");
    assert_eq!(updated.security_stamp, account.security_stamp);

    // No credential change, so the earlier confirmation token still works
    let confirm = ConfirmEmailUseCase::new(h.store.clone(), h.config.clone());
    confirm
        .execute(ConfirmEmailInput {
            account_id: account.account_id,
            token,
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn test_update_profile_retries_a_lost_stamp_race() {
    let h = Harness::new();
    h.register("alice@example.com", "pw123456").await.unwrap();
    let account = h.account("alice@example.com").await;

    // One stale write, as if a concurrent credential change rotated the
    // stamp between read and write
    let store = Arc::new(ContendedStore {
        inner: h.store.clone(),
        stale_writes: Arc::new(AtomicUsize::new(1)),
    });

    let use_case = UpdateProfileUseCase::new(store.clone());
    use_case
        .execute(UpdateProfileInput {
            account_id: account.account_id,
            first_name: "Alicia".to_string(),
            last_name: "Smith".to_string(),
            address: None,
            phone_number: None,
        })
        .await
        .unwrap();

    assert_eq!(store.stale_writes.load(Ordering::SeqCst), 0);
    assert_eq!(h.account("alice@example.com").await.first_name, "Alicia");
}

#[tokio::test]
async fn test_update_profile_gives_up_after_one_retry() {
    let h = Harness::new();
    h.register("alice@example.com", "pw123456").await.unwrap();
    let account = h.account("alice@example.com").await;

    let store = Arc::new(ContendedStore {
        inner: h.store.clone(),
        stale_writes: Arc::new(AtomicUsize::new(2)),
    });

    let use_case = UpdateProfileUseCase::new(store.clone());
    let result = use_case
        .execute(UpdateProfileInput {
            account_id: account.account_id,
            first_name: "Alicia".to_string(),
            last_name: "Smith".to_string(),
            address: None,
            phone_number: None,
        })
        .await;
    assert!(matches!(result, Err(AccountError::Internal(_))));
}

// ============================================================================
// Administration
// ============================================================================

#[tokio::test]
async fn test_listing_orders_by_name_and_flags_admins() {
    let h = Harness::new();
    let admin_use_case = AdminUseCase::new(h.store.clone());

    let use_case = RegisterUseCase::new(h.store.clone(), h.notifier.clone(), h.config.clone());
    for (email, first, last) in [
        ("carol@example.com", "Carol", "Young"),
        ("bob@example.com", "Bob", "Adams"),
        ("bea@example.com", "Bob", "Aaron"),
    ] {
        use_case
            .execute(RegisterInput {
                email: email.to_string(),
                password: "pw123456".to_string(),
                first_name: first.to_string(),
                last_name: last.to_string(),
                address: None,
                phone_number: None,
            })
            .await
            .unwrap();
    }

    let carol = h.account("carol@example.com").await;
    admin_use_case
        .grant_role(&carol.account_id, &Role::admin())
        .await
        .unwrap();

    let listing = admin_use_case.list_accounts().await.unwrap();
    let names: Vec<String> = listing.iter().map(|s| s.account.full_name()).collect();
    assert_eq!(names, ["Bob Aaron", "Bob Adams", "Carol Young"]);

    let flags: Vec<bool> = listing.iter().map(|s| s.is_admin).collect();
    assert_eq!(flags, [false, false, true]);
}

#[tokio::test]
async fn test_role_grant_and_revoke_are_idempotent() {
    let h = Harness::new();
    h.register("alice@example.com", "pw123456").await.unwrap();
    let account = h.account("alice@example.com").await;

    let use_case = AdminUseCase::new(h.store.clone());
    let admin = Role::admin();

    use_case.grant_role(&account.account_id, &admin).await.unwrap();
    use_case.grant_role(&account.account_id, &admin).await.unwrap();
    assert!(h
        .store
        .has_role(&account.account_id, &admin)
        .await
        .unwrap());

    use_case.revoke_role(&account.account_id, &admin).await.unwrap();
    use_case.revoke_role(&account.account_id, &admin).await.unwrap();
    assert!(!h
        .store
        .has_role(&account.account_id, &admin)
        .await
        .unwrap());
}

#[tokio::test]
async fn test_delete_account_invalidates_session() {
    let h = Harness::new();
    h.register("alice@example.com", "pw123456").await.unwrap();
    h.confirm("alice@example.com").await.unwrap();

    let session = h.sign_in("alice@example.com", "pw123456").await.unwrap();
    let account = h.account("alice@example.com").await;

    let use_case = AdminUseCase::new(h.store.clone());
    use_case.delete_account(&account.account_id).await.unwrap();

    // The artifact still verifies cryptographically but names no account
    let check = crate::application::CheckSessionUseCase::new(h.store.clone(), h.config.clone());
    let result = check.execute(&session).await;
    assert!(matches!(result, Err(AccountError::SessionInvalid)));

    let again = use_case.delete_account(&account.account_id).await;
    assert!(matches!(again, Err(AccountError::NotFound)));
}
