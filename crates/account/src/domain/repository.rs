//! Repository traits for the account domain.
//!
//! Infrastructure implements these; use cases depend only on the traits.
//! `trait_variant::make` generates Send-bounded variants usable across
//! await points in axum handlers.

use crate::domain::entity::Account;
use crate::domain::value_object::{Email, Role};
use crate::error::AccountResult;
use kernel::id::AccountId;
use uuid::Uuid;

/// Account persistence.
#[trait_variant::make(AccountRepository: Send)]
pub trait LocalAccountRepository {
    /// Insert a new account.
    ///
    /// The store enforces email uniqueness; a concurrent insert of the same
    /// canonical email fails with `AccountError::DuplicateAccount` for
    /// exactly one of the racers.
    async fn insert(&self, account: &Account) -> AccountResult<()>;

    async fn find_by_id(&self, account_id: &AccountId) -> AccountResult<Option<Account>>;

    async fn find_by_email(&self, email: &Email) -> AccountResult<Option<Account>>;

    /// Conditionally persist an updated account.
    ///
    /// The write only lands if the stored security stamp still equals
    /// `expected_stamp` (the value read before mutating). Returns `false`
    /// when another credential change won the race.
    async fn update(&self, account: &Account, expected_stamp: &Uuid) -> AccountResult<bool>;

    /// Delete an account and its role assignments. Returns `false` if no
    /// such account existed.
    async fn delete(&self, account_id: &AccountId) -> AccountResult<bool>;

    /// All accounts, ordered by first name then last name.
    async fn list_all(&self) -> AccountResult<Vec<Account>>;
}

/// Role persistence and assignment.
#[trait_variant::make(RoleRepository: Send)]
pub trait LocalRoleRepository {
    /// Create the role if it does not exist yet. Idempotent.
    async fn ensure_role(&self, role: &Role) -> AccountResult<()>;

    /// Assign a role to an account, creating the role first if needed.
    /// Assigning an already-held role is a no-op.
    async fn assign_role(&self, account_id: &AccountId, role: &Role) -> AccountResult<()>;

    /// Remove a role from an account. Removing an unheld role is a no-op.
    async fn unassign_role(&self, account_id: &AccountId, role: &Role) -> AccountResult<()>;

    async fn has_role(&self, account_id: &AccountId, role: &Role) -> AccountResult<bool>;
}

/// Outbound mail delivery.
///
/// Delivery is best-effort: callers log failures and never roll back the
/// operation that produced the message.
#[trait_variant::make(Notifier: Send)]
pub trait LocalNotifier {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> AccountResult<()>;
}
