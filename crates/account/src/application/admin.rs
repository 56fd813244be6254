//! Admin Use Cases
//!
//! Account administration: listing, role toggling and deletion. The HTTP
//! layer gates these behind the Admin role before anything here runs.

use std::sync::Arc;

use crate::domain::entity::Account;
use crate::domain::repository::{AccountRepository, RoleRepository};
use crate::domain::value_object::Role;
use crate::error::{AccountError, AccountResult};
use kernel::id::AccountId;

/// Account plus its admin flag, as shown in the management listing
pub struct AccountSummary {
    pub account: Account,
    pub is_admin: bool,
}

/// Admin use case
pub struct AdminUseCase<R>
where
    R: AccountRepository + RoleRepository,
{
    store: Arc<R>,
}

impl<R> AdminUseCase<R>
where
    R: AccountRepository + RoleRepository,
{
    pub fn new(store: Arc<R>) -> Self {
        Self { store }
    }

    /// All accounts ordered by first name then last name, each annotated
    /// with whether it holds the Admin role.
    pub async fn list_accounts(&self) -> AccountResult<Vec<AccountSummary>> {
        let accounts = self.store.list_all().await?;
        let admin = Role::admin();

        let mut summaries = Vec::with_capacity(accounts.len());
        for account in accounts {
            let is_admin = self.store.has_role(&account.account_id, &admin).await?;
            summaries.push(AccountSummary { account, is_admin });
        }
        Ok(summaries)
    }

    /// Grant a role. Creates the role on first use; granting an
    /// already-held role is a no-op.
    pub async fn grant_role(&self, account_id: &AccountId, role: &Role) -> AccountResult<()> {
        self.require_account(account_id).await?;
        self.store.assign_role(account_id, role).await?;
        tracing::info!(account_id = %account_id, role = %role, "Role granted");
        Ok(())
    }

    /// Revoke a role. Revoking an unheld role is a no-op.
    pub async fn revoke_role(&self, account_id: &AccountId, role: &Role) -> AccountResult<()> {
        self.require_account(account_id).await?;
        self.store.unassign_role(account_id, role).await?;
        tracing::info!(account_id = %account_id, role = %role, "Role revoked");
        Ok(())
    }

    /// Delete an account and its role assignments.
    pub async fn delete_account(&self, account_id: &AccountId) -> AccountResult<()> {
        if !self.store.delete(account_id).await? {
            return Err(AccountError::NotFound);
        }
        tracing::info!(account_id = %account_id, "Account deleted");
        Ok(())
    }

    async fn require_account(&self, account_id: &AccountId) -> AccountResult<()> {
        if self.store.find_by_id(account_id).await?.is_none() {
            return Err(AccountError::NotFound);
        }
        Ok(())
    }
}
