//! In-Memory Store and Notifiers
//!
//! `InMemoryAccountStore` backs the scenario tests and local development
//! without Postgres. All invariants the SQL schema enforces (unique email,
//! stamp-conditioned updates, cascading role cleanup) are enforced here
//! under a single `RwLock`, so the same race-losing semantics apply.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, RwLock};

use uuid::Uuid;

use crate::domain::entity::Account;
use crate::domain::repository::{AccountRepository, Notifier, RoleRepository};
use crate::domain::value_object::{Email, Role};
use crate::error::{AccountError, AccountResult};
use kernel::id::AccountId;

#[derive(Default)]
struct StoreState {
    accounts: HashMap<Uuid, Account>,
    roles: HashSet<String>,
    assignments: HashSet<(Uuid, String)>,
}

/// In-memory account and role store
#[derive(Clone, Default)]
pub struct InMemoryAccountStore {
    state: Arc<RwLock<StoreState>>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_read(&self) -> AccountResult<std::sync::RwLockReadGuard<'_, StoreState>> {
        self.state
            .read()
            .map_err(|_| AccountError::Internal("Store lock poisoned".to_string()))
    }

    fn lock_write(&self) -> AccountResult<std::sync::RwLockWriteGuard<'_, StoreState>> {
        self.state
            .write()
            .map_err(|_| AccountError::Internal("Store lock poisoned".to_string()))
    }
}

impl AccountRepository for InMemoryAccountStore {
    async fn insert(&self, account: &Account) -> AccountResult<()> {
        let mut state = self.lock_write()?;
        // Check and insert under one write lock; racing inserts serialize
        if state
            .accounts
            .values()
            .any(|a| a.email == account.email)
        {
            return Err(AccountError::DuplicateAccount);
        }
        state
            .accounts
            .insert(*account.account_id.as_uuid(), account.clone());
        Ok(())
    }

    async fn find_by_id(&self, account_id: &AccountId) -> AccountResult<Option<Account>> {
        let state = self.lock_read()?;
        Ok(state.accounts.get(account_id.as_uuid()).cloned())
    }

    async fn find_by_email(&self, email: &Email) -> AccountResult<Option<Account>> {
        let state = self.lock_read()?;
        Ok(state.accounts.values().find(|a| &a.email == email).cloned())
    }

    async fn update(&self, account: &Account, expected_stamp: &Uuid) -> AccountResult<bool> {
        let mut state = self.lock_write()?;
        match state.accounts.get_mut(account.account_id.as_uuid()) {
            Some(stored) if &stored.security_stamp == expected_stamp => {
                *stored = account.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete(&self, account_id: &AccountId) -> AccountResult<bool> {
        let mut state = self.lock_write()?;
        let existed = state.accounts.remove(account_id.as_uuid()).is_some();
        if existed {
            state
                .assignments
                .retain(|(id, _)| id != account_id.as_uuid());
        }
        Ok(existed)
    }

    async fn list_all(&self) -> AccountResult<Vec<Account>> {
        let state = self.lock_read()?;
        let mut accounts: Vec<Account> = state.accounts.values().cloned().collect();
        accounts.sort_by(|a, b| {
            a.first_name
                .cmp(&b.first_name)
                .then_with(|| a.last_name.cmp(&b.last_name))
        });
        Ok(accounts)
    }
}

impl RoleRepository for InMemoryAccountStore {
    async fn ensure_role(&self, role: &Role) -> AccountResult<()> {
        let mut state = self.lock_write()?;
        state.roles.insert(role.as_str().to_string());
        Ok(())
    }

    async fn assign_role(&self, account_id: &AccountId, role: &Role) -> AccountResult<()> {
        let mut state = self.lock_write()?;
        state.roles.insert(role.as_str().to_string());
        state
            .assignments
            .insert((*account_id.as_uuid(), role.as_str().to_string()));
        Ok(())
    }

    async fn unassign_role(&self, account_id: &AccountId, role: &Role) -> AccountResult<()> {
        let mut state = self.lock_write()?;
        state
            .assignments
            .remove(&(*account_id.as_uuid(), role.as_str().to_string()));
        Ok(())
    }

    async fn has_role(&self, account_id: &AccountId, role: &Role) -> AccountResult<bool> {
        let state = self.lock_read()?;
        Ok(state
            .assignments
            .contains(&(*account_id.as_uuid(), role.as_str().to_string())))
    }
}

/// Notifier that logs instead of sending.
///
/// The default for development; mail content lands in the log stream.
#[derive(Clone, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> AccountResult<()> {
        tracing::info!(to = %to, subject = %subject, body_len = html_body.len(), "Outbound mail");
        Ok(())
    }
}

/// A message captured by [`RecordingNotifier`]
#[derive(Debug, Clone)]
pub struct OutboundMail {
    pub to: String,
    pub subject: String,
    pub html_body: String,
}

/// Notifier that records messages for inspection in tests.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<OutboundMail>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<OutboundMail> {
        self.sent.lock().map(|m| m.clone()).unwrap_or_default()
    }
}

impl Notifier for RecordingNotifier {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> AccountResult<()> {
        let mut sent = self
            .sent
            .lock()
            .map_err(|_| AccountError::Internal("Notifier lock poisoned".to_string()))?;
        sent.push(OutboundMail {
            to: to.to_string(),
            subject: subject.to_string(),
            html_body: html_body.to_string(),
        });
        Ok(())
    }
}
