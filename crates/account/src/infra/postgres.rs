//! PostgreSQL Repository Implementations

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entity::Account;
use crate::domain::repository::{AccountRepository, RoleRepository};
use crate::domain::value_object::{Email, Role};
use crate::error::{AccountError, AccountResult};
use kernel::id::AccountId;
use platform::password::HashedPassword;

const UNIQUE_VIOLATION: &str = "23505";

/// PostgreSQL-backed account store
#[derive(Clone)]
pub struct PgAccountStore {
    pool: PgPool,
}

impl PgAccountStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// ============================================================================
// Account Repository Implementation
// ============================================================================

impl AccountRepository for PgAccountStore {
    async fn insert(&self, account: &Account) -> AccountResult<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO accounts (
                account_id,
                email,
                password_hash,
                security_stamp,
                email_confirmed,
                first_name,
                last_name,
                address,
                phone_number,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(account.account_id.as_uuid())
        .bind(account.email.as_str())
        .bind(account.password_hash.as_phc_string())
        .bind(account.security_stamp)
        .bind(account.email_confirmed)
        .bind(&account.first_name)
        .bind(&account.last_name)
        .bind(&account.address)
        .bind(&account.phone_number)
        .bind(account.created_at)
        .bind(account.updated_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) => {
                // The unique index on email is the duplicate-race arbiter
                if let sqlx::Error::Database(db_err) = &e {
                    if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) {
                        return Err(AccountError::DuplicateAccount);
                    }
                }
                Err(AccountError::Store(e))
            }
        }
    }

    async fn find_by_id(&self, account_id: &AccountId) -> AccountResult<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            SELECT
                account_id,
                email,
                password_hash,
                security_stamp,
                email_confirmed,
                first_name,
                last_name,
                address,
                phone_number,
                created_at,
                updated_at
            FROM accounts
            WHERE account_id = $1
            "#,
        )
        .bind(account_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_account()).transpose()
    }

    async fn find_by_email(&self, email: &Email) -> AccountResult<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            SELECT
                account_id,
                email,
                password_hash,
                security_stamp,
                email_confirmed,
                first_name,
                last_name,
                address,
                phone_number,
                created_at,
                updated_at
            FROM accounts
            WHERE email = $1
            "#,
        )
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_account()).transpose()
    }

    async fn update(&self, account: &Account, expected_stamp: &Uuid) -> AccountResult<bool> {
        let updated = sqlx::query(
            r#"
            UPDATE accounts SET
                password_hash = $1,
                security_stamp = $2,
                email_confirmed = $3,
                first_name = $4,
                last_name = $5,
                address = $6,
                phone_number = $7,
                updated_at = $8
            WHERE account_id = $9 AND security_stamp = $10
            "#,
        )
        .bind(account.password_hash.as_phc_string())
        .bind(account.security_stamp)
        .bind(account.email_confirmed)
        .bind(&account.first_name)
        .bind(&account.last_name)
        .bind(&account.address)
        .bind(&account.phone_number)
        .bind(account.updated_at)
        .bind(account.account_id.as_uuid())
        .bind(expected_stamp)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(updated == 1)
    }

    async fn delete(&self, account_id: &AccountId) -> AccountResult<bool> {
        // account_roles rows go with it via ON DELETE CASCADE
        let deleted = sqlx::query("DELETE FROM accounts WHERE account_id = $1")
            .bind(account_id.as_uuid())
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(deleted == 1)
    }

    async fn list_all(&self) -> AccountResult<Vec<Account>> {
        let rows = sqlx::query_as::<_, AccountRow>(
            r#"
            SELECT
                account_id,
                email,
                password_hash,
                security_stamp,
                email_confirmed,
                first_name,
                last_name,
                address,
                phone_number,
                created_at,
                updated_at
            FROM accounts
            ORDER BY first_name ASC, last_name ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|r| r.into_account()).collect()
    }
}

// ============================================================================
// Role Repository Implementation
// ============================================================================

impl RoleRepository for PgAccountStore {
    async fn ensure_role(&self, role: &Role) -> AccountResult<()> {
        sqlx::query("INSERT INTO roles (role_name) VALUES ($1) ON CONFLICT DO NOTHING")
            .bind(role.as_str())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn assign_role(&self, account_id: &AccountId, role: &Role) -> AccountResult<()> {
        self.ensure_role(role).await?;

        sqlx::query(
            r#"
            INSERT INTO account_roles (account_id, role_name)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(account_id.as_uuid())
        .bind(role.as_str())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn unassign_role(&self, account_id: &AccountId, role: &Role) -> AccountResult<()> {
        sqlx::query("DELETE FROM account_roles WHERE account_id = $1 AND role_name = $2")
            .bind(account_id.as_uuid())
            .bind(role.as_str())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn has_role(&self, account_id: &AccountId, role: &Role) -> AccountResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM account_roles WHERE account_id = $1 AND role_name = $2)",
        )
        .bind(account_id.as_uuid())
        .bind(role.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }
}

// ============================================================================
// Row Types for sqlx mapping
// ============================================================================

#[derive(sqlx::FromRow)]
struct AccountRow {
    account_id: Uuid,
    email: String,
    password_hash: String,
    security_stamp: Uuid,
    email_confirmed: bool,
    first_name: String,
    last_name: String,
    address: Option<String>,
    phone_number: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl AccountRow {
    fn into_account(self) -> AccountResult<Account> {
        let password_hash = HashedPassword::from_phc_string(self.password_hash)
            .map_err(|e| AccountError::Internal(format!("Invalid password hash: {}", e)))?;

        Ok(Account {
            account_id: AccountId::from_uuid(self.account_id),
            email: Email::from_db(self.email),
            password_hash,
            security_stamp: self.security_stamp,
            email_confirmed: self.email_confirmed,
            first_name: self.first_name,
            last_name: self.last_name,
            address: self.address,
            phone_number: self.phone_number,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
