//! Startup Seeding
//!
//! Ensures the built-in roles exist and provisions the initial admin
//! account from the environment. Safe to run on every boot.

use account::domain::entity::{Account, Profile};
use account::domain::repository::{AccountRepository, RoleRepository};
use account::domain::value_object::{Email, Role};
use account::{AccountConfig, PgAccountStore};
use platform::password::ClearTextPassword;

/// Admin bootstrap credentials from the environment
pub struct SeedAdmin {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

impl SeedAdmin {
    /// Read `SEED_ADMIN_EMAIL` / `SEED_ADMIN_PASSWORD` if both are set.
    pub fn from_env() -> Option<Self> {
        let email = std::env::var("SEED_ADMIN_EMAIL").ok()?;
        let password = std::env::var("SEED_ADMIN_PASSWORD").ok()?;
        Some(Self {
            email,
            password,
            first_name: std::env::var("SEED_ADMIN_FIRST_NAME")
                .unwrap_or_else(|_| "Admin".to_string()),
            last_name: std::env::var("SEED_ADMIN_LAST_NAME")
                .unwrap_or_else(|_| "User".to_string()),
        })
    }
}

/// Ensure roles and, when configured, the initial admin account.
pub async fn run(
    store: &PgAccountStore,
    config: &AccountConfig,
    admin: Option<SeedAdmin>,
) -> anyhow::Result<()> {
    store.ensure_role(&Role::admin()).await?;
    store.ensure_role(&Role::customer()).await?;

    let Some(admin) = admin else {
        tracing::info!("No seed admin configured, skipping");
        return Ok(());
    };

    let email = Email::new(&admin.email)?;
    if let Some(existing) = store.find_by_email(&email).await? {
        // Already provisioned; make sure the role assignment survives
        store
            .assign_role(&existing.account_id, &Role::admin())
            .await?;
        tracing::info!(email = %email, "Seed admin already exists");
        return Ok(());
    }

    let password = ClearTextPassword::new(admin.password)?;
    let password_hash = password.hash(config.pepper())?;

    let mut account = Account::new(
        email,
        password_hash,
        Profile {
            first_name: admin.first_name,
            last_name: admin.last_name,
            address: None,
            phone_number: None,
        },
    );
    // The bootstrap admin skips the mail round-trip
    account.confirm_email();

    store.insert(&account).await?;
    store.assign_role(&account.account_id, &Role::admin()).await?;

    tracing::info!(account_id = %account.account_id, "Seed admin created");
    Ok(())
}
