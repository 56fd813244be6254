//! Account (Identity and Credential Lifecycle) Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, value objects, token service, repository traits
//! - `application/` - Use cases and application services
//! - `infra/` - Database implementations and notifiers
//! - `presentation/` - HTTP handlers, DTOs, router, authorization gates
//!
//! ## Features
//! - Registration with deferred email activation
//! - Interactive login with signed session cookies
//! - Long-lived bearer tokens (JWT) for API clients
//! - Password change, recover and reset flows
//! - Role-based administration (Admin, Customer)
//!
//! ## Security Model
//! - Passwords hashed with Argon2id
//! - Single-use tokens derived from the account's security stamp;
//!   consuming an operation rotates the stamp and invalidates them
//! - Credential failures never reveal whether an account exists

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

#[cfg(test)]
mod tests;

// Re-exports for convenience
pub use application::config::AccountConfig;
pub use error::{AccountError, AccountResult};
pub use infra::postgres::PgAccountStore;
pub use presentation::router::account_router;

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

// Convenience re-exports
pub mod config {
    pub use crate::application::config::*;
}

pub mod models {
    pub use crate::domain::entity::*;
    pub use crate::domain::value_object::*;
    pub use crate::presentation::dto::*;
}

pub mod handlers {
    pub use crate::presentation::handlers::*;
}

pub mod store {
    pub use crate::infra::memory::InMemoryAccountStore;
    pub use crate::infra::postgres::PgAccountStore as AccountStore;
}

pub mod router {
    pub use crate::presentation::router::*;
}

pub mod middleware {
    pub use crate::presentation::middleware::*;
}
