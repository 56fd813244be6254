//! Presentation Layer
//!
//! HTTP handlers, DTOs, router, and authorization gates.

pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod router;

pub use handlers::AccountAppState;
pub use middleware::{authenticate, require_admin};
pub use router::{account_router, account_router_generic};
