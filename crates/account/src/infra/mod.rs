//! Infrastructure Layer
//!
//! Database implementations and external service integrations.

pub mod memory;
pub mod postgres;

pub use memory::{InMemoryAccountStore, LogNotifier, OutboundMail, RecordingNotifier};
pub use postgres::PgAccountStore;
