//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Cryptographic utilities (Base64, constant-time comparison)
//! - Password hashing (Argon2id with zeroized clear-text handling)
//! - Cookie management

pub mod cookie;
pub mod crypto;
pub mod password;
