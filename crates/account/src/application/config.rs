//! Application Configuration
//!
//! Configuration for the account application layer.

use std::time::Duration;

/// Re-export SameSite from platform
pub use platform::cookie::SameSite;

use platform::cookie::CookieConfig;

/// Account application configuration
#[derive(Debug, Clone)]
pub struct AccountConfig {
    /// Session cookie name
    pub session_cookie_name: String,
    /// Session secret key for HMAC signing (32 bytes)
    pub session_secret: [u8; 32],
    /// Secret for single-use tokens, distinct from the session secret
    pub token_secret: [u8; 32],
    /// Symmetric key for bearer token signing (HS256)
    pub bearer_key: String,
    /// Bearer token issuer claim
    pub bearer_issuer: String,
    /// Bearer token audience claim
    pub bearer_audience: String,
    /// Bearer token lifetime (10 years; clients are expected to re-issue
    /// rather than refresh)
    pub bearer_ttl: Duration,
    /// Confirmation token lifetime (24 hours)
    pub confirm_token_ttl: Duration,
    /// Reset token lifetime (2 hours)
    pub reset_token_ttl: Duration,
    /// Session TTL without "Remember Me" (12 hours)
    pub session_ttl_short: Duration,
    /// Session TTL with "Remember Me" (1 week)
    pub session_ttl_long: Duration,
    /// Whether interactive login requires a confirmed email
    pub require_confirmed_email: bool,
    /// Whether to require Secure cookie
    pub cookie_secure: bool,
    /// SameSite policy
    pub cookie_same_site: SameSite,
    /// Password pepper (optional, application-wide secret)
    pub password_pepper: Option<Vec<u8>>,
    /// Base URL embedded in confirmation and reset links
    pub public_base_url: String,
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            session_cookie_name: "account_session".to_string(),
            session_secret: [0u8; 32],
            token_secret: [0u8; 32],
            bearer_key: String::new(),
            bearer_issuer: "account-api".to_string(),
            bearer_audience: "account-api".to_string(),
            bearer_ttl: Duration::from_secs(10 * 365 * 24 * 3600), // 10 years
            confirm_token_ttl: Duration::from_secs(24 * 3600),     // 24 hours
            reset_token_ttl: Duration::from_secs(2 * 3600),        // 2 hours
            session_ttl_short: Duration::from_secs(12 * 3600),     // 12 hours
            session_ttl_long: Duration::from_secs(7 * 24 * 3600),  // 1 week
            require_confirmed_email: true,
            cookie_secure: true,
            cookie_same_site: SameSite::Lax,
            password_pepper: None,
            public_base_url: "http://localhost:8080".to_string(),
        }
    }
}

impl AccountConfig {
    /// Create config with random secrets (for development and tests)
    pub fn with_random_secrets() -> Self {
        use rand::RngCore;
        let mut session_secret = [0u8; 32];
        rand::rng().fill_bytes(&mut session_secret);
        let mut token_secret = [0u8; 32];
        rand::rng().fill_bytes(&mut token_secret);
        let mut key = [0u8; 32];
        rand::rng().fill_bytes(&mut key);
        Self {
            session_secret,
            token_secret,
            bearer_key: platform::crypto::to_base64(&key),
            ..Default::default()
        }
    }

    /// Create config for development (insecure cookie)
    pub fn development() -> Self {
        Self {
            cookie_secure: false,
            ..Self::with_random_secrets()
        }
    }

    /// Get session TTL in milliseconds
    pub fn session_ttl_short_ms(&self) -> i64 {
        self.session_ttl_short.as_millis() as i64
    }

    /// Get session TTL with Remember Me in milliseconds
    pub fn session_ttl_long_ms(&self) -> i64 {
        self.session_ttl_long.as_millis() as i64
    }

    /// Get password pepper as slice
    pub fn pepper(&self) -> Option<&[u8]> {
        self.password_pepper.as_deref()
    }

    /// Cookie settings for the session cookie
    pub fn cookie_config(&self) -> CookieConfig {
        CookieConfig {
            name: self.session_cookie_name.clone(),
            secure: self.cookie_secure,
            http_only: true,
            same_site: self.cookie_same_site,
            path: "/".to_string(),
        }
    }
}
