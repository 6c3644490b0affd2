//! Auth-related types and configuration.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::redact::redact;

/// JWT Claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (username)
    pub sub: String,
    /// Issued at timestamp
    pub iat: i64,
    /// Expiration timestamp
    pub exp: i64,
}

/// Validated user from JWT
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub username: String,
}

/// Signing configuration for locally issued session tokens.
#[derive(Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub token_duration_minutes: i64,
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &redact(&self.secret))
            .field("token_duration_minutes", &self.token_duration_minutes)
            .finish()
    }
}
