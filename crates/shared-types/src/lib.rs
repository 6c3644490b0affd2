//! Request and response bodies exchanged between the frontend and the relay.

use serde::{Deserialize, Serialize};

// ============================================================================
// Google OAuth Types
// ============================================================================

/// Body of `POST /auth/google`.
///
/// `code` is optional at the serde level so that a missing field reaches the
/// handler and is reported as an invalid request with a `detail` message,
/// rather than being rejected by the JSON extractor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExchangeRequest {
    #[serde(default)]
    pub code: Option<String>,
}

impl ExchangeRequest {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
        }
    }
}

/// Tokens handed back to the frontend after a successful exchange.
///
/// There is deliberately no refresh token field on this type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeResponse {
    pub access_token: String,
    pub id_token: String,
    pub message: String,
}

/// Consent-screen URL the frontend should redirect the user to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUrlResponse {
    pub auth_url: String,
    pub state: String,
}

// ============================================================================
// Password Login Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
}

/// Body of the protected `GET /secure-data` endpoint. Secret values are
/// always redacted before they are placed here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecureDataResponse {
    pub message: String,
    pub client_secret: Option<String>,
    pub refresh_token: Option<String>,
    pub detail: String,
}

// ============================================================================
// Misc
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WelcomeResponse {
    pub message: String,
}

/// Error body returned for every failed request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}
