//! OAuth types and provider configuration.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::redact::redact;

/// Google's token endpoint.
pub const GOOGLE_TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";

/// Google's consent-screen endpoint.
pub const GOOGLE_AUTH_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/v2/auth";

/// Client credentials registered with the identity provider.
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

impl fmt::Debug for ProviderCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &redact(&self.client_secret))
            .field("redirect_uri", &self.redirect_uri)
            .finish()
    }
}

/// Form body posted to the token endpoint.
#[derive(Serialize)]
pub(crate) struct TokenRequest<'a> {
    pub code: &'a str,
    pub client_id: &'a str,
    pub client_secret: &'a str,
    pub redirect_uri: &'a str,
    pub grant_type: &'a str,
}

/// Successful token endpoint reply. Every field is optional so that a
/// reply missing a required token can be reported precisely.
#[derive(Default, Deserialize)]
pub struct GoogleTokenResponse {
    pub access_token: Option<String>,
    pub id_token: Option<String>,
    pub refresh_token: Option<String>,
    pub token_type: Option<String>,
    pub expires_in: Option<i64>,
    pub scope: Option<String>,
}

impl fmt::Debug for GoogleTokenResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let masked = |token: &Option<String>| token.as_deref().map(redact);
        f.debug_struct("GoogleTokenResponse")
            .field("access_token", &masked(&self.access_token))
            .field("id_token", &masked(&self.id_token))
            .field("refresh_token", &masked(&self.refresh_token))
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field("scope", &self.scope)
            .finish()
    }
}

/// Error reply from the token endpoint (RFC 6749 section 5.2).
#[derive(Debug, Deserialize)]
pub struct ProviderErrorBody {
    pub error: Option<String>,
    pub error_description: Option<String>,
}

impl ProviderErrorBody {
    /// Best human-readable description of an error body, falling back to the
    /// raw text when the body is not the standard JSON shape.
    pub fn describe(raw: &str) -> String {
        match serde_json::from_str::<ProviderErrorBody>(raw) {
            Ok(ProviderErrorBody {
                error_description: Some(description),
                ..
            }) if !description.is_empty() => description,
            Ok(ProviderErrorBody {
                error: Some(error), ..
            }) if !error.is_empty() => error,
            _ => raw.trim().to_string(),
        }
    }
}
