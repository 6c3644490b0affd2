//! Password login HTTP handlers.

use axum::{
    extract::{rejection::FormRejection, State},
    Extension, Form, Json,
};
use shared_types::{LoginRequest, LoginResponse, SecureDataResponse};

use crate::error::{ApiError, ApiResult};
use crate::redact::redact;
use crate::AppState;

use super::{jwt, types::AuthUser};

const BAD_CREDENTIALS: &str = "Incorrect username or password";

/// Issue a session token for a username/password pair.
///
/// Expects a form-encoded body with `username` and `password`.
pub async fn login(
    State(state): State<AppState>,
    form: Result<Form<LoginRequest>, FormRejection>,
) -> ApiResult<Json<LoginResponse>> {
    let config = state.config.jwt.as_ref().ok_or_else(|| {
        ApiError::misconfigured("Token signing key is not configured on the server")
    })?;

    let Form(credentials) = form.map_err(|e| ApiError::invalid_request(e.body_text()))?;

    let user = state
        .users
        .find(&credentials.username)
        .await?
        .filter(|user| user.verify_password(&credentials.password));

    let Some(user) = user else {
        tracing::warn!("Failed login attempt for: {}", credentials.username);
        return Err(ApiError::invalid_request(BAD_CREDENTIALS));
    };

    let token = jwt::create_token(config, &user.username)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("Failed to create token: {}", e)))?;

    tracing::info!("Successful login for: {}", user.username);

    Ok(Json(LoginResponse {
        access_token: token,
        token_type: "bearer".to_string(),
    }))
}

/// Protected endpoint showing that server-held secrets stay server-side.
pub async fn secure_data(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Json<SecureDataResponse> {
    tracing::debug!("Secure data requested by: {}", user.username);

    let config = &state.config;
    Json(SecureDataResponse {
        message: "Sensitive data is only visible on the backend".to_string(),
        client_secret: config
            .provider
            .as_ref()
            .map(|credentials| redact(&credentials.client_secret)),
        refresh_token: config.service_refresh_token.as_deref().map(redact),
        detail: "These values are never exposed to the frontend in full".to_string(),
    })
}
