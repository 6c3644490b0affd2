//! Authentication middleware layer for protecting routes.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::ApiError;
use crate::AppState;

use super::jwt;
use super::types::AuthUser;

/// Middleware function that requires a bearer token issued by `/login`.
///
/// This can be used with `axum::middleware::from_fn_with_state` to protect routes.
/// On success the [`AuthUser`] is placed in the request extensions.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    match authenticate(&state, request.headers()).await {
        Ok(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(err) => err.into_response(),
    }
}

/// Extract and validate the user from request headers.
pub async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<AuthUser, ApiError> {
    let config = state.config.jwt.as_ref().ok_or_else(|| {
        ApiError::misconfigured("Token signing key is not configured on the server")
    })?;

    let token = extract_token_from_header(headers)
        .ok_or_else(|| ApiError::unauthorized("Not authenticated"))?;

    let claims = jwt::validate_token(config, &token).map_err(|e| {
        tracing::debug!("Rejected bearer token: {}", e);
        ApiError::unauthorized("Invalid token")
    })?;

    // Verify the user still exists
    if state.users.find(&claims.sub).await?.is_none() {
        tracing::warn!("Token presented for unknown user: {}", claims.sub);
        return Err(ApiError::unauthorized("Invalid user"));
    }

    Ok(AuthUser {
        username: claims.sub,
    })
}

fn extract_token_from_header(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}
