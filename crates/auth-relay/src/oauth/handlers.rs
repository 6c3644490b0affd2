//! Google OAuth HTTP handlers.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use shared_types::{AuthUrlResponse, ExchangeRequest, ExchangeResponse};

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Scopes requested on the consent screen.
const LOGIN_SCOPES: [&str; 3] = ["openid", "email", "profile"];

/// Build the Google consent-screen URL for the frontend to redirect to.
///
/// `access_type=offline` and `prompt=consent` make Google issue a refresh
/// token on the subsequent exchange. The frontend should compare the returned
/// `state` with the one on the redirect back.
pub async fn google_auth_url(State(state): State<AppState>) -> ApiResult<Json<AuthUrlResponse>> {
    let config = &state.config;
    let credentials = config.provider.as_ref().ok_or_else(|| {
        ApiError::misconfigured("Google OAuth credentials are not configured on the server")
    })?;

    let csrf_state = uuid::Uuid::new_v4().to_string();

    let auth_url = format!(
        "{}?\
         client_id={}&\
         redirect_uri={}&\
         response_type=code&\
         scope={}&\
         access_type=offline&\
         prompt=consent&\
         state={}",
        config.auth_endpoint,
        urlencoding::encode(&credentials.client_id),
        urlencoding::encode(&credentials.redirect_uri),
        urlencoding::encode(&LOGIN_SCOPES.join(" ")),
        csrf_state
    );

    Ok(Json(AuthUrlResponse {
        auth_url,
        state: csrf_state,
    }))
}

/// Exchange an authorization code posted by the frontend.
///
/// Returns the access and id tokens; the refresh token stays on the server.
pub async fn google_exchange(
    State(state): State<AppState>,
    payload: Result<Json<ExchangeRequest>, JsonRejection>,
) -> ApiResult<Json<ExchangeResponse>> {
    let Json(request) = payload.map_err(|e| ApiError::invalid_request(e.body_text()))?;

    let response = state.exchange.exchange(request).await?;
    tracing::info!("Authorization code exchanged");

    Ok(Json(response))
}
