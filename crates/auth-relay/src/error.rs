//! Unified error handling for the relay API.
//!
//! Every handler returns [`ApiResult`]; failures are turned into a status code
//! plus a JSON `{"detail": ...}` body here and nowhere else.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use shared_types::ErrorResponse;
use thiserror::Error;

use crate::oauth::ExchangeError;

/// Unified error type for API handlers
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed or incomplete client input
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Authentication required but not provided or invalid
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The deployment is missing configuration this endpoint needs
    #[error("Server misconfigured: {0}")]
    ServerMisconfigured(String),

    /// An upstream dependency rejected the request or was unreachable
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// An upstream dependency did not answer in time
    #[error("Upstream timeout: {0}")]
    UpstreamTimeout(String),

    /// An upstream dependency answered successfully with an unusable body
    #[error("Incomplete upstream response: {0}")]
    IncompleteUpstreamResponse(String),

    /// Anything else
    #[error("{0}")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn invalid_request(message: impl Into<String>) -> Self {
        ApiError::InvalidRequest(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn misconfigured(message: impl Into<String>) -> Self {
        ApiError::ServerMisconfigured(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::ServerMisconfigured(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::UpstreamTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::IncompleteUpstreamResponse(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<ExchangeError> for ApiError {
    fn from(err: ExchangeError) -> Self {
        match err {
            ExchangeError::InvalidRequest(msg) => ApiError::InvalidRequest(msg),
            ExchangeError::ServerMisconfigured(msg) => ApiError::ServerMisconfigured(msg),
            err @ ExchangeError::Upstream { .. } => ApiError::Upstream(err.to_string()),
            err @ ExchangeError::UpstreamTimeout(_) => ApiError::UpstreamTimeout(err.to_string()),
            ExchangeError::IncompleteUpstreamResponse(msg) => {
                ApiError::IncompleteUpstreamResponse(msg)
            }
            ExchangeError::Internal(e) => ApiError::Internal(e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match &self {
            ApiError::Internal(e) => {
                tracing::error!("Internal error: {:?}", e);
                "Internal server error".to_string()
            }
            ApiError::ServerMisconfigured(msg) => {
                tracing::error!("Configuration error: {}", msg);
                msg.clone()
            }
            ApiError::InvalidRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Upstream(msg)
            | ApiError::UpstreamTimeout(msg)
            | ApiError::IncompleteUpstreamResponse(msg) => msg.clone(),
        };

        let body = Json(ErrorResponse { detail });

        if status == StatusCode::UNAUTHORIZED {
            return (status, [(header::WWW_AUTHENTICATE, "Bearer")], body).into_response();
        }

        (status, body).into_response()
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
