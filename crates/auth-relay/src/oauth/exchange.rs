//! Authorization-code exchange against the provider's token endpoint.

use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use shared_types::{ExchangeRequest, ExchangeResponse};
use thiserror::Error;
use tokio::sync::Semaphore;

use crate::redact::redact;

use super::id_token;
use super::store::RefreshTokenStore;
use super::types::{GoogleTokenResponse, ProviderCredentials, ProviderErrorBody, TokenRequest};

pub const SUCCESS_MESSAGE: &str = "Authentication successful";

/// Failure of a single exchange.
#[derive(Debug, Error)]
pub enum ExchangeError {
    /// The caller sent no usable authorization code
    #[error("{0}")]
    InvalidRequest(String),

    /// Provider credentials were not configured at startup
    #[error("{0}")]
    ServerMisconfigured(String),

    /// The token endpoint refused the exchange or could not be reached
    #[error("Token exchange failed: {detail}")]
    Upstream {
        status: Option<StatusCode>,
        detail: String,
    },

    /// The token endpoint did not answer within the configured deadline
    #[error("Token endpoint did not respond within {0:?}")]
    UpstreamTimeout(Duration),

    /// The token endpoint answered 2xx with a body we cannot use
    #[error("{0}")]
    IncompleteUpstreamResponse(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Settings for [`TokenExchangeService`], taken from the application config.
#[derive(Debug, Clone)]
pub struct ExchangeSettings {
    pub credentials: Option<ProviderCredentials>,
    pub token_endpoint: String,
    pub timeout: Duration,
    pub max_concurrent: usize,
}

/// Redeems authorization codes and filters the provider's reply down to what
/// the frontend may see.
pub struct TokenExchangeService {
    http: reqwest::Client,
    credentials: Option<ProviderCredentials>,
    token_endpoint: String,
    timeout: Duration,
    permits: Semaphore,
    store: Arc<dyn RefreshTokenStore>,
}

impl TokenExchangeService {
    pub fn new(
        settings: ExchangeSettings,
        store: Arc<dyn RefreshTokenStore>,
    ) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {}", e))?;

        Ok(Self {
            http,
            credentials: settings.credentials,
            token_endpoint: settings.token_endpoint,
            timeout: settings.timeout,
            permits: Semaphore::new(settings.max_concurrent.max(1)),
            store,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.credentials.is_some()
    }

    /// Exchange an authorization code for tokens.
    ///
    /// The refresh token, if any, is handed to the store and never returned.
    /// Dropping the returned future cancels the outbound request.
    pub async fn exchange(
        &self,
        request: ExchangeRequest,
    ) -> Result<ExchangeResponse, ExchangeError> {
        let code = request
            .code
            .as_deref()
            .filter(|code| !code.trim().is_empty())
            .ok_or_else(|| {
                ExchangeError::InvalidRequest("Authorization code is required".to_string())
            })?;

        let credentials = self.credentials.as_ref().ok_or_else(|| {
            ExchangeError::ServerMisconfigured(
                "Google OAuth credentials are not configured on the server".to_string(),
            )
        })?;

        // The permit covers only the outbound call, not storage.
        let tokens = {
            let _permit = self
                .permits
                .acquire()
                .await
                .map_err(|e| anyhow::anyhow!("Exchange limiter closed: {}", e))?;
            self.request_tokens(credentials, code).await?
        };

        let access_token = required_token(tokens.access_token, "access_token")?;
        let id_token = required_token(tokens.id_token, "id_token")?;

        match tokens.refresh_token {
            Some(refresh_token) if !refresh_token.is_empty() => {
                self.retain_refresh_token(&id_token, &refresh_token).await;
            }
            _ => {
                tracing::debug!("No refresh token issued; user has likely consented before");
            }
        }

        Ok(ExchangeResponse {
            access_token,
            id_token,
            message: SUCCESS_MESSAGE.to_string(),
        })
    }

    async fn request_tokens(
        &self,
        credentials: &ProviderCredentials,
        code: &str,
    ) -> Result<GoogleTokenResponse, ExchangeError> {
        let response = self
            .http
            .post(&self.token_endpoint)
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&TokenRequest {
                code,
                client_id: &credentials.client_id,
                client_secret: &credentials.client_secret,
                redirect_uri: &credentials.redirect_uri,
                grant_type: "authorization_code",
            })
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            let detail = ProviderErrorBody::describe(&body);
            tracing::warn!("Token exchange rejected: {} - {}", status, detail);
            return Err(ExchangeError::Upstream {
                status: Some(status),
                detail,
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!("Unparseable token response: {}", e);
            ExchangeError::IncompleteUpstreamResponse(
                "Token endpoint returned an unreadable response".to_string(),
            )
        })
    }

    async fn retain_refresh_token(&self, id_token: &str, refresh_token: &str) {
        let subject = match id_token::subject(id_token) {
            Ok(subject) => subject,
            Err(e) => {
                tracing::warn!(
                    "Could not read subject from id token, refresh token {} not stored: {}",
                    redact(refresh_token),
                    e
                );
                return;
            }
        };

        let stored = tokio::time::timeout(self.timeout, self.store.store(&subject, refresh_token));
        match stored.await {
            Ok(Ok(())) => tracing::info!(
                "Stored refresh token {} for subject {}",
                redact(refresh_token),
                subject
            ),
            // Continue with the exchange even if storage fails
            Ok(Err(e)) => tracing::error!(
                "Failed to store refresh token {} for subject {}: {:?}",
                redact(refresh_token),
                subject,
                e
            ),
            Err(_) => tracing::error!(
                "Storing refresh token {} for subject {} did not finish within {:?}",
                redact(refresh_token),
                subject,
                self.timeout
            ),
        }
    }

    fn transport_error(&self, error: reqwest::Error) -> ExchangeError {
        if error.is_timeout() {
            tracing::error!("Token endpoint timed out after {:?}", self.timeout);
            return ExchangeError::UpstreamTimeout(self.timeout);
        }

        tracing::error!("Token endpoint unreachable: {}", error);
        ExchangeError::Upstream {
            status: None,
            detail: "Could not reach the token endpoint".to_string(),
        }
    }
}

fn required_token(token: Option<String>, field: &str) -> Result<String, ExchangeError> {
    match token {
        Some(token) if !token.is_empty() => Ok(token),
        _ => {
            tracing::error!("Token response is missing {}", field);
            Err(ExchangeError::IncompleteUpstreamResponse(format!(
                "Token response is missing {}",
                field
            )))
        }
    }
}
