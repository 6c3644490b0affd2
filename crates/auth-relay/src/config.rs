//! Application configuration, read once at startup.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use thiserror::Error;

use crate::auth::{JwtConfig, UserRecord};
use crate::oauth::{
    ExchangeSettings, ProviderCredentials, GOOGLE_AUTH_ENDPOINT, GOOGLE_TOKEN_ENDPOINT,
};

const DEFAULT_CORS_ORIGINS: &str = "http://localhost:3000,http://localhost:5173";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variables: {}", .0.join(", "))]
    MissingVars(Vec<&'static str>),
}

/// Settings shared by the whole process. Holds secrets, so no `Debug`.
#[derive(Clone)]
pub struct AppConfig {
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
    /// `None` when any Google credential is missing; the exchange endpoint
    /// then answers 503.
    pub provider: Option<ProviderCredentials>,
    pub token_endpoint: String,
    pub auth_endpoint: String,
    pub exchange_timeout: Duration,
    pub max_concurrent_exchanges: usize,
    /// `None` when `SECRET_KEY` is unset; login then answers 503.
    pub jwt: Option<JwtConfig>,
    pub login_users: Vec<UserRecord>,
    pub service_refresh_token: Option<String>,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from any key/value source. Empty values count as
    /// unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let strict = parse_bool(get("REQUIRE_PROVIDER_CONFIG"))
            .context("REQUIRE_PROVIDER_CONFIG must be true or false")?;
        let provider = match load_provider_credentials(&get) {
            Ok(credentials) => Some(credentials),
            Err(e) => {
                if strict {
                    return Err(e).context("Google OAuth is not configured");
                }
                tracing::error!(
                    "Google OAuth is not configured ({}); /auth/google will answer 503",
                    e
                );
                None
            }
        };

        let jwt = match get("SECRET_KEY") {
            Some(secret) => Some(JwtConfig {
                secret,
                token_duration_minutes: parse_or(get("ACCESS_TOKEN_EXPIRE_MINUTES"), 30)
                    .context("ACCESS_TOKEN_EXPIRE_MINUTES must be a valid number")?,
            }),
            None => {
                tracing::warn!("SECRET_KEY not set, password login is disabled");
                None
            }
        };

        let max_concurrent_exchanges: usize = parse_or(get("MAX_CONCURRENT_EXCHANGES"), 64)
            .context("MAX_CONCURRENT_EXCHANGES must be a valid number")?;
        if max_concurrent_exchanges == 0 {
            bail!("MAX_CONCURRENT_EXCHANGES must be at least 1");
        }

        let timeout_secs: u64 = parse_or(get("TOKEN_EXCHANGE_TIMEOUT_SECS"), 10)
            .context("TOKEN_EXCHANGE_TIMEOUT_SECS must be a valid number")?;
        if timeout_secs == 0 {
            bail!("TOKEN_EXCHANGE_TIMEOUT_SECS must be at least 1");
        }

        Ok(Self {
            port: parse_or(get("PORT"), 8000).context("PORT must be a valid number")?,
            cors_allowed_origins: split_list(
                &get("CORS_ALLOWED_ORIGINS").unwrap_or_else(|| DEFAULT_CORS_ORIGINS.to_string()),
            ),
            provider,
            token_endpoint: get("GOOGLE_TOKEN_ENDPOINT")
                .unwrap_or_else(|| GOOGLE_TOKEN_ENDPOINT.to_string()),
            auth_endpoint: get("GOOGLE_AUTH_ENDPOINT")
                .unwrap_or_else(|| GOOGLE_AUTH_ENDPOINT.to_string()),
            exchange_timeout: Duration::from_secs(timeout_secs),
            max_concurrent_exchanges,
            jwt,
            login_users: parse_users(get("LOGIN_USERS").as_deref().unwrap_or_default())?,
            service_refresh_token: get("REFRESH_TOKEN"),
        })
    }

    pub fn exchange_settings(&self) -> ExchangeSettings {
        ExchangeSettings {
            credentials: self.provider.clone(),
            token_endpoint: self.token_endpoint.clone(),
            timeout: self.exchange_timeout,
            max_concurrent: self.max_concurrent_exchanges,
        }
    }
}

/// Read all three Google credentials, reporting every missing one at once.
fn load_provider_credentials<F>(get: &F) -> Result<ProviderCredentials, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let client_id = get("GOOGLE_CLIENT_ID");
    let client_secret = get("GOOGLE_CLIENT_SECRET");
    let redirect_uri = get("GOOGLE_REDIRECT_URI");

    match (client_id, client_secret, redirect_uri) {
        (Some(client_id), Some(client_secret), Some(redirect_uri)) => Ok(ProviderCredentials {
            client_id,
            client_secret,
            redirect_uri,
        }),
        (client_id, client_secret, redirect_uri) => {
            let missing = [
                ("GOOGLE_CLIENT_ID", client_id.is_none()),
                ("GOOGLE_CLIENT_SECRET", client_secret.is_none()),
                ("GOOGLE_REDIRECT_URI", redirect_uri.is_none()),
            ]
            .into_iter()
            .filter(|(_, missing)| *missing)
            .map(|(name, _)| name)
            .collect();
            Err(ConfigError::MissingVars(missing))
        }
    }
}

/// Parse `user:sha256hex` pairs separated by commas.
fn parse_users(raw: &str) -> Result<Vec<UserRecord>> {
    split_list(raw)
        .into_iter()
        .map(|pair| {
            let (username, digest) = pair
                .split_once(':')
                .with_context(|| format!("LOGIN_USERS entry '{}' must be user:sha256hex", pair))?;
            let (username, digest) = (username.trim(), digest.trim());
            if username.is_empty()
                || digest.len() != 64
                || !digest.chars().all(|c| c.is_ascii_hexdigit())
            {
                bail!(
                    "LOGIN_USERS entry for '{}' must carry a 64-character hex SHA-256 digest",
                    username
                );
            }
            Ok(UserRecord {
                username: username.to_string(),
                password_sha256: digest.to_ascii_lowercase(),
            })
        })
        .collect()
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_or<T: std::str::FromStr>(value: Option<String>, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match value {
        Some(v) => Ok(v.parse()?),
        None => Ok(default),
    }
}

fn parse_bool(value: Option<String>) -> Result<bool> {
    match value.as_deref().map(str::to_ascii_lowercase).as_deref() {
        None | Some("false") | Some("0") => Ok(false),
        Some("true") | Some("1") => Ok(true),
        Some(other) => bail!("expected a boolean, got '{}'", other),
    }
}
