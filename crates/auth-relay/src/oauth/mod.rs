//! Google OAuth2 authorization-code relay.
//!
//! The frontend obtains an authorization code from Google and posts it here.
//! [`TokenExchangeService`] redeems it at the token endpoint, keeps the
//! refresh token in a [`RefreshTokenStore`] and returns only the access and
//! id tokens.

mod exchange;
mod handlers;
pub mod id_token;
pub mod store;
pub mod types;

pub use exchange::{ExchangeError, ExchangeSettings, TokenExchangeService, SUCCESS_MESSAGE};
pub use handlers::{google_auth_url, google_exchange};
pub use store::{InMemoryRefreshTokenStore, RefreshTokenStore};
pub use types::{ProviderCredentials, GOOGLE_AUTH_ENDPOINT, GOOGLE_TOKEN_ENDPOINT};
