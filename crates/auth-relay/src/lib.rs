//! Backend relay for Google OAuth2 sign-in.
//!
//! Redeems authorization codes on behalf of a frontend, keeps refresh tokens
//! server-side and returns only access and id tokens. Also hosts a small
//! password login that gates a protected endpoint behind a local JWT.

pub mod auth;
pub mod config;
pub mod error;
pub mod oauth;
pub mod redact;
mod routes;

pub use routes::{build_cors_layer, create_app, AppState};
