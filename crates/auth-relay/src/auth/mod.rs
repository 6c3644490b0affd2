//! Password login issuing locally signed JWTs.
//!
//! This module provides:
//! - JWT token creation and validation
//! - A pluggable `UserStore` for credential lookup
//! - `require_auth` middleware for protecting routes

mod handlers;
mod jwt;
mod middleware;
pub mod types;
pub mod users;

pub use handlers::{login, secure_data};
pub use jwt::{create_token, validate_token};
pub use middleware::{authenticate, require_auth};
pub use types::{AuthUser, JwtConfig};
pub use users::{hash_password, InMemoryUserStore, UserRecord, UserStore};
