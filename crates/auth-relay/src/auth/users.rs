//! User lookup for password login.

use std::collections::HashMap;

use async_trait::async_trait;
use sha2::{Digest, Sha256};

/// A user known to the login endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub username: String,
    /// Lowercase hex SHA-256 digest of the password.
    pub password_sha256: String,
}

impl UserRecord {
    #[cfg(test)]
    pub(crate) fn with_password(username: impl Into<String>, password: &str) -> Self {
        Self {
            username: username.into(),
            password_sha256: hash_password(password),
        }
    }

    /// Check a candidate password against the stored digest.
    pub fn verify_password(&self, candidate: &str) -> bool {
        let candidate = hash_password(candidate);
        constant_time_eq::constant_time_eq(
            candidate.as_bytes(),
            self.password_sha256.to_ascii_lowercase().as_bytes(),
        )
    }
}

/// Lowercase hex SHA-256 digest of a password.
pub fn hash_password(password: &str) -> String {
    format!("{:x}", Sha256::digest(password.as_bytes()))
}

/// Source of users for the login endpoint.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find(&self, username: &str) -> anyhow::Result<Option<UserRecord>>;
}

/// Users held in memory, seeded from configuration.
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    users: HashMap<String, UserRecord>,
}

impl InMemoryUserStore {
    pub fn new(users: impl IntoIterator<Item = UserRecord>) -> Self {
        Self {
            users: users
                .into_iter()
                .map(|user| (user.username.clone(), user))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find(&self, username: &str) -> anyhow::Result<Option<UserRecord>> {
        Ok(self.users.get(username).cloned())
    }
}
