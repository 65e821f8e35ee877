//! Credential resolution
//!
//! The token service never stores credentials. It asks a
//! [`CredentialResolver`] to turn a (username, password) pair into a
//! principal, then signs whatever that principal's role allows.

use crate::errors::{AuthError, AuthResult};
use crate::scope::Role;
use async_trait::async_trait;
use config::UserConfig;
use std::collections::HashMap;
use std::fmt;

#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Who a verified credential pair belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub subject: String,
    pub role: Role,
}

#[async_trait]
pub trait CredentialResolver: Send + Sync {
    /// `Ok(None)` means the pair is unknown or wrong
    async fn resolve(&self, credentials: &Credentials) -> AuthResult<Option<Principal>>;
}

/// Fixed user table, loaded from configuration
#[derive(Default)]
pub struct StaticCredentials {
    users: HashMap<String, (String, Principal)>,
}

impl StaticCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, username: &str, password: &str, role: Role) -> Self {
        self.users.insert(
            username.to_string(),
            (
                password.to_string(),
                Principal {
                    subject: username.to_string(),
                    role,
                },
            ),
        );
        self
    }

    pub fn from_config(users: &[UserConfig]) -> AuthResult<Self> {
        users.iter().try_fold(Self::new(), |resolver, user| {
            let role = user
                .role
                .parse::<Role>()
                .map_err(|err| AuthError::CredentialStore(format!("{}: {}", user.username, err)))?;
            Ok(resolver.with_user(&user.username, &user.password, role))
        })
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl fmt::Debug for StaticCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticCredentials")
            .field("users", &self.users.len())
            .finish()
    }
}

#[async_trait]
impl CredentialResolver for StaticCredentials {
    async fn resolve(&self, credentials: &Credentials) -> AuthResult<Option<Principal>> {
        Ok(self
            .users
            .get(&credentials.username)
            .filter(|(password, _)| *password == credentials.password)
            .map(|(_, principal)| principal.clone()))
    }
}
