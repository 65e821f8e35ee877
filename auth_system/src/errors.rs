//! Error types for token issuance, verification and authorization

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("token expired")]
    Expired,
    #[error("malformed token: {0}")]
    Malformed(String),
    #[error("token signature is invalid")]
    SignatureInvalid,
    #[error("insufficient scope: {required} is required")]
    InsufficientScope { required: String },
    #[error("missing bearer token")]
    MissingToken,
    #[error("token signing failed: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),
    #[error("credential store error: {0}")]
    CredentialStore(String),
}

pub type AuthResult<T> = Result<T, AuthError>;

impl AuthError {
    /// Stable snake_case name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::Expired => "expired",
            AuthError::Malformed(_) => "malformed",
            AuthError::SignatureInvalid => "signature_invalid",
            AuthError::InsufficientScope { .. } => "insufficient_scope",
            AuthError::MissingToken => "missing_token",
            AuthError::Signing(_) => "signing",
            AuthError::CredentialStore(_) => "credential_store",
        }
    }
}
