//! Error types for the CatalogHaus crate
//!
//! This module contains all error types that can be returned by CatalogHaus operations,
//! and their mapping onto HTTP status codes and JSON error bodies.

use auth_system::AuthError;
use cache_system::CacheError;
use config::ConfigError;
use serde_json::{Value, json};
use store_object::RepositoryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database connection error: {0}")]
    DatabaseConnection(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("No route for {0}")]
    RouteNotFound(String),

    #[error("Method {method} not allowed on {path}")]
    MethodNotAllowed { method: String, path: String },
}

impl CatalogError {
    pub fn status(&self) -> u16 {
        match self {
            CatalogError::Auth(err) => match err {
                AuthError::InsufficientScope { .. } => 403,
                AuthError::Signing(_) | AuthError::CredentialStore(_) => 500,
                _ => 401,
            },
            CatalogError::Repository(err) => match err {
                RepositoryError::NotFound(_) => 404,
                RepositoryError::DuplicateSku(_) => 409,
                RepositoryError::InvalidPrice(_) => 422,
                RepositoryError::ValidationError(_) => 400,
                RepositoryError::Database(_) => 500,
            },
            CatalogError::BadRequest(_) => 400,
            CatalogError::RouteNotFound(_) => 404,
            CatalogError::MethodNotAllowed { .. } => 405,
            CatalogError::Cache(_)
            | CatalogError::Config(_)
            | CatalogError::DatabaseConnection(_)
            | CatalogError::Serialization(_) => 500,
        }
    }

    /// Stable snake_case name used in error bodies
    pub fn kind(&self) -> &'static str {
        match self {
            CatalogError::Auth(err) => err.kind(),
            CatalogError::Repository(err) => match err {
                RepositoryError::NotFound(_) => "not_found",
                RepositoryError::DuplicateSku(_) => "duplicate_sku",
                RepositoryError::InvalidPrice(_) => "invalid_price",
                RepositoryError::ValidationError(_) => "validation_error",
                RepositoryError::Database(_) => "backend",
            },
            CatalogError::Cache(_) => "cache",
            CatalogError::Config(_) => "config",
            CatalogError::DatabaseConnection(_) => "backend",
            CatalogError::Serialization(_) => "serialization",
            CatalogError::BadRequest(_) => "bad_request",
            CatalogError::RouteNotFound(_) => "route_not_found",
            CatalogError::MethodNotAllowed { .. } => "method_not_allowed",
        }
    }

    /// JSON error body; server-side failures do not leak their details
    pub fn body(&self) -> Value {
        let message = if self.status() >= 500 {
            "internal error".to_string()
        } else {
            self.to_string()
        };
        json!({ "error": self.kind(), "message": message })
    }
}
