use thiserror::Error;

use crate::model::ItemId;

#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("Duplicate SKU: {0}")]
    DuplicateSku(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid price {0}: price must be a finite number >= 0")]
    InvalidPrice(f64),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl RepositoryError {
    pub fn item_not_found(id: ItemId) -> Self {
        RepositoryError::NotFound(format!("item {}", id))
    }

    pub fn sku_not_found(sku: &str) -> Self {
        RepositoryError::NotFound(format!("sku {}", sku))
    }
}
