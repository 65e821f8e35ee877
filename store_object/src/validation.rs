//! Validation module
//!
//! Checks applied to repository inputs before any lock is taken.

use crate::errors::RepositoryError;

/// SKUs appear in request paths and cache keys
const MAX_SKU_LENGTH: usize = 64;

/// Price must be finite and non-negative
pub fn validate_price(price: f64) -> Result<(), RepositoryError> {
    if !price.is_finite() || price < 0.0 {
        return Err(RepositoryError::InvalidPrice(price));
    }
    Ok(())
}

/// SKU must be non-empty, bounded, and usable as a single path segment
pub fn validate_sku(sku: &str) -> Result<(), RepositoryError> {
    if sku.is_empty() {
        return Err(RepositoryError::ValidationError(
            "SKU cannot be empty".to_string(),
        ));
    }
    if sku.len() > MAX_SKU_LENGTH {
        return Err(RepositoryError::ValidationError(format!(
            "SKU '{}' is too long: {} characters (max {})",
            sku,
            sku.len(),
            MAX_SKU_LENGTH
        )));
    }
    if sku
        .chars()
        .any(|c| c.is_whitespace() || c.is_control() || matches!(c, '/' | '?' | '#' | '*'))
    {
        return Err(RepositoryError::ValidationError(format!(
            "SKU '{}' contains characters that are not allowed",
            sku
        )));
    }
    Ok(())
}
