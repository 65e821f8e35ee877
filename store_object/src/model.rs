//! Catalog item model
//!
//! `Item` is what the repository stores and returns. `NewItem` and
//! `ItemPatch` are the inputs of create and update.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Repository-assigned identifier; ascending in creation order, never reused
pub type ItemId = i64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Item {
    pub id: ItemId,
    pub sku: String,
    pub name: String,
    pub category: String,
    pub price: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Client-supplied fields of a new item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewItem {
    pub sku: String,
    pub name: String,
    pub category: String,
    pub price: f64,
}

impl NewItem {
    pub fn new(sku: &str, name: &str, category: &str, price: f64) -> Self {
        Self {
            sku: sku.to_string(),
            name: name.to_string(),
            category: category.to_string(),
            price,
        }
    }
}

/// Partial update of the mutable item fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ItemPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl ItemPatch {
    pub fn price(price: f64) -> Self {
        Self {
            price: Some(price),
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn with_category(mut self, category: &str) -> Self {
        self.category = Some(category.to_string());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.price.is_none() && self.name.is_none() && self.category.is_none()
    }

    /// Apply the patch in place; returns whether any field actually changed
    ///
    /// `updated_at` is only touched when something changed, which is what
    /// makes reapplying the same patch a no-op.
    pub fn apply_to(&self, item: &mut Item, now: DateTime<Utc>) -> bool {
        let mut changed = false;
        if let Some(price) = self.price {
            if item.price != price {
                item.price = price;
                changed = true;
            }
        }
        if let Some(name) = &self.name {
            if &item.name != name {
                item.name = name.clone();
                changed = true;
            }
        }
        if let Some(category) = &self.category {
            if &item.category != category {
                item.category = category.clone();
                changed = true;
            }
        }
        if changed {
            item.updated_at = now;
        }
        changed
    }
}
