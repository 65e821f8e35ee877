//! Route resolution
//!
//! Maps a method and path onto one catalog operation. The HTTP router proper
//! lives outside this crate; this table is what it forwards into.

use crate::errors::CatalogError;
use auth_system::{ITEMS_READ, ITEMS_WRITE};
use cache_system::key::normalize_path;
use std::fmt;
use store_object::{ItemId, Pagination};

pub const ITEMS_PATH: &str = "/items";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Patch,
    Delete,
    Other(String),
}

impl Method {
    pub fn as_str(&self) -> &str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::Other(other) => other,
        }
    }

    /// Only reads are served from cache
    pub fn is_read(&self) -> bool {
        matches!(self, Method::Get)
    }
}

impl From<&str> for Method {
    fn from(value: &str) -> Self {
        match value.to_ascii_uppercase().as_str() {
            "GET" => Method::Get,
            "POST" => Method::Post,
            "PATCH" => Method::Patch,
            "DELETE" => Method::Delete,
            other => Method::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Default scope mapping: reads need `items:read`, everything else `items:write`
pub fn required_scope_for(method: &Method) -> &'static str {
    if method.is_read() {
        ITEMS_READ
    } else {
        ITEMS_WRITE
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Route {
    ListItems(Pagination),
    GetById(ItemId),
    GetBySku(String),
    CreateItem,
    PatchItem(String),
    DeleteItem(String),
}

impl Route {
    pub fn resolve(
        method: &Method,
        path: &str,
        query: &[(String, String)],
    ) -> Result<Self, CatalogError> {
        let normalized = normalize_path(path);
        let segments: Vec<&str> = normalized.split('/').filter(|s| !s.is_empty()).collect();

        let not_allowed = || CatalogError::MethodNotAllowed {
            method: method.to_string(),
            path: normalized.clone(),
        };

        match segments.as_slice() {
            ["items"] => match method {
                Method::Get => Ok(Route::ListItems(parse_pagination(query)?)),
                Method::Post => Ok(Route::CreateItem),
                _ => Err(not_allowed()),
            },
            ["items", "sku", sku] => match method {
                Method::Get => Ok(Route::GetBySku(sku.to_string())),
                _ => Err(not_allowed()),
            },
            ["items", key] => match method {
                Method::Get => key.parse::<ItemId>().map(Route::GetById).map_err(|_| {
                    CatalogError::BadRequest(format!("item id must be an integer, got {}", key))
                }),
                Method::Patch => Ok(Route::PatchItem(key.to_string())),
                Method::Delete => Ok(Route::DeleteItem(key.to_string())),
                _ => Err(not_allowed()),
            },
            _ => Err(CatalogError::RouteNotFound(normalized.clone())),
        }
    }
}

pub fn item_path(id: ItemId) -> String {
    format!("{}/{}", ITEMS_PATH, id)
}

pub fn sku_path(sku: &str) -> String {
    format!("{}/sku/{}", ITEMS_PATH, sku)
}

/// Parse `offset`, `limit` and `category`; other parameters are ignored
pub fn parse_pagination(query: &[(String, String)]) -> Result<Pagination, CatalogError> {
    let mut pagination = Pagination::new();
    for (name, value) in query {
        match name.as_str() {
            "offset" => pagination.offset = parse_number(name, value)?,
            "limit" => {
                let limit: u64 = parse_number(name, value)?;
                // Anything beyond u32 gets clamped to the page maximum anyway
                pagination.limit = Some(u32::try_from(limit).unwrap_or(u32::MAX));
            }
            "category" => pagination.category = Some(value.clone()),
            _ => {}
        }
    }
    Ok(pagination)
}

fn parse_number(name: &str, value: &str) -> Result<u64, CatalogError> {
    value.trim().parse::<u64>().map_err(|_| {
        CatalogError::BadRequest(format!(
            "{} must be a non-negative integer, got {:?}",
            name, value
        ))
    })
}
