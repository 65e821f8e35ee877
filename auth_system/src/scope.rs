//! Scopes and roles
//!
//! A role is fixed at issuance time and maps to a fixed scope set.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const ITEMS_READ: &str = "items:read";
pub const ITEMS_WRITE: &str = "items:write";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Viewer,
    Editor,
}

impl Role {
    pub fn scopes(&self) -> Vec<String> {
        match self {
            Role::Viewer => vec![ITEMS_READ.to_string()],
            Role::Editor => vec![ITEMS_READ.to_string(), ITEMS_WRITE.to_string()],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Viewer => "viewer",
            Role::Editor => "editor",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "viewer" | "reader" => Ok(Role::Viewer),
            "editor" | "writer" => Ok(Role::Editor),
            other => Err(format!("unknown role: {other}")),
        }
    }
}
