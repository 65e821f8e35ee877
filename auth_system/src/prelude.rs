//! Convenience re-exports for common auth usage

pub use crate::credentials::{CredentialResolver, Credentials, Principal, StaticCredentials};
pub use crate::errors::{AuthError, AuthResult};
pub use crate::guard::{authorize, bearer_token};
pub use crate::scope::{ITEMS_READ, ITEMS_WRITE, Role};
pub use crate::token::{Claims, IssuedToken, TokenService};
