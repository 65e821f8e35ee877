//! Auth system for CatalogHaus
//!
//! Token issuance and verification (HS256 signed, time-bounded, carrying a
//! subject and a scope set) plus the stateless authorization guard.

pub mod credentials;
pub mod errors;
pub mod guard;
pub mod prelude;
pub mod scope;
pub mod token;

// Re-export centralized config
pub use config::{AuthConfig, UserConfig};

pub use credentials::{CredentialResolver, Credentials, Principal, StaticCredentials};
pub use errors::{AuthError, AuthResult};
pub use guard::{authorize, bearer_token, scope_grants};
pub use scope::{ITEMS_READ, ITEMS_WRITE, Role};
pub use token::{Claims, IssuedToken, TokenService};
