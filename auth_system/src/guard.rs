//! Authorization guard
//!
//! Decides whether verified claims carry the scope an operation needs. It
//! holds no state and never consults the repository or cache.

use crate::errors::{AuthError, AuthResult};
use crate::token::Claims;

const BEARER_SCHEME: &str = "Bearer";

/// Allow the call when `claims` grant `required_scope`
pub fn authorize(claims: &Claims, required_scope: &str) -> AuthResult<()> {
    if scope_grants(&claims.scopes, required_scope) {
        Ok(())
    } else {
        tracing::debug!(
            subject = %claims.sub,
            required = required_scope,
            "insufficient scope"
        );
        Err(AuthError::InsufficientScope {
            required: required_scope.to_string(),
        })
    }
}

/// Flat membership check. Hierarchical scopes would hook in here.
pub fn scope_grants(granted: &[String], required: &str) -> bool {
    granted.iter().any(|scope| scope == required)
}

/// Pull the token out of an `Authorization` header value
///
/// The scheme name is matched case-insensitively.
pub fn bearer_token(header: Option<&str>) -> AuthResult<&str> {
    let header = header.ok_or(AuthError::MissingToken)?;
    let token = header
        .trim_start()
        .split_once(' ')
        .filter(|(scheme, _)| scheme.eq_ignore_ascii_case(BEARER_SCHEME))
        .map(|(_, token)| token.trim());
    match token {
        Some(token) if !token.is_empty() => Ok(token),
        _ => Err(AuthError::Malformed(
            "authorization header is not a bearer token".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::{ITEMS_READ, ITEMS_WRITE};

    fn claims_with(scopes: &[&str]) -> Claims {
        Claims {
            iss: "cataloghaus".to_string(),
            aud: "catalog-api".to_string(),
            sub: "alice".to_string(),
            exp: 2_000_000_000,
            iat: 1_000_000_000,
            jti: None,
            scopes: scopes.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn grants_held_scope() {
        let claims = claims_with(&[ITEMS_READ, ITEMS_WRITE]);
        assert!(authorize(&claims, ITEMS_READ).is_ok());
        assert!(authorize(&claims, ITEMS_WRITE).is_ok());
    }

    #[test]
    fn rejects_missing_scope() {
        let claims = claims_with(&[ITEMS_READ]);
        match authorize(&claims, ITEMS_WRITE) {
            Err(AuthError::InsufficientScope { required }) => assert_eq!(required, ITEMS_WRITE),
            other => panic!("expected insufficient scope, got {:?}", other),
        }
    }

    #[test]
    fn empty_scope_set_grants_nothing() {
        assert!(authorize(&claims_with(&[]), ITEMS_READ).is_err());
    }

    #[test]
    fn scopes_are_not_prefixes() {
        assert!(!scope_grants(&["items".to_string()], ITEMS_READ));
        assert!(!scope_grants(&["items:read:all".to_string()], ITEMS_READ));
    }

    #[test]
    fn bearer_token_parsing() {
        assert_eq!(bearer_token(Some("Bearer abc.def.ghi")).unwrap(), "abc.def.ghi");
        assert!(matches!(bearer_token(None), Err(AuthError::MissingToken)));
        assert!(matches!(
            bearer_token(Some("Basic dXNlcjpwdw==")),
            Err(AuthError::Malformed(_))
        ));
        assert!(matches!(
            bearer_token(Some("Bearer ")),
            Err(AuthError::Malformed(_))
        ));
        assert!(matches!(
            bearer_token(Some("Bearerabc")),
            Err(AuthError::Malformed(_))
        ));
    }

    #[test]
    fn bearer_scheme_is_case_insensitive() {
        assert_eq!(bearer_token(Some("bearer abc.def.ghi")).unwrap(), "abc.def.ghi");
        assert_eq!(bearer_token(Some("BEARER abc.def.ghi")).unwrap(), "abc.def.ghi");
    }
}
