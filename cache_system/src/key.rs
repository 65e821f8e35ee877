//! Cache key derivation
//!
//! Keys have the shape `{prefix}:{METHOD}:{path}?{query}`. The path is
//! normalized and the query is sorted, so logically identical requests map
//! to the same key no matter how the caller ordered its parameters.

use serde::Serialize;
use std::fmt;

/// Deterministic identity of a cacheable request
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derive a key from request method, path and query parameters
    pub fn derive<I, K, V>(prefix: &str, method: &str, path: &str, query: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        Self(format!(
            "{}?{}",
            family_root(prefix, method, path),
            canonical_query(query)
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Selects cache entries to invalidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyPattern {
    /// Exactly one key
    Exact(String),
    /// Every key starting with the given string
    Prefix(String),
}

impl KeyPattern {
    /// Parse a raw pattern; a trailing `*` turns it into a prefix match
    pub fn parse(raw: &str) -> Self {
        match raw.strip_suffix('*') {
            Some(prefix) => KeyPattern::Prefix(prefix.to_string()),
            None => KeyPattern::Exact(raw.to_string()),
        }
    }

    pub fn exact(key: &CacheKey) -> Self {
        KeyPattern::Exact(key.as_str().to_string())
    }

    /// Every query variant of a single path
    pub fn family(prefix: &str, method: &str, path: &str) -> Self {
        KeyPattern::Prefix(format!("{}?", family_root(prefix, method, path)))
    }

    /// A path together with everything below it
    pub fn subtree(prefix: &str, method: &str, path: &str) -> Self {
        KeyPattern::Prefix(family_root(prefix, method, path))
    }

    pub fn matches(&self, key: &str) -> bool {
        match self {
            KeyPattern::Exact(exact) => key == exact,
            KeyPattern::Prefix(prefix) => key.starts_with(prefix.as_str()),
        }
    }
}

impl fmt::Display for KeyPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyPattern::Exact(exact) => f.write_str(exact),
            KeyPattern::Prefix(prefix) => write!(f, "{}*", prefix),
        }
    }
}

fn family_root(prefix: &str, method: &str, path: &str) -> String {
    format!(
        "{}:{}:{}",
        prefix,
        method.to_ascii_uppercase(),
        normalize_path(path)
    )
}

/// Collapse repeated slashes and drop the trailing one
pub fn normalize_path(path: &str) -> String {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    format!("/{}", segments.join("/"))
}

/// Sort parameters by name then value and join them with `&`
pub fn canonical_query<I, K, V>(query: I) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut pairs: Vec<(String, String)> = query
        .into_iter()
        .map(|(k, v)| (escape(k.as_ref()), escape(v.as_ref())))
        .collect();
    pairs.sort();
    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

fn escape(component: &str) -> String {
    component
        .replace('%', "%25")
        .replace('&', "%26")
        .replace('=', "%3D")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameter_order_does_not_matter() {
        let a = CacheKey::derive("c", "get", "/items", [("offset", "0"), ("limit", "10")]);
        let b = CacheKey::derive("c", "GET", "/items", [("limit", "10"), ("offset", "0")]);
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "c:GET:/items?limit=10&offset=0");
    }

    #[test]
    fn test_path_normalization() {
        assert_eq!(normalize_path("//items///7/"), "/items/7");
        assert_eq!(normalize_path(""), "/");
        let a = CacheKey::derive("c", "GET", "/items/7/", Vec::<(&str, &str)>::new());
        let b = CacheKey::derive("c", "GET", "/items//7", Vec::<(&str, &str)>::new());
        assert_eq!(a, b);
    }

    #[test]
    fn test_escaping_keeps_keys_distinct() {
        let a = CacheKey::derive("c", "GET", "/items", [("category", "a&b=c")]);
        let b = CacheKey::derive("c", "GET", "/items", [("category", "a"), ("b", "c")]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_family_pattern_matches_all_query_variants() {
        let pattern = KeyPattern::family("c", "GET", "/items");
        let page = CacheKey::derive("c", "GET", "/items", [("offset", "10")]);
        let item = CacheKey::derive("c", "GET", "/items/1", Vec::<(&str, &str)>::new());
        assert!(pattern.matches(page.as_str()));
        assert!(!pattern.matches(item.as_str()));

        let subtree = KeyPattern::subtree("c", "GET", "/items");
        assert!(subtree.matches(page.as_str()));
        assert!(subtree.matches(item.as_str()));
    }

    #[test]
    fn test_parse_pattern() {
        assert_eq!(
            KeyPattern::parse("c:GET:/items?*"),
            KeyPattern::Prefix("c:GET:/items?".to_string())
        );
        assert_eq!(
            KeyPattern::parse("c:GET:/items?"),
            KeyPattern::Exact("c:GET:/items?".to_string())
        );
        assert_eq!(KeyPattern::parse("c:*").to_string(), "c:*");
    }
}
