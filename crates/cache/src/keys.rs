//! Deterministic cache keys for read requests

use gatehouse_core::{CacheScope, Principal};
use std::fmt;

/// Key under which a response is stored
///
/// The key is the request path followed by its decoded query parameters
/// sorted by name then value, so parameter order never splits entries.
/// Private entries additionally carry the principal's partition key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derive the key for a request
    #[must_use]
    pub fn derive(
        path: &str,
        query: &[(String, String)],
        scope: CacheScope,
        principal: &Principal,
    ) -> Self {
        let mut key = normalize_path(path);

        let mut params: Vec<_> = query.iter().collect();
        params.sort();
        for (i, (name, value)) in params.into_iter().enumerate() {
            key.push(if i == 0 { '?' } else { '&' });
            push_component(&mut key, name);
            key.push('=');
            push_component(&mut key, value);
        }

        if scope == CacheScope::Private {
            key.push('#');
            key.push_str(&principal.id().partition_key());
        }

        Self(key)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Append a decoded query component, escaping the key's own delimiters
fn push_component(key: &mut String, component: &str) {
    for c in component.chars() {
        match c {
            '%' => key.push_str("%25"),
            '&' => key.push_str("%26"),
            '=' => key.push_str("%3D"),
            '#' => key.push_str("%23"),
            _ => key.push(c),
        }
    }
}

/// Collapse repeated and trailing slashes; `""` becomes `/`
fn normalize_path(path: &str) -> String {
    let segments: Vec<_> = path.split('/').filter(|s| !s.is_empty()).collect();
    format!("/{}", segments.join("/"))
}
