use serde::{Deserialize, Serialize};

/// Where a scope set came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScopeOrigin {
    /// Supplied by the user; authoritative.
    Explicit,
    /// Returned by the provider's discovery call.
    Discovered,
    /// Static fallback used after discovery failed.
    Fallback,
}

/// Ordered, de-duplicated regions / subscriptions / projects to query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeSet {
    scopes: Vec<String>,
    origin: ScopeOrigin,
}

impl ScopeSet {
    pub fn new<I, S>(origin: ScopeOrigin, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out: Vec<String> = Vec::new();
        for scope in scopes {
            let scope = scope.as_ref().trim();
            if !scope.is_empty() && !out.iter().any(|s| s == scope) {
                out.push(scope.to_string());
            }
        }
        Self { scopes: out, origin }
    }

    pub fn origin(&self) -> ScopeOrigin {
        self.origin
    }

    pub fn as_slice(&self) -> &[String] {
        &self.scopes
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.scopes.iter()
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }
}
