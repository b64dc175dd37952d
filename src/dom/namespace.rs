//! Namespace Scoping
//!
//! Prefix bindings reported by the event source arrive before the element
//! that declares them. They are collected in a pending map and attached to
//! that element when it opens.

use std::collections::BTreeMap;

/// Well-known namespace URIs
pub mod ns {
    /// Namespace reserved for the store's own bookkeeping attributes
    pub const RESERVED: &str = "http://exist.sourceforge.net/NS/exist";
}

/// Prefix -> URI table attached to an element
pub type NamespaceMap = BTreeMap<String, String>;

/// Pending prefix bindings plus the scopes of suppressed reserved prefixes
#[derive(Debug, Default)]
pub struct NamespaceScopes {
    /// Bindings awaiting the next opened element
    pending: NamespaceMap,
    /// Prefixes bound to the reserved namespace, innermost last
    suppressed: Vec<String>,
}

impl NamespaceScopes {
    /// Create empty scopes
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a binding for the next element.
    ///
    /// Bindings to [`ns::RESERVED`] are not recorded as ordinary prefixes.
    pub fn bind(&mut self, prefix: &str, uri: &str) {
        if uri == ns::RESERVED {
            self.suppressed.push(prefix.to_string());
        } else {
            self.pending.insert(prefix.to_string(), uri.to_string());
        }
    }

    /// End the scope of `prefix`
    pub fn unbind(&mut self, prefix: &str) {
        if self.suppressed.last().is_some_and(|p| p == prefix) {
            self.suppressed.pop();
        } else {
            self.pending.remove(prefix);
        }
    }

    /// Hand the pending bindings to the element being opened
    pub fn take_pending(&mut self) -> Option<NamespaceMap> {
        if self.pending.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.pending))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_suppressed(scopes: &NamespaceScopes, prefix: &str) -> bool {
        scopes.suppressed.iter().any(|p| p == prefix)
    }

    #[test]
    fn test_pending_attaches_once() {
        let mut scopes = NamespaceScopes::new();
        scopes.bind("svg", "http://www.w3.org/2000/svg");
        scopes.bind("", "urn:default");

        let map = scopes.take_pending().unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("svg").map(String::as_str), Some("http://www.w3.org/2000/svg"));
        assert!(scopes.take_pending().is_none());
    }

    #[test]
    fn test_reserved_binding_is_suppressed() {
        let mut scopes = NamespaceScopes::new();
        scopes.bind("exist", ns::RESERVED);
        assert!(scopes.pending.is_empty());
        assert!(is_suppressed(&scopes, "exist"));

        scopes.unbind("exist");
        assert!(!is_suppressed(&scopes, "exist"));
    }

    #[test]
    fn test_nested_suppressed_scopes() {
        let mut scopes = NamespaceScopes::new();
        scopes.bind("outer", ns::RESERVED);
        scopes.bind("inner", ns::RESERVED);

        scopes.unbind("inner");
        assert!(is_suppressed(&scopes, "outer"));
        assert!(!is_suppressed(&scopes, "inner"));

        scopes.unbind("outer");
        assert!(!is_suppressed(&scopes, "outer"));
    }

    #[test]
    fn test_unbind_unattached_pending() {
        let mut scopes = NamespaceScopes::new();
        scopes.bind("x", "urn:x");
        scopes.unbind("x");
        assert!(scopes.pending.is_empty());
    }
}
