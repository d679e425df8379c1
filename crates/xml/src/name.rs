//! Qualified XML names.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A qualified XML name: a namespace URI plus a local name.
///
/// An empty namespace URI means the name is unqualified. `Display` renders
/// the expanded `{namespace}local` form so error messages and logs identify
/// elements unambiguously.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QName {
    namespace_uri: String,
    local_name: String,
}

impl QName {
    /// Creates a qualified name in the given namespace.
    pub fn new(namespace_uri: impl Into<String>, local_name: impl Into<String>) -> Self {
        QName {
            namespace_uri: namespace_uri.into(),
            local_name: local_name.into(),
        }
    }

    /// Creates an unqualified name (no namespace).
    pub fn local(local_name: impl Into<String>) -> Self {
        QName {
            namespace_uri: String::new(),
            local_name: local_name.into(),
        }
    }

    pub fn namespace_uri(&self) -> &str {
        &self.namespace_uri
    }

    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    pub fn has_namespace(&self) -> bool {
        !self.namespace_uri.is_empty()
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.has_namespace() {
            write!(f, "{{{}}}{}", self.namespace_uri, self.local_name)
        } else {
            f.write_str(&self.local_name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_qualified() {
        let name = QName::new("urn:example", "item");
        assert_eq!(name.to_string(), "{urn:example}item");
    }

    #[test]
    fn test_display_unqualified() {
        let name = QName::local("item");
        assert_eq!(name.to_string(), "item");
        assert!(!name.has_namespace());
    }

    #[test]
    fn test_equality() {
        assert_eq!(QName::new("urn:a", "x"), QName::new("urn:a", "x"));
        assert_ne!(QName::new("urn:a", "x"), QName::new("urn:b", "x"));
        assert_ne!(QName::new("urn:a", "x"), QName::new("urn:a", "y"));
    }
}
