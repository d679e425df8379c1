//! Element type descriptors driving descriptor-based reads.

use soapwire_xml::QName;

/// Describes one expected element: its tag, its schema type, and how many
/// times it may occur. Reads are driven entirely by the descriptor; the
/// core never infers occurrence from the stream alone.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeInfo {
    namespace: String,
    name: String,
    type_namespace: String,
    type_name: String,
    min_occurs: u32,
    max_occurs: i32,
    nillable: bool,
}

impl TypeInfo {
    /// Creates a descriptor. A `max_occurs` of `-1` means unbounded.
    pub fn new(
        namespace: impl Into<String>,
        name: impl Into<String>,
        type_namespace: impl Into<String>,
        type_name: impl Into<String>,
        min_occurs: u32,
        max_occurs: i32,
        nillable: bool,
    ) -> Self {
        TypeInfo {
            namespace: namespace.into(),
            name: name.into(),
            type_namespace: type_namespace.into(),
            type_name: type_name.into(),
            min_occurs,
            max_occurs,
            nillable,
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_namespace(&self) -> &str {
        &self.type_namespace
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn min_occurs(&self) -> u32 {
        self.min_occurs
    }

    pub fn max_occurs(&self) -> i32 {
        self.max_occurs
    }

    pub fn nillable(&self) -> bool {
        self.nillable
    }

    pub fn unbounded(&self) -> bool {
        self.max_occurs < 0
    }

    /// The element tag this descriptor expects.
    pub fn element_qname(&self) -> QName {
        QName::new(self.namespace.clone(), self.name.clone())
    }

    /// The schema type this descriptor binds the element content to.
    pub fn type_qname(&self) -> QName {
        QName::new(self.type_namespace.clone(), self.type_name.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use soapwire_xml::ns;

    #[test]
    fn test_qname_views() {
        let info = TypeInfo::new("urn:example", "anArray", ns::SCHEMA_NS, "string", 0, -1, true);
        assert_eq!(info.element_qname(), QName::new("urn:example", "anArray"));
        assert_eq!(info.type_qname(), QName::new(ns::SCHEMA_NS, "string"));
        assert!(info.unbounded());
        assert!(info.nillable());
    }
}
