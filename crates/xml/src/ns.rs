//! Well-known namespace URIs and attribute names.

/// XML Schema namespace (`xsd:` types such as `xsd:string`).
pub const SCHEMA_NS: &str = "http://www.w3.org/2001/XMLSchema";

/// XML Schema instance namespace (`xsi:type`, `xsi:nil`).
pub const SCHEMA_INSTANCE_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// Namespace bound to the reserved `xml` prefix.
pub const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

/// Local name of the `xsi:type` attribute.
pub const TYPE_ATTR: &str = "type";

/// Local name of the `xsi:nil` attribute.
pub const NIL_ATTR: &str = "nil";

/// Splits a possibly-prefixed name into `(prefix, local)`.
///
/// A name with no colon has no prefix. The split is purely lexical; binding
/// the prefix to a namespace is the caller's concern.
pub fn split_prefixed(name: &str) -> (Option<&str>, &str) {
    match name.split_once(':') {
        Some((prefix, local)) => (Some(prefix), local),
        None => (None, name),
    }
}
