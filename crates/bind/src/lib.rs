//! # Soapwire XML Object Binding
//!
//! The binding core of the soapwire web service toolkit: a generic,
//! dynamically-typed value tree that maps to and from XML elements through
//! a pluggable type registry.
//!
//! ## Architecture
//!
//! - [`XmlObject`]: a named tree node holding a scalar, an array, nil, or
//!   ordered child nodes. Nodes write themselves depth-first onto a
//!   [`soapwire_xml::XmlWriter`] and are reconstructed from a
//!   [`soapwire_xml::XmlReader`].
//! - [`TypeMapper`]: the bidirectional registry between runtime value kinds
//!   and wire-level schema types. Write resolution walks declared fallback
//!   chains from the most specific kind outward; read reconstruction is
//!   driven by a [`TypeInfo`] descriptor with occurrence bounds.
//! - [`snapshot`]: opaque serialize/deserialize byte boundary used for deep
//!   copies.
//!
//! ## Wire format
//!
//! | Value | XML |
//! |-------|-----|
//! | `Value::Scalar("a")` | `<name xsi:type="xsd:string">a</name>` |
//! | `Value::Null` | `<name xsi:nil="true"/>` |
//! | `Value::Array(["a", "b"])` | `<name …>a</name><name …>b</name>` |
//! | children | `<name><child…/>…</name>` |
//!
//! Arrays are repeated sibling elements sharing one tag; reading them back
//! requires a [`TypeInfo`] descriptor because the stream alone carries no
//! occurrence information.
//!
//! ## Examples
//!
//! ```ignore
//! use soapwire_bind::{to_xml_string, TypeMapper, XmlObject};
//! use soapwire_xml::QName;
//!
//! let mut account = XmlObject::new(QName::new("urn:example", "account"));
//! account.set_field("name", "Acme");
//! account.set_field("employees", 250i32);
//!
//! let mapper = TypeMapper::new();
//! let xml = to_xml_string(&account, &mapper)?;
//! ```

pub mod error;
pub mod mapper;
pub mod object;
pub mod snapshot;
pub mod typeinfo;
pub mod value;

pub use error::{BindError, Result};
pub use mapper::{ExpectedType, ReadValue, TypeMapper};
pub use object::XmlObject;
pub use typeinfo::TypeInfo;
pub use value::{Scalar, Value, tags};

use soapwire_xml::{Tag, XmlReader, XmlWriter, ns};
use std::io::Write;

/// Serializes a tree to a complete XML document string.
pub fn to_xml_string(object: &XmlObject, mapper: &TypeMapper) -> Result<String> {
    let buffer = to_xml_vec(object, mapper)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

/// Serializes a tree to a complete XML document byte vector.
pub fn to_xml_vec(object: &XmlObject, mapper: &TypeMapper) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    to_xml_writer(object, mapper, &mut buffer)?;
    Ok(buffer)
}

/// Serializes a tree as a complete XML document onto a writer. The schema
/// and schema-instance prefixes are bound at document level so typed leaves
/// share one declaration.
pub fn to_xml_writer<W: Write>(object: &XmlObject, mapper: &TypeMapper, writer: W) -> Result<()> {
    let mut out = XmlWriter::new(writer);
    out.set_prefix("xsi", ns::SCHEMA_INSTANCE_NS);
    out.set_prefix("xsd", ns::SCHEMA_NS);
    out.start_document()?;
    object.write(object.name(), &mut out, mapper)?;
    out.close()?;
    Ok(())
}

/// Reconstructs a generic tree from an XML document string.
pub fn from_xml_str(xml: &str, mapper: &TypeMapper) -> Result<XmlObject> {
    let mut reader = XmlReader::from_str(xml);
    match reader.next_tag()? {
        Tag::Start(_) => XmlObject::load(&mut reader, mapper),
        Tag::End(name) => Err(BindError::UnexpectedElement {
            expected: "a document element".to_string(),
            found: format!("end of {}", name),
        }),
        Tag::Eof => Err(BindError::UnexpectedElement {
            expected: "a document element".to_string(),
            found: "end of stream".to_string(),
        }),
    }
}
