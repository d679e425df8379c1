//! The generic value tree node.
//!
//! An [`XmlObject`] represents one XML element's content: a qualified name
//! plus either a value (scalar, array or nil) or an ordered sequence of
//! child nodes. Callers pick one content path; when both are populated the
//! write path gives children precedence.

use serde::{Deserialize, Serialize};
use std::io::{BufRead, Write};

use soapwire_xml::{QName, Tag, XmlError, XmlReader, XmlWriter, ns};

use crate::error::{BindError, Result};
use crate::mapper::TypeMapper;
use crate::value::{Scalar, Value};

/// A named, optionally-valued, optionally-childed tree node.
///
/// The name is fixed at construction. Children keep insertion order and may
/// repeat names; lookups return the first match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XmlObject {
    name: QName,
    value: Option<Value>,
    children: Vec<XmlObject>,
}

impl XmlObject {
    /// Creates an empty node.
    pub fn new(name: QName) -> Self {
        XmlObject {
            name,
            value: None,
            children: Vec::new(),
        }
    }

    /// Creates a leaf node holding a value.
    pub fn with_value(name: QName, value: impl Into<Value>) -> Self {
        XmlObject {
            name,
            value: Some(value.into()),
            children: Vec::new(),
        }
    }

    pub fn name(&self) -> &QName {
        &self.name
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    pub fn set_value(&mut self, value: impl Into<Value>) {
        self.value = Some(value.into());
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Forward iterator over children in insertion order.
    pub fn children(&self) -> impl Iterator<Item = &XmlObject> {
        self.children.iter()
    }

    /// Appends a child node.
    pub fn add_child(&mut self, child: XmlObject) {
        self.children.push(child);
    }

    /// Appends a leaf child named `local` in this node's namespace.
    /// Duplicate names append; earlier fields keep their position.
    pub fn set_field(&mut self, local: &str, value: impl Into<Value>) {
        let name = QName::new(self.name.namespace_uri(), local);
        self.add_field(name, value);
    }

    /// Appends a leaf child under an explicit qualified name.
    pub fn add_field(&mut self, name: QName, value: impl Into<Value>) {
        self.children.push(XmlObject::with_value(name, value));
    }

    /// First child whose local name matches.
    pub fn get_child(&self, local: &str) -> Option<&XmlObject> {
        self.children
            .iter()
            .find(|child| child.name.local_name() == local)
    }

    /// First child whose qualified name matches.
    pub fn get_child_qname(&self, name: &QName) -> Option<&XmlObject> {
        self.children.iter().find(|child| child.name == *name)
    }

    /// Value of the first child whose local name matches.
    pub fn get_field(&self, local: &str) -> Option<&Value> {
        self.get_child(local).and_then(|child| child.value.as_ref())
    }

    /// Writes this node as an element named `element`. That is usually the
    /// node's own name, but an array-item wrapper may pass a different one.
    ///
    /// Children are written recursively under their own names. An array
    /// value is unrolled into repeated sibling elements sharing `element`,
    /// in array order. A failure partway through leaves the stream
    /// partially written.
    pub fn write<W: Write>(
        &self,
        element: &QName,
        out: &mut XmlWriter<W>,
        mapper: &TypeMapper,
    ) -> Result<()> {
        if self.has_children() {
            out.write_start_tag(element)?;
            for child in &self.children {
                child.write(&child.name, out, mapper)?;
            }
            out.write_end_tag(element)?;
        } else {
            match &self.value {
                Some(Value::Array(items)) => {
                    for item in items {
                        mapper.write_value(out, element, item)?;
                    }
                }
                Some(value) => mapper.write_value(out, element, value)?,
                None => {
                    out.write_start_tag(element)?;
                    out.write_end_tag(element)?;
                }
            }
        }
        Ok(())
    }

    /// Reconstructs a generic tree from the element the reader is currently
    /// inside (start tag already consumed), up to and including its end tag.
    ///
    /// Child elements recurse; leaves with an `xsi:type` parse through the
    /// registry; `xsi:nil` leaves carry [`Value::Null`]; plain text leaves
    /// default to string. Repeated sibling names stay repeated children;
    /// collapsing them into an array value takes an explicit descriptor.
    pub fn load<R: BufRead>(reader: &mut XmlReader<R>, mapper: &TypeMapper) -> Result<XmlObject> {
        let name = match reader.current_name() {
            Some(name) => name.clone(),
            None => {
                return Err(BindError::UnexpectedElement {
                    expected: "a consumed start tag".to_string(),
                    found: "no current element".to_string(),
                });
            }
        };
        let nil = matches!(
            reader.attribute(ns::SCHEMA_INSTANCE_NS, ns::NIL_ATTR),
            Some("true") | Some("1")
        );
        let xml_type = match reader.attribute(ns::SCHEMA_INSTANCE_NS, ns::TYPE_ATTR) {
            Some(raw) => Some(reader.resolve_qname(raw)?),
            None => None,
        };

        let mut object = XmlObject::new(name);
        loop {
            match reader.peek_tag()? {
                Tag::Start(_) => {
                    reader.next_tag()?;
                    object.children.push(XmlObject::load(reader, mapper)?);
                }
                Tag::End(_) => {
                    let text = reader.read_text()?;
                    if !object.has_children() {
                        if nil {
                            object.value = Some(Value::Null);
                        } else if let Some(xml_type) = &xml_type {
                            object.value =
                                Some(Value::Scalar(mapper.read_scalar(xml_type, &text)?));
                        } else if !text.trim().is_empty() {
                            object.value = Some(Value::Scalar(Scalar::String(text)));
                        }
                    }
                    return Ok(object);
                }
                Tag::Eof => return Err(BindError::Stream(XmlError::UnexpectedEof)),
            }
        }
    }
}
