//! The type-mapping registry.
//!
//! [`TypeMapper`] is the bidirectional bridge between runtime value kinds
//! and wire-level schema types. Write resolution starts at a value's exact
//! type tag and walks the declared fallback chain (the registry's stand-in
//! for a superclass walk) until a mapping is found or the chain runs out.
//! Read resolution is driven by a [`TypeInfo`] descriptor: elements are
//! pulled while the tag matches, occurrence bounds are enforced, and content
//! is parsed back into runtime values.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use std::collections::HashMap;
use std::io::{BufRead, Write};
use tracing::{debug, trace};

use soapwire_xml::{QName, Tag, XmlReader, XmlWriter, ns};

use crate::error::{BindError, Result};
use crate::object::XmlObject;
use crate::typeinfo::TypeInfo;
use crate::value::{Scalar, Value, tags};

/// The runtime shape a descriptor-driven read should produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectedType {
    /// One value of the descriptor's schema type.
    Scalar,
    /// A homogeneous array of the descriptor's schema type.
    Array,
    /// One value whose kind comes from its own `xsi:type`.
    Any,
    /// An array whose item kinds come from each element's own `xsi:type`.
    AnyArray,
    /// A compound element reconstructed as a generic tree.
    Tree,
}

/// The result of a descriptor-driven read.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadValue {
    /// The element sequence was absent, or a single nil element.
    Nil,
    /// A scalar or array value.
    Value(Value),
    /// A single compound element.
    Object(Box<XmlObject>),
    /// A repeated compound element.
    Objects(Vec<XmlObject>),
}

/// Bidirectional mapping between runtime value kinds and schema types.
///
/// The mapper is read-only after registration and is shared by reference
/// across independent write and read operations.
pub struct TypeMapper {
    /// Runtime kind to wire type.
    write_types: HashMap<String, QName>,
    /// Wire type back to runtime kind.
    read_types: HashMap<QName, String>,
    /// Declared fallback chain: derived kind to its base kind.
    bases: HashMap<String, String>,
}

impl TypeMapper {
    /// Creates a mapper with the built-in scalar kinds pre-registered under
    /// their XML Schema names.
    pub fn new() -> Self {
        let mut mapper = TypeMapper {
            write_types: HashMap::new(),
            read_types: HashMap::new(),
            bases: HashMap::new(),
        };
        for tag in [
            tags::STRING,
            tags::BOOLEAN,
            tags::INT,
            tags::LONG,
            tags::SHORT,
            tags::BYTE,
            tags::FLOAT,
            tags::DOUBLE,
            tags::DATE_TIME,
            tags::DATE,
            tags::TIME,
            tags::BASE64_BINARY,
        ] {
            mapper.register_type(tag, QName::new(ns::SCHEMA_NS, tag));
        }
        mapper
    }

    /// Registers a kind in both directions: values tagged `tag` write as
    /// `xml_type`, and elements typed `xml_type` read back as `tag`.
    pub fn register_type(&mut self, tag: impl Into<String>, xml_type: QName) {
        let tag = tag.into();
        debug!(tag = %tag, xml_type = %xml_type, "registering type mapping");
        self.write_types.insert(tag.clone(), xml_type.clone());
        self.read_types.insert(xml_type, tag);
    }

    /// Declares `tag` as derived from `base`: write resolution for `tag`
    /// falls back to `base` when `tag` itself has no mapping.
    pub fn register_derived(&mut self, tag: impl Into<String>, base: impl Into<String>) {
        let tag = tag.into();
        let base = base.into();
        debug!(tag = %tag, base = %base, "registering derived kind");
        self.bases.insert(tag, base);
    }

    /// Resolves a value's wire type, walking the declared fallback chain
    /// from the most specific kind outward.
    pub fn xml_type(&self, scalar: &Scalar) -> Result<&QName> {
        let mut tag = scalar.type_tag();
        let mut hops = 0;
        loop {
            if let Some(xml_type) = self.write_types.get(tag) {
                trace!(tag = scalar.type_tag(), xml_type = %xml_type, "resolved wire type");
                return Ok(xml_type);
            }
            // The hop bound keeps a cyclic fallback chain from spinning.
            match self.bases.get(tag) {
                Some(base) if hops <= self.bases.len() => {
                    trace!(tag, base = base.as_str(), "walking fallback chain");
                    tag = base;
                    hops += 1;
                }
                _ => {
                    return Err(BindError::UnresolvableType {
                        tag: scalar.type_tag().to_string(),
                        value: scalar.lexical(),
                    });
                }
            }
        }
    }

    /// Writes one value as an element named `element`. Scalars carry an
    /// `xsi:type` attribute; nil writes `xsi:nil="true"`. Arrays are
    /// unrolled by the node layer, one element per item, so a nested array
    /// reaching this point has no wire encoding and is rejected.
    pub fn write_value<W: Write>(
        &self,
        out: &mut XmlWriter<W>,
        element: &QName,
        value: &Value,
    ) -> Result<()> {
        match value {
            Value::Null => {
                out.write_start_tag(element)?;
                out.write_ns_attribute(&QName::new(ns::SCHEMA_INSTANCE_NS, ns::NIL_ATTR), "true")?;
                out.write_end_tag(element)?;
            }
            Value::Scalar(scalar) => {
                // Resolve before opening the tag so an unmappable value
                // produces no output at all.
                let xml_type = self.xml_type(scalar)?;
                out.write_start_tag(element)?;
                out.write_qname_attribute(
                    &QName::new(ns::SCHEMA_INSTANCE_NS, ns::TYPE_ATTR),
                    xml_type,
                )?;
                let text = scalar.lexical();
                if !text.is_empty() {
                    out.write_text(&text)?;
                }
                out.write_end_tag(element)?;
            }
            Value::Array(_) => {
                return Err(BindError::UnresolvableType {
                    tag: "array".to_string(),
                    value: "nested array".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Parses one lexical value under the given schema type.
    pub fn read_scalar(&self, xml_type: &QName, text: &str) -> Result<Scalar> {
        match self.read_types.get(xml_type) {
            Some(tag) => self.parse_lexical(tag, text),
            None => Err(BindError::UnresolvableSchemaType(xml_type.clone())),
        }
    }

    /// Reads the element sequence described by `info` into the expected
    /// runtime shape. The reader must be positioned just before the first
    /// candidate tag; reading stops at the first non-matching tag.
    pub fn read_object<R: BufRead>(
        &self,
        reader: &mut XmlReader<R>,
        info: &TypeInfo,
        expected: ExpectedType,
    ) -> Result<ReadValue> {
        let element = info.element_qname();
        // Single-result shapes cap the sequence at one element regardless of
        // how permissive the descriptor is.
        let max_occurs = match expected {
            ExpectedType::Scalar | ExpectedType::Any => {
                if info.unbounded() {
                    1
                } else {
                    info.max_occurs().min(1)
                }
            }
            _ => info.max_occurs(),
        };
        let unbounded = max_occurs < 0;

        let mut values: Vec<Value> = Vec::new();
        let mut objects: Vec<XmlObject> = Vec::new();
        let mut count: usize = 0;
        loop {
            match reader.peek_tag()? {
                Tag::Start(name) if name == element => {
                    if !unbounded && count >= max_occurs.max(0) as usize {
                        return Err(BindError::OccurrenceViolation {
                            element,
                            count: count + 1,
                            min: info.min_occurs(),
                            max: info.max_occurs(),
                        });
                    }
                    reader.next_tag()?;
                    match expected {
                        ExpectedType::Tree => objects.push(XmlObject::load(reader, self)?),
                        ExpectedType::Scalar | ExpectedType::Array => {
                            values.push(self.read_typed_item(reader, info)?);
                        }
                        ExpectedType::Any | ExpectedType::AnyArray => {
                            values.push(self.read_dynamic_item(reader, info)?);
                        }
                    }
                    count += 1;
                }
                _ => break,
            }
        }
        if count < info.min_occurs() as usize {
            return Err(BindError::OccurrenceViolation {
                element,
                count,
                min: info.min_occurs(),
                max: info.max_occurs(),
            });
        }
        debug!(element = %element, count, "read element sequence");

        match expected {
            ExpectedType::Scalar | ExpectedType::Any => Ok(match values.pop() {
                None | Some(Value::Null) => ReadValue::Nil,
                Some(value) => ReadValue::Value(value),
            }),
            ExpectedType::Array | ExpectedType::AnyArray => {
                Ok(ReadValue::Value(Value::Array(values)))
            }
            ExpectedType::Tree => Ok(match objects.pop() {
                None => ReadValue::Nil,
                Some(last) if objects.is_empty() => ReadValue::Object(Box::new(last)),
                Some(last) => {
                    objects.push(last);
                    ReadValue::Objects(objects)
                }
            }),
        }
    }

    /// One element parsed under the descriptor's schema type. The start tag
    /// has already been consumed.
    fn read_typed_item<R: BufRead>(
        &self,
        reader: &mut XmlReader<R>,
        info: &TypeInfo,
    ) -> Result<Value> {
        if let Some(nil) = self.take_nil(reader, info)? {
            return Ok(nil);
        }
        let xml_type = info.type_qname();
        let tag = match self.read_types.get(&xml_type) {
            Some(tag) => tag.clone(),
            None => return Err(BindError::UnresolvableSchemaType(xml_type)),
        };
        let text = reader.read_text()?;
        Ok(Value::Scalar(self.parse_lexical(&tag, &text)?))
    }

    /// One element parsed under its own `xsi:type`. An element with no
    /// `xsi:type` defaults to string, matching generic tree loading.
    fn read_dynamic_item<R: BufRead>(
        &self,
        reader: &mut XmlReader<R>,
        info: &TypeInfo,
    ) -> Result<Value> {
        if let Some(nil) = self.take_nil(reader, info)? {
            return Ok(nil);
        }
        let tag = match reader.attribute(ns::SCHEMA_INSTANCE_NS, ns::TYPE_ATTR) {
            Some(raw) => {
                let xml_type = reader.resolve_qname(raw)?;
                match self.read_types.get(&xml_type) {
                    Some(tag) => tag.clone(),
                    None => return Err(BindError::UnresolvableSchemaType(xml_type)),
                }
            }
            None => tags::STRING.to_string(),
        };
        let text = reader.read_text()?;
        Ok(Value::Scalar(self.parse_lexical(&tag, &text)?))
    }

    /// Consumes the current element as a nil item if it carries `xsi:nil`.
    /// Nil is only admitted when the descriptor says nillable.
    fn take_nil<R: BufRead>(
        &self,
        reader: &mut XmlReader<R>,
        info: &TypeInfo,
    ) -> Result<Option<Value>> {
        let nil = matches!(
            reader.attribute(ns::SCHEMA_INSTANCE_NS, ns::NIL_ATTR),
            Some("true") | Some("1")
        );
        if !nil {
            return Ok(None);
        }
        if !info.nillable() {
            return Err(BindError::UnexpectedElement {
                expected: format!("non-nil {}", info.element_qname()),
                found: "xsi:nil element".to_string(),
            });
        }
        reader.read_text()?;
        Ok(Some(Value::Null))
    }

    /// Parses lexical content under a resolved runtime kind. Registered
    /// non-built-in kinds keep their lexical form.
    fn parse_lexical(&self, tag: &str, text: &str) -> Result<Scalar> {
        let lexical = || BindError::Lexical {
            tag: tag.to_string(),
            text: text.to_string(),
        };
        Ok(match tag {
            tags::STRING => Scalar::String(text.to_string()),
            tags::BOOLEAN => match text {
                "true" | "1" => Scalar::Boolean(true),
                "false" | "0" => Scalar::Boolean(false),
                _ => return Err(lexical()),
            },
            tags::INT => Scalar::Int(text.parse().map_err(|_| lexical())?),
            tags::LONG => Scalar::Long(text.parse().map_err(|_| lexical())?),
            tags::SHORT => Scalar::Short(text.parse().map_err(|_| lexical())?),
            tags::BYTE => Scalar::Byte(text.parse().map_err(|_| lexical())?),
            tags::FLOAT => Scalar::Float(text.parse().map_err(|_| lexical())?),
            tags::DOUBLE => Scalar::Double(text.parse().map_err(|_| lexical())?),
            tags::DATE_TIME => Scalar::DateTime(
                chrono::DateTime::parse_from_rfc3339(text).map_err(|_| lexical())?,
            ),
            tags::DATE => Scalar::Date(
                chrono::NaiveDate::parse_from_str(text, "%Y-%m-%d").map_err(|_| lexical())?,
            ),
            tags::TIME => Scalar::Time(
                chrono::NaiveTime::parse_from_str(text, "%H:%M:%S%.f").map_err(|_| lexical())?,
            ),
            tags::BASE64_BINARY => Scalar::Bytes(BASE64.decode(text).map_err(|_| lexical())?),
            other => Scalar::Tagged {
                tag: other.to_string(),
                lexical: text.to_string(),
            },
        })
    }
}

impl Default for TypeMapper {
    fn default() -> Self {
        Self::new()
    }
}
