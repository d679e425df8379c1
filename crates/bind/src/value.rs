//! The dynamic value model carried by tree nodes.
//!
//! A node's content is a [`Value`]: nil, a single [`Scalar`], or an array of
//! values. The model is a closed tagged variant rather than an open "any"
//! slot, so the write path is exhaustive at compile time; the open-world
//! edge is [`Scalar::Tagged`], an application-registered kind carried in
//! lexical form and resolved through the registry's fallback chains.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, SecondsFormat};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable type tags for the built-in scalar kinds. The tags double as the
/// XML Schema local names the registry pre-registers them under.
pub mod tags {
    pub const STRING: &str = "string";
    pub const BOOLEAN: &str = "boolean";
    pub const INT: &str = "int";
    pub const LONG: &str = "long";
    pub const SHORT: &str = "short";
    pub const BYTE: &str = "byte";
    pub const FLOAT: &str = "float";
    pub const DOUBLE: &str = "double";
    pub const DATE_TIME: &str = "dateTime";
    pub const DATE: &str = "date";
    pub const TIME: &str = "time";
    pub const BASE64_BINARY: &str = "base64Binary";
}

/// A single typed value in its runtime representation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Scalar {
    String(String),
    Boolean(bool),
    Int(i32),
    Long(i64),
    Short(i16),
    Byte(i8),
    Float(f32),
    Double(f64),
    DateTime(DateTime<FixedOffset>),
    Date(NaiveDate),
    Time(NaiveTime),
    Bytes(Vec<u8>),
    /// An application-registered kind, carried in XML lexical form. Whether
    /// it is writable is the registry's decision, not the model's.
    Tagged { tag: String, lexical: String },
}

impl Scalar {
    /// The type tag the registry resolves this value under.
    pub fn type_tag(&self) -> &str {
        match self {
            Scalar::String(_) => tags::STRING,
            Scalar::Boolean(_) => tags::BOOLEAN,
            Scalar::Int(_) => tags::INT,
            Scalar::Long(_) => tags::LONG,
            Scalar::Short(_) => tags::SHORT,
            Scalar::Byte(_) => tags::BYTE,
            Scalar::Float(_) => tags::FLOAT,
            Scalar::Double(_) => tags::DOUBLE,
            Scalar::DateTime(_) => tags::DATE_TIME,
            Scalar::Date(_) => tags::DATE,
            Scalar::Time(_) => tags::TIME,
            Scalar::Bytes(_) => tags::BASE64_BINARY,
            Scalar::Tagged { tag, .. } => tag,
        }
    }

    /// The XML lexical form of the value.
    pub fn lexical(&self) -> String {
        match self {
            Scalar::String(value) => value.clone(),
            Scalar::Boolean(value) => if *value { "true" } else { "false" }.to_string(),
            Scalar::Int(value) => value.to_string(),
            Scalar::Long(value) => value.to_string(),
            Scalar::Short(value) => value.to_string(),
            Scalar::Byte(value) => value.to_string(),
            Scalar::Float(value) => value.to_string(),
            Scalar::Double(value) => value.to_string(),
            Scalar::DateTime(value) => value.to_rfc3339_opts(SecondsFormat::Millis, true),
            Scalar::Date(value) => value.format("%Y-%m-%d").to_string(),
            Scalar::Time(value) => value.format("%H:%M:%S%.3f").to_string(),
            Scalar::Bytes(value) => BASE64.encode(value),
            Scalar::Tagged { lexical, .. } => lexical.clone(),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.lexical())
    }
}

/// A node's content: nil, one scalar, or an ordered array of values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Explicit nil (`xsi:nil="true"` on the wire).
    Null,
    Scalar(Scalar),
    Array(Vec<Value>),
}

impl Value {
    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Value::Scalar(scalar) => Some(scalar),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Builds an array value from anything convertible item-wise.
    pub fn array<T: Into<Value>>(items: impl IntoIterator<Item = T>) -> Value {
        Value::Array(items.into_iter().map(Into::into).collect())
    }
}

impl From<Scalar> for Value {
    fn from(scalar: Scalar) -> Value {
        Value::Scalar(scalar)
    }
}

macro_rules! scalar_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Scalar {
                fn from(value: $ty) -> Scalar {
                    Scalar::$variant(value.into())
                }
            }

            impl From<$ty> for Value {
                fn from(value: $ty) -> Value {
                    Value::Scalar(Scalar::$variant(value.into()))
                }
            }
        )*
    };
}

scalar_from! {
    &str => String,
    String => String,
    bool => Boolean,
    i32 => Int,
    i64 => Long,
    i16 => Short,
    i8 => Byte,
    f32 => Float,
    f64 => Double,
    DateTime<FixedOffset> => DateTime,
    NaiveDate => Date,
    NaiveTime => Time,
    Vec<u8> => Bytes,
}
