//! Error types for the XML stream adapters.

use thiserror::Error;

/// Errors produced while reading from or writing to an XML stream.
#[derive(Error, Debug)]
pub enum XmlError {
    /// Structurally invalid XML reported by the underlying parser.
    #[error("malformed xml stream: {0}")]
    Parse(#[from] quick_xml::Error),

    /// Malformed attribute syntax inside a tag.
    #[error("malformed xml attribute: {0}")]
    Attr(#[from] quick_xml::events::attributes::AttrError),

    /// I/O failure on the wrapped reader or writer.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A prefixed name used a prefix with no in-scope binding.
    #[error("unbound namespace prefix `{0}`")]
    UnboundPrefix(String),

    /// The stream held a different event than the caller required.
    #[error("unexpected {found} while expecting {expected}")]
    UnexpectedEvent { expected: String, found: String },

    /// The document ended inside an open element.
    #[error("unexpected end of xml stream")]
    UnexpectedEof,
}

/// Result type alias for XML stream operations.
pub type Result<T> = std::result::Result<T, XmlError>;
