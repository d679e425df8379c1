//! Error types for the binding core.

use soapwire_xml::{QName, XmlError};
use thiserror::Error;

/// Errors raised while binding value trees to and from XML.
#[derive(Error, Debug)]
pub enum BindError {
    /// Write-side resolution failure: the value's kind has no wire mapping,
    /// directly or through its declared fallback chain.
    #[error("unable to find xml type for value `{value}` of kind `{tag}`")]
    UnresolvableType { tag: String, value: String },

    /// Read-side resolution failure: the schema type has no runtime mapping.
    #[error("unable to find runtime type for {0}")]
    UnresolvableSchemaType(QName),

    /// Element content does not parse under the mapped kind.
    #[error("invalid {tag} value `{text}`")]
    Lexical { tag: String, text: String },

    /// Parsed element count violates the descriptor's occurrence bounds.
    #[error("element {element} occurred {count} times, outside bounds [{min}, {max}]")]
    OccurrenceViolation {
        element: QName,
        count: usize,
        min: u32,
        max: i32,
    },

    /// The stream is positioned on a tag the read path cannot accept.
    #[error("unexpected element {found}, expected {expected}")]
    UnexpectedElement { expected: String, found: String },

    /// Malformed-stream and namespace errors from the XML adapters,
    /// propagated unchanged.
    #[error(transparent)]
    Stream(#[from] XmlError),

    /// Snapshot transport failure.
    #[error("snapshot error: {0}")]
    Snapshot(#[from] serde_json::Error),
}

/// Result type alias for binding operations.
pub type Result<T> = std::result::Result<T, BindError>;
