//! Streaming XML adapters for the soapwire toolkit.
//!
//! This crate wraps `quick-xml` behind two small, SOAP-shaped surfaces:
//!
//! - [`XmlWriter`]: a sequential tag/attribute writer. Start tags stay
//!   pending until the next write so attributes can still be attached, and
//!   namespace prefixes are managed per namespace URI, caller-assigned
//!   through [`XmlWriter::set_prefix`] or generated on first use.
//! - [`XmlReader`]: a pull-style tag reader with one-event lookahead and an
//!   explicit namespace-binding stack, so element names, attribute names and
//!   QName-valued attribute content (`xsi:type="xsd:string"`) all resolve
//!   back to full qualified names.
//!
//! Both adapters are synchronous and blocking; any buffering beyond a single
//! event of lookahead belongs to the wrapped `Read`/`Write`.

pub mod error;
pub mod name;
pub mod ns;
pub mod reader;
pub mod writer;

pub use error::{Result, XmlError};
pub use name::QName;
pub use reader::{Tag, XmlReader};
pub use writer::XmlWriter;
