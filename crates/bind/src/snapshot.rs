//! Snapshot transport: opaque byte-level deep copies of value trees.
//!
//! This module provides thin wrappers around `serde_json`, giving the rest
//! of the toolkit a serialize-tree-to-bytes / deserialize-bytes-to-tree
//! boundary without caring what the bytes are. A round-tripped tree
//! reproduces every node exactly: name, value (array contents element-wise)
//! and the full ordered children sequence.

use crate::error::Result;
use crate::object::XmlObject;

/// Serializes a tree to a snapshot byte vector.
///
/// # Examples
///
/// ```ignore
/// use soapwire_bind::{snapshot, XmlObject};
///
/// let copy = snapshot::from_slice(&snapshot::to_vec(&tree)?)?;
/// assert_eq!(tree, copy);
/// ```
pub fn to_vec(object: &XmlObject) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(object)?)
}

/// Reconstructs a tree from a snapshot byte slice.
pub fn from_slice(bytes: &[u8]) -> Result<XmlObject> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Serializes a tree to a snapshot string.
pub fn to_string(object: &XmlObject) -> Result<String> {
    Ok(serde_json::to_string(object)?)
}

/// Reconstructs a tree from a snapshot string.
pub fn from_str(snapshot: &str) -> Result<XmlObject> {
    Ok(serde_json::from_str(snapshot)?)
}
