//! Sequential XML writing with namespace-prefix management.
//!
//! [`XmlWriter`] adapts `quick_xml::Writer` to the tag/attribute surface the
//! binding layer works against. A start tag is held pending until the next
//! write so attributes can still be attached to it; a start tag closed with
//! no intervening content collapses to an empty element (`<tag/>`).

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use std::io::Write;
use tracing::trace;

use crate::error::{Result, XmlError};
use crate::name::QName;

/// Sequential XML writer with per-namespace prefix management.
///
/// Prefixes are bound with [`set_prefix`](Self::set_prefix); the matching
/// `xmlns` declarations are emitted on the next start tag written. A
/// namespace used before any prefix was assigned to it gets a generated
/// prefix (`ns1`, `ns2`, …), declared at first use.
pub struct XmlWriter<W: Write> {
    writer: Writer<W>,
    /// (prefix, namespace) bindings in declaration order; the most recent
    /// binding for a namespace wins.
    bindings: Vec<(String, String)>,
    /// Declarations not yet attached to a start tag.
    pending_decls: Vec<(String, String)>,
    /// Start tag held back so attributes can still be attached.
    pending_start: Option<(String, BytesStart<'static>)>,
    /// Binding-stack mark per open element: bindings above the mark were
    /// declared on that element and go out of scope with it.
    open_marks: Vec<usize>,
    declaration_written: bool,
    generated: u32,
}

impl<W: Write> XmlWriter<W> {
    /// Creates a writer producing compact output.
    pub fn new(writer: W) -> Self {
        Self::wrap(Writer::new(writer))
    }

    /// Creates a writer producing indented output.
    pub fn pretty(writer: W) -> Self {
        Self::wrap(Writer::new_with_indent(writer, b' ', 2))
    }

    fn wrap(writer: Writer<W>) -> Self {
        XmlWriter {
            writer,
            bindings: Vec::new(),
            pending_decls: Vec::new(),
            pending_start: None,
            open_marks: Vec::new(),
            declaration_written: false,
            generated: 0,
        }
    }

    /// Binds `prefix` to `namespace`. The declaration is emitted on the next
    /// start tag; an empty prefix declares the default namespace.
    pub fn set_prefix(&mut self, prefix: impl Into<String>, namespace: impl Into<String>) {
        let prefix = prefix.into();
        let namespace = namespace.into();
        trace!(prefix = %prefix, namespace = %namespace, "binding namespace prefix");
        self.bindings.push((prefix.clone(), namespace.clone()));
        self.pending_decls.push((prefix, namespace));
    }

    /// Writes the XML declaration (`1.0`, `UTF-8`) if not already written.
    pub fn start_document(&mut self) -> Result<()> {
        if !self.declaration_written {
            self.writer
                .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
            self.declaration_written = true;
        }
        Ok(())
    }

    /// Opens an element. The tag stays pending until the next write so
    /// attributes can still be attached.
    pub fn write_start_tag(&mut self, name: &QName) -> Result<()> {
        self.flush_pending()?;
        let serialized = self.element_name(name);
        let element = BytesStart::new(serialized.clone());
        self.pending_start = Some((serialized, element));
        Ok(())
    }

    /// Attaches an unqualified attribute to the open start tag.
    pub fn write_attribute(&mut self, local: &str, value: &str) -> Result<()> {
        match self.pending_start.as_mut() {
            Some((_, element)) => {
                element.push_attribute((local, value));
                Ok(())
            }
            None => Err(XmlError::UnexpectedEvent {
                expected: "an open start tag".to_string(),
                found: format!("attribute `{}`", local),
            }),
        }
    }

    /// Attaches a namespace-qualified attribute whose value is itself a
    /// qualified name, rendered in `prefix:local` form.
    pub fn write_qname_attribute(&mut self, name: &QName, value: &QName) -> Result<()> {
        let key = self.attribute_name(name);
        let rendered = self.qname_value(value);
        self.write_attribute(&key, &rendered)
    }

    /// Attaches a namespace-qualified attribute with plain text content.
    pub fn write_ns_attribute(&mut self, name: &QName, value: &str) -> Result<()> {
        let key = self.attribute_name(name);
        self.write_attribute(&key, value)
    }

    /// Writes character content, escaped as needed.
    pub fn write_text(&mut self, text: &str) -> Result<()> {
        self.flush_pending()?;
        self.writer.write_event(Event::Text(BytesText::new(text)))?;
        Ok(())
    }

    /// Closes an element. A start tag still pending for the same element is
    /// collapsed to an empty element. Bindings declared on the closed
    /// element go out of scope with it.
    pub fn write_end_tag(&mut self, name: &QName) -> Result<()> {
        let serialized = self.element_name(name);
        if let Some((pending_name, mut element)) = self.pending_start.take() {
            if pending_name != serialized {
                return Err(XmlError::UnexpectedEvent {
                    expected: format!("end of <{}>", pending_name),
                    found: format!("end of <{}>", serialized),
                });
            }
            let mark = self.bindings.len().saturating_sub(self.pending_decls.len());
            for (prefix, namespace) in self.pending_decls.drain(..) {
                element.push_attribute((decl_attribute(&prefix).as_str(), namespace.as_str()));
            }
            self.writer.write_event(Event::Empty(element))?;
            self.bindings.truncate(mark);
        } else {
            self.writer
                .write_event(Event::End(BytesEnd::new(serialized)))?;
            if let Some(mark) = self.open_marks.pop() {
                self.bindings.truncate(mark);
            }
        }
        Ok(())
    }

    /// Flushes any pending start tag and the underlying writer.
    pub fn close(&mut self) -> Result<()> {
        self.flush_pending()?;
        self.writer.get_mut().flush()?;
        Ok(())
    }

    /// Consumes the adapter, returning the wrapped writer.
    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }

    fn flush_pending(&mut self) -> Result<()> {
        if let Some((_, mut element)) = self.pending_start.take() {
            let mark = self.bindings.len().saturating_sub(self.pending_decls.len());
            for (prefix, namespace) in self.pending_decls.drain(..) {
                element.push_attribute((decl_attribute(&prefix).as_str(), namespace.as_str()));
            }
            self.open_marks.push(mark);
            self.writer.write_event(Event::Start(element))?;
        }
        Ok(())
    }

    /// Serialized form of an element name under current bindings.
    fn element_name(&mut self, name: &QName) -> String {
        if !name.has_namespace() {
            return name.local_name().to_string();
        }
        let prefix = match self.prefix_for(name.namespace_uri()) {
            Some(prefix) => prefix,
            None => self.assign_prefix(name.namespace_uri()),
        };
        join_prefixed(&prefix, name.local_name())
    }

    /// Serialized form of an attribute name. Unlike elements, attributes are
    /// never in the default namespace, so a non-empty prefix is required.
    fn attribute_name(&mut self, name: &QName) -> String {
        if !name.has_namespace() {
            return name.local_name().to_string();
        }
        let prefix = match self.named_prefix_for(name.namespace_uri()) {
            Some(prefix) => prefix,
            None => self.assign_prefix(name.namespace_uri()),
        };
        join_prefixed(&prefix, name.local_name())
    }

    /// Serialized form of a qualified name used as attribute content.
    fn qname_value(&mut self, value: &QName) -> String {
        if !value.has_namespace() {
            return value.local_name().to_string();
        }
        let prefix = match self.prefix_for(value.namespace_uri()) {
            Some(prefix) => prefix,
            None => self.assign_prefix(value.namespace_uri()),
        };
        join_prefixed(&prefix, value.local_name())
    }

    fn prefix_for(&self, namespace: &str) -> Option<String> {
        self.bindings
            .iter()
            .rev()
            .find(|(_, bound)| bound == namespace)
            .map(|(prefix, _)| prefix.clone())
    }

    fn named_prefix_for(&self, namespace: &str) -> Option<String> {
        self.bindings
            .iter()
            .rev()
            .find(|(prefix, bound)| !prefix.is_empty() && bound == namespace)
            .map(|(prefix, _)| prefix.clone())
    }

    fn assign_prefix(&mut self, namespace: &str) -> String {
        let prefix = loop {
            self.generated += 1;
            let candidate = format!("ns{}", self.generated);
            if !self.bindings.iter().any(|(prefix, _)| *prefix == candidate) {
                break candidate;
            }
        };
        trace!(prefix = %prefix, namespace = %namespace, "generated namespace prefix");
        self.bindings.push((prefix.clone(), namespace.to_string()));
        self.pending_decls.push((prefix.clone(), namespace.to_string()));
        prefix
    }
}

fn join_prefixed(prefix: &str, local: &str) -> String {
    if prefix.is_empty() {
        local.to_string()
    } else {
        format!("{}:{}", prefix, local)
    }
}

fn decl_attribute(prefix: &str) -> String {
    if prefix.is_empty() {
        "xmlns".to_string()
    } else {
        format!("xmlns:{}", prefix)
    }
}
