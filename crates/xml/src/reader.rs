//! Pull-style XML reading with namespace resolution.
//!
//! [`XmlReader`] adapts `quick_xml::Reader` to a tag-oriented pull surface:
//! [`next_tag`](XmlReader::next_tag) / [`peek_tag`](XmlReader::peek_tag)
//! step over structural events, attributes of the current start tag are
//! available by qualified name, and QName-valued attribute content resolves
//! against the namespace bindings in scope at that element.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::collections::VecDeque;
use std::io::BufRead;
use tracing::trace;

use crate::error::{Result, XmlError};
use crate::name::QName;
use crate::ns;

/// One structural event produced by [`XmlReader`].
#[derive(Debug, Clone, PartialEq)]
pub enum Tag {
    Start(QName),
    End(QName),
    Eof,
}

/// A resolved attribute of a start tag. An empty namespace means the
/// attribute name was unprefixed.
#[derive(Debug, Clone)]
struct Attr {
    namespace: String,
    local: String,
    value: String,
}

/// A fully resolved start tag: element name, attributes, and a snapshot of
/// the namespace bindings in scope at that element.
#[derive(Debug, Clone)]
struct StartState {
    name: QName,
    attrs: Vec<Attr>,
    bindings: Vec<(String, String)>,
}

/// Normalized events buffered between the parser and the pull surface.
/// Empty elements are expanded into a start/end pair at parse time.
#[derive(Debug)]
enum Parsed {
    Start(StartState),
    End(QName),
    Text(String),
    Eof,
}

/// Pull-style tag reader with one-event lookahead.
pub struct XmlReader<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
    pending: VecDeque<Parsed>,
    /// Namespace declarations per open element, innermost last.
    scopes: Vec<Vec<(String, String)>>,
    /// The most recently consumed start tag.
    current: Option<StartState>,
}

impl<'a> XmlReader<&'a [u8]> {
    /// Creates a reader over a string slice.
    pub fn from_str(xml: &'a str) -> Self {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);
        Self::wrap(reader)
    }
}

impl<R: BufRead> XmlReader<R> {
    /// Creates a reader over any buffered input.
    pub fn from_reader(input: R) -> XmlReader<R> {
        let mut reader = Reader::from_reader(input);
        reader.config_mut().trim_text(true);
        Self::wrap(reader)
    }

    fn wrap(reader: Reader<R>) -> Self {
        XmlReader {
            reader,
            buf: Vec::new(),
            pending: VecDeque::new(),
            scopes: Vec::new(),
            current: None,
        }
    }

    /// Advances to the next start or end tag, skipping whitespace and other
    /// non-structural events. Non-whitespace character content between tags
    /// is a stream error; use [`read_text`](Self::read_text) to consume it.
    pub fn next_tag(&mut self) -> Result<Tag> {
        loop {
            self.ensure_pending()?;
            let parsed = match self.pending.pop_front() {
                Some(parsed) => parsed,
                None => continue,
            };
            match parsed {
                Parsed::Text(text) if is_whitespace(&text) => continue,
                Parsed::Text(_) => {
                    return Err(XmlError::UnexpectedEvent {
                        expected: "a tag".to_string(),
                        found: "character content".to_string(),
                    });
                }
                Parsed::Start(state) => {
                    let name = state.name.clone();
                    trace!(element = %name, "start tag");
                    self.current = Some(state);
                    return Ok(Tag::Start(name));
                }
                Parsed::End(name) => {
                    self.current = None;
                    return Ok(Tag::End(name));
                }
                Parsed::Eof => return Ok(Tag::Eof),
            }
        }
    }

    /// Looks at the next tag without consuming anything, skipping over any
    /// buffered character content.
    pub fn peek_tag(&mut self) -> Result<Tag> {
        let mut idx = 0;
        loop {
            while self.pending.len() <= idx {
                self.parse_step()?;
            }
            match &self.pending[idx] {
                Parsed::Text(_) => idx += 1,
                Parsed::Start(state) => return Ok(Tag::Start(state.name.clone())),
                Parsed::End(name) => return Ok(Tag::End(name.clone())),
                Parsed::Eof => return Ok(Tag::Eof),
            }
        }
    }

    /// Name of the current (most recently consumed) start tag.
    pub fn current_name(&self) -> Option<&QName> {
        self.current.as_ref().map(|state| &state.name)
    }

    /// Attribute value of the current start tag, looked up by namespace and
    /// local name. An empty namespace matches unprefixed attributes.
    pub fn attribute(&self, namespace: &str, local: &str) -> Option<&str> {
        self.current.as_ref()?.attrs.iter().find_map(|attr| {
            (attr.namespace == namespace && attr.local == local).then_some(attr.value.as_str())
        })
    }

    /// Consumes the character content of the current element, up to and
    /// including its end tag. Child elements are a stream error here.
    pub fn read_text(&mut self) -> Result<String> {
        let mut text = String::new();
        loop {
            self.ensure_pending()?;
            let parsed = match self.pending.pop_front() {
                Some(parsed) => parsed,
                None => continue,
            };
            match parsed {
                Parsed::Text(chunk) => text.push_str(&chunk),
                Parsed::End(_) => {
                    self.current = None;
                    return Ok(text);
                }
                Parsed::Start(state) => {
                    return Err(XmlError::UnexpectedEvent {
                        expected: "character content".to_string(),
                        found: format!("element {}", state.name),
                    });
                }
                Parsed::Eof => return Err(XmlError::UnexpectedEof),
            }
        }
    }

    /// Resolves `prefix:local` attribute content (such as an `xsi:type`
    /// value) against the bindings in scope at the current element.
    pub fn resolve_qname(&self, prefixed: &str) -> Result<QName> {
        let bindings = self
            .current
            .as_ref()
            .map(|state| state.bindings.as_slice())
            .unwrap_or(&[]);
        resolve_with(bindings, prefixed)
    }

    fn ensure_pending(&mut self) -> Result<()> {
        while self.pending.is_empty() {
            self.parse_step()?;
        }
        Ok(())
    }

    /// Reads one event from quick-xml into the pending queue. Namespace
    /// scope bookkeeping happens here, at parse time, so lookahead never
    /// observes stale bindings.
    fn parse_step(&mut self) -> Result<()> {
        self.buf.clear();
        let event = self.reader.read_event_into(&mut self.buf)?.into_owned();
        match event {
            Event::Start(start) => self.push_start(start, false)?,
            Event::Empty(start) => self.push_start(start, true)?,
            Event::End(end) => {
                let raw = String::from_utf8_lossy(end.name().as_ref()).into_owned();
                let bindings = self.flattened_bindings();
                let name = resolve_with(&bindings, &raw)?;
                self.pending.push_back(Parsed::End(name));
                self.scopes.pop();
            }
            Event::Text(text) => {
                let raw = String::from_utf8_lossy(text.as_ref()).into_owned();
                self.pending.push_back(Parsed::Text(unescape_text(&raw)?));
            }
            Event::CData(data) => {
                let raw = String::from_utf8_lossy(data.as_ref()).into_owned();
                self.pending.push_back(Parsed::Text(raw));
            }
            Event::GeneralRef(reference) => {
                // Predefined and character references become text; anything
                // else has no replacement this reader can supply.
                let name = String::from_utf8_lossy(&reference).into_owned();
                match resolve_entity(&name) {
                    Some(text) => self.pending.push_back(Parsed::Text(text)),
                    None => {
                        return Err(XmlError::UnexpectedEvent {
                            expected: "a predefined or character entity".to_string(),
                            found: format!("&{};", name),
                        });
                    }
                }
            }
            Event::Decl(_) | Event::Comment(_) | Event::PI(_) | Event::DocType(_) => {}
            Event::Eof => self.pending.push_back(Parsed::Eof),
        }
        Ok(())
    }

    fn push_start(&mut self, start: BytesStart<'static>, empty: bool) -> Result<()> {
        let mut declarations: Vec<(String, String)> = Vec::new();
        let mut raw_attrs: Vec<(String, String)> = Vec::new();
        for attr in start.attributes() {
            let attr = attr?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = unescape_text(&String::from_utf8_lossy(&attr.value))?;
            if key == "xmlns" {
                declarations.push((String::new(), value));
            } else if let Some(prefix) = key.strip_prefix("xmlns:") {
                declarations.push((prefix.to_string(), value));
            } else {
                raw_attrs.push((key, value));
            }
        }
        self.scopes.push(declarations);
        let bindings = self.flattened_bindings();

        let raw_name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let name = resolve_with(&bindings, &raw_name)?;

        let mut attrs = Vec::with_capacity(raw_attrs.len());
        for (key, value) in raw_attrs {
            let (prefix, local) = ns::split_prefixed(&key);
            let namespace = match prefix {
                // Unprefixed attributes are in no namespace.
                None => String::new(),
                Some("xml") => ns::XML_NS.to_string(),
                Some(prefix) => lookup_prefix(&bindings, prefix)
                    .ok_or_else(|| XmlError::UnboundPrefix(prefix.to_string()))?,
            };
            attrs.push(Attr {
                namespace,
                local: local.to_string(),
                value,
            });
        }

        self.pending.push_back(Parsed::Start(StartState {
            name: name.clone(),
            attrs,
            bindings,
        }));
        if empty {
            self.pending.push_back(Parsed::End(name));
            self.scopes.pop();
        }
        Ok(())
    }

    fn flattened_bindings(&self) -> Vec<(String, String)> {
        self.scopes.iter().flatten().cloned().collect()
    }
}

/// Resolves a possibly-prefixed name against bindings, innermost last.
/// Unprefixed names fall back to the default namespace, the element rule,
/// which is also the XSD rule for unprefixed QName content.
fn resolve_with(bindings: &[(String, String)], raw: &str) -> Result<QName> {
    let (prefix, local) = ns::split_prefixed(raw);
    match prefix {
        None => match lookup_prefix(bindings, "") {
            Some(namespace) => Ok(QName::new(namespace, local)),
            None => Ok(QName::local(local)),
        },
        Some("xml") => Ok(QName::new(ns::XML_NS, local)),
        Some(prefix) => match lookup_prefix(bindings, prefix) {
            Some(namespace) => Ok(QName::new(namespace, local)),
            None => Err(XmlError::UnboundPrefix(prefix.to_string())),
        },
    }
}

fn lookup_prefix(bindings: &[(String, String)], prefix: &str) -> Option<String> {
    bindings
        .iter()
        .rev()
        .find(|(bound, _)| bound == prefix)
        .map(|(_, namespace)| namespace.clone())
}

fn is_whitespace(text: &str) -> bool {
    text.bytes().all(|b| matches!(b, b' ' | b'\n' | b'\r' | b'\t'))
}

/// Replacement text for a predefined entity or a character reference.
fn resolve_entity(name: &str) -> Option<String> {
    match name {
        "amp" => Some("&".to_string()),
        "lt" => Some("<".to_string()),
        "gt" => Some(">".to_string()),
        "apos" => Some("'".to_string()),
        "quot" => Some("\"".to_string()),
        _ => {
            let code = name
                .strip_prefix("#x")
                .or_else(|| name.strip_prefix("#X"))
                .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                .or_else(|| name.strip_prefix('#').and_then(|dec| dec.parse().ok()))?;
            char::from_u32(code).map(|c| c.to_string())
        }
    }
}

fn unescape_text(raw: &str) -> Result<String> {
    match quick_xml::escape::unescape(raw) {
        Ok(text) => Ok(text.into_owned()),
        Err(err) => Err(XmlError::UnexpectedEvent {
            expected: "well-formed character content".to_string(),
            found: format!("invalid escape: {}", err),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_tag_resolves_prefixes() -> Result<()> {
        let xml = r#"<ex:root xmlns:ex="urn:example"><ex:item/></ex:root>"#;
        let mut reader = XmlReader::from_str(xml);
        assert_eq!(
            reader.next_tag()?,
            Tag::Start(QName::new("urn:example", "root"))
        );
        assert_eq!(
            reader.next_tag()?,
            Tag::Start(QName::new("urn:example", "item"))
        );
        assert_eq!(
            reader.next_tag()?,
            Tag::End(QName::new("urn:example", "item"))
        );
        assert_eq!(
            reader.next_tag()?,
            Tag::End(QName::new("urn:example", "root"))
        );
        assert_eq!(reader.next_tag()?, Tag::Eof);
        Ok(())
    }

    #[test]
    fn test_attribute_lookup() -> Result<()> {
        let xml = r#"<a xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
                        xsi:nil="true" id="7">x</a>"#;
        let mut reader = XmlReader::from_str(xml);
        reader.next_tag()?;
        assert_eq!(reader.attribute(ns::SCHEMA_INSTANCE_NS, "nil"), Some("true"));
        assert_eq!(reader.attribute("", "id"), Some("7"));
        assert_eq!(reader.attribute("", "missing"), None);
        Ok(())
    }

    #[test]
    fn test_read_text() -> Result<()> {
        let mut reader = XmlReader::from_str("<a>hello &amp; goodbye</a>");
        reader.next_tag()?;
        assert_eq!(reader.read_text()?, "hello & goodbye");
        Ok(())
    }

    #[test]
    fn test_resolve_qname_value() -> Result<()> {
        let xml = r#"<a xmlns:xsd="http://www.w3.org/2001/XMLSchema" t="xsd:string"/>"#;
        let mut reader = XmlReader::from_str(xml);
        reader.next_tag()?;
        assert_eq!(
            reader.resolve_qname("xsd:string")?,
            QName::new(ns::SCHEMA_NS, "string")
        );
        assert!(matches!(
            reader.resolve_qname("nope:string"),
            Err(XmlError::UnboundPrefix(_))
        ));
        Ok(())
    }

    #[test]
    fn test_default_namespace_applies_to_elements() -> Result<()> {
        let xml = r#"<root xmlns="urn:example"><child/></root>"#;
        let mut reader = XmlReader::from_str(xml);
        assert_eq!(
            reader.next_tag()?,
            Tag::Start(QName::new("urn:example", "root"))
        );
        assert_eq!(
            reader.next_tag()?,
            Tag::Start(QName::new("urn:example", "child"))
        );
        Ok(())
    }

    #[test]
    fn test_peek_does_not_consume() -> Result<()> {
        let mut reader = XmlReader::from_str("<a><b/></a>");
        assert_eq!(reader.peek_tag()?, Tag::Start(QName::local("a")));
        assert_eq!(reader.next_tag()?, Tag::Start(QName::local("a")));
        assert_eq!(reader.peek_tag()?, Tag::Start(QName::local("b")));
        assert_eq!(reader.next_tag()?, Tag::Start(QName::local("b")));
        Ok(())
    }

    #[test]
    fn test_resolve_entity() {
        assert_eq!(resolve_entity("amp").as_deref(), Some("&"));
        assert_eq!(resolve_entity("lt").as_deref(), Some("<"));
        assert_eq!(resolve_entity("#38").as_deref(), Some("&"));
        assert_eq!(resolve_entity("#x26").as_deref(), Some("&"));
        assert_eq!(resolve_entity("unknown"), None);
    }

    #[test]
    fn test_malformed_stream() {
        let mut reader = XmlReader::from_str("<a><b></a>");
        reader.next_tag().unwrap();
        reader.next_tag().unwrap();
        let result = reader.next_tag();
        assert!(matches!(result, Err(XmlError::Parse(_))));
    }
}
