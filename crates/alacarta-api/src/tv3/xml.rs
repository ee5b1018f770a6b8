//! Owned XML element tree with tag-name lookup.
//!
//! The service nests list items at varying depth depending on the method,
//! so lookups search all descendants by tag name rather than mapping a fixed
//! document shape.

use std::borrow::Cow;
use std::io::BufRead;

use quick_xml::Reader;
use quick_xml::encoding::Decoder;
use quick_xml::events::{BytesStart, Event};

use super::error::{AlacartaError, Result};

/// One XML element with its attributes, direct text and child elements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlElement {
    /// Tag name.
    pub name: String,
    /// Attributes in document order (values unescaped).
    pub attributes: Vec<(String, String)>,
    /// Concatenated direct text and CDATA content (untrimmed).
    pub text: String,
    /// Child elements in document order.
    pub children: Vec<Self>,
}

impl XmlElement {
    fn from_start(start: &BytesStart<'_>, decoder: Decoder) -> Self {
        let name = decode(decoder, start.name().as_ref());
        let attributes = start
            .attributes()
            .flatten()
            .map(|attr| {
                let key = decode(decoder, attr.key.as_ref());
                let value = attr
                    .decode_and_unescape_value(decoder)
                    .map_or_else(|_| decode(decoder, &attr.value), Cow::into_owned);
                (key, value)
            })
            .collect();
        Self {
            name,
            attributes,
            text: String::new(),
            children: Vec::new(),
        }
    }

    /// Attribute value by name.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// All descendants named `name`, depth-first in document order.
    /// The element itself is not included.
    #[must_use]
    pub fn descendants<'a>(&'a self, name: &str) -> Vec<&'a Self> {
        let mut found = Vec::new();
        for child in &self.children {
            child.collect_named(name, &mut found);
        }
        found
    }

    fn collect_named<'a>(&'a self, name: &str, found: &mut Vec<&'a Self>) {
        if self.name == name {
            found.push(self);
        }
        for child in &self.children {
            child.collect_named(name, found);
        }
    }

    /// First descendant named `name`.
    #[must_use]
    pub fn first_descendant(&self, name: &str) -> Option<&Self> {
        self.children.iter().find_map(|child| {
            if child.name == name {
                Some(child)
            } else {
                child.first_descendant(name)
            }
        })
    }

    /// Trimmed text of the first descendant named `name`; `None` when the
    /// element is absent or its text is empty.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<String> {
        self.first_descendant(name)
            .map(|el| el.text.trim())
            .filter(|s| !s.is_empty())
            .map(String::from)
    }
}

/// A parsed response document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlDocument {
    /// Document element.
    pub root: XmlElement,
}

impl XmlDocument {
    /// Parses a document that is already text.
    ///
    /// # Errors
    ///
    /// Returns `Service` for malformed XML or a body with no root element.
    pub fn parse(input: &str) -> Result<Self> {
        Self::read(Reader::from_str(input))
    }

    /// Parses a raw response body, decoding text in the encoding named by
    /// the XML declaration (UTF-8 when there is none).
    ///
    /// # Errors
    ///
    /// Returns `Service` for malformed XML or a body with no root element.
    pub fn parse_bytes(body: &[u8]) -> Result<Self> {
        Self::read(Reader::from_reader(body))
    }

    fn read<R: BufRead>(mut reader: Reader<R>) -> Result<Self> {
        let mut buf = Vec::new();
        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            buf.clear();
            let event = reader
                .read_event_into(&mut buf)
                .map_err(|e| AlacartaError::Service(format!("malformed XML: {e}")))?;
            // The declaration switches the decoder, so fetch it per event.
            let decoder = reader.decoder();
            match event {
                Event::Start(e) => stack.push(XmlElement::from_start(&e, decoder)),
                Event::Empty(e) => {
                    attach(&mut stack, &mut root, XmlElement::from_start(&e, decoder))?;
                }
                Event::End(_) => {
                    let el = stack
                        .pop()
                        .ok_or_else(|| AlacartaError::service("malformed XML: unexpected end tag"))?;
                    attach(&mut stack, &mut root, el)?;
                }
                Event::Text(t) => {
                    if let Some(top) = stack.last_mut() {
                        top.text.push_str(&decode(decoder, &t));
                    }
                }
                Event::CData(c) => {
                    if let Some(top) = stack.last_mut() {
                        top.text.push_str(&decode(decoder, &c));
                    }
                }
                Event::GeneralRef(r) => {
                    if let Some(top) = stack.last_mut() {
                        match r.resolve_char_ref() {
                            Ok(Some(ch)) => top.text.push(ch),
                            _ => top.text.push_str(&resolve_entity(&decode(decoder, &r))),
                        }
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some(open) = stack.last() {
            return Err(AlacartaError::Service(format!(
                "malformed XML: unclosed element <{}>",
                open.name
            )));
        }
        root.map(|root| Self { root })
            .ok_or_else(|| AlacartaError::service("malformed XML: no root element"))
    }

    /// All elements named `name`, including the document element.
    #[must_use]
    pub fn elements(&self, name: &str) -> Vec<&XmlElement> {
        let mut found = Vec::new();
        if self.root.name == name {
            found.push(&self.root);
        }
        found.extend(self.root.descendants(name));
        found
    }

    /// First element named `name`, including the document element.
    #[must_use]
    pub fn first_element(&self, name: &str) -> Option<&XmlElement> {
        if self.root.name == name {
            Some(&self.root)
        } else {
            self.root.first_descendant(name)
        }
    }

    /// Trimmed text of the first element named `name`.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<String> {
        self.first_element(name)
            .map(|el| el.text.trim())
            .filter(|s| !s.is_empty())
            .map(String::from)
    }
}

/// Pushes a finished element onto its parent, or makes it the root.
fn attach(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    el: XmlElement,
) -> Result<()> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(el);
        Ok(())
    } else if root.is_none() {
        *root = Some(el);
        Ok(())
    } else {
        Err(AlacartaError::service("malformed XML: multiple root elements"))
    }
}

/// Text in the document's encoding, falling back to lossy UTF-8 for bytes
/// the decoder rejects.
fn decode(decoder: Decoder, bytes: &[u8]) -> String {
    decoder
        .decode(bytes)
        .map_or_else(|_| String::from_utf8_lossy(bytes).into_owned(), Cow::into_owned)
}

/// Resolves a predefined entity (`amp`, `lt`, ...). Unknown entities are
/// kept verbatim.
fn resolve_entity(name: &str) -> String {
    quick_xml::escape::resolve_predefined_entity(name)
        .map_or_else(|| format!("&{name};"), String::from)
}
