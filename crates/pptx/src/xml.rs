//! Owned XML element tree for editing package parts.
//!
//! Parts are parsed with quick-xml into a small tree, edited in place and
//! written back. Whitespace text is kept so untouched content round-trips.

use deckfill_core::{Error, Result};
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::borrow::Cow;
use std::fmt::Write as _;

/// A node in an element's content.
#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    Element(XmlElement),
    /// Unescaped character data.
    Text(String),
    CData(String),
    Comment(String),
}

/// An element with its qualified name, attributes and children.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct XmlElement {
    /// Qualified name as written, e.g. `p:sp`.
    pub name: String,

    /// Attributes in document order, values unescaped.
    pub attributes: Vec<(String, String)>,

    pub children: Vec<XmlNode>,
}

/// A parsed XML part.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlDocument {
    pub root: XmlElement,
    has_declaration: bool,
}

impl XmlDocument {
    /// Parse a document from a string.
    pub fn parse(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(false);

        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;
        let mut has_declaration = false;

        loop {
            let event = reader
                .read_event()
                .map_err(|e| Error::XmlError(format!("at position {}: {}", reader.buffer_position(), e)))?;
            match event {
                Event::Decl(_) => has_declaration = true,
                Event::Start(ref e) => stack.push(element_from_start(e)?),
                Event::Empty(ref e) => {
                    let element = element_from_start(e)?;
                    attach(&mut stack, &mut root, XmlNode::Element(element))?;
                }
                Event::End(_) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| Error::XmlError("unbalanced end tag".to_string()))?;
                    attach(&mut stack, &mut root, XmlNode::Element(element))?;
                }
                Event::Text(ref e) => {
                    let text = e
                        .unescape()
                        .map_err(|e| Error::XmlError(format!("invalid text: {}", e)))?;
                    if let Some(parent) = stack.last_mut() {
                        parent.children.push(XmlNode::Text(text.into_owned()));
                    }
                }
                Event::CData(ref e) => {
                    if let Some(parent) = stack.last_mut() {
                        parent
                            .children
                            .push(XmlNode::CData(String::from_utf8_lossy(e).into_owned()));
                    }
                }
                Event::Comment(ref e) => {
                    if let Some(parent) = stack.last_mut() {
                        parent
                            .children
                            .push(XmlNode::Comment(String::from_utf8_lossy(e).into_owned()));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !stack.is_empty() {
            return Err(Error::XmlError("unexpected end of document".to_string()));
        }
        let root = root.ok_or_else(|| Error::XmlError("document has no root element".to_string()))?;

        Ok(Self { root, has_declaration })
    }

    /// Parse a document from raw part bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(bytes).map_err(|e| Error::XmlError(format!("part is not UTF-8: {}", e)))?;
        Self::parse(text.trim_start_matches('\u{feff}'))
    }

    /// Create a document around a root element, with an XML declaration.
    pub fn new(root: XmlElement) -> Self {
        Self {
            root,
            has_declaration: true,
        }
    }

    /// Serialize the document.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = Writer::new(Vec::new());
        if self.has_declaration {
            write(&mut writer, Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
            write(&mut writer, Event::Text(BytesText::from_escaped("\r\n")))?;
        }
        write_element(&mut writer, &self.root)?;
        Ok(writer.into_inner())
    }
}

fn element_from_start(start: &BytesStart<'_>) -> Result<XmlElement> {
    let mut element = XmlElement::new(String::from_utf8_lossy(start.name().as_ref()));
    for attr in start.attributes() {
        let attr = attr.map_err(|e| Error::XmlError(format!("invalid attribute: {}", e)))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| Error::XmlError(format!("invalid attribute value: {}", e)))?
            .into_owned();
        element.attributes.push((key, value));
    }
    Ok(element)
}

fn attach(stack: &mut [XmlElement], root: &mut Option<XmlElement>, node: XmlNode) -> Result<()> {
    match (stack.last_mut(), node) {
        (Some(parent), node) => parent.children.push(node),
        (None, XmlNode::Element(element)) => {
            if root.is_some() {
                return Err(Error::XmlError("multiple root elements".to_string()));
            }
            *root = Some(element);
        }
        (None, _) => {}
    }
    Ok(())
}

fn write(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<()> {
    writer
        .write_event(event)
        .map_err(|e| Error::XmlError(format!("write failed: {}", e)))
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &XmlElement) -> Result<()> {
    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in &element.attributes {
        let value = escape_attr(value);
        start.push_attribute((key.as_bytes(), value.as_bytes()));
    }

    if element.children.is_empty() {
        return write(writer, Event::Empty(start));
    }

    write(writer, Event::Start(start))?;
    for child in &element.children {
        match child {
            XmlNode::Element(e) => write_element(writer, e)?,
            XmlNode::Text(t) => write(writer, Event::Text(BytesText::new(&escape_control_chars(t))))?,
            XmlNode::CData(t) => write(writer, Event::CData(BytesCData::new(t.as_str())))?,
            XmlNode::Comment(t) => write(writer, Event::Comment(BytesText::from_escaped(t.as_str())))?,
        }
    }
    write(writer, Event::End(BytesEnd::new(element.name.as_str())))
}

/// Escape an attribute value, keeping whitespace that would otherwise be
/// normalized to a space when the value is read back.
fn escape_attr(value: &str) -> String {
    let escaped = quick_xml::escape::escape(escape_control_chars(value).as_ref()).into_owned();
    if !escaped.contains(['\t', '\n', '\r']) {
        return escaped;
    }
    escaped
        .replace('\t', "&#x9;")
        .replace('\n', "&#xA;")
        .replace('\r', "&#xD;")
}

/// Replace characters XML 1.0 cannot carry with `_xHHHH_` escapes.
pub fn escape_control_chars(text: &str) -> Cow<'_, str> {
    if !text.chars().any(is_disallowed) {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        if is_disallowed(c) {
            let _ = write!(out, "_x{:04X}_", c as u32);
        } else {
            out.push(c);
        }
    }
    Cow::Owned(out)
}

fn is_disallowed(c: char) -> bool {
    matches!(c, '\u{0}'..='\u{8}' | '\u{B}' | '\u{C}' | '\u{E}'..='\u{1F}' | '\u{FFFE}' | '\u{FFFF}')
}

/// Extract the local name from a potentially namespaced XML element name.
pub fn local_name(name: &str) -> &str {
    match name.find(':') {
        Some(pos) => &name[pos + 1..],
        None => name,
    }
}

impl XmlElement {
    /// Create an element with no attributes or children.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Builder: add an attribute.
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }

    /// Builder: add a child element.
    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.children.push(XmlNode::Element(child));
        self
    }

    /// Local part of the element name.
    pub fn local_name(&self) -> &str {
        local_name(&self.name)
    }

    /// Whether the element's local name is `name`.
    pub fn is(&self, name: &str) -> bool {
        self.local_name() == name
    }

    /// Value of the attribute with the given qualified name.
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Remove an attribute if present.
    pub fn remove_attr(&mut self, key: &str) {
        self.attributes.retain(|(k, _)| k != key);
    }

    /// Set an attribute, replacing an existing value.
    pub fn set_attr(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| k == key) {
            Some((_, v)) => *v = value,
            None => self.attributes.push((key.to_string(), value)),
        }
    }

    /// Child elements, in order.
    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(e) => Some(e),
            _ => None,
        })
    }

    /// Mutable child elements, in order.
    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut XmlElement> {
        self.children.iter_mut().filter_map(|node| match node {
            XmlNode::Element(e) => Some(e),
            _ => None,
        })
    }

    /// First child element with the given local name.
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.elements().find(|e| e.is(name))
    }

    /// Mutable first child element with the given local name.
    pub fn child_mut(&mut self, name: &str) -> Option<&mut XmlElement> {
        self.elements_mut().find(|e| e.is(name))
    }

    /// Follow a path of local names through first-matching children.
    pub fn path(&self, names: &[&str]) -> Option<&XmlElement> {
        names.iter().try_fold(self, |e, name| e.child(name))
    }

    /// Mutable variant of [`XmlElement::path`].
    pub fn path_mut(&mut self, names: &[&str]) -> Option<&mut XmlElement> {
        let mut current = self;
        for name in names {
            current = current.child_mut(name)?;
        }
        Some(current)
    }

    /// Child elements with the given local name.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> + 'a {
        self.elements().filter(move |e| e.is(name))
    }

    /// Mutable child elements with the given local name.
    pub fn children_named_mut<'a>(&'a mut self, name: &'a str) -> impl Iterator<Item = &'a mut XmlElement> + 'a {
        self.elements_mut().filter(move |e| e.is(name))
    }

    /// Concatenated text of this element's direct text children.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| match node {
                XmlNode::Text(t) | XmlNode::CData(t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Replace all children with a single text node.
    pub fn set_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        self.children.clear();
        if !text.is_empty() {
            self.children.push(XmlNode::Text(text));
        }
    }

    /// Visit this element and every descendant element, depth first.
    pub fn walk<'a>(&'a self, visit: &mut dyn FnMut(&'a XmlElement)) {
        visit(self);
        for child in self.elements() {
            child.walk(visit);
        }
    }
}
