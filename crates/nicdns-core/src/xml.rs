//! Minimal XML element tree
//!
//! The dns-master API speaks small, shallow XML documents. Responses are read
//! into an [`Element`] tree with `quick-xml`'s pull parser and navigated with
//! slash-separated child paths (`"soa/mname/name"`), the same way the record
//! codec and the envelope parser address fields.

use std::io::Write;

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::reader::Reader;

use crate::error::{Error, Result};

/// An XML element with attributes, child elements and text content
///
/// Whitespace between child elements is not kept; text of leaf elements is
/// kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Element>,
    text: Option<String>,
}

impl Element {
    /// Create an empty element
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Create a leaf element holding `text`
    pub fn text_element(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(name).with_text(text)
    }

    /// Set an attribute (replacing a previous value)
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(key, value);
        self
    }

    /// Set the text content
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Append a child element
    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    /// Set an attribute in place
    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((key, value)),
        }
    }

    /// Append a child element in place
    pub fn push_child(&mut self, child: Element) {
        self.children.push(child);
    }

    /// Element name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attribute value by name
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// All attributes in document order
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Text content, if any
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Child elements in document order
    pub fn children(&self) -> &[Element] {
        &self.children
    }

    /// First element matching a slash-separated path of child names
    pub fn find(&self, path: &str) -> Option<&Element> {
        path.split('/')
            .filter(|segment| !segment.is_empty())
            .try_fold(self, |current, segment| {
                current.children.iter().find(|child| child.name == segment)
            })
    }

    /// All elements matching a path; only the last segment fans out
    pub fn find_all(&self, path: &str) -> Vec<&Element> {
        let (parent, leaf) = match path.rsplit_once('/') {
            Some((parent, leaf)) => (self.find(parent), leaf),
            None => (Some(self), path),
        };
        parent
            .map(|parent| {
                parent
                    .children
                    .iter()
                    .filter(|child| child.name == leaf)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Text of the first element matching `path`
    ///
    /// An element that exists but has no text yields `Some("")`.
    pub fn find_text(&self, path: &str) -> Option<&str> {
        self.find(path).map(|el| el.text().unwrap_or(""))
    }

    /// Parse a document and return its root element
    pub fn parse(xml: &str) -> Result<Element> {
        let mut reader = Reader::from_str(xml);
        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            let event = reader
                .read_event()
                .map_err(|e| Error::protocol(format!("Malformed XML: {e}")))?;

            match event {
                Event::Start(start) => stack.push(Self::from_start(&start)?),
                Event::Empty(start) => {
                    let element = Self::from_start(&start)?;
                    Self::attach(&mut stack, &mut root, element)?;
                }
                Event::End(_) => {
                    let mut element = stack
                        .pop()
                        .ok_or_else(|| Error::protocol("Malformed XML: unexpected closing tag"))?;
                    if !element.children.is_empty()
                        && element.text.as_deref().is_some_and(|t| t.trim().is_empty())
                    {
                        element.text = None;
                    }
                    Self::attach(&mut stack, &mut root, element)?;
                }
                Event::Text(text) => {
                    if let Some(current) = stack.last_mut() {
                        let text = text
                            .unescape()
                            .map_err(|e| Error::protocol(format!("Malformed XML text: {e}")))?;
                        current.append_text(&text);
                    }
                }
                Event::CData(cdata) => {
                    if let Some(current) = stack.last_mut() {
                        let text = String::from_utf8(cdata.into_inner().into_owned())
                            .map_err(|e| Error::protocol(format!("Malformed CDATA: {e}")))?;
                        current.append_text(&text);
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some(open) = stack.last() {
            return Err(Error::protocol(format!(
                "Malformed XML: element <{}> is never closed",
                open.name
            )));
        }

        root.ok_or_else(|| Error::protocol("Malformed XML: document has no root element"))
    }

    /// Serialize this element (without XML declaration)
    pub fn to_xml_string(&self) -> Result<String> {
        let mut writer = Writer::new(Vec::new());
        self.write_into(&mut writer)?;
        into_string(writer)
    }

    /// Serialize this element as a standalone UTF-8 document
    pub fn to_document(&self) -> Result<String> {
        let mut writer = Writer::new(Vec::new());
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(write_error)?;
        self.write_into(&mut writer)?;
        into_string(writer)
    }

    /// Write this element and its subtree
    pub fn write_into<W: Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        let mut start = BytesStart::new(self.name.as_str());
        for (key, value) in &self.attributes {
            start.push_attribute((key.as_str(), value.as_str()));
        }

        if self.children.is_empty() && self.text.is_none() {
            writer.write_event(Event::Empty(start)).map_err(write_error)?;
            return Ok(());
        }

        writer.write_event(Event::Start(start)).map_err(write_error)?;
        if let Some(text) = &self.text {
            writer
                .write_event(Event::Text(BytesText::new(text)))
                .map_err(write_error)?;
        }
        for child in &self.children {
            child.write_into(writer)?;
        }
        writer
            .write_event(Event::End(BytesEnd::new(self.name.as_str())))
            .map_err(write_error)?;
        Ok(())
    }

    fn from_start(start: &BytesStart<'_>) -> Result<Element> {
        let name = std::str::from_utf8(start.name().as_ref())
            .map_err(|e| Error::protocol(format!("Malformed XML element name: {e}")))?
            .to_string();

        let mut element = Element::new(name);
        for attribute in start.attributes() {
            let attribute =
                attribute.map_err(|e| Error::protocol(format!("Malformed XML attribute: {e}")))?;
            let key = std::str::from_utf8(attribute.key.as_ref())
                .map_err(|e| Error::protocol(format!("Malformed XML attribute name: {e}")))?
                .to_string();
            let value = attribute
                .unescape_value()
                .map_err(|e| Error::protocol(format!("Malformed XML attribute value: {e}")))?
                .into_owned();
            element.attributes.push((key, value));
        }
        Ok(element)
    }

    fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) -> Result<()> {
        match stack.last_mut() {
            Some(parent) => parent.children.push(element),
            None if root.is_some() => {
                return Err(Error::protocol("Malformed XML: multiple root elements"));
            }
            None => *root = Some(element),
        }
        Ok(())
    }

    fn append_text(&mut self, text: &str) {
        self.text.get_or_insert_with(String::new).push_str(text);
    }
}

fn write_error(err: impl std::fmt::Display) -> Error {
    Error::protocol(format!("Failed to write XML: {err}"))
}

fn into_string(writer: Writer<Vec<u8>>) -> Result<String> {
    String::from_utf8(writer.into_inner())
        .map_err(|e| Error::protocol(format!("Serialized XML is not UTF-8: {e}")))
}
