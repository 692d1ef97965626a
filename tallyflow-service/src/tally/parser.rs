//! Generic XML tree for Tally responses.
//!
//! Tally's export schema is loose: a tag that appears once is a plain element,
//! the same tag repeated becomes a sequence, and leaf values sometimes carry
//! attributes. The tree keeps that shape as-is and makes every consumer
//! normalise cardinality explicitly through [`XmlNode::items`].

use super::TallyError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::BTreeMap;

/// Tally answers with this tag when the report produced no data.
pub const NO_RESPONSE_MARKER: &str = "<NORSPS>";

#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    /// Leaf element without attributes. Empty elements hold `""`.
    Text(String),
    /// Element with child fields and/or attributes.
    Object(XmlElement),
    /// Sibling elements sharing one tag name, in document order.
    List(Vec<XmlNode>),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct XmlElement {
    pub attributes: BTreeMap<String, String>,
    pub fields: BTreeMap<String, XmlNode>,
    pub text: Option<String>,
}

impl XmlNode {
    /// View this node as a sequence: a list yields its members, anything else
    /// yields itself once.
    pub fn items(&self) -> &[XmlNode] {
        match self {
            XmlNode::List(items) => items,
            other => std::slice::from_ref(other),
        }
    }

    pub fn as_element(&self) -> Option<&XmlElement> {
        match self {
            XmlNode::Object(element) => Some(element),
            _ => None,
        }
    }

    /// Child field of an object node. Lists are not searched.
    pub fn field(&self, name: &str) -> Option<&XmlNode> {
        self.as_element().and_then(|element| element.field(name))
    }

    /// Text content of a leaf or of an object that carries text.
    pub fn text(&self) -> Option<&str> {
        match self {
            XmlNode::Text(text) => Some(text),
            XmlNode::Object(element) => element.text.as_deref(),
            XmlNode::List(_) => None,
        }
    }
}

impl XmlElement {
    pub fn field(&self, name: &str) -> Option<&XmlNode> {
        self.fields.get(name)
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Trimmed, non-empty text of the first `name` child.
    pub fn text_of(&self, name: &str) -> Option<&str> {
        self.field(name)?
            .items()
            .first()?
            .text()
            .map(str::trim)
            .filter(|text| !text.is_empty())
    }

    /// Follow single-occurrence object fields. Returns `None` as soon as a
    /// step is missing or is not an object.
    pub fn path(&self, steps: &[&str]) -> Option<&XmlNode> {
        let (last, parents) = steps.split_last()?;
        let mut current = self;
        for step in parents {
            current = current.field(step)?.as_element()?;
        }
        current.field(last)
    }

    fn insert(&mut self, name: String, node: XmlNode) {
        match self.fields.remove(&name) {
            None => {
                self.fields.insert(name, node);
            }
            Some(XmlNode::List(mut items)) => {
                items.push(node);
                self.fields.insert(name, XmlNode::List(items));
            }
            Some(existing) => {
                self.fields.insert(name, XmlNode::List(vec![existing, node]));
            }
        }
    }

    fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        match &mut self.text {
            Some(existing) => existing.push_str(text),
            None => self.text = Some(text.to_string()),
        }
    }

    fn into_node(self) -> XmlNode {
        if self.attributes.is_empty() && self.fields.is_empty() {
            XmlNode::Text(self.text.unwrap_or_default())
        } else {
            XmlNode::Object(self)
        }
    }
}

/// Result of inspecting a raw export response.
#[derive(Debug, Clone, PartialEq)]
pub enum TallyPayload {
    /// Tally's explicit "no response" marker; not an error.
    NoResponse,
    Document(XmlElement),
}

pub fn parse_payload(raw: &str) -> Result<TallyPayload, TallyError> {
    if raw.contains(NO_RESPONSE_MARKER) {
        return Ok(TallyPayload::NoResponse);
    }
    parse(raw).map(TallyPayload::Document)
}

/// Parse a document into a tree rooted at an anonymous element whose single
/// field is the document's top-level tag. Namespace prefixes are stripped from
/// tag names.
pub fn parse(xml: &str) -> Result<XmlElement, TallyError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<(String, XmlElement)> = vec![(String::new(), XmlElement::default())];
    let mut root_seen = false;

    loop {
        let event = reader.read_event().map_err(|e| {
            TallyError::parse(format!(
                "malformed XML at byte {}: {}",
                reader.buffer_position(),
                e
            ))
        })?;

        match event {
            Event::Start(ref start) => {
                open_root_if_top_level(&stack, &mut root_seen)?;
                let name = tag_name(start)?;
                let element = element_with_attributes(start)?;
                stack.push((name, element));
            }
            Event::Empty(ref start) => {
                open_root_if_top_level(&stack, &mut root_seen)?;
                let name = tag_name(start)?;
                let node = element_with_attributes(start)?.into_node();
                current(&mut stack)?.insert(name, node);
            }
            Event::Text(ref text) => {
                let text = text
                    .unescape()
                    .map_err(|e| TallyError::parse(format!("invalid text content: {}", e)))?;
                reject_top_level_text(&stack, &text)?;
                current(&mut stack)?.push_text(&text);
            }
            Event::CData(cdata) => {
                let text = String::from_utf8_lossy(&cdata.into_inner()).into_owned();
                reject_top_level_text(&stack, &text)?;
                current(&mut stack)?.push_text(&text);
            }
            Event::End(_) => {
                let (name, element) = match stack.pop() {
                    Some(entry) if !stack.is_empty() => entry,
                    _ => return Err(TallyError::parse("closing tag without an opening tag")),
                };
                current(&mut stack)?.insert(name, element.into_node());
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if stack.len() > 1 {
        let open = stack.last().map(|(name, _)| name.as_str()).unwrap_or_default();
        return Err(TallyError::parse(format!(
            "document ended while <{}> was still open",
            open
        )));
    }

    stack
        .pop()
        .map(|(_, root)| root)
        .ok_or_else(|| TallyError::parse("empty parser stack"))
}

/// A document has exactly one root element.
fn open_root_if_top_level(
    stack: &[(String, XmlElement)],
    root_seen: &mut bool,
) -> Result<(), TallyError> {
    if stack.len() > 1 {
        return Ok(());
    }
    if *root_seen {
        return Err(TallyError::parse("more than one top-level element"));
    }
    *root_seen = true;
    Ok(())
}

/// Only whitespace may appear outside the root element.
fn reject_top_level_text(stack: &[(String, XmlElement)], text: &str) -> Result<(), TallyError> {
    if stack.len() == 1 && !text.trim().is_empty() {
        return Err(TallyError::parse("text outside the root element"));
    }
    Ok(())
}

fn current(stack: &mut [(String, XmlElement)]) -> Result<&mut XmlElement, TallyError> {
    stack
        .last_mut()
        .map(|(_, element)| element)
        .ok_or_else(|| TallyError::parse("empty parser stack"))
}

fn tag_name(start: &BytesStart<'_>) -> Result<String, TallyError> {
    let qname = start.name();
    std::str::from_utf8(qname.local_name().as_ref())
        .map(str::to_string)
        .map_err(|e| TallyError::parse(format!("tag name is not UTF-8: {}", e)))
}

fn element_with_attributes(start: &BytesStart<'_>) -> Result<XmlElement, TallyError> {
    let mut element = XmlElement::default();
    for attribute in start.attributes() {
        let attribute =
            attribute.map_err(|e| TallyError::parse(format!("invalid attribute: {}", e)))?;
        let key = std::str::from_utf8(attribute.key.as_ref())
            .map_err(|e| TallyError::parse(format!("attribute name is not UTF-8: {}", e)))?;
        if key == "xmlns" || key.starts_with("xmlns:") {
            continue;
        }
        let value = attribute
            .unescape_value()
            .map_err(|e| TallyError::parse(format!("invalid attribute value: {}", e)))?;
        element
            .attributes
            .insert(key.to_string(), value.into_owned());
    }
    Ok(element)
}
