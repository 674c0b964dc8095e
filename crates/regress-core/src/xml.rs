//! Minimal owned element tree built on the `quick-xml` event reader.
//!
//! The engine's payloads are small, so a full tree is cheaper to reason about
//! than streaming. Text follows the element-tree convention: an element's
//! `text` is the character data that precedes its first child; anything after
//! a child element is tail text and is dropped.

use crate::error::ParseError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::Serialize;

/// One XML element with its leading text and child elements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct XmlElement {
    /// Tag name exactly as written (prefix included).
    pub tag: String,
    /// Leading text, `None` when the element has no character data.
    pub text: Option<String>,
    /// Child elements in document order.
    pub children: Vec<XmlElement>,
}

impl XmlElement {
    /// Creates an element with no text and no children.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            text: None,
            children: Vec::new(),
        }
    }

    /// Number of child elements.
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// Whether the element has no child elements.
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// First direct child with exactly this tag.
    pub fn find(&self, tag: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.tag == tag)
    }

    /// Follows a `/`-separated path of direct-child tags.
    pub fn find_path(&self, path: &str) -> Option<&XmlElement> {
        path.split('/')
            .filter(|segment| !segment.is_empty())
            .try_fold(self, |el, segment| el.find(segment))
    }

    /// Lazy pre-order traversal over this element and all its descendants.
    pub fn iter(&self) -> Elements<'_> {
        Elements { stack: vec![self] }
    }

    fn push_text(&mut self, chunk: &str) {
        // Character data after a child belongs to that child's tail.
        if !self.children.is_empty() || chunk.is_empty() {
            return;
        }
        match &mut self.text {
            Some(text) => text.push_str(chunk),
            None => self.text = Some(chunk.to_string()),
        }
    }
}

/// Pre-order iterator returned by [`XmlElement::iter`].
#[derive(Debug, Clone)]
pub struct Elements<'a> {
    stack: Vec<&'a XmlElement>,
}

impl<'a> Iterator for Elements<'a> {
    type Item = &'a XmlElement;

    fn next(&mut self) -> Option<Self::Item> {
        let el = self.stack.pop()?;
        self.stack.extend(el.children.iter().rev());
        Some(el)
    }
}

/// Parses a whole document into its root element.
///
/// Fails on malformed markup, on a document without a root, on more than one
/// root, on non-whitespace text outside the root, and on unknown entities.
pub fn parse_tree(input: &str) -> Result<XmlElement, ParseError> {
    let mut reader = Reader::from_str(input);
    let mut open: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        let event = reader.read_event().map_err(|e| ParseError::Malformed {
            position: reader.buffer_position() as u64,
            message: e.to_string(),
        })?;

        match event {
            Event::Start(start) => {
                if root.is_some() && open.is_empty() {
                    return Err(ParseError::UnexpectedContent(format!(
                        "second root element <{}>",
                        tag_name(&start)?
                    )));
                }
                open.push(XmlElement::new(tag_name(&start)?));
            }
            Event::Empty(start) => {
                let el = XmlElement::new(tag_name(&start)?);
                close_element(&mut open, &mut root, el)?;
            }
            Event::End(end) => {
                let Some(el) = open.pop() else {
                    let name = String::from_utf8_lossy(end.name().as_ref()).into_owned();
                    return Err(ParseError::UnexpectedContent(format!("stray </{name}>")));
                };
                close_element(&mut open, &mut root, el)?;
            }
            Event::Text(text) => {
                let chunk = utf8(&text)?;
                append_text(&mut open, chunk)?;
            }
            Event::CData(cdata) => {
                let chunk = utf8(&cdata)?;
                append_text(&mut open, chunk)?;
            }
            Event::GeneralRef(reference) => {
                let name = utf8(&reference)?;
                let resolved = resolve_reference(name)?;
                append_text(&mut open, &resolved)?;
            }
            Event::Eof => break,
            // Declarations, comments, processing instructions, doctype.
            _ => {}
        }
    }

    if let Some(unclosed) = open.pop() {
        return Err(ParseError::UnclosedElement(unclosed.tag));
    }
    root.ok_or(ParseError::NoRootElement)
}

fn tag_name(start: &BytesStart<'_>) -> Result<String, ParseError> {
    utf8(start.name().as_ref()).map(str::to_string)
}

fn utf8(bytes: &[u8]) -> Result<&str, ParseError> {
    std::str::from_utf8(bytes).map_err(|e| ParseError::Encoding(e.to_string()))
}

fn close_element(
    open: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    el: XmlElement,
) -> Result<(), ParseError> {
    match open.last_mut() {
        Some(parent) => parent.children.push(el),
        None if root.is_none() => *root = Some(el),
        None => {
            return Err(ParseError::UnexpectedContent(format!(
                "second root element <{}>",
                el.tag
            )))
        }
    }
    Ok(())
}

fn append_text(open: &mut [XmlElement], chunk: &str) -> Result<(), ParseError> {
    match open.last_mut() {
        Some(el) => el.push_text(chunk),
        None if chunk.trim().is_empty() => {}
        None => {
            return Err(ParseError::UnexpectedContent(format!(
                "text {:?}",
                chunk.trim()
            )))
        }
    }
    Ok(())
}

fn resolve_reference(name: &str) -> Result<String, ParseError> {
    if let Some(code) = name.strip_prefix('#') {
        let value = match code.strip_prefix('x').or_else(|| code.strip_prefix('X')) {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => code.parse::<u32>().ok(),
        };
        return value
            .and_then(char::from_u32)
            .filter(|&c| is_xml_char(c))
            .map(String::from)
            .ok_or_else(|| ParseError::UnknownEntity(name.to_string()));
    }
    quick_xml::escape::resolve_predefined_entity(name)
        .map(str::to_string)
        .ok_or_else(|| ParseError::UnknownEntity(name.to_string()))
}

/// The XML `Char` production.
fn is_xml_char(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n' | '\r' | '\u{20}'..='\u{d7ff}' | '\u{e000}'..='\u{fffd}' | '\u{10000}'..='\u{10ffff}'
    )
}
