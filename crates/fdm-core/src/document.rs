//! Minimal owned-tree XML parsing shared by the expression builder and the
//! script engine crates, so neither depends on the other just to read a
//! document.
//!
//! This is deliberately a plain tree, not a typed model: callers walk
//! [`Element`] themselves and convert the parts they recognize into their
//! own typed values (mirroring the raw-tree-then-convert idiom used for
//! the compiler's grammar rules).

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::EvalError;

/// Failure raised while parsing a document into an [`Element`] tree.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DocumentError {
    #[error("xml parse error at position {position}: {detail}")]
    Xml { position: usize, detail: String },

    #[error("document has no root element")]
    Empty,
}

impl From<DocumentError> for EvalError {
    fn from(e: DocumentError) -> Self {
        EvalError::NumericFailure {
            op: "document",
            detail: e.to_string(),
        }
    }
}

/// One XML element: tag name, attributes in document order, child elements,
/// and concatenated text content.
#[derive(Debug, Clone, Default)]
pub struct Element {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Element>,
    pub text: String,
}

impl Element {
    /// First attribute value matching `name`, if present.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
    }

    /// All direct children whose tag matches `tag`.
    pub fn children_named<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Element> {
        self.children.iter().filter(move |c| c.tag == tag)
    }

    /// First direct child whose tag matches `tag`.
    pub fn child_named(&self, tag: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.tag == tag)
    }

    /// Trimmed text content, parsed as `f64`.
    pub fn text_as_f64(&self) -> Option<f64> {
        self.text.trim().parse().ok()
    }

    /// Whitespace-separated tokens of the trimmed text content, parsed as
    /// `f64`. Used for `tableData` rows, where a table's body is a block of
    /// space/newline-separated numbers rather than nested elements.
    pub fn text_as_f64_list(&self) -> Vec<f64> {
        self.text
            .split_whitespace()
            .filter_map(|tok| tok.parse().ok())
            .collect()
    }
}

/// Parse a complete XML document into its root [`Element`].
pub fn parse(input: &str) -> Result<Element, DocumentError> {
    let mut reader = Reader::from_str(input);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                stack.push(element_from_start(e)?);
            }
            Ok(Event::Empty(ref e)) => {
                let leaf = element_from_start(e)?;
                push_child(&mut stack, &mut root, leaf);
            }
            Ok(Event::End(_)) => {
                if let Some(finished) = stack.pop() {
                    push_child(&mut stack, &mut root, finished);
                }
            }
            Ok(Event::Text(t)) => {
                let text = t.unescape().map_err(|e| DocumentError::Xml {
                    position: reader.error_position(),
                    detail: e.to_string(),
                })?;
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(text.as_ref());
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(DocumentError::Xml {
                    position: reader.error_position(),
                    detail: e.to_string(),
                });
            }
            _ => {}
        }
        buf.clear();
    }

    root.ok_or(DocumentError::Empty)
}

fn push_child(stack: &mut Vec<Element>, root: &mut Option<Element>, child: Element) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(child),
        None => *root = Some(child),
    }
}

fn element_from_start(e: &BytesStart<'_>) -> Result<Element, DocumentError> {
    let tag = std::str::from_utf8(e.name().as_ref())
        .map_err(|err| DocumentError::Xml {
            position: 0,
            detail: format!("invalid tag name: {err}"),
        })?
        .to_owned();

    let mut attrs = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| DocumentError::Xml {
            position: 0,
            detail: format!("invalid attribute: {err}"),
        })?;
        let key = std::str::from_utf8(attr.key.as_ref())
            .map_err(|err| DocumentError::Xml {
                position: 0,
                detail: format!("invalid attribute name: {err}"),
            })?
            .to_owned();
        let value = attr
            .unescape_value()
            .map_err(|err| DocumentError::Xml {
                position: 0,
                detail: format!("invalid attribute value: {err}"),
            })?
            .into_owned();
        attrs.push((key, value));
    }

    Ok(Element {
        tag,
        attrs,
        children: Vec::new(),
        text: String::new(),
    })
}

#[cfg(test)]
mod document_tests;
