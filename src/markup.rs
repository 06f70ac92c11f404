//! A minimal element tree over `quick-xml` events.
//!
//! Only what the extractor needs is kept per element: its name, its children and its
//! leading text (character data before the first child element). Elements live in a single
//! arena in document order, so the descendants of an element are a contiguous slice.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

#[derive(Debug, thiserror::Error)]
pub enum MarkupError {
    #[error("{source} (at byte {position})")]
    Syntax {
        position: u64,
        source: quick_xml::Error,
    },
    #[error("no element found")]
    Empty,
    #[error("unclosed element <{0}>")]
    Unclosed(String),
    #[error("content outside the document element (at byte {0})")]
    StrayContent(u64),
    #[error("undefined entity or invalid character reference &{0};")]
    UndefinedEntity(String),
}

#[derive(Debug)]
struct Element {
    name: String,
    text: Option<String>,
    children: Vec<usize>,
    /// Exclusive end of this element's subtree in the arena.
    end: usize,
}

#[derive(Debug)]
pub struct Document {
    elements: Vec<Element>,
}

/// A borrowed view of one element of a [`Document`].
#[derive(Debug, Clone, Copy)]
pub struct Node<'d> {
    doc: &'d Document,
    idx: usize,
}

impl Document {
    pub fn parse(xml: &str) -> Result<Document, MarkupError> {
        let mut reader = Reader::from_str(xml);

        let mut elements: Vec<Element> = Vec::new();
        let mut open: Vec<usize> = Vec::new();

        loop {
            let event = reader
                .read_event()
                .map_err(|source| syntax(&reader, source))?;
            match event {
                Event::Eof => break,
                Event::Start(e) => {
                    let idx = push_element(&mut elements, &open, &e, &reader)?;
                    open.push(idx);
                }
                Event::Empty(e) => {
                    let idx = push_element(&mut elements, &open, &e, &reader)?;
                    elements[idx].end = idx + 1;
                }
                Event::End(_) => {
                    // The reader already rejects mismatched and unmatched end tags.
                    if let Some(idx) = open.pop() {
                        elements[idx].end = elements.len();
                    }
                }
                Event::Text(t) => {
                    // Line endings come out normalised to `\n`.
                    let text = t.xml_content().map_err(|e| syntax(&reader, e.into()))?;
                    push_text(&mut elements, &open, &text, &reader)?;
                }
                Event::CData(t) => {
                    let text = t.xml_content().map_err(|e| syntax(&reader, e.into()))?;
                    push_text(&mut elements, &open, &text, &reader)?;
                }
                Event::GeneralRef(r) => {
                    let name = String::from_utf8_lossy(r.as_ref());
                    let resolved = resolve_reference(&name)
                        .ok_or_else(|| MarkupError::UndefinedEntity(name.to_string()))?;
                    push_text(&mut elements, &open, &resolved, &reader)?;
                }
                _ => {}
            }
        }

        if let Some(&idx) = open.last() {
            return Err(MarkupError::Unclosed(elements[idx].name.clone()));
        }
        if elements.is_empty() {
            return Err(MarkupError::Empty);
        }
        Ok(Document { elements })
    }

    pub fn root(&self) -> Node<'_> {
        Node { doc: self, idx: 0 }
    }
}

impl<'d> Node<'d> {
    fn element(&self) -> &'d Element {
        &self.doc.elements[self.idx]
    }

    pub fn name(&self) -> &'d str {
        &self.element().name
    }

    /// Leading text, `None` when there is none.
    pub fn text(&self) -> Option<&'d str> {
        self.element().text.as_deref()
    }

    /// First direct child called `name`.
    pub fn child(&self, name: &str) -> Option<Node<'d>> {
        let doc = self.doc;
        self.element()
            .children
            .iter()
            .map(|&idx| Node { doc, idx })
            .find(|n| n.name() == name)
    }

    /// Every element called `name` below this one, in document order.
    pub fn descendants(self, name: &'d str) -> impl Iterator<Item = Node<'d>> + 'd {
        let doc = self.doc;
        (self.idx + 1..self.element().end)
            .map(move |idx| Node { doc, idx })
            .filter(move |n| n.name() == name)
    }

    /// First element called `name` below this one.
    pub fn find(self, name: &'d str) -> Option<Node<'d>> {
        self.descendants(name).next()
    }
}

fn push_element(
    elements: &mut Vec<Element>,
    open: &[usize],
    start: &BytesStart<'_>,
    reader: &Reader<&[u8]>,
) -> Result<usize, MarkupError> {
    let parent = open.last().copied();
    if parent.is_none() && !elements.is_empty() {
        return Err(MarkupError::StrayContent(reader.buffer_position()));
    }
    // Nothing reads attributes, but unquoted or repeated ones still make the document invalid.
    for attr in start.attributes().with_checks(true) {
        attr.map_err(|e| syntax(reader, e.into()))?;
    }
    let idx = elements.len();
    elements.push(Element {
        name: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
        text: None,
        children: Vec::new(),
        end: idx + 1,
    });
    if let Some(parent) = parent {
        elements[parent].children.push(idx);
    }
    Ok(idx)
}

fn push_text(
    elements: &mut [Element],
    open: &[usize],
    text: &str,
    reader: &Reader<&[u8]>,
) -> Result<(), MarkupError> {
    let Some(&idx) = open.last() else {
        if text.trim().is_empty() {
            return Ok(());
        }
        return Err(MarkupError::StrayContent(reader.buffer_position()));
    };
    let element = &mut elements[idx];
    // Text after a child belongs to the child's tail, which nobody reads.
    if element.children.is_empty() && !text.is_empty() {
        element.text.get_or_insert_with(String::new).push_str(text);
    }
    Ok(())
}

/// Resolve the body of an `&...;` reference: predefined entities and character references.
fn resolve_reference(name: &str) -> Option<String> {
    let resolved = match name {
        "lt" => '<',
        "gt" => '>',
        "amp" => '&',
        "apos" => '\'',
        "quot" => '"',
        _ => {
            let num = name.strip_prefix('#')?;
            let code = match num.strip_prefix('x') {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => num.parse::<u32>().ok()?,
            };
            char::from_u32(code).filter(|&c| is_xml_char(c))?
        }
    };
    Some(resolved.to_string())
}

/// The `Char` production of XML 1.0: what a character reference may produce.
fn is_xml_char(c: char) -> bool {
    matches!(c,
        '\u{9}' | '\u{A}' | '\u{D}'
        | '\u{20}'..='\u{D7FF}'
        | '\u{E000}'..='\u{FFFD}'
        | '\u{10000}'..='\u{10FFFF}')
}

fn syntax(reader: &Reader<&[u8]>, source: quick_xml::Error) -> MarkupError {
    MarkupError::Syntax {
        position: reader.error_position(),
        source,
    }
}
