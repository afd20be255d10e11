//! Best-effort text extraction from XML documents.

use quick_xml::events::Event;
use quick_xml::Reader;

/// Outcome of pulling the text of one element out of a document
///
/// Callers that only care about the text use [`Extraction::into_text`],
/// which degrades `Missing` and `Failed` to an empty string; the variant is
/// still there to be logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// The element was found; markup stripped, whitespace collapsed
    Found(String),
    /// The document parsed but has no such element
    Missing,
    /// The document is malformed before or inside the element
    Failed(String),
}

impl Extraction {
    /// The extracted text, or an empty string
    pub fn into_text(self) -> String {
        match self {
            Extraction::Found(text) => text,
            Extraction::Missing | Extraction::Failed(_) => String::new(),
        }
    }
}

/// Extract the plain text of the first `<tag>` element in `xml`
///
/// Nested markup (`<i>`, `<sup>`, `<AbstractText Label=...>`) is stripped.
/// The closing tag of each direct child element contributes a space so that
/// labelled sections do not run together.
pub fn extract_element_text(xml: &str, tag: &str) -> Extraction {
    let mut reader = Reader::from_str(xml);
    let tag = tag.as_bytes();

    let mut depth = 0usize;
    let mut text = String::new();

    loop {
        let event = match reader.read_event() {
            Ok(event) => event,
            Err(e) => {
                return Extraction::Failed(format!(
                    "XML error at position {}: {}",
                    reader.error_position(),
                    e
                ))
            }
        };

        match event {
            Event::Start(e) => {
                if depth > 0 {
                    depth += 1;
                } else if e.name().as_ref() == tag {
                    depth = 1;
                }
            }
            Event::Empty(e) if depth == 0 && e.name().as_ref() == tag => {
                return Extraction::Found(String::new());
            }
            Event::Text(t) if depth > 0 => match t.unescape() {
                Ok(chunk) => text.push_str(&chunk),
                Err(e) => return Extraction::Failed(format!("bad entity: {}", e)),
            },
            Event::CData(c) if depth > 0 => {
                text.push_str(&String::from_utf8_lossy(&c.into_inner()));
            }
            Event::End(_) if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    return Extraction::Found(collapse_whitespace(&text));
                }
                if depth == 1 {
                    text.push(' ');
                }
            }
            Event::Eof => {
                return if depth > 0 {
                    Extraction::Failed("document ended inside element".to_string())
                } else {
                    Extraction::Missing
                };
            }
            _ => {}
        }
    }
}

/// Collapse runs of whitespace (including newlines) into single spaces
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
