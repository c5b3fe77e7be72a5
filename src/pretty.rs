//! Pretty-printing post-processor
//!
//! Documents are checked with roxmltree (which also enforces namespace
//! well-formedness) and then re-emitted event by event through an
//! indenting quick-xml writer. Whitespace-only text between tags is
//! treated as layout and dropped, unless it is the whole content of an
//! element; any other text is copied through untouched, so printing an
//! already printed document gives the same bytes back.

use crate::documents::Element;
use crate::error::{Error, Result};
use crate::request::Formatting;
use quick_xml::events::{BytesDecl, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

/// Indentation width in spaces
pub const INDENT: usize = 2;

/// Re-serialize an XML document with indentation
pub fn pretty_print(xml: &[u8]) -> Result<Vec<u8>> {
    let text = std::str::from_utf8(xml)
        .map_err(|e| Error::MalformedSourceDocument(format!("not UTF-8: {}", e)))?;
    let options = roxmltree::ParsingOptions {
        allow_dtd: true,
        ..Default::default()
    };
    roxmltree::Document::parse_with_options(text, options)
        .map_err(|e| Error::MalformedSourceDocument(e.to_string()))?;

    let mut reader = Reader::from_str(text);
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', INDENT);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    // A start tag is held back until the next event shows whether the
    // element has content; empty elements are written self-closing and
    // whitespace that is an element's only content is kept.
    let mut pending: Option<BytesStart> = None;
    let mut pending_text: Option<BytesText> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| Error::MalformedSourceDocument(e.to_string()))?;

        match event {
            Event::Text(text) if text.iter().all(u8::is_ascii_whitespace) => {
                if pending.is_some() {
                    pending_text = Some(text);
                }
                continue;
            }
            Event::End(end) if pending.is_some() => {
                if let Some(start) = pending.take() {
                    match pending_text.take() {
                        Some(text) => {
                            writer.write_event(Event::Start(start))?;
                            writer.write_event(Event::Text(text))?;
                            writer.write_event(Event::End(end))?;
                        }
                        None => writer.write_event(Event::Empty(start))?,
                    }
                }
                continue;
            }
            _ => {}
        }

        pending_text = None;
        if let Some(start) = pending.take() {
            writer.write_event(Event::Start(start))?;
        }

        match event {
            Event::Eof => break,
            Event::Decl(_) => {}
            Event::Start(start) => pending = Some(start),
            other => writer.write_event(other)?,
        }
    }

    Ok(writer.into_inner())
}

/// Serialize a generated element tree with the requested formatting.
///
/// Pretty output goes through `pretty_print`, so every artifact is
/// re-parsed before it is handed out.
pub fn render(element: &Element, formatting: Formatting) -> Result<Vec<u8>> {
    let compact = element.to_document_bytes(false)?;
    match formatting {
        Formatting::Compact => Ok(compact),
        Formatting::Pretty => pretty_print(&compact),
    }
}
