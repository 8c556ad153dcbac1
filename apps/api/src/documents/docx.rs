use std::io::{Cursor, Read};
use std::path::Path;

use async_trait::async_trait;
use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::{info, warn};

use crate::documents::{decode_blocking, extension_of, read_document, DecodeError, DocumentParser};

const DOCUMENT_PART: &str = "word/document.xml";

/// Word documents (.docx, and .doc files that are really OOXML).
///
/// Emits one line per non-empty body paragraph, then one line per non-empty
/// table row with its cells joined by `" | "`.
#[derive(Debug, Default, Clone, Copy)]
pub struct WordParser;

impl WordParser {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DocumentParser for WordParser {
    fn extensions(&self) -> &[&'static str] {
        &["docx", "doc"]
    }

    async fn parse(&self, path: &Path) -> Result<String, DecodeError> {
        let legacy = extension_of(path).as_deref() == Some("doc");
        if legacy {
            warn!("Legacy .doc format detected: {}", path.display());
        }

        let bytes = read_document(path).await?;
        let owned = path.to_path_buf();

        let text = decode_blocking(move || {
            let xml = read_document_part(&bytes).map_err(|reason| {
                if legacy {
                    DecodeError::malformed(
                        &owned,
                        "cannot parse legacy .doc file; convert it to .docx (for example with LibreOffice)",
                    )
                } else {
                    DecodeError::malformed(&owned, reason)
                }
            })?;
            let text = document_text(&xml).map_err(|reason| DecodeError::malformed(&owned, reason))?;
            if text.is_empty() {
                return Err(DecodeError::Empty(owned));
            }
            Ok(text)
        })
        .await?;

        info!(
            "Parsed Word document {} ({} characters)",
            path.display(),
            text.len()
        );
        Ok(text)
    }
}

fn read_document_part(bytes: &[u8]) -> Result<String, String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| format!("not a valid Word archive: {e}"))?;
    let mut part = archive
        .by_name(DOCUMENT_PART)
        .map_err(|e| format!("missing {DOCUMENT_PART}: {e}"))?;
    let mut xml = String::new();
    part.read_to_string(&mut xml)
        .map_err(|e| format!("cannot read {DOCUMENT_PART}: {e}"))?;
    Ok(xml)
}

/// Walks `word/document.xml` collecting body paragraphs and top-level table
/// rows. Paragraphs inside tables belong to their cell, not to the body.
pub fn document_text(xml: &str) -> Result<String, String> {
    let mut reader = Reader::from_str(xml);

    let mut paragraphs: Vec<String> = Vec::new();
    let mut rows: Vec<String> = Vec::new();

    let mut table_depth = 0usize;
    let mut in_text = false;
    let mut paragraph = String::new();
    let mut cell: Vec<String> = Vec::new();
    let mut row: Vec<String> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"w:tbl" => table_depth += 1,
                b"w:tr" if table_depth == 1 => row.clear(),
                b"w:tc" if table_depth == 1 => cell.clear(),
                b"w:p" => paragraph.clear(),
                b"w:t" => in_text = true,
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"w:tab" => paragraph.push('\t'),
                b"w:br" | b"w:cr" => paragraph.push('\n'),
                _ => {}
            },
            Ok(Event::Text(t)) if in_text => {
                let text = t.unescape().map_err(|e| format!("invalid XML text: {e}"))?;
                paragraph.push_str(&text);
            }
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:p" => {
                    let text = paragraph.trim();
                    if !text.is_empty() {
                        match table_depth {
                            0 => paragraphs.push(text.to_string()),
                            1 => cell.push(text.to_string()),
                            _ => {}
                        }
                    }
                    paragraph.clear();
                }
                b"w:tc" if table_depth == 1 => {
                    let text = cell.join("\n");
                    if !text.trim().is_empty() {
                        row.push(text.trim().to_string());
                    }
                }
                b"w:tr" if table_depth == 1 => {
                    if !row.is_empty() {
                        rows.push(row.join(" | "));
                    }
                }
                b"w:tbl" => table_depth = table_depth.saturating_sub(1),
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(format!(
                    "invalid document XML at position {}: {e}",
                    reader.buffer_position()
                ))
            }
            _ => {}
        }
    }

    paragraphs.extend(rows);
    Ok(paragraphs.join("\n"))
}
