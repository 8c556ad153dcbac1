use std::path::Path;

use async_trait::async_trait;
use tracing::info;

use crate::documents::{decode_blocking, read_document, DecodeError, DocumentParser};

/// PDF text via pdf-extract.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfParser;

impl PdfParser {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DocumentParser for PdfParser {
    fn extensions(&self) -> &[&'static str] {
        &["pdf"]
    }

    async fn parse(&self, path: &Path) -> Result<String, DecodeError> {
        let bytes = read_document(path).await?;
        let owned = path.to_path_buf();

        let text = decode_blocking(move || {
            // pdf-extract panics on some malformed inputs instead of erroring.
            let raw = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(&bytes))
                .map_err(|_| DecodeError::malformed(&owned, "PDF parser panicked"))?
                .map_err(|e| DecodeError::malformed(&owned, format!("PDF parsing failed: {e}")))?;
            let cleaned = clean_text(&raw);
            if cleaned.is_empty() {
                return Err(DecodeError::Empty(owned));
            }
            Ok(cleaned)
        })
        .await?;

        info!(
            "Parsed PDF {} ({} characters)",
            path.display(),
            text.len()
        );
        Ok(text)
    }
}

/// Collapses runs of whitespace inside each line and drops blank lines,
/// keeping line breaks.
pub fn clean_text(raw: &str) -> String {
    raw.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text_collapses_and_drops_blank_lines() {
        let raw = "  Jane   Doe \n\n\t\nEmail:\tjane@example.com  \n   \nSkills:  Rust,   SQL";
        assert_eq!(
            clean_text(raw),
            "Jane Doe\nEmail: jane@example.com\nSkills: Rust, SQL"
        );
    }

    #[test]
    fn test_clean_text_of_whitespace_is_empty() {
        assert_eq!(clean_text(" \n\t\n "), "");
    }

    #[test]
    fn test_supports_pdf_only() {
        let parser = PdfParser::new();
        assert!(parser.supports_format(Path::new("cv.pdf")));
        assert!(parser.supports_format(Path::new("cv.PDF")));
        assert!(!parser.supports_format(Path::new("cv.docx")));
    }

    #[tokio::test]
    async fn test_garbage_bytes_are_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, b"this is not a pdf at all").unwrap();

        let err = PdfParser::new().parse(&path).await.unwrap_err();
        assert!(matches!(err, DecodeError::Malformed { .. }));
    }

    #[tokio::test]
    async fn test_zero_byte_pdf_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.pdf");
        std::fs::write(&path, b"").unwrap();

        let err = PdfParser::new().parse(&path).await.unwrap_err();
        assert!(matches!(err, DecodeError::Empty(_)));
    }
}
