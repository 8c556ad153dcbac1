use std::path::Path;

use async_trait::async_trait;
use tracing::info;

use crate::documents::{decode_blocking, read_document, DecodeError, DocumentParser};

/// UTF-8 plain text, with a leading byte-order mark stripped.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTextParser;

impl PlainTextParser {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DocumentParser for PlainTextParser {
    fn extensions(&self) -> &[&'static str] {
        &["txt"]
    }

    async fn parse(&self, path: &Path) -> Result<String, DecodeError> {
        let bytes = read_document(path).await?;
        let owned = path.to_path_buf();

        let text = decode_blocking(move || {
            let text = String::from_utf8(bytes)
                .map_err(|e| DecodeError::malformed(&owned, format!("not valid UTF-8: {e}")))?;
            let text = text.trim_start_matches('\u{feff}').replace("\r\n", "\n");
            if text.trim().is_empty() {
                return Err(DecodeError::Empty(owned));
            }
            Ok(text)
        })
        .await?;

        info!("Read text file {} ({} characters)", path.display(), text.len());
        Ok(text)
    }
}
