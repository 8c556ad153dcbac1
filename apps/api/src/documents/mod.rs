//! Turns an uploaded resume file into plain text.
//!
//! Each format has its own `DocumentParser`. The `DocumentRegistry` maps
//! lowercased extensions to parsers. Decoding is CPU-bound and always runs
//! inside `tokio::task::spawn_blocking`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

pub mod docx;
pub mod pdf;
pub mod text;

pub use docx::WordParser;
pub use pdf::PdfParser;
pub use text::PlainTextParser;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    #[error("path is not a file: {0}")]
    NotAFile(PathBuf),

    #[error("unsupported file format '{extension}' (supported: {supported})")]
    Unsupported { extension: String, supported: String },

    #[error("no text content found in {0}")]
    Empty(PathBuf),

    #[error("cannot decode {path}: {reason}")]
    Malformed { path: PathBuf, reason: String },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("decoding task failed: {0}")]
    Task(String),
}

impl DecodeError {
    pub fn malformed(path: &Path, reason: impl Into<String>) -> Self {
        DecodeError::Malformed {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }
}

/// One document format.
#[async_trait]
pub trait DocumentParser: Send + Sync {
    /// Lowercase extensions without the leading dot, e.g. `["pdf"]`.
    fn extensions(&self) -> &[&'static str];

    fn supports_format(&self, path: &Path) -> bool {
        extension_of(path).is_some_and(|ext| self.extensions().contains(&ext.as_str()))
    }

    async fn parse(&self, path: &Path) -> Result<String, DecodeError>;
}

/// Lowercased extension of `path`, without the dot.
pub fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty())
        .map(str::to_ascii_lowercase)
}

/// Validates `path` and reads the whole file.
///
/// Missing paths, directories and zero-byte files are rejected before any
/// decoder runs.
pub(crate) async fn read_document(path: &Path) -> Result<Vec<u8>, DecodeError> {
    let metadata = match tokio::fs::metadata(path).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(DecodeError::NotFound(path.to_path_buf()))
        }
        Err(source) => {
            return Err(DecodeError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    if !metadata.is_file() {
        return Err(DecodeError::NotAFile(path.to_path_buf()));
    }
    if metadata.len() == 0 {
        warn!("File appears to be empty: {}", path.display());
        return Err(DecodeError::Empty(path.to_path_buf()));
    }

    tokio::fs::read(path).await.map_err(|source| DecodeError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Runs a CPU-bound decoder off the async executor.
pub(crate) async fn decode_blocking<F>(decode: F) -> Result<String, DecodeError>
where
    F: FnOnce() -> Result<String, DecodeError> + Send + 'static,
{
    tokio::task::spawn_blocking(decode)
        .await
        .map_err(|e| DecodeError::Task(e.to_string()))?
}

/// Extension-keyed collection of parsers.
#[derive(Clone, Default)]
pub struct DocumentRegistry {
    parsers: HashMap<String, Arc<dyn DocumentParser>>,
}

impl DocumentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// PDF, Word (.docx, .doc) and plain text.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(PdfParser::new());
        registry.register(WordParser::new());
        registry.register(PlainTextParser::new());
        registry
    }

    /// Registers `parser` for every extension it declares, replacing any
    /// previous parser for those extensions.
    pub fn register<P: DocumentParser + 'static>(&mut self, parser: P) {
        let parser: Arc<dyn DocumentParser> = Arc::new(parser);
        for ext in parser.extensions() {
            self.parsers.insert(ext.to_string(), parser.clone());
        }
    }

    pub fn parser_for(&self, path: &Path) -> Option<Arc<dyn DocumentParser>> {
        extension_of(path).and_then(|ext| self.parsers.get(&ext).cloned())
    }

    pub fn is_supported(&self, path: &Path) -> bool {
        self.parser_for(path).is_some()
    }

    /// Dotted extensions, sorted: `[".doc", ".docx", ".pdf", ".txt"]`.
    pub fn supported_extensions(&self) -> Vec<String> {
        let mut extensions: Vec<String> = self.parsers.keys().map(|ext| format!(".{ext}")).collect();
        extensions.sort();
        extensions
    }

    pub async fn parse(&self, path: &Path) -> Result<String, DecodeError> {
        let parser = self.parser_for(path).ok_or_else(|| DecodeError::Unsupported {
            extension: extension_of(path)
                .map(|ext| format!(".{ext}"))
                .unwrap_or_else(|| "<none>".to_string()),
            supported: self.supported_extensions().join(", "),
        })?;
        debug!("Decoding {}", path.display());
        parser.parse(path).await
    }
}
