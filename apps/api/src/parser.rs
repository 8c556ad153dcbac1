//! `ResumeParser`: file in, `ResumeData` out.
//!
//! Wires the document registry to an extraction coordinator built from an
//! `ExtractionConfig`. Strategies that cannot be built are skipped, but every
//! field must end up with at least one working extractor.

use std::collections::HashMap;
use std::path::Path;

use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::documents::{extension_of, DecodeError, DocumentRegistry};
use crate::extraction::{
    ExtractionConfig, ExtractionCoordinator, ExtractionError, ExtractorChains, FieldType,
    StrategyFactory,
};
use crate::models::ResumeData;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),
}

pub struct ResumeParser {
    coordinator: ExtractionCoordinator,
    documents: DocumentRegistry,
}

impl ResumeParser {
    /// Builds one extractor chain per field from `config`.
    pub fn new(config: &ExtractionConfig, factory: &StrategyFactory) -> Result<Self, ExtractionError> {
        let mut chains: ExtractorChains = HashMap::new();

        for field in FieldType::ALL {
            let strategies = config.strategies_for(field);
            debug!("Creating {} extractor(s) for '{}'", strategies.len(), field);

            let mut extractors = Vec::with_capacity(strategies.len());
            for strategy in strategies {
                match factory.build(field, *strategy) {
                    Ok(extractor) => extractors.push(extractor),
                    Err(e) => warn!(
                        "Skipping {} strategy for '{}': {}",
                        strategy, field, e
                    ),
                }
            }

            if extractors.is_empty() {
                error!("No extractors could be created for '{}'", field);
                return Err(ExtractionError::configuration(format!(
                    "failed to create any extractors for field '{field}'"
                )));
            }
            chains.insert(field, extractors);
        }

        let coordinator = ExtractionCoordinator::new(chains)?;
        info!("Resume parser ready: {:?}", coordinator);

        Ok(Self {
            coordinator,
            documents: DocumentRegistry::with_defaults(),
        })
    }

    pub fn coordinator(&self) -> &ExtractionCoordinator {
        &self.coordinator
    }

    pub fn is_supported_file(&self, path: &Path) -> bool {
        self.documents.is_supported(path)
    }

    pub fn supported_extensions(&self) -> Vec<String> {
        self.documents.supported_extensions()
    }

    /// Decodes the file at `path` and extracts every field from its text.
    pub async fn parse_resume(&self, path: &Path) -> Result<ResumeData, ParseError> {
        info!("Parsing resume {}", path.display());

        match tokio::fs::metadata(path).await {
            Err(_) => return Err(DecodeError::NotFound(path.to_path_buf()).into()),
            Ok(metadata) if !metadata.is_file() => {
                return Err(DecodeError::NotAFile(path.to_path_buf()).into())
            }
            Ok(_) => {}
        }

        let text = self.documents.parse(path).await.map_err(|e| {
            error!("Failed to decode {}: {}", path.display(), e);
            e
        })?;
        info!("Decoded {} characters from {}", text.len(), path.display());

        Ok(self.extract_text(&text).await?)
    }

    /// Same as [`ResumeParser::parse_resume`] for in-memory uploads. The
    /// bytes are spooled to a temporary file carrying the original extension.
    pub async fn parse_bytes(&self, file_name: &str, bytes: &[u8]) -> Result<ResumeData, ParseError> {
        let name = Path::new(file_name);
        if !self.is_supported_file(name) {
            return Err(DecodeError::Unsupported {
                extension: extension_of(name)
                    .map(|ext| format!(".{ext}"))
                    .unwrap_or_else(|| "<none>".to_string()),
                supported: self.supported_extensions().join(", "),
            }
            .into());
        }

        let suffix = extension_of(name)
            .map(|ext| format!(".{ext}"))
            .unwrap_or_default();
        let spool = tempfile::Builder::new()
            .prefix("resume-")
            .suffix(&suffix)
            .tempfile()
            .map_err(|source| DecodeError::Io {
                path: name.to_path_buf(),
                source,
            })?;
        tokio::fs::write(spool.path(), bytes)
            .await
            .map_err(|source| DecodeError::Io {
                path: spool.path().to_path_buf(),
                source,
            })?;

        self.parse_resume(spool.path()).await
    }

    /// Runs the coordinator over already-decoded text.
    pub async fn extract_text(&self, text: &str) -> Result<ResumeData, ExtractionError> {
        self.coordinator.extract(text).await
    }
}
