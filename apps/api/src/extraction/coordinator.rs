//! The fallback engine.
//!
//! Each field owns an ordered chain of extractors. The chain is walked
//! strictly in order until one extractor produces a meaningful value; any
//! error and any empty result just advance to the next entry. A chain that
//! runs dry resolves to the field's empty default. Only blank input and
//! construction-time wiring problems ever surface as errors.

use std::collections::HashMap;

use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::extraction::error::ExtractionError;
use crate::extraction::extractors::{FieldExtractor, FieldValue};
use crate::extraction::types::FieldType;
use crate::models::ResumeData;

pub type ExtractorChains = HashMap<FieldType, Vec<Box<dyn FieldExtractor>>>;

pub struct ExtractionCoordinator {
    extractors: ExtractorChains,
}

impl std::fmt::Debug for ExtractionCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut chains = f.debug_map();
        for field in FieldType::ALL {
            let names: Vec<&str> = self
                .chain(field)
                .iter()
                .map(|extractor| extractor.name())
                .collect();
            chains.entry(&field.as_str(), &names);
        }
        chains.finish()
    }
}

impl ExtractionCoordinator {
    /// Fails when the mapping is empty or leaves any field undeclared.
    pub fn new(extractors: ExtractorChains) -> Result<Self, ExtractionError> {
        if extractors.is_empty() {
            return Err(ExtractionError::configuration(
                "extractor mapping is empty",
            ));
        }

        let missing: Vec<&str> = FieldType::ALL
            .iter()
            .filter(|field| !extractors.contains_key(field))
            .map(|field| field.as_str())
            .collect();
        if !missing.is_empty() {
            return Err(ExtractionError::configuration(format!(
                "no extractors configured for required field(s): {}",
                missing.join(", ")
            )));
        }

        Ok(Self { extractors })
    }

    pub fn chain(&self, field: FieldType) -> &[Box<dyn FieldExtractor>] {
        self.extractors
            .get(&field)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Runs every field's chain over `text` and assembles the record.
    ///
    /// The chains run under an `extraction` span opened as a child of the
    /// caller's current span, so request-level fields reach every log line.
    pub async fn extract(&self, text: &str) -> Result<ResumeData, ExtractionError> {
        if text.trim().is_empty() {
            return Err(ExtractionError::Validation(
                "resume text must not be empty".to_string(),
            ));
        }

        async {
            info!("Extracting fields from {} characters of text", text.len());

            let name = self.run_chain(FieldType::Name, text).await;
            let email = self.run_chain(FieldType::Email, text).await;
            let skills = self.run_chain(FieldType::Skills, text).await;

            let data = ResumeData {
                name: name.and_then(FieldValue::into_single),
                email: email.and_then(FieldValue::into_single),
                skills: Some(skills.map(FieldValue::into_multiple).unwrap_or_default()),
            };
            info!(
                "Extraction finished: name={} email={} skills={}",
                data.name.is_some(),
                data.email.is_some(),
                data.skills.as_ref().map_or(0, Vec::len)
            );
            Ok(data)
        }
        .instrument(info_span!("extraction"))
        .await
    }

    async fn run_chain(&self, field: FieldType, text: &str) -> Option<FieldValue> {
        let chain = self.chain(field);
        if chain.is_empty() {
            warn!("No extractors configured for '{}'", field);
            return None;
        }

        for (attempt, extractor) in chain.iter().enumerate() {
            debug!(
                "Trying {} ({}/{}) for '{}'",
                extractor.name(),
                attempt + 1,
                chain.len(),
                field
            );

            match extractor.extract(text).await {
                Ok(value) if value.is_meaningful() => {
                    info!("Extracted '{}' with {}", field, extractor.name());
                    return Some(value);
                }
                Ok(_) => {
                    warn!(
                        "{} returned an empty result for '{}', trying next extractor",
                        extractor.name(),
                        field
                    );
                }
                Err(e) => {
                    let cause = e.root_cause();
                    error!(
                        "{} failed for '{}': {} [{}: {}]",
                        extractor.name(),
                        field,
                        e,
                        cause.kind(),
                        cause
                    );
                }
            }
        }

        error!(
            "All {} extractor(s) failed for '{}', using empty default",
            chain.len(),
            field
        );
        None
    }
}
