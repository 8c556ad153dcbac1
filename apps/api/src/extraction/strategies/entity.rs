use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::extraction::error::ExtractionError;
use crate::extraction::strategies::{ensure_text, ExtractionStrategy};
use crate::extraction::types::FieldSpec;
use crate::ner_client::EntityRecognizer;

/// Named-entity-recognition strategy.
///
/// The label searched for comes from the field spec, falling back to the
/// strategy-level default. The recognizer runs once per call and the text of
/// every entity it returns becomes a candidate.
pub struct EntityStrategy {
    spec: FieldSpec,
    recognizer: Arc<dyn EntityRecognizer>,
    default_label: Option<String>,
}

impl EntityStrategy {
    pub fn new(spec: FieldSpec, recognizer: Arc<dyn EntityRecognizer>) -> Self {
        Self {
            spec,
            recognizer,
            default_label: None,
        }
    }

    pub fn with_default_label(mut self, label: impl Into<String>) -> Self {
        self.default_label = Some(label.into());
        self
    }

    fn labels(&self) -> Option<Vec<String>> {
        self.spec
            .entity_label()
            .or(self.default_label.as_deref())
            .filter(|label| !label.trim().is_empty())
            .map(|label| vec![label.to_string()])
    }
}

#[async_trait]
impl ExtractionStrategy for EntityStrategy {
    fn name(&self) -> &str {
        "entity"
    }

    async fn extract(&self, text: &str) -> Result<Vec<String>, ExtractionError> {
        ensure_text(text)?;

        let labels = self.labels().ok_or_else(|| {
            ExtractionError::configuration(format!(
                "no entity label configured for field '{}'",
                self.spec.field_type()
            ))
        })?;

        let entities = self
            .recognizer
            .predict_entities(text, &labels)
            .await
            .map_err(|e| ExtractionError::strategy_failure("entity recognition failed", e))?;

        let texts: Vec<String> = entities.into_iter().map(|e| e.text).collect();
        if texts.is_empty() {
            return Err(ExtractionError::NoMatch(format!(
                "no '{}' entities found",
                labels.join(", ")
            )));
        }

        debug!(
            "Recognizer found {} '{}' entities for '{}'",
            texts.len(),
            labels.join(", "),
            self.spec.field_type()
        );
        Ok(self.spec.result_limit().apply(texts))
    }
}
