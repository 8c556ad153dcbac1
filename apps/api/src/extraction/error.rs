use thiserror::Error;

use crate::extraction::types::FieldType;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Every failure the extraction engine can report.
///
/// Inside a field's fallback chain all variants are treated alike: the
/// attempt is logged and the next extractor is tried. Only `Configuration`
/// (construction time) and `Validation` (coordinator input) ever reach the
/// caller of the coordinator.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("configuration error: {message}")]
    Configuration {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("validation error: {0}")]
    Validation(String),

    #[error("no match found: {0}")]
    NoMatch(String),

    #[error("strategy failed: {message}")]
    StrategyFailure {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("external service failed: {message}")]
    ExternalService {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("{field} extraction failed: {reason}")]
    FieldExtraction {
        field: FieldType,
        reason: String,
        #[source]
        source: Option<Box<ExtractionError>>,
    },
}

impl ExtractionError {
    pub fn configuration(message: impl Into<String>) -> Self {
        ExtractionError::Configuration {
            message: message.into(),
            source: None,
        }
    }

    pub fn configuration_caused_by(
        message: impl Into<String>,
        cause: impl Into<BoxError>,
    ) -> Self {
        ExtractionError::Configuration {
            message: message.into(),
            source: Some(cause.into()),
        }
    }

    pub fn strategy_failure(message: impl Into<String>, cause: impl Into<BoxError>) -> Self {
        ExtractionError::StrategyFailure {
            message: message.into(),
            source: Some(cause.into()),
        }
    }

    pub fn external_service(message: impl Into<String>, cause: Option<BoxError>) -> Self {
        ExtractionError::ExternalService {
            message: message.into(),
            source: cause,
        }
    }

    pub fn field(field: FieldType, reason: impl Into<String>) -> Self {
        ExtractionError::FieldExtraction {
            field,
            reason: reason.into(),
            source: None,
        }
    }

    pub fn field_caused_by(field: FieldType, reason: impl Into<String>, cause: Self) -> Self {
        ExtractionError::FieldExtraction {
            field,
            reason: reason.into(),
            source: Some(Box::new(cause)),
        }
    }

    /// Short label for the failure family, used in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            ExtractionError::Configuration { .. } => "configuration",
            ExtractionError::Validation(_) => "validation",
            ExtractionError::NoMatch(_) => "no_match",
            ExtractionError::StrategyFailure { .. } => "strategy_failure",
            ExtractionError::ExternalService { .. } => "external_service",
            ExtractionError::FieldExtraction { .. } => "field_extraction",
        }
    }

    /// The innermost error in a `FieldExtraction` wrapping, or `self`.
    pub fn root_cause(&self) -> &ExtractionError {
        match self {
            ExtractionError::FieldExtraction {
                source: Some(inner),
                ..
            } => inner.root_cause(),
            other => other,
        }
    }
}
