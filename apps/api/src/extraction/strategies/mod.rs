//! Extraction strategies: interchangeable techniques that turn text into
//! candidate values for one field.
//!
//! Each strategy is bound to its `FieldSpec` at construction and is then
//! called with bare text. The factory is the only place that knows which
//! concrete strategy backs a (field, strategy type) pair.

use async_trait::async_trait;

use crate::extraction::error::ExtractionError;

pub mod entity;
pub mod generative;
pub mod pattern;

pub use entity::EntityStrategy;
pub use generative::GenerativeStrategy;
pub use pattern::PatternStrategy;

/// One extraction technique bound to a field spec.
///
/// On success the returned candidates are already truncated to the field spec's
/// `ResultLimit`; a single-valued spec yields exactly one candidate.
#[async_trait]
pub trait ExtractionStrategy: Send + Sync {
    /// Human-readable identifier used in log lines.
    fn name(&self) -> &str;

    async fn extract(&self, text: &str) -> Result<Vec<String>, ExtractionError>;
}

/// Shared precondition: strategies refuse blank input with `NoMatch`.
pub(crate) fn ensure_text(text: &str) -> Result<(), ExtractionError> {
    if text.trim().is_empty() {
        return Err(ExtractionError::NoMatch(
            "cannot extract from empty text".to_string(),
        ));
    }
    Ok(())
}
