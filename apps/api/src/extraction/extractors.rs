//! Field extractors: the shape and validation layer wrapped around exactly
//! one strategy. An extractor either hands back a usable value for its field
//! or fails with `ExtractionError::FieldExtraction`.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use serde::Serialize;

use crate::extraction::error::ExtractionError;
use crate::extraction::strategies::ExtractionStrategy;
use crate::extraction::types::FieldType;

const NAME_MIN_CHARS: usize = 1;
const EMAIL_MIN_CHARS: usize = 5;
const SKILLS_MIN_CHARS: usize = 2;

static STRICT_EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("valid email regex")
});

/// What one extractor produced for its field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Single(String),
    Multiple(Vec<String>),
}

impl FieldValue {
    /// Empty strings and empty lists do not count as a result.
    pub fn is_meaningful(&self) -> bool {
        match self {
            FieldValue::Single(value) => !value.is_empty(),
            FieldValue::Multiple(values) => !values.is_empty(),
        }
    }

    pub fn into_single(self) -> Option<String> {
        match self {
            FieldValue::Single(value) => Some(value),
            FieldValue::Multiple(values) => values.into_iter().next(),
        }
    }

    pub fn into_multiple(self) -> Vec<String> {
        match self {
            FieldValue::Single(value) => vec![value],
            FieldValue::Multiple(values) => values,
        }
    }
}

#[async_trait]
pub trait FieldExtractor: Send + Sync {
    fn field_type(&self) -> FieldType;

    /// Identifier used in coordinator logs, e.g. `email/pattern`.
    fn name(&self) -> &str;

    async fn extract(&self, text: &str) -> Result<FieldValue, ExtractionError>;
}

/// Strategy plumbing shared by the three extractors.
struct Wrapped {
    field: FieldType,
    min_chars: usize,
    label: String,
    strategy: Box<dyn ExtractionStrategy>,
}

impl Wrapped {
    fn new(field: FieldType, min_chars: usize, strategy: Box<dyn ExtractionStrategy>) -> Self {
        let label = format!("{}/{}", field, strategy.name());
        Self {
            field,
            min_chars,
            label,
            strategy,
        }
    }

    /// Length check, delegation on the trimmed text, and error wrapping.
    async fn candidates(&self, text: &str) -> Result<Vec<String>, ExtractionError> {
        let trimmed = text.trim();
        if trimmed.chars().count() < self.min_chars {
            return Err(ExtractionError::field(
                self.field,
                format!(
                    "input text must be at least {} character(s) after trimming",
                    self.min_chars
                ),
            ));
        }

        let candidates = self
            .strategy
            .extract(trimmed)
            .await
            .map_err(|e| ExtractionError::field_caused_by(self.field, "strategy failed", e))?;

        if candidates.is_empty() {
            return Err(ExtractionError::field(
                self.field,
                format!("no {} found", self.field),
            ));
        }
        Ok(candidates)
    }
}

// ── Name ─────────────────────────────────────────────────────────

pub struct NameExtractor {
    inner: Wrapped,
}

impl NameExtractor {
    pub fn new(strategy: Box<dyn ExtractionStrategy>) -> Self {
        Self {
            inner: Wrapped::new(FieldType::Name, NAME_MIN_CHARS, strategy),
        }
    }
}

#[async_trait]
impl FieldExtractor for NameExtractor {
    fn field_type(&self) -> FieldType {
        FieldType::Name
    }

    fn name(&self) -> &str {
        &self.inner.label
    }

    async fn extract(&self, text: &str) -> Result<FieldValue, ExtractionError> {
        let mut candidates = self.inner.candidates(text).await?;
        Ok(FieldValue::Single(candidates.swap_remove(0)))
    }
}

// ── Email ────────────────────────────────────────────────────────

pub struct EmailExtractor {
    inner: Wrapped,
}

impl EmailExtractor {
    pub fn new(strategy: Box<dyn ExtractionStrategy>) -> Self {
        Self {
            inner: Wrapped::new(FieldType::Email, EMAIL_MIN_CHARS, strategy),
        }
    }
}

/// `local@domain.tld` with a TLD of at least two letters.
pub fn is_valid_email(candidate: &str) -> bool {
    STRICT_EMAIL.is_match(candidate)
}

#[async_trait]
impl FieldExtractor for EmailExtractor {
    fn field_type(&self) -> FieldType {
        FieldType::Email
    }

    fn name(&self) -> &str {
        &self.inner.label
    }

    async fn extract(&self, text: &str) -> Result<FieldValue, ExtractionError> {
        let mut candidates = self.inner.candidates(text).await?;
        let email = candidates.swap_remove(0);
        if !is_valid_email(&email) {
            return Err(ExtractionError::field(
                FieldType::Email,
                format!("invalid email format: '{email}'"),
            ));
        }
        Ok(FieldValue::Single(email))
    }
}

// ── Skills ───────────────────────────────────────────────────────

/// Passes the strategy's list through untouched: order and duplicates are
/// the strategy's business.
pub struct SkillsExtractor {
    inner: Wrapped,
}

impl SkillsExtractor {
    pub fn new(strategy: Box<dyn ExtractionStrategy>) -> Self {
        Self {
            inner: Wrapped::new(FieldType::Skills, SKILLS_MIN_CHARS, strategy),
        }
    }
}

#[async_trait]
impl FieldExtractor for SkillsExtractor {
    fn field_type(&self) -> FieldType {
        FieldType::Skills
    }

    fn name(&self) -> &str {
        &self.inner.label
    }

    async fn extract(&self, text: &str) -> Result<FieldValue, ExtractionError> {
        let candidates = self.inner.candidates(text).await?;
        Ok(FieldValue::Multiple(candidates))
    }
}
