//! Vocabulary of the extraction engine: which fields exist, which techniques
//! exist, and the immutable spec that tells a strategy what to pull out.

use std::fmt;
use std::num::NonZeroUsize;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::extraction::error::ExtractionError;

/// The semantic field a spec, strategy or extractor is concerned with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Name,
    Email,
    Skills,
}

impl FieldType {
    /// Every field, in the fixed order the coordinator walks them.
    pub const ALL: [FieldType; 3] = [FieldType::Name, FieldType::Email, FieldType::Skills];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Name => "name",
            FieldType::Email => "email",
            FieldType::Skills => "skills",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The technique family used to pull a field out of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyType {
    /// Regular-expression matching.
    Pattern,
    /// Named-entity recognition.
    Entity,
    /// Generative language model.
    Generative,
}

impl StrategyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyType::Pattern => "pattern",
            StrategyType::Entity => "entity",
            StrategyType::Generative => "generative",
        }
    }
}

impl fmt::Display for StrategyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyType {
    type Err = ExtractionError;

    /// Accepts both the technique names and the common shorthands
    /// (`regex`, `ner`, `llm`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pattern" | "regex" => Ok(StrategyType::Pattern),
            "entity" | "ner" => Ok(StrategyType::Entity),
            "generative" | "llm" => Ok(StrategyType::Generative),
            other => Err(ExtractionError::configuration(format!(
                "unknown strategy type '{other}'"
            ))),
        }
    }
}

/// Which strategy types may legally be paired with a field.
/// Enforced when extractors are built, never at extraction time.
pub fn supported_strategies(field_type: FieldType) -> &'static [StrategyType] {
    match field_type {
        FieldType::Name => &[StrategyType::Entity, StrategyType::Generative],
        FieldType::Email => &[
            StrategyType::Pattern,
            StrategyType::Entity,
            StrategyType::Generative,
        ],
        FieldType::Skills => &[StrategyType::Entity, StrategyType::Generative],
    }
}

/// Cardinality of a field.
///
/// `Single` fields surface exactly one value; `Unlimited` fields surface every
/// candidate; `AtMost(n)` fields surface the first `n` candidates in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultLimit {
    Single,
    Unlimited,
    AtMost(NonZeroUsize),
}

impl ResultLimit {
    /// Maps the optional-integer encoding (`None` = single, `0` = unlimited,
    /// `n` = capped) onto the tagged form.
    pub fn from_option(limit: Option<usize>) -> Self {
        match limit {
            None => ResultLimit::Single,
            Some(n) => NonZeroUsize::new(n)
                .map(ResultLimit::AtMost)
                .unwrap_or(ResultLimit::Unlimited),
        }
    }

    /// Truncates candidates according to the limit, keeping original order.
    pub fn apply(self, mut candidates: Vec<String>) -> Vec<String> {
        match self {
            ResultLimit::Single => candidates.truncate(1),
            ResultLimit::Unlimited => {}
            ResultLimit::AtMost(n) => candidates.truncate(n.get()),
        }
        candidates
    }
}

/// Immutable parameters telling a strategy what and how much to extract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    field_type: FieldType,
    patterns: Option<Vec<String>>,
    entity_label: Option<String>,
    result_limit: ResultLimit,
}

impl FieldSpec {
    /// A single-valued spec with no strategy knobs set.
    pub fn new(field_type: FieldType) -> Self {
        Self {
            field_type,
            patterns: None,
            entity_label: None,
            result_limit: ResultLimit::Single,
        }
    }

    pub fn with_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.patterns = Some(patterns.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_entity_label(mut self, label: impl Into<String>) -> Self {
        self.entity_label = Some(label.into());
        self
    }

    pub fn with_result_limit(mut self, limit: ResultLimit) -> Self {
        self.result_limit = limit;
        self
    }

    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    pub fn patterns(&self) -> Option<&[String]> {
        self.patterns.as_deref()
    }

    pub fn entity_label(&self) -> Option<&str> {
        self.entity_label.as_deref()
    }

    pub fn result_limit(&self) -> ResultLimit {
        self.result_limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owned(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_result_limit_from_option() {
        assert_eq!(ResultLimit::from_option(None), ResultLimit::Single);
        assert_eq!(ResultLimit::from_option(Some(0)), ResultLimit::Unlimited);
        assert_eq!(
            ResultLimit::from_option(Some(3)),
            ResultLimit::AtMost(NonZeroUsize::new(3).unwrap())
        );
    }

    #[test]
    fn test_single_limit_surfaces_exactly_one() {
        let out = ResultLimit::Single.apply(owned(&["a", "b", "c"]));
        assert_eq!(out, owned(&["a"]));
    }

    #[test]
    fn test_unlimited_surfaces_all_unmodified() {
        let out = ResultLimit::Unlimited.apply(owned(&["b", "a", "b"]));
        assert_eq!(out, owned(&["b", "a", "b"]));
    }

    #[test]
    fn test_capped_limit_keeps_first_n_in_order() {
        let out = ResultLimit::from_option(Some(2)).apply(owned(&["x", "y", "z"]));
        assert_eq!(out, owned(&["x", "y"]));
    }

    #[test]
    fn test_supported_strategies_table() {
        assert!(!supported_strategies(FieldType::Name).contains(&StrategyType::Pattern));
        assert!(supported_strategies(FieldType::Email).contains(&StrategyType::Pattern));
        assert!(!supported_strategies(FieldType::Skills).contains(&StrategyType::Pattern));
        for field in FieldType::ALL {
            assert!(supported_strategies(field).contains(&StrategyType::Entity));
            assert!(supported_strategies(field).contains(&StrategyType::Generative));
        }
    }

    #[test]
    fn test_strategy_type_parses_aliases() {
        assert_eq!("regex".parse::<StrategyType>().unwrap(), StrategyType::Pattern);
        assert_eq!(" NER ".parse::<StrategyType>().unwrap(), StrategyType::Entity);
        assert_eq!("llm".parse::<StrategyType>().unwrap(), StrategyType::Generative);
        assert!("magic".parse::<StrategyType>().is_err());
    }

    #[test]
    fn test_field_spec_defaults_to_single_valued() {
        let spec = FieldSpec::new(FieldType::Name);
        assert_eq!(spec.result_limit(), ResultLimit::Single);
        assert!(spec.patterns().is_none());
        assert!(spec.entity_label().is_none());
    }

    #[test]
    fn test_field_type_serde_is_snake_case() {
        let json = serde_json::to_string(&FieldType::Skills).unwrap();
        assert_eq!(json, r#""skills""#);
        let parsed: StrategyType = serde_json::from_str(r#""generative""#).unwrap();
        assert_eq!(parsed, StrategyType::Generative);
    }
}
