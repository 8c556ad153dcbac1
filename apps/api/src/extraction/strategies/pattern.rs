use async_trait::async_trait;
use regex::{Regex, RegexBuilder};
use tracing::debug;

use crate::extraction::error::ExtractionError;
use crate::extraction::strategies::{ensure_text, ExtractionStrategy};
use crate::extraction::types::FieldSpec;

/// Regular-expression strategy.
///
/// Patterns are tried in declared order and the first one that yields any
/// match wins; later patterns are not consulted. When a pattern has capture
/// groups every non-empty group becomes its own candidate.
pub struct PatternStrategy {
    spec: FieldSpec,
    patterns: Vec<Regex>,
}

impl PatternStrategy {
    pub fn new(spec: FieldSpec) -> Result<Self, ExtractionError> {
        let sources = match spec.patterns() {
            Some(patterns) if !patterns.is_empty() => patterns,
            _ => {
                return Err(ExtractionError::configuration(format!(
                    "pattern strategy for '{}' needs at least one pattern",
                    spec.field_type()
                )))
            }
        };

        let patterns = sources
            .iter()
            .map(|source| {
                RegexBuilder::new(source)
                    .case_insensitive(true)
                    .multi_line(true)
                    .build()
                    .map_err(|e| {
                        ExtractionError::configuration_caused_by(
                            format!("invalid pattern '{source}'"),
                            e,
                        )
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { spec, patterns })
    }

    pub fn spec(&self) -> &FieldSpec {
        &self.spec
    }
}

/// All non-overlapping matches of `pattern`, with capture groups flattened.
fn find_all(pattern: &Regex, text: &str) -> Vec<String> {
    if pattern.captures_len() == 1 {
        return pattern
            .find_iter(text)
            .map(|m| m.as_str().to_string())
            .filter(|s| !s.is_empty())
            .collect();
    }

    pattern
        .captures_iter(text)
        .flat_map(|caps| {
            caps.iter()
                .skip(1)
                .flatten()
                .map(|m| m.as_str().to_string())
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
        })
        .collect()
}

#[async_trait]
impl ExtractionStrategy for PatternStrategy {
    fn name(&self) -> &str {
        "pattern"
    }

    async fn extract(&self, text: &str) -> Result<Vec<String>, ExtractionError> {
        ensure_text(text)?;

        for (idx, pattern) in self.patterns.iter().enumerate() {
            let matches = find_all(pattern, text);
            if !matches.is_empty() {
                debug!(
                    "Pattern {} of {} matched {} candidate(s) for '{}'",
                    idx + 1,
                    self.patterns.len(),
                    matches.len(),
                    self.spec.field_type()
                );
                return Ok(self.spec.result_limit().apply(matches));
            }
        }

        Err(ExtractionError::NoMatch(format!(
            "no matches found for field '{}' using {} pattern(s)",
            self.spec.field_type(),
            self.patterns.len()
        )))
    }
}
