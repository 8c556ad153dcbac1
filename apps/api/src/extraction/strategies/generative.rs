use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::extraction::error::ExtractionError;
use crate::extraction::strategies::{ensure_text, ExtractionStrategy};
use crate::extraction::types::{FieldSpec, ResultLimit};
use crate::llm_client::prompts::{build_extraction_prompt, NOT_FOUND};
use crate::llm_client::{strip_code_fences, TextGenerator};

/// Generative-model strategy: one prompt, one model call, strict parsing.
///
/// Single-valued specs expect a bare value (or the `NOT_FOUND` sentinel).
/// Multi-valued specs expect a JSON array somewhere in the response,
/// delimited by the first `[` and the last `]`.
pub struct GenerativeStrategy {
    spec: FieldSpec,
    generator: Arc<dyn TextGenerator>,
}

impl GenerativeStrategy {
    pub fn new(spec: FieldSpec, generator: Arc<dyn TextGenerator>) -> Self {
        Self { spec, generator }
    }

    fn parse_response(&self, response: &str) -> Result<Vec<String>, ExtractionError> {
        match self.spec.result_limit() {
            ResultLimit::Single => parse_single(response, &self.spec),
            limit => parse_list(response).map(|items| limit.apply(items)),
        }
    }
}

fn parse_single(response: &str, spec: &FieldSpec) -> Result<Vec<String>, ExtractionError> {
    let value = strip_code_fences(response).trim_matches(|c: char| c == '"' || c == '`').trim();
    if value.is_empty() || value.eq_ignore_ascii_case(NOT_FOUND) {
        return Err(ExtractionError::NoMatch(format!(
            "model could not find field '{}'",
            spec.field_type()
        )));
    }
    Ok(vec![value.to_string()])
}

fn parse_list(response: &str) -> Result<Vec<String>, ExtractionError> {
    let (start, end) = match (response.find('['), response.rfind(']')) {
        (Some(start), Some(end)) if start < end => (start, end),
        _ => {
            return Err(ExtractionError::external_service(
                "no JSON array found in model response",
                None,
            ))
        }
    };

    let parsed: Value = serde_json::from_str(&response[start..=end]).map_err(|e| {
        ExtractionError::external_service("failed to parse model response as JSON", Some(e.into()))
    })?;

    let Value::Array(items) = parsed else {
        return Err(ExtractionError::external_service(
            "model response is not a JSON array",
            None,
        ));
    };

    let values: Vec<String> = items
        .into_iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(s.trim().to_string()),
            _ => None,
        })
        .filter(|s| !s.is_empty())
        .collect();

    if values.is_empty() {
        return Err(ExtractionError::external_service(
            "model returned an empty array",
            None,
        ));
    }
    Ok(values)
}

#[async_trait]
impl ExtractionStrategy for GenerativeStrategy {
    fn name(&self) -> &str {
        "generative"
    }

    async fn extract(&self, text: &str) -> Result<Vec<String>, ExtractionError> {
        ensure_text(text)?;

        let prompt = build_extraction_prompt(self.spec.field_type(), self.spec.result_limit(), text);
        let response = self
            .generator
            .generate(&prompt)
            .await
            .map_err(|e| ExtractionError::external_service("language model call failed", Some(e.into())))?;

        if response.trim().is_empty() {
            return Err(ExtractionError::NoMatch(format!(
                "model returned an empty response for field '{}'",
                self.spec.field_type()
            )));
        }

        let values = self.parse_response(&response)?;
        debug!(
            "Model produced {} value(s) for '{}'",
            values.len(),
            self.spec.field_type()
        );
        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use crate::extraction::types::FieldType;
    use crate::llm_client::LlmError;

    /// Replies with a canned response and remembers the last prompt.
    struct StubGenerator {
        reply: Result<&'static str, ()>,
        last_prompt: Mutex<Option<String>>,
    }

    impl StubGenerator {
        fn replying(reply: &'static str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(reply),
                last_prompt: Mutex::new(None),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                reply: Err(()),
                last_prompt: Mutex::new(None),
            })
        }
    }

    #[async_trait]
    impl TextGenerator for StubGenerator {
        async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
            *self.last_prompt.lock().unwrap() = Some(prompt.to_string());
            match self.reply {
                Ok(text) => Ok(text.to_string()),
                Err(()) => Err(LlmError::Api {
                    status: 529,
                    message: "overloaded".to_string(),
                }),
            }
        }
    }

    fn strategy(field: FieldType, limit: Option<usize>, generator: Arc<StubGenerator>) -> GenerativeStrategy {
        let spec = FieldSpec::new(field).with_result_limit(ResultLimit::from_option(limit));
        GenerativeStrategy::new(spec, generator)
    }

    #[tokio::test]
    async fn test_single_value_response() {
        let s = strategy(FieldType::Name, None, StubGenerator::replying("  Jane Doe\n"));
        assert_eq!(s.extract("resume").await.unwrap(), vec!["Jane Doe"]);
    }

    #[tokio::test]
    async fn test_single_value_strips_quotes_and_fences() {
        let s = strategy(
            FieldType::Email,
            None,
            StubGenerator::replying("```\n\"jane@example.com\"\n```"),
        );
        assert_eq!(s.extract("resume").await.unwrap(), vec!["jane@example.com"]);
    }

    #[tokio::test]
    async fn test_not_found_sentinel_is_no_match() {
        let s = strategy(FieldType::Name, None, StubGenerator::replying("NOT_FOUND"));
        assert!(matches!(
            s.extract("resume").await.unwrap_err(),
            ExtractionError::NoMatch(_)
        ));
    }

    #[tokio::test]
    async fn test_empty_response_is_no_match() {
        let s = strategy(FieldType::Skills, Some(0), StubGenerator::replying("   "));
        assert!(matches!(
            s.extract("resume").await.unwrap_err(),
            ExtractionError::NoMatch(_)
        ));
    }

    #[tokio::test]
    async fn test_multi_value_json_array() {
        let s = strategy(
            FieldType::Skills,
            Some(0),
            StubGenerator::replying(r#"["Python", "Java", "SQL"]"#),
        );
        assert_eq!(s.extract("resume").await.unwrap(), vec!["Python", "Java", "SQL"]);
    }

    #[tokio::test]
    async fn test_multi_value_array_embedded_in_prose() {
        let s = strategy(
            FieldType::Skills,
            Some(0),
            StubGenerator::replying(r#"Here are the skills: ["Python", "Java"] thanks"#),
        );
        assert_eq!(s.extract("resume").await.unwrap(), vec!["Python", "Java"]);
    }

    #[tokio::test]
    async fn test_multi_value_drops_blank_and_non_string_items_then_caps() {
        let s = strategy(
            FieldType::Skills,
            Some(2),
            StubGenerator::replying(r#"["", 42, " Rust ", null, "Go", "SQL"]"#),
        );
        assert_eq!(s.extract("resume").await.unwrap(), vec!["Rust", "Go"]);
    }

    #[tokio::test]
    async fn test_empty_array_is_external_service_error() {
        let s = strategy(FieldType::Skills, Some(0), StubGenerator::replying("[]"));
        assert_eq!(s.extract("resume").await.unwrap_err().kind(), "external_service");
    }

    #[tokio::test]
    async fn test_invalid_json_is_external_service_error() {
        let s = strategy(FieldType::Skills, Some(0), StubGenerator::replying("[Python, Java"));
        assert_eq!(s.extract("resume").await.unwrap_err().kind(), "external_service");

        let s = strategy(FieldType::Skills, Some(0), StubGenerator::replying("[Python, Java]"));
        assert_eq!(s.extract("resume").await.unwrap_err().kind(), "external_service");
    }

    #[tokio::test]
    async fn test_non_array_json_is_external_service_error() {
        let s = strategy(
            FieldType::Skills,
            Some(0),
            StubGenerator::replying(r#"{"skills": "Rust"}"#),
        );
        assert_eq!(s.extract("resume").await.unwrap_err().kind(), "external_service");
    }

    #[tokio::test]
    async fn test_transport_failure_is_external_service_error() {
        let s = strategy(FieldType::Name, None, StubGenerator::failing());
        assert_eq!(s.extract("resume").await.unwrap_err().kind(), "external_service");
    }

    #[tokio::test]
    async fn test_prompt_embeds_text_and_field_instruction() {
        let stub = StubGenerator::replying("jane@example.com");
        let s = strategy(FieldType::Email, None, stub.clone());
        s.extract("Jane Doe, jane@example.com").await.unwrap();

        let prompt = stub.last_prompt.lock().unwrap().clone().unwrap();
        assert!(prompt.contains("email address"));
        assert!(prompt.contains("Jane Doe, jane@example.com"));
    }

    #[tokio::test]
    async fn test_empty_text_is_no_match() {
        let stub = StubGenerator::replying("x");
        let s = strategy(FieldType::Name, None, stub.clone());
        assert!(matches!(s.extract("").await.unwrap_err(), ExtractionError::NoMatch(_)));
        assert!(stub.last_prompt.lock().unwrap().is_none());
    }
}
