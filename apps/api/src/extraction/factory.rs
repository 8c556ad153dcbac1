//! The only place that knows which concrete strategy and extractor back a
//! (field, strategy type) pair.

use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use tracing::{debug, info};

use crate::extraction::error::ExtractionError;
use crate::extraction::extractors::{EmailExtractor, FieldExtractor, NameExtractor, SkillsExtractor};
use crate::extraction::strategies::{
    EntityStrategy, ExtractionStrategy, GenerativeStrategy, PatternStrategy,
};
use crate::extraction::types::{supported_strategies, FieldSpec, FieldType, ResultLimit, StrategyType};
use crate::llm_client::{LlmClient, TextGenerator};
use crate::ner_client::{EntityRecognizer, LexiconRecognizer, RemoteRecognizer, DEFAULT_MODEL, DEFAULT_THRESHOLD};

/// Standard email address pattern used by the pattern strategy.
pub const EMAIL_PATTERN: &str = r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}";

/// Where entity recognition comes from.
#[derive(Clone)]
pub enum RecognizerSource {
    /// In-process lexicon recognizer, optionally with a custom skills file.
    Lexicon { skills_path: Option<PathBuf> },
    /// GLiNER-compatible HTTP inference endpoint.
    Remote {
        endpoint: String,
        model: String,
        threshold: f32,
    },
    /// Already-built recognizer (tests, embedding applications).
    Provided(Arc<dyn EntityRecognizer>),
}

impl RecognizerSource {
    pub fn remote(endpoint: impl Into<String>) -> Self {
        RecognizerSource::Remote {
            endpoint: endpoint.into(),
            model: DEFAULT_MODEL.to_string(),
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl Default for RecognizerSource {
    fn default() -> Self {
        RecognizerSource::Lexicon { skills_path: None }
    }
}

/// Where text generation comes from.
#[derive(Clone)]
pub enum GeneratorSource {
    /// Anthropic Messages API. A missing key makes generative strategies
    /// fail to build.
    Anthropic {
        api_key: Option<String>,
        base_url: Option<String>,
    },
    Provided(Arc<dyn TextGenerator>),
}

impl Default for GeneratorSource {
    fn default() -> Self {
        GeneratorSource::Anthropic {
            api_key: None,
            base_url: None,
        }
    }
}

/// The field spec every extractor for `field` is built with.
pub fn default_field_spec(field: FieldType) -> FieldSpec {
    match field {
        FieldType::Name => FieldSpec::new(FieldType::Name)
            .with_entity_label("person")
            .with_result_limit(ResultLimit::Single),
        FieldType::Email => FieldSpec::new(FieldType::Email)
            .with_patterns([EMAIL_PATTERN])
            .with_entity_label("email")
            .with_result_limit(ResultLimit::Single),
        FieldType::Skills => FieldSpec::new(FieldType::Skills)
            .with_entity_label("skill")
            .with_result_limit(ResultLimit::Unlimited),
    }
}

/// Builds extractors on demand. Recognizer and generator are loaded on first
/// use and then shared by every extractor this factory builds.
pub struct StrategyFactory {
    recognizer_source: RecognizerSource,
    generator_source: GeneratorSource,
    recognizer: OnceLock<Arc<dyn EntityRecognizer>>,
    generator: OnceLock<Arc<dyn TextGenerator>>,
}

impl Default for StrategyFactory {
    fn default() -> Self {
        Self::new(RecognizerSource::default(), GeneratorSource::default())
    }
}

impl StrategyFactory {
    pub fn new(recognizer_source: RecognizerSource, generator_source: GeneratorSource) -> Self {
        Self {
            recognizer_source,
            generator_source,
            recognizer: OnceLock::new(),
            generator: OnceLock::new(),
        }
    }

    /// Resolves `(field, strategy)` into a ready extractor.
    pub fn build(
        &self,
        field: FieldType,
        strategy: StrategyType,
    ) -> Result<Box<dyn FieldExtractor>, ExtractionError> {
        if !supported_strategies(field).contains(&strategy) {
            return Err(ExtractionError::configuration(format!(
                "strategy '{strategy}' is not supported for field '{field}'"
            )));
        }

        let spec = default_field_spec(field);
        let strategy: Box<dyn ExtractionStrategy> = match strategy {
            StrategyType::Pattern => Box::new(PatternStrategy::new(spec)?),
            StrategyType::Entity => Box::new(EntityStrategy::new(spec, self.recognizer()?)),
            StrategyType::Generative => Box::new(GenerativeStrategy::new(spec, self.generator()?)),
        };
        debug!("Built {} strategy for '{}'", strategy.name(), field);

        Ok(match field {
            FieldType::Name => Box::new(NameExtractor::new(strategy)),
            FieldType::Email => Box::new(EmailExtractor::new(strategy)),
            FieldType::Skills => Box::new(SkillsExtractor::new(strategy)),
        })
    }

    fn recognizer(&self) -> Result<Arc<dyn EntityRecognizer>, ExtractionError> {
        if let Some(recognizer) = self.recognizer.get() {
            return Ok(recognizer.clone());
        }

        let recognizer: Arc<dyn EntityRecognizer> = match &self.recognizer_source {
            RecognizerSource::Provided(recognizer) => recognizer.clone(),
            RecognizerSource::Lexicon { skills_path } => {
                let lexicon = match skills_path {
                    Some(path) => LexiconRecognizer::from_file(path),
                    None => LexiconRecognizer::new(),
                }
                .map_err(|e| {
                    ExtractionError::configuration_caused_by("failed to load entity recognizer", e)
                })?;
                info!("Using in-process lexicon entity recognizer");
                Arc::new(lexicon)
            }
            RecognizerSource::Remote {
                endpoint,
                model,
                threshold,
            } => {
                let remote = RemoteRecognizer::new(endpoint.clone(), model.clone())
                    .map_err(|e| {
                        ExtractionError::configuration_caused_by(
                            "failed to load entity recognizer",
                            e,
                        )
                    })?
                    .with_threshold(*threshold);
                info!("Using remote entity recognizer at {} ({})", endpoint, model);
                Arc::new(remote)
            }
        };

        Ok(self.recognizer.get_or_init(|| recognizer).clone())
    }

    fn generator(&self) -> Result<Arc<dyn TextGenerator>, ExtractionError> {
        if let Some(generator) = self.generator.get() {
            return Ok(generator.clone());
        }

        let generator: Arc<dyn TextGenerator> = match &self.generator_source {
            GeneratorSource::Provided(generator) => generator.clone(),
            GeneratorSource::Anthropic { api_key, base_url } => {
                let key = api_key.as_deref().unwrap_or_default();
                let mut client = LlmClient::new(key).map_err(|e| {
                    ExtractionError::configuration_caused_by(
                        "failed to initialise language model client",
                        e,
                    )
                })?;
                if let Some(url) = base_url {
                    client = client.with_base_url(url.clone());
                }
                Arc::new(client)
            }
        };

        Ok(self.generator.get_or_init(|| generator).clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use async_trait::async_trait;

    use crate::llm_client::LlmError;

    struct CannedGenerator(&'static str);

    #[async_trait]
    impl TextGenerator for CannedGenerator {
        async fn generate(&self, _prompt: &str) -> Result<String, LlmError> {
            Ok(self.0.to_string())
        }
    }

    fn lexicon_factory() -> StrategyFactory {
        StrategyFactory::new(
            RecognizerSource::default(),
            GeneratorSource::Provided(Arc::new(CannedGenerator(r#"["Rust"]"#))),
        )
    }

    #[test]
    fn test_default_specs() {
        let name = default_field_spec(FieldType::Name);
        assert_eq!(name.entity_label(), Some("person"));
        assert_eq!(name.result_limit(), ResultLimit::Single);

        let email = default_field_spec(FieldType::Email);
        assert_eq!(email.patterns().unwrap(), &[EMAIL_PATTERN.to_string()]);
        assert_eq!(email.entity_label(), Some("email"));
        assert_eq!(email.result_limit(), ResultLimit::Single);

        let skills = default_field_spec(FieldType::Skills);
        assert_eq!(skills.entity_label(), Some("skill"));
        assert_eq!(skills.result_limit(), ResultLimit::Unlimited);
    }

    #[test]
    fn test_unsupported_pairs_are_rejected() {
        let factory = lexicon_factory();
        for field in [FieldType::Name, FieldType::Skills] {
            let err = factory.build(field, StrategyType::Pattern).err().unwrap();
            assert_eq!(err.kind(), "configuration");
            assert!(err.to_string().contains("not supported"));
        }
    }

    #[test]
    fn test_every_supported_pair_builds() {
        let factory = lexicon_factory();
        for field in FieldType::ALL {
            for strategy in supported_strategies(field) {
                let extractor = factory.build(field, *strategy).unwrap();
                assert_eq!(extractor.field_type(), field);
                assert_eq!(extractor.name(), format!("{field}/{strategy}"));
            }
        }
    }

    #[test]
    fn test_generative_without_api_key_fails_to_build() {
        let factory = StrategyFactory::default();
        let err = factory
            .build(FieldType::Skills, StrategyType::Generative)
            .err()
            .unwrap();
        assert_eq!(err.kind(), "configuration");
    }

    #[test]
    fn test_missing_lexicon_file_fails_to_build() {
        let factory = StrategyFactory::new(
            RecognizerSource::Lexicon {
                skills_path: Some(PathBuf::from("/definitely/not/here.txt")),
            },
            GeneratorSource::default(),
        );
        let err = factory.build(FieldType::Skills, StrategyType::Entity).err().unwrap();
        assert_eq!(err.kind(), "configuration");
    }

    #[test]
    fn test_invalid_remote_endpoint_fails_to_build() {
        let factory = StrategyFactory::new(
            RecognizerSource::remote("not-a-url"),
            GeneratorSource::default(),
        );
        assert!(factory.build(FieldType::Name, StrategyType::Entity).is_err());
    }

    #[tokio::test]
    async fn test_custom_lexicon_file_is_used() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# custom lexicon\nCobol\n\nFortran").unwrap();

        let factory = StrategyFactory::new(
            RecognizerSource::Lexicon {
                skills_path: Some(file.path().to_path_buf()),
            },
            GeneratorSource::default(),
        );
        let extractor = factory.build(FieldType::Skills, StrategyType::Entity).unwrap();
        let value = extractor
            .extract("Skills: Fortran, Cobol and Rust")
            .await
            .unwrap();
        assert_eq!(value.into_multiple(), vec!["Fortran", "Cobol"]);
    }

    #[tokio::test]
    async fn test_built_email_pattern_extractor_finds_address() {
        let extractor = lexicon_factory()
            .build(FieldType::Email, StrategyType::Pattern)
            .unwrap();
        let value = extractor
            .extract("Jane Doe\nContact: jane.doe@example.com")
            .await
            .unwrap();
        assert_eq!(value.into_single().as_deref(), Some("jane.doe@example.com"));
    }
}
