use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};

use crate::extraction::{
    ExtractionConfig, FieldType, GeneratorSource, RecognizerSource, StrategyFactory,
    StrategyType,
};
use crate::ner_client::{DEFAULT_MODEL, DEFAULT_THRESHOLD};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Application configuration loaded from environment variables.
/// Only malformed values are fatal; everything has a default.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: Option<String>,
    pub anthropic_base_url: Option<String>,
    pub ner_endpoint: Option<String>,
    pub ner_model: String,
    pub ner_threshold: f32,
    pub skills_lexicon_path: Option<PathBuf>,
    pub extraction: ExtractionConfig,
    pub port: u16,
    pub max_upload_bytes: usize,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup; `from_env` passes the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let optional = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let mut extraction = ExtractionConfig::default();
        for (key, field) in [
            ("NAME_STRATEGIES", FieldType::Name),
            ("EMAIL_STRATEGIES", FieldType::Email),
            ("SKILLS_STRATEGIES", FieldType::Skills),
        ] {
            if let Some(value) = optional(key) {
                let strategies = parse_strategy_list(&value)
                    .with_context(|| format!("{key} must be a comma-separated list of strategies"))?;
                extraction = extraction.with_override(field, strategies);
            }
        }

        Ok(Config {
            anthropic_api_key: optional("ANTHROPIC_API_KEY"),
            anthropic_base_url: optional("ANTHROPIC_BASE_URL"),
            ner_endpoint: optional("NER_ENDPOINT"),
            ner_model: optional("NER_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            ner_threshold: parse_or(optional("NER_THRESHOLD"), DEFAULT_THRESHOLD)
                .context("NER_THRESHOLD must be a number")?,
            skills_lexicon_path: optional("SKILLS_LEXICON_PATH").map(PathBuf::from),
            extraction,
            port: parse_or(optional("PORT"), DEFAULT_PORT)
                .context("PORT must be a valid port number")?,
            max_upload_bytes: parse_or(optional("MAX_UPLOAD_BYTES"), DEFAULT_MAX_UPLOAD_BYTES)
                .context("MAX_UPLOAD_BYTES must be a byte count")?,
            rust_log: optional("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Collaborator wiring implied by this configuration.
    pub fn strategy_factory(&self) -> StrategyFactory {
        let recognizer = match &self.ner_endpoint {
            Some(endpoint) => RecognizerSource::Remote {
                endpoint: endpoint.clone(),
                model: self.ner_model.clone(),
                threshold: self.ner_threshold,
            },
            None => RecognizerSource::Lexicon {
                skills_path: self.skills_lexicon_path.clone(),
            },
        };
        let generator = GeneratorSource::Anthropic {
            api_key: self.anthropic_api_key.clone(),
            base_url: self.anthropic_base_url.clone(),
        };
        StrategyFactory::new(recognizer, generator)
    }
}

fn parse_or<T>(value: Option<String>, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match value {
        Some(raw) => Ok(raw.parse::<T>()?),
        None => Ok(default),
    }
}

fn parse_strategy_list(value: &str) -> Result<Vec<StrategyType>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| StrategyType::from_str(s).map_err(anyhow::Error::new))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.max_upload_bytes, 10 * 1024 * 1024);
        assert_eq!(config.ner_model, DEFAULT_MODEL);
        assert_eq!(config.ner_threshold, DEFAULT_THRESHOLD);
        assert_eq!(config.rust_log, "info");
        assert!(config.anthropic_api_key.is_none());
        assert!(config.ner_endpoint.is_none());
        assert_eq!(config.extraction, ExtractionConfig::default());
    }

    #[test]
    fn test_blank_values_count_as_unset() {
        let config = config(&[("ANTHROPIC_API_KEY", "  "), ("PORT", "")]).unwrap();
        assert!(config.anthropic_api_key.is_none());
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn test_strategy_overrides() {
        let config = config(&[("SKILLS_STRATEGIES", "ner, llm"), ("EMAIL_STRATEGIES", "regex")]).unwrap();
        assert_eq!(
            config.extraction.strategies_for(FieldType::Skills),
            &[StrategyType::Entity, StrategyType::Generative]
        );
        assert_eq!(
            config.extraction.strategies_for(FieldType::Email),
            &[StrategyType::Pattern]
        );
        assert_eq!(config.extraction.strategies_for(FieldType::Name).len(), 2);
    }

    #[test]
    fn test_malformed_values_are_rejected() {
        assert!(config(&[("PORT", "eighty")]).is_err());
        assert!(config(&[("NER_THRESHOLD", "high")]).is_err());
        assert!(config(&[("MAX_UPLOAD_BYTES", "-1")]).is_err());

        let err = config(&[("NAME_STRATEGIES", "entity,telepathy")]).unwrap_err();
        assert!(err.to_string().contains("NAME_STRATEGIES"));
    }

    #[test]
    fn test_factory_selects_remote_recognizer_when_endpoint_set() {
        let config = config(&[("NER_ENDPOINT", "not-a-url")]).unwrap();
        // The endpoint is only validated when the recognizer is first built.
        let factory = config.strategy_factory();
        assert!(factory.build(FieldType::Skills, StrategyType::Entity).is_err());
    }
}
