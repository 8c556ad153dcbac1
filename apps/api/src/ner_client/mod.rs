//! Entity-recognition backends behind one trait.
//!
//! `RemoteRecognizer` talks to a GLiNER-compatible inference endpoint.
//! `LexiconRecognizer` runs in-process and needs no model download.
//! The entity strategy only ever sees `Arc<dyn EntityRecognizer>`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub mod lexicon;

pub use lexicon::LexiconRecognizer;

pub const DEFAULT_MODEL: &str = "urchade/gliner_multi_pii-v1";
pub const DEFAULT_THRESHOLD: f32 = 0.5;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum NerError {
    #[error("failed to load recognizer: {0}")]
    Load(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("inference endpoint returned status {status}: {message}")]
    Endpoint { status: u16, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// One entity span found by a recognizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognizedEntity {
    pub text: String,
    pub label: String,
    pub score: f32,
}

/// Zero-shot entity recognition: find spans of `text` matching any of `labels`.
#[async_trait]
pub trait EntityRecognizer: Send + Sync {
    async fn predict_entities(
        &self,
        text: &str,
        labels: &[String],
    ) -> Result<Vec<RecognizedEntity>, NerError>;
}

#[derive(Debug, Serialize)]
struct PredictRequest<'a> {
    model: &'a str,
    text: &'a str,
    labels: &'a [String],
    threshold: f32,
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    entities: Vec<RecognizedEntity>,
}

/// Recognizer backed by an HTTP inference server hosting a GLiNER model.
///
/// Request: `POST {endpoint}` with `{model, text, labels, threshold}`.
/// Response: `{"entities": [{"text", "label", "score"}]}`.
#[derive(Clone)]
pub struct RemoteRecognizer {
    client: Client,
    endpoint: String,
    model: String,
    threshold: f32,
}

impl RemoteRecognizer {
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Result<Self, NerError> {
        let endpoint = endpoint.into();
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(NerError::Load(format!(
                "endpoint '{endpoint}' is not an http(s) URL"
            )));
        }

        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| NerError::Load(e.to_string()))?;

        Ok(Self {
            client,
            endpoint,
            model: model.into(),
            threshold: DEFAULT_THRESHOLD,
        })
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }
}

#[async_trait]
impl EntityRecognizer for RemoteRecognizer {
    async fn predict_entities(
        &self,
        text: &str,
        labels: &[String],
    ) -> Result<Vec<RecognizedEntity>, NerError> {
        let body = PredictRequest {
            model: &self.model,
            text,
            labels,
            threshold: self.threshold,
        };

        let response = self.client.post(&self.endpoint).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(NerError::Endpoint {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: PredictResponse = response.json().await?;
        debug!(
            "NER endpoint returned {} entities for labels {:?}",
            parsed.entities.len(),
            labels
        );
        Ok(parsed.entities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_recognizer_rejects_non_http_endpoint() {
        let err = RemoteRecognizer::new("localhost:9000", DEFAULT_MODEL)
            .err()
            .expect("should fail");
        assert!(matches!(err, NerError::Load(_)));
    }

    #[tokio::test]
    async fn test_remote_recognizer_posts_labels_and_reads_entities() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/predict")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "model": DEFAULT_MODEL,
                "labels": ["person"]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"entities": [{"text": "Jane Doe", "label": "person", "score": 0.93}]}"#)
            .create_async()
            .await;

        let recognizer =
            RemoteRecognizer::new(format!("{}/predict", server.url()), DEFAULT_MODEL).unwrap();
        let entities = recognizer
            .predict_entities("Jane Doe\nEngineer", &["person".to_string()])
            .await
            .unwrap();

        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].text, "Jane Doe");
        assert_eq!(entities[0].label, "person");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_remote_recognizer_surfaces_endpoint_errors() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/predict")
            .with_status(500)
            .with_body("model crashed")
            .create_async()
            .await;

        let recognizer =
            RemoteRecognizer::new(format!("{}/predict", server.url()), DEFAULT_MODEL).unwrap();
        let err = recognizer
            .predict_entities("text", &["skill".to_string()])
            .await
            .unwrap_err();

        assert!(matches!(err, NerError::Endpoint { status: 500, .. }));
    }
}
