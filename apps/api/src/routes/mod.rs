pub mod health;
pub mod resumes;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/resumes/formats", get(resumes::handle_formats))
        .route("/api/v1/resumes/parse", post(resumes::handle_parse))
        .route("/api/v1/resumes/extract", post(resumes::handle_extract))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::config::Config;
    use crate::extraction::{ExtractionConfig, GeneratorSource, RecognizerSource, StrategyFactory};
    use crate::llm_client::{LlmError, TextGenerator};
    use crate::parser::ResumeParser;

    const BOUNDARY: &str = "resume-parser-test-boundary";
    const RESUME: &str = "Jane Doe\nEmail: jane.doe@example.com\nSkills: Rust, Kubernetes\n";

    struct OfflineGenerator;

    #[async_trait]
    impl TextGenerator for OfflineGenerator {
        async fn generate(&self, _prompt: &str) -> Result<String, LlmError> {
            Err(LlmError::Client("offline".to_string()))
        }
    }

    fn app_with_limit(max_upload_bytes: usize) -> Router {
        let mut config = Config::from_lookup(|_| None).unwrap();
        config.max_upload_bytes = max_upload_bytes;
        let factory = StrategyFactory::new(
            RecognizerSource::default(),
            GeneratorSource::Provided(Arc::new(OfflineGenerator)),
        );
        let parser = ResumeParser::new(&ExtractionConfig::default(), &factory).unwrap();
        build_router(AppState::new(parser, config))
    }

    fn app() -> Router {
        app_with_limit(1024 * 1024)
    }

    fn multipart(field: &str, file_name: &str, content: &[u8]) -> Request<Body> {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri("/api/v1/resumes/parse")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    #[tokio::test]
    async fn test_health() {
        let request = Request::get("/health").body(Body::empty()).unwrap();
        let (status, body) = send(app(), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "resume-parser");
    }

    #[tokio::test]
    async fn test_formats() {
        let request = Request::get("/api/v1/resumes/formats")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(app(), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["extensions"],
            serde_json::json!([".doc", ".docx", ".pdf", ".txt"])
        );
    }

    #[tokio::test]
    async fn test_parse_upload() {
        let (status, body) = send(app(), multipart("file", "jane.txt", RESUME.as_bytes())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["file_name"], "jane.txt");
        assert_eq!(body["resume"]["name"], "Jane Doe");
        assert_eq!(body["resume"]["email"], "jane.doe@example.com");
        assert_eq!(body["resume"]["skills"], serde_json::json!(["Rust", "Kubernetes"]));
        assert!(body["request_id"].as_str().is_some());
        assert!(body["parsed_at"].as_str().is_some());
    }

    #[tokio::test]
    async fn test_parse_without_file_field() {
        let (status, body) = send(app(), multipart("attachment", "jane.txt", RESUME.as_bytes())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_parse_empty_upload() {
        let (status, body) = send(app(), multipart("file", "jane.txt", b"")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_parse_unsupported_format() {
        let (status, body) = send(app(), multipart("file", "jane.rtf", b"{\\rtf1 Jane}")).await;
        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(body["error"]["code"], "UNSUPPORTED_FORMAT");
    }

    #[tokio::test]
    async fn test_parse_undecodable_file() {
        let (status, body) = send(app(), multipart("file", "jane.docx", b"not a zip archive")).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], "DECODE_ERROR");
    }

    #[tokio::test]
    async fn test_parse_upload_over_limit() {
        let big = vec![b'a'; 4096];
        let (status, _) = send(app_with_limit(1024), multipart("file", "big.txt", &big)).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_extract_text() {
        let request = Request::post("/api/v1/resumes/extract")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::json!({ "text": RESUME }).to_string()))
            .unwrap();
        let (status, body) = send(app(), request).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.get("file_name").is_none());
        assert_eq!(body["resume"]["email"], "jane.doe@example.com");
    }

    #[tokio::test]
    async fn test_extract_blank_text() {
        let request = Request::post("/api/v1/resumes/extract")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"text": "   "}"#))
            .unwrap();
        let (status, body) = send(app(), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }
}
