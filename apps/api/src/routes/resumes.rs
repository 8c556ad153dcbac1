//! Axum route handlers for the Resume API.

use axum::{
    extract::{Multipart, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::ResumeData;
use crate::state::AppState;

const FILE_FIELD: &str = "file";

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ExtractRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct ParseResponse {
    pub request_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    pub parsed_at: DateTime<Utc>,
    pub resume: ResumeData,
}

#[derive(Debug, Serialize)]
pub struct FormatsResponse {
    pub extensions: Vec<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/resumes/formats
pub async fn handle_formats(State(state): State<AppState>) -> Json<FormatsResponse> {
    Json(FormatsResponse {
        extensions: state.parser.supported_extensions(),
    })
}

/// POST /api/v1/resumes/parse
///
/// Multipart upload with the resume under the `file` field.
pub async fn handle_parse(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ParseResponse>, AppError> {
    let request_id = Uuid::new_v4();
    parse_upload(state, multipart, request_id)
        .instrument(info_span!("parse_resume", %request_id))
        .await
        .map(Json)
}

/// POST /api/v1/resumes/extract
///
/// Runs extraction over text the caller already decoded.
pub async fn handle_extract(
    State(state): State<AppState>,
    Json(request): Json<ExtractRequest>,
) -> Result<Json<ParseResponse>, AppError> {
    let request_id = Uuid::new_v4();
    let span = info_span!("extract_text", %request_id);

    let resume = async {
        info!("Extracting from {} characters of text", request.text.len());
        state.parser.extract_text(&request.text).await
    }
    .instrument(span)
    .await?;

    Ok(Json(ParseResponse {
        request_id,
        file_name: None,
        parsed_at: Utc::now(),
        resume,
    }))
}

async fn parse_upload(
    state: AppState,
    mut multipart: Multipart,
    request_id: Uuid,
) -> Result<ParseResponse, AppError> {
    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let file_name = field
            .file_name()
            .map(str::to_string)
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| AppError::Validation("uploaded file has no file name".to_string()))?;
        let bytes = field.bytes().await?;
        upload = Some((file_name, bytes));
        break;
    }

    let (file_name, bytes) = upload
        .ok_or_else(|| AppError::Validation(format!("missing multipart field '{FILE_FIELD}'")))?;
    if bytes.is_empty() {
        return Err(AppError::Validation("uploaded file is empty".to_string()));
    }

    info!("Received {} ({} bytes)", file_name, bytes.len());
    let resume = state.parser.parse_bytes(&file_name, &bytes).await?;

    Ok(ParseResponse {
        request_id,
        file_name: Some(file_name),
        parsed_at: Utc::now(),
        resume,
    })
}
