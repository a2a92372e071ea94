//! Axum route handlers for the interview chat API.

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::extract::{require_field, Validate, ValidatedJson};
use crate::interview::archive::{archive_interview, SCORECARD_FILE};
use crate::interview::controller::TurnRequest;
use crate::models::transcript::{Message, Transcript};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub cv: Option<String>,
    pub jd: Option<String>,
    pub messages: Vec<Message>,
    pub user_text: Option<String>,
    pub session_id: Option<String>,
}

impl Validate for ChatRequest {}

#[derive(Debug, Deserialize)]
pub struct ScorecardRequest {
    pub conversation: Vec<Message>,
}

impl Validate for ScorecardRequest {}

#[derive(Debug, Deserialize)]
pub struct SaveRequest {
    pub name: Option<String>,
    pub conversation: Vec<Message>,
}

impl Validate for SaveRequest {
    fn validate(&self) -> Result<(), AppError> {
        let name = require_field("name", self.name.as_deref())?;
        // The name becomes a blob path prefix.
        if name.contains('/') || name.contains('\\') || name == "." || name == ".." {
            return Err(AppError::Validation(
                "name must not contain path separators".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct SaveResponse {
    pub success: bool,
    pub container: String,
    pub path: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/chat
///
/// Advances the interview by one turn. An empty `messages` array starts a new
/// interview; otherwise the history is continued as sent.
pub async fn handle_chat(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<ChatRequest>,
) -> Result<Json<Transcript>, AppError> {
    let updated = state
        .controller
        .advance_conversation(TurnRequest {
            transcript: request.messages,
            user_text: request.user_text,
            session_id: request.session_id.filter(|id| !id.trim().is_empty()),
            raw_cv: request.cv,
            raw_jd: request.jd,
        })
        .await?;
    Ok(Json(updated))
}

/// POST /api/chat/scorecard
///
/// Renders the conversation into a scorecard PDF.
pub async fn handle_scorecard(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<ScorecardRequest>,
) -> Result<Response, AppError> {
    let pdf = state
        .scorecard
        .render(&request.conversation)
        .await
        .map_err(|e| AppError::Upstream(format!("Scoring service failed: {e}")))?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{SCORECARD_FILE}\""),
            ),
        ],
        pdf,
    )
        .into_response())
}

/// POST /api/chat/save
///
/// Archives the transcript text and scorecard PDF under `<name>/`.
pub async fn handle_save(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<SaveRequest>,
) -> Result<Json<SaveResponse>, AppError> {
    let name = require_field("name", request.name.as_deref())?;
    let receipt = archive_interview(
        state.blobs.as_ref(),
        state.scorecard.as_ref(),
        &state.config.blob.transcripts_container,
        name,
        &request.conversation,
    )
    .await?;

    Ok(Json(SaveResponse {
        success: true,
        container: receipt.container,
        path: receipt.path,
    }))
}
