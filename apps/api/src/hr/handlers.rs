//! Axum route handlers for the HR intake API.

use axum::{
    extract::{Multipart, State},
    Json,
};
use bytes::Bytes;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::extract::{require_field, Validate, ValidatedJson};
use crate::hr::records::{find_record, insert_record, NewRecord};
use crate::state::AppState;
use crate::upload::form::MultipartForm;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct UploadRecordResponse {
    pub message: String,
    #[serde(rename = "UID")]
    pub uid: String,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    #[serde(rename = "UID")]
    pub uid: Option<String>,
}

impl Validate for StatusRequest {
    fn validate(&self) -> Result<(), AppError> {
        require_field("UID", self.uid.as_deref()).map(|_| ())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub status: i64,
    pub active: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jd_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cv_text: Option<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/hr/upload-jd-cv
///
/// Multipart `UID`, `Email`, `jdPdf`, `cvPdf` → new `hr_home` row, both flags 0.
pub async fn handle_upload_jd_cv(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<UploadRecordResponse>, AppError> {
    let form = MultipartForm::collect(multipart).await?;
    let (Some(uid), Some(email), Some(jd), Some(cv)) = (
        form.text("UID"),
        form.text("Email"),
        form.file("jdPdf"),
        form.file("cvPdf"),
    ) else {
        return Err(AppError::Validation(
            "Missing UID, Email, JD PDF, or CV PDF.".to_string(),
        ));
    };

    insert_record(
        &state.db,
        NewRecord {
            uid,
            email,
            jd_pdf: &jd.data,
            cv_pdf: &cv.data,
            submitted_at: Utc::now(),
        },
    )
    .await?;

    Ok(Json(UploadRecordResponse {
        message: "Upload successful".to_string(),
        uid: uid.to_string(),
    }))
}

/// POST /api/hr/get-status-active
///
/// Returns the approval flags. While both are 0 the stored JD/CV PDFs are
/// parsed and their text included.
pub async fn handle_get_status_active(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<StatusRequest>,
) -> Result<Json<StatusResponse>, AppError> {
    let uid = require_field("UID", request.uid.as_deref())?;
    let record = find_record(&state.db, uid)
        .await?
        .ok_or_else(|| AppError::NotFound("UID not found.".to_string()))?;

    if !record.is_pending() {
        return Ok(Json(StatusResponse {
            status: record.status,
            active: record.active,
            jd_text: None,
            cv_text: None,
        }));
    }

    let jd = Bytes::from(record.jd.unwrap_or_default());
    let cv = Bytes::from(record.cv.unwrap_or_default());
    let (jd_text, cv_text) = tokio::try_join!(
        state.extractor.extract_bytes(jd),
        state.extractor.extract_bytes(cv),
    )?;

    Ok(Json(StatusResponse {
        status: record.status,
        active: record.active,
        jd_text: Some(jd_text),
        cv_text: Some(cv_text),
    }))
}
