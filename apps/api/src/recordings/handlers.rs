use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Serialize;
use tracing::info;

use crate::errors::AppError;
use crate::recordings::{
    recording_blob_name, DEFAULT_CANDIDATE_ID, DEFAULT_CONTENT_TYPE, DEFAULT_INTERVIEW_ID,
};
use crate::state::AppState;
use crate::storage::PutObject;
use crate::upload::form::MultipartForm;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingUploadResponse {
    pub message: String,
    pub uid: String,
    pub blob_name: String,
    pub url: String,
}

/// POST /api/recordings/upload
pub async fn handle_recording_upload(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<RecordingUploadResponse>), AppError> {
    let form = MultipartForm::collect(multipart).await?;
    let file = form
        .file("file")
        .ok_or_else(|| AppError::Validation("file is required.".to_string()))?;
    let uid = form
        .text("uid")
        .ok_or_else(|| AppError::Validation("uid is required.".to_string()))?;

    let candidate_id = form.text("candidateId");
    let interview_id = form.text("interviewId");
    let blob_name = recording_blob_name(uid, candidate_id, interview_id, Utc::now());
    let container = state.config.blob.recordings_container.as_str();
    let content_type = file
        .content_type
        .as_deref()
        .unwrap_or(DEFAULT_CONTENT_TYPE);

    let object = PutObject::new(container, &blob_name, file.data.clone(), content_type)
        .with_metadata("uid", uid)
        .with_metadata("candidateId", candidate_id.unwrap_or(DEFAULT_CANDIDATE_ID))
        .with_metadata("interviewId", interview_id.unwrap_or(DEFAULT_INTERVIEW_ID))
        .with_metadata(
            "recordedDuration",
            form.text("recordedDuration").unwrap_or_default(),
        );
    let url = state.blobs.put(object).await?;

    info!(
        "Stored recording {container}/{blob_name} ({} bytes)",
        file.data.len()
    );

    Ok((
        StatusCode::CREATED,
        Json(RecordingUploadResponse {
            message: "Recording uploaded successfully".to_string(),
            uid: uid.to_string(),
            blob_name,
            url,
        }),
    ))
}
