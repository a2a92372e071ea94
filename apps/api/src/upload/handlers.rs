use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::Serialize;
use tracing::info;

use crate::errors::AppError;
use crate::state::AppState;
use crate::upload::form::{spool_to_scratch, MultipartForm};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub cv_text: String,
    pub jd_text: String,
}

/// POST /api/upload
///
/// Multipart `cv` + `jd` PDFs → extracted text. Both files are spooled to the
/// scratch directory and removed once the request finishes, success or not.
pub async fn handle_upload(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let form = MultipartForm::collect(multipart).await?;
    let (Some(cv), Some(jd)) = (form.file("cv"), form.file("jd")) else {
        return Err(AppError::Validation(
            "Both CV and JD are required.".to_string(),
        ));
    };

    let cv_file = spool_to_scratch(&state.config.upload_dir, cv.data.clone()).await?;
    let jd_file = spool_to_scratch(&state.config.upload_dir, jd.data.clone()).await?;

    let (cv_text, jd_text) = tokio::try_join!(
        state.extractor.extract_file(cv_file.path()),
        state.extractor.extract_file(jd_file.path()),
    )?;
    info!(
        "Extracted CV ({}) and JD ({}) text",
        cv.file_name.as_deref().unwrap_or("unnamed"),
        jd.file_name.as_deref().unwrap_or("unnamed")
    );

    Ok(Json(UploadResponse { cv_text, jd_text }))
}
