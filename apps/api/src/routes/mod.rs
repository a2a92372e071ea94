pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::errors::AppError;
use crate::state::AppState;
use crate::{hr, interview, mail, recordings, upload};

/// Body limit for every route except recording uploads.
pub const BODY_LIMIT: usize = 50 * 1024 * 1024;
pub const RECORDING_BODY_LIMIT: usize = 500 * 1024 * 1024;

async fn not_found() -> AppError {
    AppError::NotFound("Route not found".to_string())
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(health::health_handler))
        // Interview chat
        .route("/api/chat", post(interview::handlers::handle_chat))
        .route(
            "/api/chat/scorecard",
            post(interview::handlers::handle_scorecard),
        )
        .route("/api/chat/save", post(interview::handlers::handle_save))
        // Candidate documents
        .route("/api/upload", post(upload::handlers::handle_upload))
        .route(
            "/api/hr/upload-jd-cv",
            post(hr::handlers::handle_upload_jd_cv),
        )
        .route(
            "/api/hr/get-status-active",
            post(hr::handlers::handle_get_status_active),
        )
        // Recordings
        .route(
            "/api/recordings/upload",
            post(recordings::handlers::handle_recording_upload)
                .layer(DefaultBodyLimit::max(RECORDING_BODY_LIMIT)),
        )
        // Mail
        .route(
            "/api/email/send-interview-invite",
            post(mail::handlers::handle_send_invite),
        )
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .with_state(state)
}
