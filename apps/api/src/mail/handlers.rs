use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::AppError;
use crate::extract::{require_field, Validate, ValidatedJson};
use crate::mail::invite::{build_invite, parse_attachments};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteRequest {
    pub to: Option<String>,
    pub candidate_name: Option<String>,
    pub interview_link: Option<String>,
    /// Kept raw; malformed entries are filtered out rather than rejected.
    #[serde(default)]
    pub attachments: Option<Value>,
}

impl Validate for InviteRequest {
    fn validate(&self) -> Result<(), AppError> {
        require_field("to", self.to.as_deref())?;
        require_field("interviewLink", self.interview_link.as_deref())?;
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct InviteResponse {
    pub success: bool,
}

/// POST /api/email/send-interview-invite
pub async fn handle_send_invite(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<InviteRequest>,
) -> Result<Json<InviteResponse>, AppError> {
    let to = require_field("to", request.to.as_deref())?;
    let link = require_field("interviewLink", request.interview_link.as_deref())?;

    let mailer = state
        .mailer
        .as_ref()
        .ok_or_else(|| AppError::Upstream("mail dispatch is not configured".to_string()))?;

    let attachments = parse_attachments(request.attachments.as_ref());
    let mail = build_invite(
        to,
        request.candidate_name.as_deref(),
        link,
        &state.config.mail.organization_name,
        &attachments,
    );
    mailer.send(&mail).await?;

    Ok(Json(InviteResponse { success: true }))
}
