// Interview video recordings, streamed from the browser into blob storage.

pub mod handlers;

use chrono::{DateTime, SecondsFormat, Utc};

pub const DEFAULT_CANDIDATE_ID: &str = "anon";
pub const DEFAULT_INTERVIEW_ID: &str = "na";
pub const DEFAULT_CONTENT_TYPE: &str = "video/webm";

/// RFC 3339 UTC with milliseconds, `:` and `.` replaced so it is key-safe.
pub fn blob_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-")
}

/// `<uid>/candidate-<candidateId>-interview-<interviewId>-<ts>.webm`
pub fn recording_blob_name(
    uid: &str,
    candidate_id: Option<&str>,
    interview_id: Option<&str>,
    at: DateTime<Utc>,
) -> String {
    format!(
        "{uid}/candidate-{}-interview-{}-{}.webm",
        candidate_id.unwrap_or(DEFAULT_CANDIDATE_ID),
        interview_id.unwrap_or(DEFAULT_INTERVIEW_ID),
        blob_timestamp(at)
    )
}
