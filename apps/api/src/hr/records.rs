//! `hr_home` persistence. One statement per call, no transactions.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::info;

use crate::models::interview_record::InterviewRecordRow;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parameters for a new interview record.
pub struct NewRecord<'a> {
    pub uid: &'a str,
    pub email: &'a str,
    pub jd_pdf: &'a [u8],
    pub cv_pdf: &'a [u8],
    pub submitted_at: DateTime<Utc>,
}

/// `YYYY-MM-DD HH:MM:SS`
pub fn format_submitted_at(at: DateTime<Utc>) -> String {
    at.format(TIME_FORMAT).to_string()
}

/// Inserts a record with `status = 0` and `Active = 0`.
pub async fn insert_record(pool: &SqlitePool, record: NewRecord<'_>) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO hr_home (UID, Email, time, JD, CV, status, Active)
        VALUES (?, ?, ?, ?, ?, 0, 0)
        "#,
    )
    .bind(record.uid)
    .bind(record.email)
    .bind(format_submitted_at(record.submitted_at))
    .bind(record.jd_pdf)
    .bind(record.cv_pdf)
    .execute(pool)
    .await?;

    info!("Inserted hr_home row for UID={}", record.uid);
    Ok(())
}

pub async fn find_record(
    pool: &SqlitePool,
    uid: &str,
) -> Result<Option<InterviewRecordRow>, sqlx::Error> {
    sqlx::query_as::<_, InterviewRecordRow>(
        "SELECT UID, Email, CAST(time AS TEXT) AS time, JD, CV, status, Active FROM hr_home WHERE UID = ?",
    )
    .bind(uid)
    .fetch_optional(pool)
    .await
}
