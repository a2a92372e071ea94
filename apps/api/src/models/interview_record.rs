use sqlx::FromRow;

/// Row of the `hr_home` table: one candidate's uploaded JD/CV pair plus the
/// approval flags maintained by the external HR workflow.
#[derive(Debug, Clone, FromRow)]
pub struct InterviewRecordRow {
    #[sqlx(rename = "UID")]
    pub uid: String,
    #[sqlx(rename = "Email")]
    pub email: String,
    /// `YYYY-MM-DD HH:MM:SS`, UTC.
    pub time: String,
    #[sqlx(rename = "JD")]
    pub jd: Option<Vec<u8>>,
    #[sqlx(rename = "CV")]
    pub cv: Option<Vec<u8>>,
    pub status: i64,
    #[sqlx(rename = "Active")]
    pub active: i64,
}

impl InterviewRecordRow {
    /// JD/CV text is only released while the record is neither processed nor active.
    pub fn is_pending(&self) -> bool {
        self.status == 0 && self.active == 0
    }
}
