//! Interview session controller: the conversation state machine.
//!
//! The caller owns the transcript and round-trips it on every request. The only
//! state held here is the summary store, keyed by session id.
//!
//! State is the transcript length:
//! - Fresh (empty): derive or reuse the CV/JD summary, inject one system message.
//! - Continuing (non-empty): use the caller's transcript untouched.
//!
//! Both then ask the completion provider for one assistant reply and append it.

use std::sync::Arc;

use tracing::info;

use crate::errors::AppError;
use crate::interview::prompts::PromptTemplate;
use crate::interview::summary::{
    get_or_compute, SessionSummary, SummaryStore, Summarizer, MISSING_INPUT,
};
use crate::llm_client::{CompletionProvider, LlmError};
use crate::models::transcript::{Message, Transcript};

/// Inputs for one conversation turn.
#[derive(Debug, Default)]
pub struct TurnRequest {
    pub transcript: Transcript,
    pub user_text: Option<String>,
    pub session_id: Option<String>,
    pub raw_cv: Option<String>,
    pub raw_jd: Option<String>,
}

pub struct SessionController {
    provider: Arc<dyn CompletionProvider>,
    summarizer: Arc<dyn Summarizer>,
    summaries: Arc<dyn SummaryStore>,
    template: PromptTemplate,
}

impl SessionController {
    pub fn new(
        provider: Arc<dyn CompletionProvider>,
        summarizer: Arc<dyn Summarizer>,
        summaries: Arc<dyn SummaryStore>,
        template: PromptTemplate,
    ) -> Self {
        Self {
            provider,
            summarizer,
            summaries,
            template,
        }
    }

    /// Advances the interview by one turn and returns the updated transcript:
    /// the working transcript plus exactly one assistant message.
    pub async fn advance_conversation(&self, request: TurnRequest) -> Result<Transcript, AppError> {
        let TurnRequest {
            transcript,
            user_text,
            session_id,
            raw_cv,
            raw_jd,
        } = request;

        let mut working = if transcript.is_empty() {
            let summary = self
                .session_summary(session_id.as_deref(), raw_cv.as_deref(), raw_jd.as_deref())
                .await?;
            vec![Message::system(self.template.build_system_prompt(&summary))]
        } else {
            transcript
        };

        let reply = self
            .provider
            .complete(&working, user_text.as_deref())
            .await
            .map_err(|e| AppError::Upstream(format!("Completion provider failed: {e}")))?;
        info!("✔ LLM replied (turn {})", working.len());

        working.push(Message::assistant(reply));
        Ok(working)
    }

    async fn session_summary(
        &self,
        session_id: Option<&str>,
        raw_cv: Option<&str>,
        raw_jd: Option<&str>,
    ) -> Result<SessionSummary, AppError> {
        let cv = or_missing(raw_cv);
        let jd = or_missing(raw_jd);
        let compute = || async { self.summarizer.summarize(cv, jd).await };

        let summary = match session_id {
            Some(id) => get_or_compute::<_, _, LlmError>(self.summaries.as_ref(), id, compute).await,
            None => compute().await,
        };
        summary.map_err(|e| AppError::Upstream(format!("Summarizer failed: {e}")))
    }
}

fn or_missing(input: Option<&str>) -> &str {
    input
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(MISSING_INPUT)
}
