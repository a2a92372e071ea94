//! Client for the interview scoring service.
//!
//! The service speaks a tuple wire format: every message travels as a
//! `[role, content]` pair. It answers chat turns (`/ai_interview/ask_llm`,
//! returning the whole updated conversation) and renders scorecard PDFs
//! (`/ai_interview/generate_scorecard`).

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use serde::Serialize;
use tracing::info;

use super::{CompletionProvider, LlmError, RetryPolicy};
use crate::interview::archive::ScorecardRenderer;
use crate::models::transcript::{Message, Role};

const ASK_PATH: &str = "/ai_interview/ask_llm";
const SCORECARD_PATH: &str = "/ai_interview/generate_scorecard";

type Tuple<'a> = (&'a str, &'a str);

#[derive(Debug, Serialize)]
struct AskRequest<'a> {
    messages: Vec<Tuple<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_text: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct ScorecardRequest<'a> {
    conversation: Vec<Tuple<'a>>,
}

fn to_tuples(messages: &[Message]) -> Vec<Tuple<'_>> {
    messages
        .iter()
        .map(|m| (m.role.as_str(), m.content.as_str()))
        .collect()
}

/// Picks the reply out of the conversation the service sends back: the last
/// `assistant` pair among those appended after the `sent` messages of the
/// request. An echoed history without a new turn yields `None`.
fn new_assistant_reply(conversation: Vec<(String, String)>, sent: usize) -> Option<String> {
    conversation
        .into_iter()
        .skip(sent)
        .rev()
        .find(|(role, _)| Role::parse(role) == Some(Role::Assistant))
        .map(|(_, content)| content)
        .filter(|content| !content.trim().is_empty())
}

#[derive(Clone)]
pub struct InterviewServiceClient {
    client: Client,
    base_url: String,
    retry: RetryPolicy,
}

impl InterviewServiceClient {
    pub fn new(base_url: &str, timeout: Duration, retry: RetryPolicy) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            retry,
        })
    }

    async fn post_json<B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<reqwest::Response, LlmError> {
        let client = &self.client;
        let url = format!("{}{}", self.base_url, path);
        let url = url.as_str();

        self.retry
            .run(path, move || async move {
                let response = client.post(url).json(body).send().await?;
                let status = response.status();
                if !status.is_success() {
                    let message = response.text().await.unwrap_or_default();
                    return Err(LlmError::Api {
                        status: status.as_u16(),
                        message,
                    });
                }
                Ok(response)
            })
            .await
    }
}

#[async_trait]
impl CompletionProvider for InterviewServiceClient {
    async fn complete(
        &self,
        transcript: &[Message],
        user_text: Option<&str>,
    ) -> Result<String, LlmError> {
        let request = AskRequest {
            messages: to_tuples(transcript),
            user_text: user_text.filter(|t| !t.is_empty()),
        };
        info!("→ POST {ASK_PATH} ({} messages)", transcript.len());

        let response = self.post_json(ASK_PATH, &request).await?;
        let conversation: Vec<(String, String)> = response.json().await?;
        new_assistant_reply(conversation, transcript.len()).ok_or(LlmError::EmptyContent)
    }
}

#[async_trait]
impl ScorecardRenderer for InterviewServiceClient {
    async fn render(&self, conversation: &[Message]) -> Result<Bytes, LlmError> {
        let request = ScorecardRequest {
            conversation: to_tuples(conversation),
        };
        info!("→ POST {SCORECARD_PATH} ({} messages)", conversation.len());

        let response = self.post_json(SCORECARD_PATH, &request).await?;
        let pdf = response.bytes().await?;
        if pdf.is_empty() {
            return Err(LlmError::EmptyContent);
        }
        Ok(pdf)
    }
}
