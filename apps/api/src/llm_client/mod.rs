//! LLM client: the single point of entry for all completion-provider calls.
//!
//! ARCHITECTURAL RULE: No other module may call a model backend directly.
//! Conversation turns and summaries go through a `CompletionProvider`.
//!
//! Two backends:
//! - `LlmClient`: Azure OpenAI chat completions (deployment-addressed).
//! - `InterviewServiceClient`: the interview scoring service, tuple wire format.
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::AzureOpenAiConfig;
use crate::models::transcript::Message;

pub mod interview_service;
pub mod prompts;

pub use interview_service::InterviewServiceClient;

const TEMPERATURE: f32 = 0.7;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("LLM returned empty content")]
    EmptyContent,
}

impl LlmError {
    /// Transport failures, timeouts, 429 and 5xx may succeed on another attempt.
    fn is_retryable(&self) -> bool {
        match self {
            LlmError::Http(_) => true,
            LlmError::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// Anything that, given a transcript and the latest user utterance, returns the
/// next assistant reply.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(
        &self,
        transcript: &[Message],
        user_text: Option<&str>,
    ) -> Result<String, LlmError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Retry policy
// ────────────────────────────────────────────────────────────────────────────

/// Attempts per outbound call. The default is a single attempt; raising
/// `max_attempts` enables exponential backoff starting at `base_delay`.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    /// Delay before `attempt` (0-based). 1s, 2s, 4s, ... with the default base.
    pub fn delay_before(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        self.base_delay * (1u32 << (attempt - 1).min(16))
    }

    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> Result<T, LlmError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, LlmError>>,
    {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            let delay = self.delay_before(attempt);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt + 1 < attempts => {
                    warn!(
                        "{label} attempt {} failed ({e}), retrying after {}ms...",
                        attempt + 1,
                        self.delay_before(attempt + 1).as_millis()
                    );
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Azure OpenAI chat completions
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    pub choices: Vec<Choice>,
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub struct ChoiceMessage {
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl ChatResponse {
    /// Text of the first choice, if it carries any non-blank content.
    pub fn text(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .filter(|t| !t.trim().is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Azure OpenAI chat-completions client.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    url: String,
    api_key: String,
    retry: RetryPolicy,
}

impl LlmClient {
    pub fn new(
        config: &AzureOpenAiConfig,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            url: format!(
                "{}/openai/deployments/{}/chat/completions?api-version={}",
                config.endpoint, config.deployment, config.api_version
            ),
            api_key: config.api_key.clone(),
            retry,
        })
    }

    /// Makes a raw call to the deployment, returning the full response object.
    pub async fn call(&self, messages: &[ChatMessageRef<'_>]) -> Result<ChatResponse, LlmError> {
        let request_body = ChatRequest {
            messages: messages
                .iter()
                .map(|m| ChatMessage {
                    role: m.role,
                    content: m.content,
                })
                .collect(),
            temperature: TEMPERATURE,
        };

        let client = &self.client;
        let url = self.url.as_str();
        let api_key = self.api_key.as_str();
        let body = &request_body;

        self.retry
            .run("chat completion", move || async move {
                let response = client
                    .post(url)
                    .header("api-key", api_key)
                    .json(body)
                    .send()
                    .await?;

                let status = response.status();
                if !status.is_success() {
                    let body = response.text().await.unwrap_or_default();
                    let message = serde_json::from_str::<ApiError>(&body)
                        .map(|e| e.error.message)
                        .unwrap_or(body);
                    return Err(LlmError::Api {
                        status: status.as_u16(),
                        message,
                    });
                }

                let chat: ChatResponse = response.json().await?;
                if let Some(usage) = &chat.usage {
                    debug!(
                        "Chat completion succeeded: prompt_tokens={}, completion_tokens={}",
                        usage.prompt_tokens, usage.completion_tokens
                    );
                }
                Ok(chat)
            })
            .await
    }
}

/// Borrowed role/content pair handed to `LlmClient::call`.
#[derive(Debug, Clone, Copy)]
pub struct ChatMessageRef<'a> {
    pub role: &'a str,
    pub content: &'a str,
}

#[async_trait]
impl CompletionProvider for LlmClient {
    async fn complete(
        &self,
        transcript: &[Message],
        user_text: Option<&str>,
    ) -> Result<String, LlmError> {
        let mut messages: Vec<ChatMessageRef<'_>> = transcript
            .iter()
            .map(|m| ChatMessageRef {
                role: m.role.as_str(),
                content: &m.content,
            })
            .collect();
        if let Some(text) = user_text.filter(|t| !t.trim().is_empty()) {
            messages.push(ChatMessageRef {
                role: "user",
                content: text,
            });
        }

        let response = self.call(&messages).await?;
        response
            .text()
            .map(str::to_string)
            .ok_or(LlmError::EmptyContent)
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}
