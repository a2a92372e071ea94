//! Session summaries: the condensed CV/JD pair that seeds a fresh interview,
//! the store that caches them per session id, and the summarizer that derives them.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::interview::prompts::{summary_system_prompt, summary_user_prompt};
use crate::llm_client::{strip_json_fences, CompletionProvider, LlmError};
use crate::models::transcript::Message;

/// Placeholder for a CV or JD the caller did not supply.
pub const MISSING_INPUT: &str = "N/A";

const REDIS_KEY_PREFIX: &str = "interview:summary:";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub cv_summary: String,
    pub jd_summary: String,
}

impl SessionSummary {
    /// Parses summarizer output. Anything that is not the expected JSON object
    /// becomes both summaries verbatim.
    pub fn from_summarizer_output(raw: &str) -> Self {
        match serde_json::from_str::<SessionSummary>(strip_json_fences(raw)) {
            Ok(summary) => summary,
            Err(e) => {
                warn!("Summarizer output is not the expected JSON ({e}); using raw text");
                SessionSummary {
                    cv_summary: raw.to_string(),
                    jd_summary: raw.to_string(),
                }
            }
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Store
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum SummaryStoreError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// Session id → summary. Entries are written once per session and never
/// mutated; concurrent writers for the same id race and the last write wins.
#[async_trait]
pub trait SummaryStore: Send + Sync {
    async fn get(&self, session_id: &str) -> Result<Option<SessionSummary>, SummaryStoreError>;
    async fn set(&self, session_id: &str, summary: SessionSummary)
        -> Result<(), SummaryStoreError>;
}

/// Returns the cached summary for `session_id`, or runs `compute` and caches the
/// result. No lock is held across `compute`: two callers may both compute.
///
/// Store failures degrade to recomputation and are logged, never surfaced.
pub async fn get_or_compute<F, Fut, E>(
    store: &dyn SummaryStore,
    session_id: &str,
    compute: F,
) -> Result<SessionSummary, E>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<SessionSummary, E>>,
{
    match store.get(session_id).await {
        Ok(Some(summary)) => {
            debug!("Reusing cached summary for session {session_id}");
            return Ok(summary);
        }
        Ok(None) => {}
        Err(e) => warn!("Summary lookup failed for session {session_id}: {e}"),
    }

    let summary = compute().await?;
    if let Err(e) = store.set(session_id, summary.clone()).await {
        warn!("Failed to cache summary for session {session_id}: {e}");
    }
    Ok(summary)
}

/// Process-lifetime map. Unbounded; entries are lost on restart.
#[derive(Default)]
pub struct InMemorySummaryStore {
    entries: RwLock<HashMap<String, SessionSummary>>,
}

impl InMemorySummaryStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[async_trait]
impl SummaryStore for InMemorySummaryStore {
    async fn get(&self, session_id: &str) -> Result<Option<SessionSummary>, SummaryStoreError> {
        Ok(self.entries.read().await.get(session_id).cloned())
    }

    async fn set(
        &self,
        session_id: &str,
        summary: SessionSummary,
    ) -> Result<(), SummaryStoreError> {
        self.entries
            .write()
            .await
            .insert(session_id.to_string(), summary);
        Ok(())
    }
}

/// Redis-backed store, shared across gateway instances. JSON values, no TTL.
#[derive(Clone)]
pub struct RedisSummaryStore {
    connection: MultiplexedConnection,
}

impl RedisSummaryStore {
    pub async fn connect(redis_url: &str) -> Result<Self, SummaryStoreError> {
        let client = redis::Client::open(redis_url)?;
        let mut connection = client.get_multiplexed_async_connection().await?;
        redis::cmd("PING")
            .query_async::<_, String>(&mut connection)
            .await?;
        Ok(Self { connection })
    }

    fn key(session_id: &str) -> String {
        format!("{REDIS_KEY_PREFIX}{session_id}")
    }
}

#[async_trait]
impl SummaryStore for RedisSummaryStore {
    async fn get(&self, session_id: &str) -> Result<Option<SessionSummary>, SummaryStoreError> {
        let mut connection = self.connection.clone();
        let raw: Option<String> = connection.get(Self::key(session_id)).await?;
        Ok(raw.map(|raw| serde_json::from_str(&raw)).transpose()?)
    }

    async fn set(
        &self,
        session_id: &str,
        summary: SessionSummary,
    ) -> Result<(), SummaryStoreError> {
        let mut connection = self.connection.clone();
        let raw = serde_json::to_string(&summary)?;
        connection
            .set::<_, _, ()>(Self::key(session_id), raw)
            .await?;
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Summarizer
// ────────────────────────────────────────────────────────────────────────────

/// Condenses raw CV/JD text into a `SessionSummary`.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, cv_text: &str, jd_text: &str) -> Result<SessionSummary, LlmError>;
}

/// Summarizer running over the active completion provider.
pub struct LlmSummarizer {
    provider: Arc<dyn CompletionProvider>,
}

impl LlmSummarizer {
    pub fn new(provider: Arc<dyn CompletionProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl Summarizer for LlmSummarizer {
    async fn summarize(&self, cv_text: &str, jd_text: &str) -> Result<SessionSummary, LlmError> {
        let transcript = [Message::system(summary_system_prompt())];
        let prompt = summary_user_prompt(cv_text, jd_text);
        let raw = self.provider.complete(&transcript, Some(&prompt)).await?;
        Ok(SessionSummary::from_summarizer_output(&raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedProvider(String);

    #[async_trait]
    impl CompletionProvider for FixedProvider {
        async fn complete(
            &self,
            _transcript: &[Message],
            _user_text: Option<&str>,
        ) -> Result<String, LlmError> {
            Ok(self.0.clone())
        }
    }

    fn summary(cv: &str) -> SessionSummary {
        SessionSummary {
            cv_summary: cv.to_string(),
            jd_summary: "jd".to_string(),
        }
    }

    #[test]
    fn test_parses_camel_case_json() {
        let raw = r#"{"cvSummary": "Engineer", "jdSummary": "Senior role"}"#;
        let s = SessionSummary::from_summarizer_output(raw);
        assert_eq!(s.cv_summary, "Engineer");
        assert_eq!(s.jd_summary, "Senior role");
    }

    #[test]
    fn test_parses_fenced_json() {
        let raw = "```json\n{\"cvSummary\": \"A\", \"jdSummary\": \"B\"}\n```";
        let s = SessionSummary::from_summarizer_output(raw);
        assert_eq!(s.cv_summary, "A");
        assert_eq!(s.jd_summary, "B");
    }

    #[test]
    fn test_unparseable_output_falls_back_to_raw_text() {
        let raw = "The candidate is a strong engineer.";
        let s = SessionSummary::from_summarizer_output(raw);
        assert_eq!(s.cv_summary, raw);
        assert_eq!(s.jd_summary, raw);
    }

    #[test]
    fn test_json_missing_a_field_falls_back() {
        let raw = r#"{"cvSummary": "only one"}"#;
        let s = SessionSummary::from_summarizer_output(raw);
        assert_eq!(s.cv_summary, raw);
        assert_eq!(s.jd_summary, raw);
    }

    #[tokio::test]
    async fn test_in_memory_store_roundtrip() {
        let store = InMemorySummaryStore::new();
        assert!(store.get("s-1").await.unwrap().is_none());
        store.set("s-1", summary("cv")).await.unwrap();
        assert_eq!(store.get("s-1").await.unwrap(), Some(summary("cv")));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_get_or_compute_reuses_cached_value() {
        let store = InMemorySummaryStore::new();
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let s = get_or_compute::<_, _, LlmError>(&store, "s-1", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(summary("computed"))
            })
            .await
            .unwrap();
            assert_eq!(s.cv_summary, "computed");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_get_or_compute_does_not_cache_errors() {
        let store = InMemorySummaryStore::new();
        let result = get_or_compute(&store, "s-1", || async { Err(LlmError::EmptyContent) }).await;
        assert!(result.is_err());
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn test_llm_summarizer_falls_back_on_plain_text() {
        let summarizer = LlmSummarizer::new(Arc::new(FixedProvider("plain words".to_string())));
        let s = summarizer.summarize("cv", "jd").await.unwrap();
        assert_eq!(s.cv_summary, "plain words");
        assert_eq!(s.jd_summary, "plain words");
    }
}
