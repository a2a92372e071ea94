//! Scorecard rendering and transcript archival.
//!
//! Archival writes `<name>/transcript.txt` and then `<name>/Scorecard.pdf`.
//! The two writes are independent: a failed PDF leaves the transcript behind.

use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;
use tracing::info;

use crate::errors::AppError;
use crate::llm_client::LlmError;
use crate::models::transcript::{Message, Role};
use crate::storage::{BlobStore, PutObject};

pub const TRANSCRIPT_FILE: &str = "transcript.txt";
pub const SCORECARD_FILE: &str = "Scorecard.pdf";
const BOT_SPEAKER: &str = "HR Bot";
const SYSTEM_SPEAKER: &str = "System";

/// Renders a finished interview into a scorecard PDF.
#[async_trait]
pub trait ScorecardRenderer: Send + Sync {
    async fn render(&self, conversation: &[Message]) -> Result<Bytes, LlmError>;
}

#[derive(Debug, Serialize)]
pub struct ArchiveReceipt {
    pub container: String,
    pub path: String,
}

/// One `"<speaker>: <content>"` line per message.
pub fn render_transcript_text(candidate_name: &str, conversation: &[Message]) -> String {
    conversation
        .iter()
        .map(|msg| {
            let who = match msg.role {
                Role::Assistant => BOT_SPEAKER,
                Role::User => candidate_name,
                Role::System => SYSTEM_SPEAKER,
            };
            format!("{who}: {}", msg.content)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub async fn archive_interview(
    blobs: &dyn BlobStore,
    renderer: &dyn ScorecardRenderer,
    container: &str,
    name: &str,
    conversation: &[Message],
) -> Result<ArchiveReceipt, AppError> {
    let transcript_key = format!("{name}/{TRANSCRIPT_FILE}");
    let transcript = render_transcript_text(name, conversation);
    blobs
        .put(PutObject::new(
            container,
            &transcript_key,
            Bytes::from(transcript),
            "text/plain; charset=utf-8",
        ))
        .await?;

    let pdf = renderer
        .render(conversation)
        .await
        .map_err(|e| AppError::Upstream(format!("Scoring service failed: {e}")))?;

    let scorecard_key = format!("{name}/{SCORECARD_FILE}");
    blobs
        .put(PutObject::new(
            container,
            &scorecard_key,
            pdf,
            "application/pdf",
        ))
        .await?;

    info!("✔ Saved transcript & scorecard for {name}");
    Ok(ArchiveReceipt {
        container: container.to_string(),
        path: format!("{name}/"),
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::storage::memory::MemoryBlobStore;

    pub struct StubRenderer {
        pub pdf: Option<&'static [u8]>,
    }

    #[async_trait]
    impl ScorecardRenderer for StubRenderer {
        async fn render(&self, _conversation: &[Message]) -> Result<Bytes, LlmError> {
            self.pdf
                .map(Bytes::from_static)
                .ok_or(LlmError::EmptyContent)
        }
    }

    fn conversation() -> Vec<Message> {
        vec![
            Message::system("prompt"),
            Message::assistant("Tell me about yourself."),
            Message::user("I build compilers."),
        ]
    }

    #[test]
    fn test_transcript_lines_use_speaker_labels() {
        let text = render_transcript_text("Asha", &conversation());
        assert_eq!(
            text,
            "System: prompt\nHR Bot: Tell me about yourself.\nAsha: I build compilers."
        );
    }

    #[test]
    fn test_empty_conversation_renders_empty_text() {
        assert_eq!(render_transcript_text("Asha", &[]), "");
    }

    #[tokio::test]
    async fn test_archive_writes_both_objects() {
        let blobs = MemoryBlobStore::default();
        let renderer = StubRenderer {
            pdf: Some(b"%PDF-1.4"),
        };

        let receipt = archive_interview(&blobs, &renderer, "transcripts", "asha", &conversation())
            .await
            .unwrap();
        assert_eq!(receipt.container, "transcripts");
        assert_eq!(receipt.path, "asha/");

        let transcript = blobs.get("transcripts", "asha/transcript.txt").await.unwrap();
        assert!(transcript.body.starts_with(b"System: prompt"));
        let pdf = blobs.get("transcripts", "asha/Scorecard.pdf").await.unwrap();
        assert_eq!(pdf.content_type, "application/pdf");
    }

    #[tokio::test]
    async fn test_failed_scorecard_keeps_transcript() {
        let blobs = MemoryBlobStore::default();
        let renderer = StubRenderer { pdf: None };

        let err = archive_interview(&blobs, &renderer, "transcripts", "asha", &conversation())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Upstream(_)));
        assert!(blobs.get("transcripts", "asha/transcript.txt").await.is_some());
        assert!(blobs.get("transcripts", "asha/Scorecard.pdf").await.is_none());
    }
}
