//! Outbound mail for interview invitations.
//!
//! Two transports implement [`Mailer`]: an Azure Logic App webhook that
//! forwards a flat JSON payload, and Microsoft Graph `sendMail` authenticated
//! with the client-credentials flow. [`from_config`] picks one; the webhook
//! wins when both are configured.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::MailConfig;

pub mod graph;
pub mod handlers;
pub mod invite;
pub mod logic_app;

pub use graph::GraphMailer;
pub use logic_app::LogicAppMailer;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("mail transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("mail service returned {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("token request failed: {0}")]
    Token(String),
}

/// A file attached to an outgoing message, content already base64 encoded.
#[derive(Debug, Clone, PartialEq)]
pub struct MailAttachment {
    pub file_name: String,
    pub content_base64: String,
    pub content_type: String,
}

#[derive(Debug, Clone)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub html_body: String,
    pub attachments: Vec<MailAttachment>,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), MailError>;
}

/// Builds the configured transport, or `None` when mail is not configured.
pub fn from_config(
    config: &MailConfig,
    timeout: Duration,
) -> Result<Option<Arc<dyn Mailer>>, MailError> {
    if let Some(url) = &config.logic_app_webhook_url {
        info!("Mail dispatch via Logic App webhook");
        return Ok(Some(Arc::new(LogicAppMailer::new(url)?)));
    }
    if let Some(graph) = &config.graph {
        info!("Mail dispatch via Microsoft Graph as {}", graph.sender);
        return Ok(Some(Arc::new(GraphMailer::new(graph.clone(), timeout)?)));
    }
    warn!("No mail transport configured; invite emails will fail");
    Ok(None)
}

/// Reads a non-2xx response into [`MailError::Rejected`].
async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, MailError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(MailError::Rejected {
        status: status.as_u16(),
        body,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::GraphMailConfig;
    use tokio::sync::Mutex;

    /// Records every message instead of sending it.
    #[derive(Default)]
    pub struct RecordingMailer {
        pub sent: Mutex<Vec<OutgoingMail>>,
        pub fail: bool,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, mail: &OutgoingMail) -> Result<(), MailError> {
            if self.fail {
                return Err(MailError::Rejected {
                    status: 500,
                    body: "boom".to_string(),
                });
            }
            self.sent.lock().await.push(mail.clone());
            Ok(())
        }
    }

    fn graph_config() -> GraphMailConfig {
        GraphMailConfig {
            sender: "hr@example.com".to_string(),
            tenant_id: "tenant".to_string(),
            client_id: "client".to_string(),
            client_secret: "secret".to_string(),
            scope: "https://graph.microsoft.com/.default".to_string(),
        }
    }

    #[test]
    fn test_no_transport_configured() {
        let config = MailConfig {
            logic_app_webhook_url: None,
            graph: None,
            organization_name: "Acme".to_string(),
        };
        assert!(from_config(&config, Duration::from_secs(5)).unwrap().is_none());
    }

    #[test]
    fn test_either_transport_is_selected() {
        let both = MailConfig {
            logic_app_webhook_url: Some("http://127.0.0.1:1/hook".to_string()),
            graph: Some(graph_config()),
            organization_name: "Acme".to_string(),
        };
        assert!(from_config(&both, Duration::from_secs(5)).unwrap().is_some());

        let graph_only = MailConfig {
            logic_app_webhook_url: None,
            ..both
        };
        assert!(from_config(&graph_only, Duration::from_secs(5))
            .unwrap()
            .is_some());
    }
}
