//! Logic App webhook transport. The workflow behind the URL does the actual
//! sending, so a 2xx only means the request was accepted.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::info;

use super::{ensure_success, MailError, Mailer, OutgoingMail};

const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WebhookPayload<'a> {
    to: &'a str,
    subject: &'a str,
    email_body: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    attachments: Vec<WebhookAttachment<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WebhookAttachment<'a> {
    file_name: &'a str,
    file_content: &'a str,
    content_type: &'a str,
}

pub struct LogicAppMailer {
    client: Client,
    url: String,
}

impl LogicAppMailer {
    pub fn new(url: &str) -> Result<Self, MailError> {
        let client = Client::builder().timeout(WEBHOOK_TIMEOUT).build()?;
        Ok(Self {
            client,
            url: url.to_string(),
        })
    }
}

#[async_trait]
impl Mailer for LogicAppMailer {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), MailError> {
        let payload = WebhookPayload {
            to: &mail.to,
            subject: &mail.subject,
            email_body: &mail.html_body,
            attachments: mail
                .attachments
                .iter()
                .map(|a| WebhookAttachment {
                    file_name: &a.file_name,
                    file_content: &a.content_base64,
                    content_type: &a.content_type,
                })
                .collect(),
        };

        let response = self.client.post(&self.url).json(&payload).send().await?;
        ensure_success(response).await?;

        info!(
            "Logic App triggered for {} ({} attachments)",
            mail.to,
            mail.attachments.len()
        );
        Ok(())
    }
}
