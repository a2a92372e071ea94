//! Microsoft Graph `sendMail` transport.
//!
//! Access tokens come from the client-credentials flow and are cached until
//! shortly before they expire. The cache sits behind an async mutex so
//! concurrent sends trigger at most one token request.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info};

use super::{ensure_success, MailError, Mailer, OutgoingMail};
use crate::config::GraphMailConfig;

const LOGIN_BASE_URL: &str = "https://login.microsoftonline.com";
const GRAPH_BASE_URL: &str = "https://graph.microsoft.com/v1.0";

/// Tokens are refreshed this long before their stated expiry.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    expires_at: Instant,
}

impl CachedToken {
    fn is_fresh(&self, now: Instant) -> bool {
        now + EXPIRY_MARGIN < self.expires_at
    }
}

/// Expiry instant for a token valid `expires_in` seconds from `now`. An
/// unrepresentable lifetime is treated as already expired.
fn token_expiry(now: Instant, expires_in: u64) -> Instant {
    now.checked_add(Duration::from_secs(expires_in)).unwrap_or(now)
}

pub struct GraphMailer {
    client: Client,
    config: GraphMailConfig,
    login_base_url: String,
    graph_base_url: String,
    token: Mutex<Option<CachedToken>>,
}

impl GraphMailer {
    pub fn new(config: GraphMailConfig, timeout: Duration) -> Result<Self, MailError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            config,
            login_base_url: LOGIN_BASE_URL.to_string(),
            graph_base_url: GRAPH_BASE_URL.to_string(),
            token: Mutex::new(None),
        })
    }

    /// Points both endpoints at another host.
    pub fn with_base_urls(mut self, login: &str, graph: &str) -> Self {
        self.login_base_url = login.trim_end_matches('/').to_string();
        self.graph_base_url = graph.trim_end_matches('/').to_string();
        self
    }

    async fn access_token(&self) -> Result<String, MailError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh(Instant::now())) {
            return Ok(token.token.clone());
        }

        let url = format!(
            "{}/{}/oauth2/v2.0/token",
            self.login_base_url, self.config.tenant_id
        );
        let response = self
            .client
            .post(&url)
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("scope", self.config.scope.as_str()),
                ("grant_type", "client_credentials"),
            ])
            .send()
            .await?;
        let response = ensure_success(response).await?;
        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| MailError::Token(e.to_string()))?;

        debug!("Fetched Graph token valid for {}s", body.expires_in);
        *cached = Some(CachedToken {
            token: body.access_token.clone(),
            expires_at: token_expiry(Instant::now(), body.expires_in),
        });
        Ok(body.access_token)
    }
}

fn graph_message(mail: &OutgoingMail) -> Value {
    let attachments: Vec<Value> = mail
        .attachments
        .iter()
        .map(|a| {
            json!({
                "@odata.type": "#microsoft.graph.fileAttachment",
                "name": a.file_name,
                "contentType": a.content_type,
                "contentBytes": a.content_base64,
            })
        })
        .collect();

    json!({
        "message": {
            "subject": mail.subject,
            "body": { "contentType": "HTML", "content": mail.html_body },
            "toRecipients": [{ "emailAddress": { "address": mail.to } }],
            "attachments": attachments,
        },
        "saveToSentItems": true,
    })
}

#[async_trait]
impl Mailer for GraphMailer {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), MailError> {
        let token = self.access_token().await?;
        let url = format!(
            "{}/users/{}/sendMail",
            self.graph_base_url, self.config.sender
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(&graph_message(mail))
            .send()
            .await?;
        ensure_success(response).await?;

        info!("Graph mail sent to {}", mail.to);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use axum::extract::State;
    use axum::http::HeaderMap;
    use axum::routing::post;
    use axum::{Json, Router};
    use tokio::net::TcpListener;

    use crate::mail::MailAttachment;

    #[derive(Clone, Default)]
    struct Mock {
        token_calls: Arc<AtomicUsize>,
        sent: Arc<Mutex<Vec<(String, Value)>>>,
        expires_in: u64,
    }

    async fn token(State(mock): State<Mock>) -> Json<Value> {
        mock.token_calls.fetch_add(1, Ordering::SeqCst);
        Json(json!({
            "access_token": "tok-123",
            "expires_in": mock.expires_in,
            "token_type": "Bearer"
        }))
    }

    async fn send_mail(
        State(mock): State<Mock>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> axum::http::StatusCode {
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        mock.sent.lock().await.push((auth, body));
        axum::http::StatusCode::ACCEPTED
    }

    async fn spawn_mock(expires_in: u64) -> (String, Mock) {
        let mock = Mock {
            expires_in,
            ..Mock::default()
        };
        let app = Router::new()
            .route("/tenant/oauth2/v2.0/token", post(token))
            .route("/users/hr@example.com/sendMail", post(send_mail))
            .with_state(mock.clone());
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}"), mock)
    }

    fn mailer(base: &str) -> GraphMailer {
        let config = GraphMailConfig {
            sender: "hr@example.com".to_string(),
            tenant_id: "tenant".to_string(),
            client_id: "client".to_string(),
            client_secret: "secret".to_string(),
            scope: "https://graph.microsoft.com/.default".to_string(),
        };
        GraphMailer::new(config, Duration::from_secs(5))
            .unwrap()
            .with_base_urls(base, base)
    }

    fn mail() -> OutgoingMail {
        OutgoingMail {
            to: "candidate@example.com".to_string(),
            subject: "Invite".to_string(),
            html_body: "<p>Hello</p>".to_string(),
            attachments: vec![MailAttachment {
                file_name: "CV.pdf".to_string(),
                content_base64: "JVBERg==".to_string(),
                content_type: "application/pdf".to_string(),
            }],
        }
    }

    #[test]
    fn test_token_freshness_margin() {
        let now = Instant::now();
        let fresh = CachedToken {
            token: "t".to_string(),
            expires_at: now + Duration::from_secs(120),
        };
        let stale = CachedToken {
            token: "t".to_string(),
            expires_at: now + Duration::from_secs(30),
        };
        assert!(fresh.is_fresh(now));
        assert!(!stale.is_fresh(now));
    }

    #[test]
    fn test_absurd_token_lifetime_expires_immediately() {
        let now = Instant::now();
        let expiry = token_expiry(now, u64::MAX);
        assert_eq!(expiry, now);
        let token = CachedToken {
            token: "t".to_string(),
            expires_at: expiry,
        };
        assert!(!token.is_fresh(now));
        assert_eq!(token_expiry(now, 3600), now + Duration::from_secs(3600));
    }

    #[test]
    fn test_message_carries_file_attachments() {
        let body = graph_message(&mail());
        let attachment = &body["message"]["attachments"][0];
        assert_eq!(attachment["@odata.type"], "#microsoft.graph.fileAttachment");
        assert_eq!(attachment["contentBytes"], "JVBERg==");
        assert_eq!(
            body["message"]["toRecipients"][0]["emailAddress"]["address"],
            "candidate@example.com"
        );
    }

    #[tokio::test]
    async fn test_token_is_reused_while_fresh() {
        let (base, mock) = spawn_mock(3600).await;
        let mailer = mailer(&base);

        mailer.send(&mail()).await.unwrap();
        mailer.send(&mail()).await.unwrap();

        assert_eq!(mock.token_calls.load(Ordering::SeqCst), 1);
        let sent = mock.sent.lock().await;
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].0, "Bearer tok-123");
    }

    #[tokio::test]
    async fn test_short_lived_token_is_refetched() {
        let (base, mock) = spawn_mock(30).await;
        let mailer = mailer(&base);

        mailer.send(&mail()).await.unwrap();
        mailer.send(&mail()).await.unwrap();

        assert_eq!(mock.token_calls.load(Ordering::SeqCst), 2);
    }
}
