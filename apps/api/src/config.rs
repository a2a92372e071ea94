use std::path::PathBuf;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub rust_log: String,
    pub upload_dir: PathBuf,
    pub database_url: String,
    /// Interview scoring service: renders scorecards, and answers chat turns
    /// when no Azure OpenAI deployment is configured.
    pub llm_base_url: String,
    pub azure_openai: Option<AzureOpenAiConfig>,
    pub upstream_timeout_secs: u64,
    pub llm_max_attempts: u32,
    /// Redis URL for the session summary store. In-process map when unset.
    pub summary_store_url: Option<String>,
    pub blob: BlobConfig,
    pub mail: MailConfig,
    pub interviewer_name: String,
    pub interviewer_prompt_path: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct AzureOpenAiConfig {
    pub endpoint: String,
    pub api_key: String,
    pub deployment: String,
    pub api_version: String,
}

#[derive(Debug, Clone)]
pub struct BlobConfig {
    pub endpoint: String,
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub transcripts_container: String,
    pub recordings_container: String,
    pub public_base_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct MailConfig {
    pub logic_app_webhook_url: Option<String>,
    pub graph: Option<GraphMailConfig>,
    pub organization_name: String,
}

#[derive(Debug, Clone)]
pub struct GraphMailConfig {
    pub sender: String,
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
    pub scope: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let azure_openai = match optional_env("AZURE_OPENAI_ENDPOINT") {
            Some(endpoint) => Some(AzureOpenAiConfig {
                endpoint: endpoint.trim_end_matches('/').to_string(),
                api_key: require_env("AZURE_OPENAI_API_KEY")?,
                deployment: require_env("AZURE_OPENAI_DEPLOYMENT")?,
                api_version: env_or("AZURE_OPENAI_API_VERSION", "2024-06-01"),
            }),
            None => None,
        };

        let graph = match (
            optional_env("AZURE_MAIL_SENDER"),
            optional_env("AZURE_TENANT_ID"),
            optional_env("AZURE_CLIENT_ID"),
            optional_env("AZURE_CLIENT_SECRET"),
        ) {
            (Some(sender), Some(tenant_id), Some(client_id), Some(client_secret)) => {
                Some(GraphMailConfig {
                    sender,
                    tenant_id,
                    client_id,
                    client_secret,
                    scope: env_or("AZURE_GRAPH_SCOPE", "https://graph.microsoft.com/.default"),
                })
            }
            _ => None,
        };

        Ok(Config {
            host: env_or("HOST", "0.0.0.0"),
            port: parse_env("PORT", 5007).context("PORT must be a valid port number")?,
            rust_log: env_or("RUST_LOG", "info"),
            upload_dir: PathBuf::from(env_or("UPLOAD_DIR", "uploads")),
            database_url: env_or("DATABASE_URL", "sqlite://hr_bot.sqlite?mode=rwc"),
            llm_base_url: env_or("LLM_BASE_URL", "http://127.0.0.1:8791")
                .trim_end_matches('/')
                .to_string(),
            azure_openai,
            upstream_timeout_secs: parse_env("UPSTREAM_TIMEOUT_SECS", 30)
                .context("UPSTREAM_TIMEOUT_SECS must be a whole number of seconds")?,
            llm_max_attempts: parse_env("LLM_MAX_ATTEMPTS", 1)
                .context("LLM_MAX_ATTEMPTS must be a positive integer")?,
            summary_store_url: optional_env("SUMMARY_STORE_URL"),
            blob: BlobConfig {
                endpoint: require_env("BLOB_ENDPOINT")?.trim_end_matches('/').to_string(),
                region: env_or("BLOB_REGION", "us-east-1"),
                access_key_id: require_env("BLOB_ACCESS_KEY_ID")?,
                secret_access_key: require_env("BLOB_SECRET_ACCESS_KEY")?,
                transcripts_container: env_or("BLOB_TRANSCRIPTS_CONTAINER", "interview-transcripts"),
                recordings_container: env_or("BLOB_RECORDINGS_CONTAINER", "interview-recordings"),
                public_base_url: optional_env("BLOB_PUBLIC_BASE_URL")
                    .map(|url| url.trim_end_matches('/').to_string()),
            },
            mail: MailConfig {
                logic_app_webhook_url: optional_env("LOGICAPP_EMAIL_WEBHOOK_URL"),
                graph,
                organization_name: env_or("MAIL_ORGANIZATION_NAME", "Talent Acquisition Team"),
            },
            interviewer_name: env_or("INTERVIEWER_NAME", "Lisa"),
            interviewer_prompt_path: optional_env("INTERVIEWER_PROMPT_PATH").map(PathBuf::from),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Unset and blank values are both treated as absent.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_or(key: &str, default: &str) -> String {
    optional_env(key).unwrap_or_else(|| default.to_string())
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => Ok(raw.parse::<T>()?),
        None => Ok(default),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Config for handler tests: no external services, scratch files under `upload_dir`.
    pub fn test_config(upload_dir: PathBuf) -> Config {
        Config {
            host: "127.0.0.1".to_string(),
            port: 0,
            rust_log: "debug".to_string(),
            upload_dir,
            database_url: "sqlite::memory:".to_string(),
            llm_base_url: "http://127.0.0.1:1".to_string(),
            azure_openai: None,
            upstream_timeout_secs: 5,
            llm_max_attempts: 1,
            summary_store_url: None,
            blob: BlobConfig {
                endpoint: "http://127.0.0.1:9000".to_string(),
                region: "us-east-1".to_string(),
                access_key_id: "test".to_string(),
                secret_access_key: "test".to_string(),
                transcripts_container: "interview-transcripts".to_string(),
                recordings_container: "interview-recordings".to_string(),
                public_base_url: None,
            },
            mail: MailConfig {
                logic_app_webhook_url: None,
                graph: None,
                organization_name: "Acme Talent".to_string(),
            },
            interviewer_name: "Lisa".to_string(),
            interviewer_prompt_path: None,
        }
    }

    #[test]
    fn test_blank_optional_env_is_absent() {
        std::env::set_var("INTERVIEW_GATEWAY_TEST_BLANK", "   ");
        assert_eq!(optional_env("INTERVIEW_GATEWAY_TEST_BLANK"), None);
    }

    #[test]
    fn test_parse_env_default_and_error() {
        assert_eq!(parse_env("INTERVIEW_GATEWAY_TEST_UNSET", 5007u16).unwrap(), 5007);
        std::env::set_var("INTERVIEW_GATEWAY_TEST_PORT", "not-a-port");
        assert!(parse_env::<u16>("INTERVIEW_GATEWAY_TEST_PORT", 5007).is_err());
    }

    #[test]
    fn test_require_env_names_missing_key() {
        let err = require_env("INTERVIEW_GATEWAY_TEST_MISSING").unwrap_err();
        assert!(err.to_string().contains("INTERVIEW_GATEWAY_TEST_MISSING"));
    }
}
