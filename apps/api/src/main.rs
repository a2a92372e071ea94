mod config;
mod db;
mod errors;
mod extract;
mod hr;
mod interview;
mod llm_client;
mod mail;
mod models;
mod recordings;
mod routes;
mod state;
mod storage;
mod upload;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::{create_pool, ensure_schema};
use crate::interview::controller::SessionController;
use crate::interview::prompts::PromptTemplate;
use crate::interview::summary::{InMemorySummaryStore, LlmSummarizer, RedisSummaryStore, SummaryStore};
use crate::llm_client::{CompletionProvider, InterviewServiceClient, LlmClient, RetryPolicy};
use crate::routes::build_router;
use crate::state::AppState;
use crate::storage::{BlobStore, S3BlobStore};
use crate::upload::extract::PdfTextExtractor;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting interview gateway v{}", env!("CARGO_PKG_VERSION"));

    // Scratch directory for CV/JD uploads
    tokio::fs::create_dir_all(&config.upload_dir).await?;

    // Initialize SQLite
    let db = create_pool(&config.database_url).await?;
    ensure_schema(&db).await?;

    // Initialize completion providers
    let timeout = Duration::from_secs(config.upstream_timeout_secs);
    let retry = RetryPolicy::with_max_attempts(config.llm_max_attempts);
    let interview_service = Arc::new(InterviewServiceClient::new(
        &config.llm_base_url,
        timeout,
        retry,
    )?);
    let provider: Arc<dyn CompletionProvider> = match &config.azure_openai {
        Some(azure) => {
            info!("Chat turns via Azure OpenAI deployment {}", azure.deployment);
            Arc::new(LlmClient::new(azure, timeout, retry)?)
        }
        None => {
            info!("Chat turns via interview service at {}", config.llm_base_url);
            interview_service.clone()
        }
    };

    // Initialize summary store (Redis when configured, in-process otherwise)
    let summaries: Arc<dyn SummaryStore> = match &config.summary_store_url {
        Some(url) => Arc::new(RedisSummaryStore::connect(url).await?),
        None => {
            info!("Summary store: in-process map");
            Arc::new(InMemorySummaryStore::new())
        }
    };

    let template = PromptTemplate::load(
        &config.interviewer_name,
        config.interviewer_prompt_path.as_deref(),
    )?;
    let controller = SessionController::new(
        provider.clone(),
        Arc::new(LlmSummarizer::new(provider)),
        summaries,
        template,
    );

    // Initialize S3-compatible blob storage
    let blobs = S3BlobStore::connect(&config.blob).await;
    for container in [
        &config.blob.transcripts_container,
        &config.blob.recordings_container,
    ] {
        if let Err(e) = blobs.ensure_container(container).await {
            error!("Could not prepare container {container}: {e}");
        }
    }

    let mailer = mail::from_config(&config.mail, timeout)?;

    // Build app state
    let state = AppState {
        db,
        controller: Arc::new(controller),
        scorecard: interview_service,
        blobs: Arc::new(blobs),
        mailer,
        extractor: Arc::new(PdfTextExtractor),
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
