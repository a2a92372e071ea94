use std::sync::Arc;

use sqlx::SqlitePool;

use crate::config::Config;
use crate::interview::archive::ScorecardRenderer;
use crate::interview::controller::SessionController;
use crate::mail::Mailer;
use crate::storage::BlobStore;
use crate::upload::extract::TextExtractor;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub controller: Arc<SessionController>,
    pub scorecard: Arc<dyn ScorecardRenderer>,
    pub blobs: Arc<dyn BlobStore>,
    /// `None` when neither mail transport is configured.
    pub mailer: Option<Arc<dyn Mailer>>,
    pub extractor: Arc<dyn TextExtractor>,
    pub config: Config,
}
