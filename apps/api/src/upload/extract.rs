//! PDF → text. Extraction is CPU-bound and runs on the blocking pool.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("PDF text extraction failed: {0}")]
    Pdf(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("extraction task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Extracts text from a PDF on disk.
    async fn extract_file(&self, path: &Path) -> Result<String, ExtractError>;

    /// Extracts text from an in-memory PDF.
    async fn extract_bytes(&self, pdf: Bytes) -> Result<String, ExtractError>;
}

/// `pdf-extract` backed extractor.
pub struct PdfTextExtractor;

#[async_trait]
impl TextExtractor for PdfTextExtractor {
    async fn extract_file(&self, path: &Path) -> Result<String, ExtractError> {
        let path: PathBuf = path.to_path_buf();
        let text = tokio::task::spawn_blocking(move || {
            pdf_extract::extract_text(&path).map_err(|e| ExtractError::Pdf(e.to_string()))
        })
        .await??;
        debug!("Extracted {} chars from file", text.len());
        Ok(text)
    }

    async fn extract_bytes(&self, pdf: Bytes) -> Result<String, ExtractError> {
        let text = tokio::task::spawn_blocking(move || {
            pdf_extract::extract_text_from_mem(&pdf).map_err(|e| ExtractError::Pdf(e.to_string()))
        })
        .await??;
        debug!("Extracted {} chars from buffer", text.len());
        Ok(text)
    }
}
