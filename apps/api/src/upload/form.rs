//! Multipart form collection shared by every upload endpoint.

use std::collections::HashMap;
use std::path::Path;

use axum::extract::Multipart;
use bytes::Bytes;
use tempfile::NamedTempFile;

use crate::errors::AppError;

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Bytes,
}

/// All parts of a multipart body: file parts (those carrying a filename) and
/// plain text fields. Repeated names keep the first occurrence.
#[derive(Debug, Default)]
pub struct MultipartForm {
    files: HashMap<String, UploadedFile>,
    fields: HashMap<String, String>,
}

impl MultipartForm {
    pub async fn collect(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = MultipartForm::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::Validation(format!("Malformed multipart body: {e}")))?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            let file_name = field.file_name().map(str::to_string);
            let content_type = field.content_type().map(str::to_string);
            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::Validation(format!("Failed to read part '{name}': {e}")))?;

            if file_name.is_some() {
                form.files.entry(name).or_insert(UploadedFile {
                    file_name,
                    content_type,
                    data,
                });
            } else {
                form.fields
                    .entry(name)
                    .or_insert_with(|| String::from_utf8_lossy(&data).into_owned());
            }
        }
        Ok(form)
    }

    /// A file part with a non-empty body.
    pub fn file(&self, name: &str) -> Option<&UploadedFile> {
        self.files.get(name).filter(|f| !f.data.is_empty())
    }

    /// A text field, trimmed; blank counts as absent.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }
}

/// Writes `data` to a scratch file under `dir`. The file is removed when the
/// returned handle drops.
pub async fn spool_to_scratch(dir: &Path, data: Bytes) -> Result<NamedTempFile, AppError> {
    let dir = dir.to_path_buf();
    tokio::task::spawn_blocking(move || -> std::io::Result<NamedTempFile> {
        let mut file = NamedTempFile::new_in(&dir)?;
        std::io::Write::write_all(&mut file, &data)?;
        Ok(file)
    })
    .await
    .map_err(|e| AppError::Internal(e.into()))?
    .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to spool upload: {e}")))
}
