use async_trait::async_trait;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::primitives::ByteStream;
use tracing::info;

use super::{object_url, BlobStore, PutObject, StorageError};
use crate::config::BlobConfig;

/// S3-compatible object store (MinIO locally, any S3 API in production).
#[derive(Clone)]
pub struct S3BlobStore {
    client: aws_sdk_s3::Client,
    url_base: String,
}

impl S3BlobStore {
    pub async fn connect(config: &BlobConfig) -> Self {
        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "interview-gateway-static",
        );

        let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials)
            .endpoint_url(&config.endpoint)
            .load()
            .await;

        // Path-style addressing: bucket names become URL path segments, which
        // MinIO and most self-hosted stores require.
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(true)
            .build();

        Self {
            client: aws_sdk_s3::Client::from_conf(s3_config),
            url_base: config
                .public_base_url
                .clone()
                .unwrap_or_else(|| config.endpoint.clone()),
        }
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn ensure_container(&self, container: &str) -> Result<(), StorageError> {
        if self
            .client
            .head_bucket()
            .bucket(container)
            .send()
            .await
            .is_ok()
        {
            return Ok(());
        }

        self.client
            .create_bucket()
            .bucket(container)
            .send()
            .await
            .map_err(|e| StorageError::Container {
                container: container.to_string(),
                message: e.to_string(),
            })?;
        info!("[Blob] Container \"{container}\" created");
        Ok(())
    }

    async fn put(&self, object: PutObject<'_>) -> Result<String, StorageError> {
        let size = object.body.len();
        let mut request = self
            .client
            .put_object()
            .bucket(object.container)
            .key(object.key)
            .body(ByteStream::from(object.body))
            .content_type(object.content_type);
        for (name, value) in object.metadata {
            request = request.metadata(name, value);
        }

        request.send().await.map_err(|e| StorageError::Upload {
            container: object.container.to_string(),
            key: object.key.to_string(),
            message: e.to_string(),
        })?;

        info!(
            "Uploaded {size} bytes to {}/{}",
            object.container, object.key
        );
        Ok(object_url(&self.url_base, object.container, object.key))
    }
}
