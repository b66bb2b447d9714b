use std::time::Duration;

use async_trait::async_trait;

use crate::errors::AppError;

/// Minimal object storage surface used by the image pipeline.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn upload(
        &self,
        container: &str,
        blob_name: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<(), AppError>;

    /// Deleting a blob that does not exist is not an error.
    async fn delete(&self, container: &str, blob_name: &str) -> Result<(), AppError>;

    /// Time-limited read URL for a blob.
    async fn read_url(&self, container: &str, blob_name: &str, ttl: Duration) -> Result<String, AppError>;
}
