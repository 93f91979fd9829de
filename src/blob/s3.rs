use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;

use crate::error::{AppError, AppResult};

use super::{BlobStore, Location};

/// [`BlobStore`] backed by Amazon S3, uploading into a single
/// preconfigured bucket.
pub struct S3BlobStore {
    client: Client,
    bucket: String,
}

impl S3BlobStore {
    pub fn new(client: Client, bucket: String) -> Self {
        S3BlobStore { client, bucket }
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn upload(&self, key: &str, body: Vec<u8>) -> AppResult<Location> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type("application/json")
            .send()
            .await
            .map_err(|e| AppError::Blob(e.to_string()))?;

        Ok(Location {
            bucket: self.bucket.clone(),
            key: key.to_string(),
        })
    }
}
