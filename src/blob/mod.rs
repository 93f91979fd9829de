mod s3;

pub use s3::S3BlobStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AppResult;

/// Where a blob ended up, as carried on the scheduler queue message body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Location {
    pub bucket: String,
    pub key: String,
}

/// Write-only blob store used to persist a deployment plan's JSON before
/// forwarding its location to the scheduler.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn upload(&self, key: &str, body: Vec<u8>) -> AppResult<Location>;
}
