//! Blob storage trait.

use async_trait::async_trait;

use crate::auth::Session;

use super::error::StorageResult;

/// Storage interface for opaque per-player files.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `bytes` under `key`, replacing any existing blob.
    async fn upload(&self, session: &Session, key: &str, bytes: &[u8]) -> StorageResult<()>;

    /// List the keys of every stored blob.
    async fn list(&self, session: &Session) -> StorageResult<Vec<String>>;

    /// Fetch the blob stored under `key`.
    ///
    /// Returns `StorageError::NotFound` if there is none.
    async fn download(&self, session: &Session, key: &str) -> StorageResult<Vec<u8>>;
}
