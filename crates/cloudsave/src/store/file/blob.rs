//! File-based blob storage implementation.
//!
//! Directory structure:
//! ```text
//! {files_dir}/
//!   {player_id}/
//!     {base64url(key)}.blob
//! ```
//!
//! Keys are encoded so any string maps to a safe file name. Encoded names
//! still count against the file system's name length limit, so very long
//! keys fail with an I/O error.

use std::path::PathBuf;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use tokio::fs;
use tracing::{debug, warn};

use super::{player_component, write_atomic};
use crate::auth::Session;
use crate::store::blob::BlobStore;
use crate::store::error::{StorageError, StorageResult};

const BLOB_EXTENSION: &str = "blob";

/// File-based implementation of `BlobStore`.
#[derive(Debug, Clone)]
pub struct FileBlobStore {
    files_dir: PathBuf,
}

impl FileBlobStore {
    /// Create a new file blob store.
    pub fn new(files_dir: impl Into<PathBuf>) -> Self {
        Self {
            files_dir: files_dir.into(),
        }
    }

    fn player_dir(&self, player_id: &str) -> StorageResult<PathBuf> {
        Ok(self.files_dir.join(player_component(player_id)?))
    }

    fn blob_path(&self, player_id: &str, key: &str) -> StorageResult<PathBuf> {
        let name = format!("{}.{}", URL_SAFE_NO_PAD.encode(key), BLOB_EXTENSION);
        Ok(self.player_dir(player_id)?.join(name))
    }
}

/// Recover a key from a blob file name, if it is one.
fn decode_file_name(file_name: &str) -> Option<String> {
    let encoded = file_name.strip_suffix(BLOB_EXTENSION)?.strip_suffix('.')?;
    let bytes = URL_SAFE_NO_PAD.decode(encoded).ok()?;
    String::from_utf8(bytes).ok()
}

#[async_trait]
impl BlobStore for FileBlobStore {
    async fn upload(&self, session: &Session, key: &str, bytes: &[u8]) -> StorageResult<()> {
        let path = self.blob_path(session.player_id(), key)?;

        write_atomic(&path, bytes)
            .await
            .map_err(|e| StorageError::file_io(&path, e))?;

        debug!(key, size = bytes.len(), "Stored blob");
        Ok(())
    }

    async fn list(&self, session: &Session) -> StorageResult<Vec<String>> {
        let dir = self.player_dir(session.player_id())?;

        let mut entries = match fs::read_dir(&dir).await {
            Ok(e) => e,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StorageError::file_io(&dir, e)),
        };

        let mut keys = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StorageError::file_io(&dir, e))?
        {
            let file_name = entry.file_name();
            let file_name = file_name.to_string_lossy();
            if file_name.starts_with('.') {
                continue;
            }
            match decode_file_name(&file_name) {
                Some(key) => keys.push(key),
                None => warn!(file = %file_name, "Skipping unrecognized file in blob directory"),
            }
        }

        keys.sort();
        Ok(keys)
    }

    async fn download(&self, session: &Session, key: &str) -> StorageResult<Vec<u8>> {
        let path = self.blob_path(session.player_id(), key)?;

        match fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::not_found("blob", key))
            }
            Err(e) => Err(StorageError::file_io(&path, e)),
        }
    }
}
