//! File-based storage implementations.
//!
//! These emulate the remote service inside a local workspace:
//! - one JSON document per player for records
//! - one file per blob, under a per-player directory
//!
//! All writes use atomic operations (temp file + rename) to prevent corruption.

mod blob;
mod record;

pub use blob::FileBlobStore;
pub use record::FileRecordStore;

use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::AsyncWriteExt;
use ulid::Ulid;

use super::error::{StorageError, StorageResult};

/// Write `contents` to `path` atomically.
///
/// Creates missing parent directories, writes a uniquely named sibling temp
/// file, fsyncs it and renames it over `path`.
pub(crate) async fn write_atomic(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }

    let tmp_path = temp_sibling(path);
    let result = async {
        let mut file = fs::File::create(&tmp_path).await?;
        file.write_all(contents).await?;
        file.sync_all().await?;
        drop(file);
        fs::rename(&tmp_path, path).await
    }
    .await;

    if result.is_err() {
        let _ = fs::remove_file(&tmp_path).await;
    }
    result
}

/// Temp file next to `path`; starts with a dot so directory scans skip it.
fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.{}.tmp", name, Ulid::new()))
}

/// Check that a player id can be used as a single path component.
fn player_component(player_id: &str) -> StorageResult<&str> {
    if player_id.is_empty() {
        return Err(StorageError::invalid_name("player id", player_id, "empty"));
    }
    if !player_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(StorageError::invalid_name(
            "player id",
            player_id,
            "only ASCII letters, digits, '-' and '_' are allowed",
        ));
    }
    Ok(player_id)
}
