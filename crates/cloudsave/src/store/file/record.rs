//! File-based record storage implementation.
//!
//! Directory structure:
//! ```text
//! {data_dir}/
//!   {player_id}.json     # {"version": 1, "items": {key: value}}
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::debug;

use super::{player_component, write_atomic};
use crate::auth::Session;
use crate::store::error::{StorageError, StorageResult};
use crate::store::record::RecordStore;
use crate::sync::KeyedLocks;
use crate::value::{RecordFields, RecordValue};

/// Current record document schema version.
pub const RECORD_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct RecordDocument {
    version: u32,
    #[serde(default)]
    items: BTreeMap<String, RecordValue>,
}

impl Default for RecordDocument {
    fn default() -> Self {
        Self {
            version: RECORD_SCHEMA_VERSION,
            items: BTreeMap::new(),
        }
    }
}

/// File-based implementation of `RecordStore`.
///
/// Saves for the same player are serialized so concurrent read-modify-write
/// cycles never lose keys; all keys of one save land in a single atomic
/// file replacement.
#[derive(Clone)]
pub struct FileRecordStore {
    data_dir: PathBuf,
    locks: KeyedLocks,
}

impl FileRecordStore {
    /// Create a new file record store.
    ///
    /// The data directory will be created when the first record is saved.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            locks: KeyedLocks::new(),
        }
    }

    fn document_path(&self, player_id: &str) -> StorageResult<PathBuf> {
        let player = player_component(player_id)?;
        Ok(self.data_dir.join(format!("{}.json", player)))
    }

    async fn read_document(&self, player_id: &str) -> StorageResult<RecordDocument> {
        let path = self.document_path(player_id)?;

        let contents = match fs::read(&path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(RecordDocument::default());
            }
            Err(e) => return Err(StorageError::file_io(&path, e)),
        };

        let document: RecordDocument = serde_json::from_slice(&contents)
            .map_err(|e| StorageError::file_deserialization(&path, e.to_string()))?;

        if document.version != RECORD_SCHEMA_VERSION {
            return Err(StorageError::file_incompatible_schema(
                &path,
                RECORD_SCHEMA_VERSION,
                document.version,
            ));
        }

        Ok(document)
    }
}

#[async_trait]
impl RecordStore for FileRecordStore {
    async fn save(&self, session: &Session, entries: &RecordFields) -> StorageResult<()> {
        let player_id = session.player_id();
        let path = self.document_path(player_id)?;

        {
            let lock = self.locks.get(player_id);
            let _guard = lock.lock().await;

            let mut document = self.read_document(player_id).await?;
            document
                .items
                .extend(entries.iter().map(|(k, v)| (k.clone(), v.clone())));

            let contents = serde_json::to_vec_pretty(&document)
                .map_err(|e| StorageError::serialization(e.to_string()))?;
            write_atomic(&path, &contents)
                .await
                .map_err(|e| StorageError::file_io(&path, e))?;
        }
        self.locks.prune_idle();

        debug!(player_id, keys = entries.len(), "Saved records");
        Ok(())
    }

    async fn load(&self, session: &Session, keys: &BTreeSet<String>) -> StorageResult<RecordFields> {
        let document = self.read_document(session.player_id()).await?;

        Ok(document
            .items
            .into_iter()
            .filter(|(key, _)| keys.contains(key))
            .collect())
    }
}
