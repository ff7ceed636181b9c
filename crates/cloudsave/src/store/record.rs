//! Record storage trait.
//!
//! Defines the interface for the remote key-value store holding player records.

use std::collections::BTreeSet;

use async_trait::async_trait;

use crate::auth::Session;
use crate::value::RecordFields;

use super::error::StorageResult;

/// Storage interface for per-player key-value records.
///
/// Every call is scoped to the player identified by `session`.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Save every entry, overwriting existing values at those keys.
    ///
    /// Keys not named in `entries` are left untouched.
    async fn save(&self, session: &Session, entries: &RecordFields) -> StorageResult<()>;

    /// Load the values stored at `keys`.
    ///
    /// Keys with no stored value are absent from the result.
    async fn load(&self, session: &Session, keys: &BTreeSet<String>) -> StorageResult<RecordFields>;
}
