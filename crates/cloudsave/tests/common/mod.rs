//! Common test utilities.
#![allow(dead_code)]

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use tempfile::TempDir;

use cloudsave::CloudSave;
use cloudsave::auth::{AuthError, AuthResult, IdentityProvider, LocalIdentityProvider, Session};
use cloudsave::store::file::{FileBlobStore, FileRecordStore};
use cloudsave::store::{BlobStore, RecordStore, StorageError, StorageResult};
use cloudsave::value::RecordFields;

/// Create a façade over the local file backend rooted in `temp_dir`.
pub fn local_cloud(temp_dir: &TempDir) -> CloudSave {
    let workspace = temp_dir.path().join("workspace");
    CloudSave::new(
        Arc::new(LocalIdentityProvider::new(&workspace)),
        Arc::new(FileRecordStore::new(workspace.join("data"))),
        Arc::new(FileBlobStore::new(workspace.join("files"))),
    )
}

/// Create a signed-in façade over the local file backend.
pub async fn signed_in_cloud(temp_dir: &TempDir) -> CloudSave {
    let cloud = local_cloud(temp_dir);
    cloud.initialize().await.unwrap();
    cloud
}

/// Identity provider that always refuses to sign in.
pub struct RejectingIdentity;

#[async_trait]
impl IdentityProvider for RejectingIdentity {
    async fn sign_in_anonymously(&self) -> AuthResult<Session> {
        Err(AuthError::Rejected {
            status: 403,
            message: "anonymous sign-in disabled".to_string(),
        })
    }
}

/// Identity provider that hands out a fixed session.
pub struct FixedIdentity(pub Session);

#[async_trait]
impl IdentityProvider for FixedIdentity {
    async fn sign_in_anonymously(&self) -> AuthResult<Session> {
        Ok(self.0.clone())
    }
}

/// Backend whose every call fails with the error built by `make_error`.
pub struct FailingStore {
    pub make_error: fn() -> StorageError,
}

impl FailingStore {
    pub fn server_error() -> Self {
        Self {
            make_error: || StorageError::Api {
                status: 503,
                message: "service unavailable".to_string(),
            },
        }
    }

    pub fn unauthorized() -> Self {
        Self {
            make_error: || StorageError::Unauthorized { status: 401 },
        }
    }
}

#[async_trait]
impl RecordStore for FailingStore {
    async fn save(&self, _session: &Session, _entries: &RecordFields) -> StorageResult<()> {
        Err((self.make_error)())
    }

    async fn load(&self, _session: &Session, _keys: &BTreeSet<String>) -> StorageResult<RecordFields> {
        Err((self.make_error)())
    }
}

#[async_trait]
impl BlobStore for FailingStore {
    async fn upload(&self, _session: &Session, _key: &str, _bytes: &[u8]) -> StorageResult<()> {
        Err((self.make_error)())
    }

    async fn list(&self, _session: &Session) -> StorageResult<Vec<String>> {
        Err((self.make_error)())
    }

    async fn download(&self, _session: &Session, _key: &str) -> StorageResult<Vec<u8>> {
        Err((self.make_error)())
    }
}

/// Create a signed-in façade whose backend always fails.
pub async fn failing_cloud(store: FailingStore) -> CloudSave {
    let store = Arc::new(store);
    let cloud = CloudSave::new(
        Arc::new(FixedIdentity(Session::new("player-1", "token"))),
        store.clone(),
        store,
    );
    cloud.initialize().await.unwrap();
    cloud
}
