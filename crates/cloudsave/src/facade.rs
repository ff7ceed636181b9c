//! The remote persistence façade.
//!
//! [`CloudSave`] signs the player in once, then maps typed values onto the
//! record store and byte payloads onto the blob store. It holds no state
//! besides the session and never retries or caches: every call is one fresh
//! round trip whose failure is reported as a [`CloudSaveError`].

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::auth::{HttpIdentityProvider, IdentityProvider, LocalIdentityProvider, Session};
use crate::client::{self, ServiceClient};
use crate::config::{self, BackendKind, Config, ConfigError};
use crate::error::{CloudSaveError, Result};
use crate::store::file::{FileBlobStore, FileRecordStore};
use crate::store::http::HttpCloudStore;
use crate::store::{BlobStore, RecordStore};
use crate::value::{RecordFields, RecordValue};

/// Typed key-value and blob persistence for one signed-in player.
pub struct CloudSave {
    identity: Arc<dyn IdentityProvider>,
    records: Arc<dyn RecordStore>,
    blobs: Arc<dyn BlobStore>,
    session: RwLock<Option<Session>>,
}

impl CloudSave {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        records: Arc<dyn RecordStore>,
        blobs: Arc<dyn BlobStore>,
    ) -> Self {
        Self {
            identity,
            records,
            blobs,
            session: RwLock::new(None),
        }
    }

    /// Build a façade for the backend selected in `config`.
    ///
    /// `config_path` anchors relative paths in the config.
    pub fn from_config(config: &Config, config_path: &Path) -> std::result::Result<Self, ConfigError> {
        let workspace = config.workspace_dir(config_path);

        match config.backend {
            BackendKind::Local => {
                let identity = Arc::new(LocalIdentityProvider::new(&workspace));
                let records = Arc::new(FileRecordStore::new(workspace.join(config::DEFAULT_DATA_DIR)));
                let blobs = Arc::new(FileBlobStore::new(workspace.join(config::DEFAULT_FILES_DIR)));
                Ok(Self::new(identity, records, blobs))
            }
            BackendKind::Remote => {
                let remote = &config.remote;
                let project_id = remote.require_project_id()?;
                let auth_url = client::parse_base_url(remote.require_auth_url()?).map_err(|message| {
                    ConfigError::InvalidSetting {
                        setting: "remote.auth_url",
                        message,
                    }
                })?;
                let api_url = client::parse_base_url(remote.require_api_url()?).map_err(|message| {
                    ConfigError::InvalidSetting {
                        setting: "remote.api_url",
                        message,
                    }
                })?;

                let service = ServiceClient::new(
                    project_id,
                    remote.environment().map(str::to_string),
                    Duration::from_secs(remote.request_timeout_seconds),
                )
                .map_err(|e| ConfigError::InvalidSetting {
                    setting: "remote",
                    message: e.to_string(),
                })?;

                let identity = Arc::new(HttpIdentityProvider::new(service.clone(), auth_url, &workspace));
                let store = Arc::new(HttpCloudStore::new(service, api_url));
                Ok(Self::new(identity, store.clone(), store))
            }
        }
    }

    // ------------------------------------------------------------------------
    // Session
    // ------------------------------------------------------------------------

    /// Sign the player in anonymously and keep the session for later calls.
    ///
    /// Calling it again signs in again and replaces the stored session.
    pub async fn initialize(&self) -> Result<Session> {
        let session = self.identity.sign_in_anonymously().await?;
        info!(player_id = %session.player_id(), "Signed in");

        *self.session.write().await = Some(session.clone());
        Ok(session)
    }

    /// The current session.
    ///
    /// Fails with `NotAuthenticated` before `initialize()` succeeds or once
    /// the session has expired.
    pub async fn session(&self) -> Result<Session> {
        match self.session.read().await.as_ref() {
            Some(session) if !session.is_expired() => Ok(session.clone()),
            _ => Err(CloudSaveError::NotAuthenticated),
        }
    }

    // ------------------------------------------------------------------------
    // Records
    // ------------------------------------------------------------------------

    /// Save every field, overwriting existing values at those keys.
    pub async fn save_record(&self, fields: &RecordFields) -> Result<()> {
        let session = self.session().await?;
        if fields.is_empty() {
            return Err(CloudSaveError::invalid_request("no fields to save"));
        }
        validate_keys(fields.keys())?;

        self.records
            .save(&session, fields)
            .await
            .map_err(CloudSaveError::remote_write)?;

        debug!(keys = fields.len(), "Saved record fields");
        Ok(())
    }

    /// Serialize `value` and save it under `key`.
    pub async fn save_typed<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        self.session().await?;
        let value = RecordValue::from_serialize(value).map_err(|e| {
            CloudSaveError::invalid_request(format!("cannot serialize value for '{}': {}", key, e))
        })?;

        let mut fields = RecordFields::new();
        fields.insert(key.to_string(), value);
        self.save_record(&fields).await
    }

    /// Load the values stored at `keys`.
    ///
    /// Duplicate keys collapse. Keys with nothing stored are absent from the
    /// result.
    pub async fn load_record<I, K>(&self, keys: I) -> Result<RecordFields>
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        let session = self.session().await?;
        let keys: BTreeSet<String> = keys.into_iter().map(Into::into).collect();
        if keys.is_empty() {
            return Err(CloudSaveError::invalid_request("no keys to load"));
        }
        validate_keys(keys.iter())?;

        let mut loaded = self
            .records
            .load(&session, &keys)
            .await
            .map_err(CloudSaveError::remote_read)?;
        loaded.retain(|key, _| keys.contains(key));

        debug!(requested = keys.len(), found = loaded.len(), "Loaded record fields");
        Ok(loaded)
    }

    /// Load the value at `key` and decode it as `T`.
    pub async fn load_typed<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        let mut loaded = self.load_record([key]).await?;
        let value = loaded
            .remove(key)
            .ok_or_else(|| CloudSaveError::key_not_found(key))?;

        value.get_as().map_err(|e| CloudSaveError::TypeMismatch {
            key: key.to_string(),
            expected: std::any::type_name::<T>(),
            message: e.to_string(),
        })
    }

    // ------------------------------------------------------------------------
    // Blobs
    // ------------------------------------------------------------------------

    /// Store `bytes` under `key`, replacing any existing blob.
    pub async fn upload_blob(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let session = self.session().await?;
        validate_key(key)?;

        self.blobs
            .upload(&session, key, bytes)
            .await
            .map_err(|e| CloudSaveError::blob_write(key, e))?;

        debug!(key, size = bytes.len(), "Uploaded blob");
        Ok(())
    }

    /// Keys of every stored blob.
    pub async fn list_blobs(&self) -> Result<Vec<String>> {
        let session = self.session().await?;

        self.blobs
            .list(&session)
            .await
            .map_err(CloudSaveError::remote_read)
    }

    /// Bytes stored under `key`.
    pub async fn download_blob(&self, key: &str) -> Result<Vec<u8>> {
        let session = self.session().await?;
        validate_key(key)?;

        let bytes = self
            .blobs
            .download(&session, key)
            .await
            .map_err(|e| CloudSaveError::blob_read(key, e))?;

        debug!(key, size = bytes.len(), "Downloaded blob");
        Ok(bytes)
    }
}

fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(CloudSaveError::invalid_request("keys must not be empty"));
    }
    Ok(())
}

fn validate_keys<'a>(keys: impl IntoIterator<Item = &'a String>) -> Result<()> {
    keys.into_iter().try_for_each(|key| validate_key(key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn from_config_local_uses_workspace() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("cloudsave.yaml");

        let cloud = CloudSave::from_config(&Config::default(), &config_path).unwrap();
        cloud.initialize().await.unwrap();
        cloud.save_typed("level", &3).await.unwrap();

        assert!(temp_dir.path().join(".cloudsave").join("player.json").exists());
        assert!(temp_dir.path().join(".cloudsave").join("data").exists());
    }

    #[test]
    fn from_config_remote_requires_settings() {
        let config = Config {
            backend: BackendKind::Remote,
            ..Default::default()
        };

        let result = CloudSave::from_config(&config, Path::new("cloudsave.yaml"));
        assert!(matches!(
            result,
            Err(ConfigError::MissingSetting("remote.project_id"))
        ));
    }

    #[test]
    fn from_config_remote_rejects_bad_url() {
        let mut config = Config {
            backend: BackendKind::Remote,
            ..Default::default()
        };
        config.remote.project_id = Some("proj".to_string());
        config.remote.auth_url = Some("not a url".to_string());
        config.remote.api_url = Some("https://api.example.com".to_string());

        let result = CloudSave::from_config(&config, Path::new("cloudsave.yaml"));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidSetting {
                setting: "remote.auth_url",
                ..
            })
        ));
    }

    #[test]
    fn validate_keys_rejects_empty() {
        let keys = vec!["a".to_string(), String::new()];
        assert!(matches!(
            validate_keys(keys.iter()),
            Err(CloudSaveError::InvalidRequest(_))
        ));
    }
}
