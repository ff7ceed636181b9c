//! Workspace-backed anonymous identity.
//!
//! The first sign-in generates a player id and stores it in
//! `{workspace}/player.json`; later sign-ins reuse it.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::debug;
use ulid::Ulid;

use super::error::{AuthError, AuthResult};
use super::session::Session;
use super::IdentityProvider;
use crate::store::file::write_atomic;

/// File name of the stored player identity, relative to the workspace.
pub const PLAYER_FILE: &str = "player.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlayerCredentials {
    player_id: String,
    created_at: DateTime<Utc>,
}

/// Identity provider that keeps the player id on local disk.
#[derive(Debug, Clone)]
pub struct LocalIdentityProvider {
    credentials_path: PathBuf,
}

impl LocalIdentityProvider {
    /// Create a provider storing its identity inside `workspace`.
    pub fn new(workspace: impl AsRef<Path>) -> Self {
        Self {
            credentials_path: workspace.as_ref().join(PLAYER_FILE),
        }
    }

    pub fn credentials_path(&self) -> &Path {
        &self.credentials_path
    }

    async fn load_credentials(&self) -> AuthResult<Option<PlayerCredentials>> {
        let path = &self.credentials_path;
        let contents = match fs::read_to_string(path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(AuthError::credentials(path, e)),
        };

        serde_json::from_str(&contents)
            .map(Some)
            .map_err(|e| AuthError::corrupt_credentials(path, e.to_string()))
    }

    async fn create_credentials(&self) -> AuthResult<PlayerCredentials> {
        let credentials = PlayerCredentials {
            player_id: Ulid::new().to_string(),
            created_at: Utc::now(),
        };
        let contents = serde_json::to_vec_pretty(&credentials)
            .map_err(|e| AuthError::corrupt_credentials(&self.credentials_path, e.to_string()))?;

        write_atomic(&self.credentials_path, &contents)
            .await
            .map_err(|e| AuthError::credentials(&self.credentials_path, e))?;

        debug!(player_id = %credentials.player_id, "Created local player identity");
        Ok(credentials)
    }
}

#[async_trait]
impl IdentityProvider for LocalIdentityProvider {
    async fn sign_in_anonymously(&self) -> AuthResult<Session> {
        let credentials = match self.load_credentials().await? {
            Some(c) => c,
            None => self.create_credentials().await?,
        };

        let token = format!("local.{}", credentials.player_id);
        Ok(Session::new(credentials.player_id, token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn first_sign_in_creates_player_file() {
        let temp_dir = TempDir::new().unwrap();
        let provider = LocalIdentityProvider::new(temp_dir.path().join("workspace"));

        let session = provider.sign_in_anonymously().await.unwrap();

        assert!(!session.player_id().is_empty());
        assert!(provider.credentials_path().exists());
    }

    #[tokio::test]
    async fn sign_in_reuses_player_id() {
        let temp_dir = TempDir::new().unwrap();
        let provider = LocalIdentityProvider::new(temp_dir.path());

        let first = provider.sign_in_anonymously().await.unwrap();
        let second = LocalIdentityProvider::new(temp_dir.path())
            .sign_in_anonymously()
            .await
            .unwrap();

        assert_eq!(first.player_id(), second.player_id());
    }

    #[tokio::test]
    async fn corrupt_player_file_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join(PLAYER_FILE), "not json").unwrap();

        let provider = LocalIdentityProvider::new(temp_dir.path());
        let err = provider.sign_in_anonymously().await.unwrap_err();

        assert!(matches!(err, AuthError::CorruptCredentials { .. }));
    }
}
