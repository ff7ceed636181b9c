//! Anonymous sign-in against a remote authentication service.
//!
//! The session token from the last successful sign-in is cached in
//! `{workspace}/session.json` and exchanged on the next run, so the player
//! keeps the same id across restarts. A rejected token falls back to a fresh
//! anonymous sign-in.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use reqwest::{Method, Url};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{debug, warn};

use super::error::{AuthError, AuthResult};
use super::session::Session;
use super::IdentityProvider;
use crate::client::{self, ServiceClient};
use crate::store::file::write_atomic;

/// File name of the cached session token, relative to the workspace.
pub const SESSION_CACHE_FILE: &str = "session.json";

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CachedSession {
    player_id: String,
    session_token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionTokenRequest<'a> {
    session_token: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    user_id: String,
    id_token: String,
    #[serde(default)]
    session_token: Option<String>,
    /// Lifetime of `id_token` in seconds.
    #[serde(default)]
    expires_in: Option<i64>,
}

impl SignInResponse {
    fn into_session(self) -> AuthResult<Session> {
        if self.user_id.is_empty() || self.id_token.is_empty() {
            return Err(AuthError::InvalidResponse(
                "sign-in response is missing userId or idToken".to_string(),
            ));
        }

        let mut session = Session::new(self.user_id, self.id_token);
        if let Some(token) = self.session_token {
            session = session.with_session_token(token);
        }
        if let Some(seconds) = self.expires_in {
            let expires_at = Duration::try_seconds(seconds)
                .filter(|lifetime| *lifetime >= Duration::zero())
                .and_then(|lifetime| Utc::now().checked_add_signed(lifetime))
                .ok_or_else(|| {
                    AuthError::InvalidResponse(format!("expiresIn out of range: {}", seconds))
                })?;
            session = session.with_expiry(expires_at);
        }
        Ok(session)
    }
}

/// Identity provider backed by a remote authentication service.
#[derive(Debug, Clone)]
pub struct HttpIdentityProvider {
    client: ServiceClient,
    auth_url: Url,
    cache_path: PathBuf,
}

impl HttpIdentityProvider {
    /// Create a provider that caches its session token inside `workspace`.
    pub fn new(client: ServiceClient, auth_url: Url, workspace: impl AsRef<Path>) -> Self {
        Self {
            client,
            auth_url,
            cache_path: workspace.as_ref().join(SESSION_CACHE_FILE),
        }
    }

    pub fn cache_path(&self) -> &Path {
        &self.cache_path
    }

    async fn anonymous(&self) -> AuthResult<Session> {
        let url = client::join_segments(&self.auth_url, ["v1", "authentication", "anonymous"]);
        let response = self
            .client
            .request(Method::POST, url)
            .json(&serde_json::json!({}))
            .send()
            .await?;
        Self::session_response(response).await
    }

    async fn resume(&self, session_token: &str) -> AuthResult<Session> {
        let url =
            client::join_segments(&self.auth_url, ["v1", "authentication", "session-token"]);
        let response = self
            .client
            .request(Method::POST, url)
            .json(&SessionTokenRequest { session_token })
            .send()
            .await?;
        Self::session_response(response).await
    }

    async fn session_response(response: reqwest::Response) -> AuthResult<Session> {
        if !response.status().is_success() {
            let (status, message) = client::error_message(response).await;
            return Err(AuthError::Rejected { status, message });
        }

        let body: SignInResponse = response
            .json()
            .await
            .map_err(|e| AuthError::InvalidResponse(e.to_string()))?;
        body.into_session()
    }

    /// Read the cached session token, ignoring a cache that cannot be parsed.
    async fn load_cache(&self) -> AuthResult<Option<CachedSession>> {
        let contents = match fs::read_to_string(&self.cache_path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(AuthError::credentials(&self.cache_path, e)),
        };

        match serde_json::from_str(&contents) {
            Ok(cached) => Ok(Some(cached)),
            Err(e) => {
                warn!(path = %self.cache_path.display(), error = %e, "Ignoring unreadable session cache");
                Ok(None)
            }
        }
    }

    async fn store_cache(&self, session: &Session) -> AuthResult<()> {
        let Some(session_token) = session.session_token() else {
            return Ok(());
        };

        let cached = CachedSession {
            player_id: session.player_id().to_string(),
            session_token: session_token.to_string(),
        };
        let contents = serde_json::to_vec_pretty(&cached)
            .map_err(|e| AuthError::corrupt_credentials(&self.cache_path, e.to_string()))?;

        write_atomic(&self.cache_path, &contents)
            .await
            .map_err(|e| AuthError::credentials(&self.cache_path, e))
    }

    async fn clear_cache(&self) -> AuthResult<()> {
        match fs::remove_file(&self.cache_path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AuthError::credentials(&self.cache_path, e)),
        }
    }
}

/// Whether a rejected resume means the cached token is no longer usable.
fn is_stale_token(status: u16) -> bool {
    matches!(status, 400 | 401 | 403 | 404)
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn sign_in_anonymously(&self) -> AuthResult<Session> {
        if let Some(cached) = self.load_cache().await? {
            match self.resume(&cached.session_token).await {
                Ok(session) => {
                    debug!(player_id = %session.player_id(), "Resumed cached session");
                    self.store_cache(&session).await?;
                    return Ok(session);
                }
                Err(AuthError::Rejected { status, message }) if is_stale_token(status) => {
                    warn!(
                        player_id = %cached.player_id,
                        status,
                        message = %message,
                        "Cached session token rejected, signing in anonymously"
                    );
                    self.clear_cache().await?;
                }
                Err(e) => return Err(e),
            }
        }

        let session = self.anonymous().await?;
        self.store_cache(&session).await?;
        Ok(session)
    }
}
