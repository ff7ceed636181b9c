use std::fmt;

use chrono::{DateTime, Utc};

/// Authenticated player identity shared by every remote call.
///
/// Tokens are kept out of the `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    player_id: String,
    access_token: String,
    session_token: Option<String>,
    expires_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn new(player_id: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            player_id: player_id.into(),
            access_token: access_token.into(),
            session_token: None,
            expires_at: None,
        }
    }

    /// Attach a long-lived token that can resume this player's identity later.
    pub fn with_session_token(mut self, token: impl Into<String>) -> Self {
        self.session_token = Some(token.into());
        self
    }

    /// Attach the instant the access token stops being accepted.
    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn player_id(&self) -> &str {
        &self.player_id
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn session_token(&self) -> Option<&str> {
        self.session_token.as_deref()
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// Whether the access token has expired as of `now`.
    ///
    /// Sessions without an expiry never expire.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("player_id", &self.player_id)
            .field("access_token", &"<redacted>")
            .field(
                "session_token",
                &self.session_token.as_ref().map(|_| "<redacted>"),
            )
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
