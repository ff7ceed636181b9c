//! Identity provider error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while signing a player in.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The identity provider could not be reached.
    #[error("identity provider unreachable: {0}")]
    Http(#[from] reqwest::Error),

    /// The identity provider refused the sign-in request.
    #[error("sign-in rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// Reading or writing stored credentials failed.
    #[error("credentials I/O error at {path}: {source}")]
    Credentials {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Stored credentials exist but cannot be parsed.
    #[error("unreadable credentials at {path}: {message}")]
    CorruptCredentials { path: PathBuf, message: String },

    /// The identity provider answered with something other than a session.
    #[error("invalid identity provider response: {0}")]
    InvalidResponse(String),
}

impl AuthError {
    /// Create a credentials I/O error with path context.
    pub fn credentials(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Credentials {
            path: path.into(),
            source,
        }
    }

    /// Create a corrupt credentials error with path context.
    pub fn corrupt_credentials(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::CorruptCredentials {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Convenience type alias for sign-in results.
pub type AuthResult<T> = Result<T, AuthError>;
