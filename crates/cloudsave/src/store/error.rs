//! Unified error types for storage operations.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    // ========================================================================
    // File-based backend errors
    // ========================================================================
    /// I/O error during file operations.
    #[error("I/O error at {path}: {source}")]
    FileIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error deserializing file contents.
    #[error("deserialization error at {path}: {message}")]
    FileDeserialization { path: PathBuf, message: String },

    /// Schema version mismatch in file.
    #[error("incompatible schema version {found} at {path}, expected {expected}")]
    FileIncompatibleSchema {
        path: PathBuf,
        expected: u32,
        found: u32,
    },

    // ========================================================================
    // HTTP backend errors
    // ========================================================================
    /// The request never produced a response (connect, timeout, body).
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with an error status.
    #[error("api error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The service rejected the session's credentials.
    #[error("credentials rejected ({status})")]
    Unauthorized { status: u16 },

    // ========================================================================
    // Generic errors (any backend)
    // ========================================================================
    /// Error serializing data.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A player id or key cannot be represented by this backend.
    #[error("invalid {kind} '{name}': {reason}")]
    InvalidName {
        kind: &'static str,
        name: String,
        reason: &'static str,
    },

    /// Entity not found.
    #[error("{entity_type} not found: {id}")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },
}

impl StorageError {
    /// Create a file I/O error with path context.
    pub fn file_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileIo {
            path: path.into(),
            source,
        }
    }

    /// Create a file deserialization error with path context.
    pub fn file_deserialization(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::FileDeserialization {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a file schema incompatibility error.
    pub fn file_incompatible_schema(path: impl Into<PathBuf>, expected: u32, found: u32) -> Self {
        Self::FileIncompatibleSchema {
            path: path.into(),
            expected,
            found,
        }
    }

    /// Create a serialization error.
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization(message.into())
    }

    /// Create an invalid name error.
    pub fn invalid_name(kind: &'static str, name: impl Into<String>, reason: &'static str) -> Self {
        Self::InvalidName {
            kind,
            name: name.into(),
            reason,
        }
    }

    /// Create a not found error.
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Whether the backend refused the session rather than the request.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }
}

/// Convenience type alias for storage results.
pub type StorageResult<T> = Result<T, StorageError>;
