//! Errors reported by the [`CloudSave`](crate::CloudSave) façade.

use thiserror::Error;

use crate::auth::AuthError;
use crate::store::StorageError;

/// Result type for façade operations.
pub type Result<T> = std::result::Result<T, CloudSaveError>;

/// Failure kinds surfaced to callers.
///
/// The façade never retries; every backend failure ends up here with the
/// operation it interrupted and, where there is one, the offending key.
#[derive(Debug, Error)]
pub enum CloudSaveError {
    /// Anonymous sign-in failed.
    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),

    /// No valid session: `initialize()` has not succeeded, the session has
    /// expired, or the backend rejected its credentials.
    #[error("not authenticated")]
    NotAuthenticated,

    /// Saving records failed.
    #[error("failed to save records: {source}")]
    RemoteWrite {
        #[source]
        source: StorageError,
    },

    /// Loading records or listing blobs failed.
    #[error("failed to read from remote store: {source}")]
    RemoteRead {
        #[source]
        source: StorageError,
    },

    /// Uploading a blob failed.
    #[error("failed to upload blob '{key}': {source}")]
    BlobWrite {
        key: String,
        #[source]
        source: StorageError,
    },

    /// Downloading a blob failed.
    #[error("failed to download blob '{key}': {source}")]
    BlobRead {
        key: String,
        #[source]
        source: StorageError,
    },

    /// The stored value cannot be decoded as the requested type.
    #[error("value at '{key}' is not a {expected}: {message}")]
    TypeMismatch {
        key: String,
        expected: &'static str,
        message: String,
    },

    /// Nothing is stored under the key.
    #[error("key not found: {key}")]
    KeyNotFound { key: String },

    /// The call itself is malformed (empty key set, empty key, ...).
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl CloudSaveError {
    /// Create a key not found error.
    pub fn key_not_found(key: impl Into<String>) -> Self {
        Self::KeyNotFound { key: key.into() }
    }

    /// Create an invalid request error.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Map a storage error from a record save.
    pub(crate) fn remote_write(source: StorageError) -> Self {
        if source.is_unauthorized() {
            return Self::NotAuthenticated;
        }
        Self::RemoteWrite { source }
    }

    /// Map a storage error from a record load or blob listing.
    pub(crate) fn remote_read(source: StorageError) -> Self {
        if source.is_unauthorized() {
            return Self::NotAuthenticated;
        }
        Self::RemoteRead { source }
    }

    /// Map a storage error from a blob upload.
    pub(crate) fn blob_write(key: &str, source: StorageError) -> Self {
        if source.is_unauthorized() {
            return Self::NotAuthenticated;
        }
        Self::BlobWrite {
            key: key.to_string(),
            source,
        }
    }

    /// Map a storage error from a blob download.
    pub(crate) fn blob_read(key: &str, source: StorageError) -> Self {
        match source {
            StorageError::NotFound { .. } => Self::key_not_found(key),
            source if source.is_unauthorized() => Self::NotAuthenticated,
            source => Self::BlobRead {
                key: key.to_string(),
                source,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_storage_errors_become_not_authenticated() {
        let unauthorized = || StorageError::Unauthorized { status: 401 };

        assert!(matches!(
            CloudSaveError::remote_write(unauthorized()),
            CloudSaveError::NotAuthenticated
        ));
        assert!(matches!(
            CloudSaveError::remote_read(unauthorized()),
            CloudSaveError::NotAuthenticated
        ));
        assert!(matches!(
            CloudSaveError::blob_write("k", unauthorized()),
            CloudSaveError::NotAuthenticated
        ));
        assert!(matches!(
            CloudSaveError::blob_read("k", unauthorized()),
            CloudSaveError::NotAuthenticated
        ));
    }

    #[test]
    fn missing_blob_becomes_key_not_found() {
        let err = CloudSaveError::blob_read("shot.png", StorageError::not_found("blob", "shot.png"));
        match err {
            CloudSaveError::KeyNotFound { key } => assert_eq!(key, "shot.png"),
            other => panic!("expected KeyNotFound, got {other:?}"),
        }
    }

    #[test]
    fn other_failures_keep_their_source() {
        let err = CloudSaveError::remote_write(StorageError::Api {
            status: 500,
            message: "boom".to_string(),
        });
        assert!(matches!(err, CloudSaveError::RemoteWrite { .. }));
        assert!(err.to_string().contains("boom"));
    }
}
