//! Storage backends for player records and blobs.
//!
//! Defines the `RecordStore` and `BlobStore` traits along with two
//! implementations:
//! - `file`: local workspace emulation of the remote service
//! - `http`: remote service over HTTP

pub mod blob;
pub mod error;
pub mod file;
pub mod http;
pub mod record;

pub use blob::BlobStore;
pub use error::{StorageError, StorageResult};
pub use record::RecordStore;
