//! Cloudsave - typed key-value and blob persistence for anonymously signed-in players.
//!
//! The [`CloudSave`] façade signs a player in once, then saves and loads
//! typed records and uploads and downloads opaque blobs through pluggable
//! backends (a local workspace emulation or a remote HTTP service).

pub mod auth;
pub mod build_info;
pub mod client;
pub mod config;
pub mod error;
pub mod facade;
pub mod model;
pub mod store;
pub mod sync;
pub mod value;

pub use auth::Session;
pub use error::{CloudSaveError, Result};
pub use facade::CloudSave;
pub use model::{ItemRecord, PlayerRecord};
pub use value::{RecordFields, RecordValue};
