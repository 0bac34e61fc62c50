//! FileGate Storage Library
//!
//! Blob storage for uploaded spreadsheets: the [`Storage`] trait and a local
//! filesystem implementation.
//!
//! # Storage key format
//!
//! Keys are relative to the storage root and never absolute:
//!
//! `files/{tenant_id}/{file_id}/{filename}`
//!
//! Keys must not contain `..` or a leading `/`. The key is resolved against the
//! configured root on every access, so the root can move without rewriting
//! stored metadata.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
pub mod traits;

pub use factory::create_storage;
pub use keys::file_key;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
pub use traits::{Storage, StorageBackend, StorageError, StorageResult};
