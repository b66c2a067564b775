//! Persistent key-value storage for storefront state.
//!
//! # Architecture
//!
//! - String keys, string values (JSON-encoded unless noted), the same model
//!   as browser local storage
//! - [`MemoryStore`] for tests and single-session use
//! - [`FileStore`] keeps one file per key under a directory
//!
//! # Keys
//!
//! | Key | Contents |
//! |---|---|
//! | `products` | ordered product list |
//! | `productsTimestamp` | epoch milliseconds of the last source fetch |
//! | `hasAdminEdits` | `"true"` / `"false"` |
//! | `adminProducts` | admin working copy |
//! | `cart` | cart lines |
//! | `orders` | recorded orders |
//!
//! Reads are tolerant: a value that fails to parse is logged and treated as
//! absent. There is no locking across processes; the last writer wins.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::warn;

/// Well-known storage keys.
pub mod keys {
    pub const PRODUCTS: &str = "products";
    pub const PRODUCTS_TIMESTAMP: &str = "productsTimestamp";
    pub const HAS_ADMIN_EDITS: &str = "hasAdminEdits";
    pub const ADMIN_PRODUCTS: &str = "adminProducts";
    pub const CART: &str = "cart";
    pub const ORDERS: &str = "orders";

    /// Every key the storefront writes.
    pub const ALL: [&str; 6] = [
        PRODUCTS,
        PRODUCTS_TIMESTAMP,
        HAS_ADMIN_EDITS,
        ADMIN_PRODUCTS,
        CART,
        ORDERS,
    ];
}

/// Errors raised by storage backends.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem operation failed.
    #[error("I/O error on key {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// Value could not be encoded.
    #[error("Failed to encode value for key {key}: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// String-keyed persistent storage.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a raw value.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a raw value, replacing any previous one.
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete a value. Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Read a raw value, treating backend failures as absence.
pub async fn read_raw(store: &dyn KeyValueStore, key: &str) -> Option<String> {
    match store.get(key).await {
        Ok(value) => value,
        Err(e) => {
            warn!(key, error = %e, "Storage read failed, treating as absent");
            None
        }
    }
}

/// Read and decode a JSON value, treating malformed data as absence.
pub async fn read_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    let raw = read_raw(store, key).await?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(key, error = %e, "Malformed value in storage, treating as absent");
            None
        }
    }
}

/// Encode and write a JSON value.
///
/// # Errors
///
/// Returns `StorageError::Encode` if serialization fails, or the backend's
/// error if the write fails.
pub async fn write_json<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let raw = serde_json::to_string(value).map_err(|source| StorageError::Encode {
        key: key.to_string(),
        source,
    })?;
    store.set(key, &raw).await
}
