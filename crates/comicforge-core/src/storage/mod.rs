//! Key-value blob storage for persistence.

mod memory;

#[cfg(not(target_arch = "wasm32"))]
mod file;

#[cfg(target_arch = "wasm32")]
mod local;

pub use memory::MemoryBlobStore;

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileBlobStore;

#[cfg(target_arch = "wasm32")]
pub use local::LocalBlobStore;

use thiserror::Error;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Key not found: {0}")]
    NotFound(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Storage error: {0}")]
    Other(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for blob storage backends.
///
/// A blob store maps fixed string keys to serialized text blobs. Writes
/// complete before the call returns.
///
/// Note: On native platforms, implementations must be Send + Sync.
/// On WASM, these bounds are relaxed since it's single-threaded.
#[cfg(not(target_arch = "wasm32"))]
pub trait BlobStore: Send + Sync {
    /// Store a blob under `key`, replacing any previous value.
    fn save(&self, key: &str, blob: &str) -> StorageResult<()>;

    /// Load the blob stored under `key`.
    fn load(&self, key: &str) -> StorageResult<String>;

    /// Delete the blob under `key`. Deleting a missing key is not an error.
    fn delete(&self, key: &str) -> StorageResult<()>;

    /// List all keys.
    fn list(&self) -> StorageResult<Vec<String>>;

    /// Check if a key exists.
    fn exists(&self, key: &str) -> StorageResult<bool>;
}

/// Trait for blob storage backends (WASM version without Send + Sync).
#[cfg(target_arch = "wasm32")]
pub trait BlobStore {
    /// Store a blob under `key`, replacing any previous value.
    fn save(&self, key: &str, blob: &str) -> StorageResult<()>;

    /// Load the blob stored under `key`.
    fn load(&self, key: &str) -> StorageResult<String>;

    /// Delete the blob under `key`. Deleting a missing key is not an error.
    fn delete(&self, key: &str) -> StorageResult<()>;

    /// List all keys.
    fn list(&self) -> StorageResult<Vec<String>>;

    /// Check if a key exists.
    fn exists(&self, key: &str) -> StorageResult<bool>;
}

/// Map a `load` result to presence: `NotFound` means absent, other errors propagate.
#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
pub(crate) fn presence(loaded: StorageResult<String>) -> StorageResult<bool> {
    match loaded {
        Ok(_) => Ok(true),
        Err(StorageError::NotFound(_)) => Ok(false),
        Err(e) => Err(e),
    }
}

/// Create a platform-appropriate blob store.
#[cfg(not(target_arch = "wasm32"))]
pub fn create_default_store() -> StorageResult<FileBlobStore> {
    FileBlobStore::default_location()
}

#[cfg(target_arch = "wasm32")]
pub fn create_default_store() -> StorageResult<LocalBlobStore> {
    LocalBlobStore::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presence_propagates_read_errors() {
        assert!(presence(Ok("{}".to_string())).unwrap());
        assert!(!presence(Err(StorageError::NotFound("k".to_string()))).unwrap());
        assert!(matches!(
            presence(Err(StorageError::Io("denied".to_string()))),
            Err(StorageError::Io(_))
        ));
    }
}
