//! Browser `localStorage` blob store for WASM.

use super::{BlobStore, StorageError, StorageResult};
use web_sys::Storage;

/// Blob store backed by the browser's `localStorage`.
pub struct LocalBlobStore {
    storage: Storage,
}

impl LocalBlobStore {
    /// Open the window's local storage area.
    pub fn new() -> StorageResult<Self> {
        let window = web_sys::window()
            .ok_or_else(|| StorageError::Other("No window available".to_string()))?;
        let storage = window
            .local_storage()
            .map_err(|e| StorageError::Other(format!("localStorage unavailable: {:?}", e)))?
            .ok_or_else(|| StorageError::Other("localStorage disabled".to_string()))?;
        Ok(Self { storage })
    }
}

impl BlobStore for LocalBlobStore {
    fn save(&self, key: &str, blob: &str) -> StorageResult<()> {
        self.storage
            .set_item(key, blob)
            .map_err(|e| StorageError::Io(format!("Failed to write {}: {:?}", key, e)))
    }

    fn load(&self, key: &str) -> StorageResult<String> {
        self.storage
            .get_item(key)
            .map_err(|e| StorageError::Io(format!("Failed to read {}: {:?}", key, e)))?
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    fn delete(&self, key: &str) -> StorageResult<()> {
        self.storage
            .remove_item(key)
            .map_err(|e| StorageError::Io(format!("Failed to delete {}: {:?}", key, e)))
    }

    fn list(&self) -> StorageResult<Vec<String>> {
        let len = self
            .storage
            .length()
            .map_err(|e| StorageError::Io(format!("Failed to list keys: {:?}", e)))?;
        let mut keys = Vec::with_capacity(len as usize);
        for i in 0..len {
            if let Ok(Some(key)) = self.storage.key(i) {
                keys.push(key);
            }
        }
        Ok(keys)
    }

    fn exists(&self, key: &str) -> StorageResult<bool> {
        super::presence(self.load(key))
    }
}
