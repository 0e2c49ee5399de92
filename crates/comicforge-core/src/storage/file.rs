//! File-based blob store for native platforms.

use super::{BlobStore, StorageError, StorageResult};
use std::fs;
use std::path::{Path, PathBuf};

/// File-based blob store for native platforms.
///
/// Stores each key as a JSON file in a specified directory.
pub struct FileBlobStore {
    /// Base directory for blob files.
    base_path: PathBuf,
}

impl FileBlobStore {
    /// Create a new file store with the given base directory.
    ///
    /// Creates the directory if it doesn't exist.
    pub fn new(base_path: PathBuf) -> StorageResult<Self> {
        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(|e| {
                StorageError::Io(format!("Failed to create storage directory: {}", e))
            })?;
        }
        Ok(Self { base_path })
    }

    /// Create a file store in the default location.
    ///
    /// On Unix: `~/.local/share/comicforge/store/`
    /// On Windows: `%LOCALAPPDATA%\comicforge\store\`
    pub fn default_location() -> StorageResult<Self> {
        let base = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| StorageError::Io("Could not determine home directory".to_string()))?;

        Self::new(base.join("comicforge").join("store"))
    }

    /// Get the file path for a key.
    fn blob_path(&self, key: &str) -> PathBuf {
        // Sanitize key to be safe for filenames
        let safe_key: String = key
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.base_path.join(format!("{}.json", safe_key))
    }

    /// Get the base path.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}

impl BlobStore for FileBlobStore {
    fn save(&self, key: &str, blob: &str) -> StorageResult<()> {
        let path = self.blob_path(key);
        fs::write(&path, blob)
            .map_err(|e| StorageError::Io(format!("Failed to write {}: {}", path.display(), e)))
    }

    fn load(&self, key: &str) -> StorageResult<String> {
        let path = self.blob_path(key);
        if !path.exists() {
            return Err(StorageError::NotFound(key.to_string()));
        }
        fs::read_to_string(&path)
            .map_err(|e| StorageError::Io(format!("Failed to read {}: {}", path.display(), e)))
    }

    fn delete(&self, key: &str) -> StorageResult<()> {
        let path = self.blob_path(key);
        if path.exists() {
            fs::remove_file(&path).map_err(|e| {
                StorageError::Io(format!("Failed to delete {}: {}", path.display(), e))
            })?;
        }
        Ok(())
    }

    fn list(&self) -> StorageResult<Vec<String>> {
        if !self.base_path.exists() {
            return Ok(vec![]);
        }

        let entries = fs::read_dir(&self.base_path)
            .map_err(|e| StorageError::Io(format!("Failed to read directory: {}", e)))?;

        let mut keys = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().map(|e| e == "json").unwrap_or(false) {
                if let Some(name) = path.file_stem().and_then(|n| n.to_str()) {
                    keys.push(name.to_string());
                }
            }
        }
        Ok(keys)
    }

    fn exists(&self, key: &str) -> StorageResult<bool> {
        Ok(self.blob_path(key).exists())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_file_store_save_load() {
        let dir = tempdir().unwrap();
        let store = FileBlobStore::new(dir.path().to_path_buf()).unwrap();

        store.save("projects", "[{\"id\":\"p1\"}]").unwrap();
        assert_eq!(store.load("projects").unwrap(), "[{\"id\":\"p1\"}]");
    }

    #[test]
    fn test_file_store_creates_directory() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let store = FileBlobStore::new(nested.clone()).unwrap();
        assert!(nested.exists());
        assert_eq!(store.base_path(), nested.as_path());
    }

    #[test]
    fn test_file_store_not_found() {
        let dir = tempdir().unwrap();
        let store = FileBlobStore::new(dir.path().to_path_buf()).unwrap();

        let result = store.load("nonexistent");
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[test]
    fn test_file_store_list() {
        let dir = tempdir().unwrap();
        let store = FileBlobStore::new(dir.path().to_path_buf()).unwrap();

        store.save("projects", "[]").unwrap();
        store.save("characters", "[]").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let list = store.list().unwrap();
        assert_eq!(list.len(), 2);
        assert!(list.contains(&"projects".to_string()));
        assert!(list.contains(&"characters".to_string()));
    }

    #[test]
    fn test_file_store_delete() {
        let dir = tempdir().unwrap();
        let store = FileBlobStore::new(dir.path().to_path_buf()).unwrap();

        store.save("projects", "[]").unwrap();
        assert!(store.exists("projects").unwrap());

        store.delete("projects").unwrap();
        assert!(!store.exists("projects").unwrap());
    }

    #[test]
    fn test_file_store_sanitizes_key() {
        let dir = tempdir().unwrap();
        let store = FileBlobStore::new(dir.path().to_path_buf()).unwrap();

        store.save("user/projects:v1", "[]").unwrap();
        assert_eq!(store.load("user/projects:v1").unwrap(), "[]");
    }
}
