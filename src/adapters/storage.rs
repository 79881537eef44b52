use crate::domain::ports::Storage;
use crate::utils::error::{AddressError, Result};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

/// Reads reference data from a directory on disk.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}

impl Storage for LocalStorage {
    fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let full_path = self.base_path.join(path);
        tracing::debug!("Reading {}", full_path.display());
        let data = fs::read(full_path)?;
        Ok(data)
    }
}

/// In-memory reference data, mostly for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    files: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, path: impl Into<String>, data: impl Into<Vec<u8>>) {
        let mut files = self.files.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        files.insert(path.into(), data.into());
    }

    pub fn insert_json(&self, path: impl Into<String>, value: &serde_json::Value) -> Result<()> {
        self.insert(path, serde_json::to_vec(value)?);
        Ok(())
    }
}

impl Storage for MemoryStorage {
    fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let files = self.files.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        files
            .get(path)
            .cloned()
            .ok_or_else(|| AddressError::NotFoundError {
                path: path.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_local_storage_reads_relative_paths() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join("address_format")).unwrap();
        fs::write(temp_dir.path().join("address_format/DE.json"), b"{}").unwrap();

        let storage = LocalStorage::new(temp_dir.path());
        assert_eq!(storage.read_file("address_format/DE.json").unwrap(), b"{}");

        let err = storage.read_file("address_format/XX.json").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_memory_storage_clones_share_files() {
        let storage = MemoryStorage::new();
        let clone = storage.clone();
        storage
            .insert_json("subdivision/US.json", &serde_json::json!({"country_code": "US"}))
            .unwrap();

        assert!(clone.read_file("subdivision/US.json").is_ok());
        assert!(clone.read_file("subdivision/BR.json").unwrap_err().is_not_found());
    }
}
