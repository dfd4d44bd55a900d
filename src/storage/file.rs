// src/storage/file.rs

//! JSON-file product store.
//!
//! One file per category under a root directory, each holding that
//! category's records sorted by capture time descending. An absent file
//! or directory reads as an empty universe; unreadable or unwritable
//! files are real errors that fail the surrounding scan.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::ProductRecord;
use crate::storage::{ProductStore, group_by_category};

/// Filesystem-backed product store.
#[derive(Debug, Clone)]
pub struct FileStore {
    root_dir: PathBuf,
}

impl FileStore {
    /// Create a store rooted at the given directory.
    ///
    /// The directory is created lazily on first write.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    /// File path for one category.
    fn category_path(&self, category: &str) -> PathBuf {
        self.root_dir.join(format!("{category}.json"))
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }

    /// Write JSON data.
    async fn write_json<T: Serialize + ?Sized>(&self, path: &Path, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(value)?;
        self.write_bytes(path, &bytes).await
    }

    /// Read JSON data, returning None if the file doesn't exist.
    async fn read_json<T: DeserializeOwned>(&self, path: &Path) -> Result<Option<T>> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// List the category JSON files currently on disk.
    async fn category_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        let mut entries = match tokio::fs::read_dir(&self.root_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(files),
            Err(e) => return Err(AppError::Io(e)),
        };

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

#[async_trait]
impl ProductStore for FileStore {
    async fn load(&self) -> Result<HashMap<String, ProductRecord>> {
        let mut universe = HashMap::new();
        for (_, records) in self.by_category().await? {
            for record in records {
                universe.insert(record.id.clone(), record);
            }
        }
        Ok(universe)
    }

    async fn replace(&self, records: &[ProductRecord]) -> Result<()> {
        let grouped = group_by_category(records.iter().cloned());

        for (category, records) in &grouped {
            let path = self.category_path(category);
            self.write_json(&path, records).await?;
            log::debug!("Wrote {} records to {}", records.len(), path.display());
        }

        // The store reflects only the latest scan; files for categories
        // that produced nothing this time are stale and must go.
        for path in self.category_files().await? {
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default();
            if !grouped.contains_key(&stem) {
                log::debug!("Removing stale category file {}", path.display());
                tokio::fs::remove_file(&path).await?;
            }
        }

        Ok(())
    }

    async fn by_category(&self) -> Result<BTreeMap<String, Vec<ProductRecord>>> {
        let mut grouped = BTreeMap::new();
        for path in self.category_files().await? {
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default();
            if let Some(records) = self.read_json::<Vec<ProductRecord>>(&path).await? {
                grouped.insert(stem, records);
            }
        }
        Ok(grouped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn make_record(id: &str, category: &str, time: &str) -> ProductRecord {
        ProductRecord {
            id: id.to_string(),
            title: format!("Product {id}"),
            price: "$ 1.000".to_string(),
            link: format!("https://www.mercadolibre.cl/{id}"),
            image: String::new(),
            category: category.to_string(),
            page: 1,
            scanned_time: time.to_string(),
            scanned_date: "2026-08-07".to_string(),
        }
    }

    #[tokio::test]
    async fn test_missing_directory_reads_empty() {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::new(tmp.path().join("does-not-exist"));
        assert!(store.load().await.unwrap().is_empty());
        assert!(store.by_category().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_replace_then_load_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::new(tmp.path());

        store
            .replace(&[
                make_record("MLC1", "celulares", "09:00:00"),
                make_record("MLC2", "notebooks", "10:00:00"),
            ])
            .await
            .unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded["MLC1"].category, "celulares");

        assert!(tmp.path().join("celulares.json").exists());
        assert!(tmp.path().join("notebooks.json").exists());
    }

    #[tokio::test]
    async fn test_records_sorted_newest_first_on_disk() {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::new(tmp.path());

        store
            .replace(&[
                make_record("MLC1", "celulares", "09:00:00"),
                make_record("MLC2", "celulares", "11:00:00"),
                make_record("MLC3", "celulares", "10:00:00"),
            ])
            .await
            .unwrap();

        let grouped = store.by_category().await.unwrap();
        let ids: Vec<&str> = grouped["celulares"].iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["MLC2", "MLC3", "MLC1"]);
    }

    #[tokio::test]
    async fn test_replace_drops_vanished_categories() {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::new(tmp.path());

        store
            .replace(&[
                make_record("MLC1", "celulares", "09:00:00"),
                make_record("MLC2", "notebooks", "09:00:00"),
            ])
            .await
            .unwrap();
        store
            .replace(&[make_record("MLC3", "celulares", "10:00:00")])
            .await
            .unwrap();

        assert!(!tmp.path().join("notebooks.json").exists());
        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert!(loaded.contains_key("MLC3"));
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::new(tmp.path());

        tokio::fs::write(tmp.path().join("celulares.json"), b"not json")
            .await
            .unwrap();
        assert!(store.load().await.is_err());
    }

    #[tokio::test]
    async fn test_durable_across_store_instances() {
        let tmp = TempDir::new().unwrap();
        {
            let store = FileStore::new(tmp.path());
            store
                .replace(&[make_record("MLC1", "celulares", "09:00:00")])
                .await
                .unwrap();
        }

        let reopened = FileStore::new(tmp.path());
        let loaded = reopened.load().await.unwrap();
        assert!(loaded.contains_key("MLC1"));
    }
}
