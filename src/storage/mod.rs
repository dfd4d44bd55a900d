// src/storage/mod.rs

//! Product store abstractions.
//!
//! The store holds the last known universe of products, keyed by id, and
//! is replaced wholesale at the end of every scan. Two backends implement
//! the same trait: a process-lifetime map and a JSON-file layout with one
//! file per category. The stateless deployment simply constructs no store.
//!
//! ## File layout (file mode)
//!
//! ```text
//! {root}/
//! ├── celulares.json        # records, capture time descending
//! └── notebooks.json
//! ```

pub mod file;
pub mod memory;

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{ProductRecord, StorageConfig, StorageMode};

// Re-export for convenience
pub use file::FileStore;
pub use memory::MemoryStore;

/// Trait for product store backends.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Load the stored universe as an id-keyed map.
    async fn load(&self) -> Result<HashMap<String, ProductRecord>>;

    /// Replace the stored universe with the given records.
    ///
    /// Records absent from `records` are gone afterwards; the store
    /// reflects only the latest scan.
    async fn replace(&self, records: &[ProductRecord]) -> Result<()>;

    /// Load the stored universe grouped by category, newest first.
    async fn by_category(&self) -> Result<BTreeMap<String, Vec<ProductRecord>>>;

    /// Stored records whose id the client does not already know,
    /// grouped by category. Categories left empty by the filter are
    /// omitted entirely.
    async fn diff_against_ids(
        &self,
        client_ids: &HashSet<String>,
    ) -> Result<BTreeMap<String, Vec<ProductRecord>>> {
        let mut grouped = self.by_category().await?;
        for records in grouped.values_mut() {
            records.retain(|record| !client_ids.contains(&record.id));
        }
        grouped.retain(|_, records| !records.is_empty());
        Ok(grouped)
    }
}

/// Group records by category, each group sorted by capture time descending.
pub fn group_by_category(
    records: impl IntoIterator<Item = ProductRecord>,
) -> BTreeMap<String, Vec<ProductRecord>> {
    let mut grouped: BTreeMap<String, Vec<ProductRecord>> = BTreeMap::new();
    for record in records {
        grouped.entry(record.category.clone()).or_default().push(record);
    }
    for group in grouped.values_mut() {
        group.sort_by(|a, b| b.capture_key().cmp(&a.capture_key()));
    }
    grouped
}

/// Construct the store selected by configuration.
///
/// Stateless mode yields `None`: scans then return their raw output and
/// no reconciliation state exists anywhere in the process.
pub fn build_store(config: &StorageConfig) -> Option<Arc<dyn ProductStore>> {
    match config.mode {
        StorageMode::Stateless => None,
        StorageMode::Memory => Some(Arc::new(MemoryStore::new())),
        StorageMode::File => Some(Arc::new(FileStore::new(&config.path))),
    }
}
