// src/storage/memory.rs

//! In-memory product store.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::Result;
use crate::models::ProductRecord;
use crate::storage::{ProductStore, group_by_category};

/// Process-lifetime product store.
///
/// Holds the universe in a plain map behind a lock; contents survive
/// across scans but are lost on restart. Constructed once at startup and
/// shared by reference, so no state hides in module globals.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<String, ProductRecord>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProductStore for MemoryStore {
    async fn load(&self) -> Result<HashMap<String, ProductRecord>> {
        Ok(self.records.read().await.clone())
    }

    async fn replace(&self, records: &[ProductRecord]) -> Result<()> {
        let mut guard = self.records.write().await;
        *guard = records
            .iter()
            .map(|record| (record.id.clone(), record.clone()))
            .collect();
        Ok(())
    }

    async fn by_category(&self) -> Result<BTreeMap<String, Vec<ProductRecord>>> {
        let records = self.records.read().await;
        Ok(group_by_category(records.values().cloned()))
    }
}
