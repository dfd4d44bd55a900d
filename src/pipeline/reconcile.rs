// src/pipeline/reconcile.rs

//! Reconciliation of a scan against the previously known product set.
//!
//! Computes which scanned records are new relative to the stored universe
//! and produces the replacement universe. Pure function of its inputs so
//! repeated runs over the same data always agree.

use std::collections::HashMap;

use crate::models::ProductRecord;

/// Outcome of reconciling one scan against the previous product set.
#[derive(Debug, Clone, Default)]
pub struct ReconcileResult {
    /// The updated universe: exactly the scanned set, keyed by id.
    /// Ids absent from the latest scan are dropped, not retained.
    pub merged: HashMap<String, ProductRecord>,
    /// Scanned records whose id was unknown before this scan, in
    /// discovery order
    pub new_records: Vec<ProductRecord>,
}

impl ReconcileResult {
    /// Check whether the scan surfaced anything unseen.
    pub fn has_new(&self) -> bool {
        !self.new_records.is_empty()
    }
}

/// Reconcile scanned records against the previous id-keyed universe.
///
/// `scanned` must already be deduplicated by id; its order is preserved
/// in `new_records`.
pub fn reconcile(
    previous: &HashMap<String, ProductRecord>,
    scanned: &[ProductRecord],
) -> ReconcileResult {
    let merged: HashMap<String, ProductRecord> = scanned
        .iter()
        .map(|record| (record.id.clone(), record.clone()))
        .collect();

    let new_records: Vec<ProductRecord> = scanned
        .iter()
        .filter(|record| !previous.contains_key(&record.id))
        .cloned()
        .collect();

    ReconcileResult {
        merged,
        new_records,
    }
}
