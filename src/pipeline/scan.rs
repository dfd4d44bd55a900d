// src/pipeline/scan.rs

//! Scan orchestration.
//!
//! Walks every configured category in declaration order, aggregates the
//! records, applies the selected reconciliation policy, and produces the
//! summary handed back to the API layer.

use std::collections::HashMap;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::{Config, ProductRecord};
use crate::pipeline::reconcile::reconcile;
use crate::services::ListingScanner;
use crate::storage::ProductStore;

/// Per-category scan totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorySummary {
    /// Category name
    pub name: String,
    /// Records accepted for this category
    pub total: usize,
    /// Records not present in the store before this scan
    pub new_count: usize,
    /// Pages actually walked
    pub pages_walked: u32,
}

/// Result of one full scan, as returned to callers.
///
/// In the stateful deployments `new_records` carries only what changed;
/// the caller is expected to already hold the rest. In stateless mode it
/// carries the entire scan output and diffing is the caller's job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanSummary {
    /// Total records accepted across all categories
    pub total: usize,
    /// Total records considered new
    pub new_total: usize,
    /// Per-category breakdown, in configuration order
    pub categories: Vec<CategorySummary>,
    /// The new records, in discovery order
    pub new_records: Vec<ProductRecord>,
    /// Completion timestamp
    pub finished_at: DateTime<Local>,
}

/// Run one scan over every configured category.
///
/// Page- and item-level failures have already been absorbed by the
/// walker; the failures that surface from here are store I/O and the
/// degenerate case where not a single upstream request got a response.
pub async fn run_scan(
    scanner: &ListingScanner,
    store: Option<&dyn ProductStore>,
    config: &Config,
) -> Result<ScanSummary> {
    log::info!("Starting scan of {} categories", config.categories.len());

    // Walk categories strictly in configuration order, one request in
    // flight at a time.
    let mut scanned: Vec<ProductRecord> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut categories: Vec<CategorySummary> = Vec::new();
    let mut responses = 0usize;

    for category in &config.categories {
        let walk = scanner.walk_category(category).await;
        responses += walk.responses;

        let mut total = 0usize;
        for record in walk.records {
            match index.get(&record.id) {
                // Duplicate id within one scan: last seen wins, first
                // discovery position is kept.
                Some(&slot) => {
                    log::debug!(
                        "Duplicate id {} on {} page {}, replacing earlier record",
                        record.id,
                        record.category,
                        record.page
                    );
                    scanned[slot] = record;
                }
                None => {
                    index.insert(record.id.clone(), scanned.len());
                    scanned.push(record);
                    total += 1;
                }
            }
        }

        categories.push(CategorySummary {
            name: category.name.clone(),
            total,
            new_count: 0,
            pages_walked: walk.pages_walked,
        });
    }

    if responses == 0 && !config.categories.is_empty() {
        return Err(AppError::scan(
            "run_scan",
            "no listing page responded; upstream unreachable",
        ));
    }

    let new_records = match store {
        Some(store) => {
            let previous = store.load().await?;
            let result = reconcile(&previous, &scanned);
            store.replace(&scanned).await?;
            log::info!(
                "Reconciled {} records against {} previously known, {} new",
                scanned.len(),
                previous.len(),
                result.new_records.len()
            );
            result.new_records
        }
        // Stateless deployment: no universe to diff against, the whole
        // scan output is the result.
        None => scanned.clone(),
    };

    for summary in &mut categories {
        summary.new_count = new_records
            .iter()
            .filter(|record| record.category == summary.name)
            .count();
    }

    let summary = ScanSummary {
        total: scanned.len(),
        new_total: new_records.len(),
        categories,
        new_records,
        finished_at: Local::now(),
    };

    log::info!(
        "Scan complete: {} records, {} new",
        summary.total,
        summary.new_total
    );
    for category in &summary.categories {
        log::info!(
            "  {}: {} records ({} new) from {} page(s)",
            category.name,
            category.total,
            category.new_count,
            category.pages_walked
        );
    }

    Ok(summary)
}
