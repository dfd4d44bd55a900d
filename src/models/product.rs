// src/models/product.rs

//! Product record data structure.

use serde::{Deserialize, Serialize};

/// One product listing scraped from a category page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProductRecord {
    /// Marketplace product identifier (e.g. "MLC123456", hyphens stripped)
    pub id: String,

    /// Listing title
    pub title: String,

    /// Formatted price, "$ <digits>" ("$ 0" when no price element exists)
    pub price: String,

    /// Absolute URL of the listing
    pub link: String,

    /// Image URL (empty string when the item has no image element)
    pub image: String,

    /// Category the listing was found under
    pub category: String,

    /// Listing page number the record was found on (1-based)
    pub page: u32,

    /// Local wall-clock time of the scan that produced this record (HH:MM:SS)
    pub scanned_time: String,

    /// Local wall-clock date of the scan that produced this record (YYYY-MM-DD)
    pub scanned_date: String,
}

impl ProductRecord {
    /// Capture instant as a sortable (date, time) pair.
    ///
    /// Both components are fixed-width formatted strings, so lexicographic
    /// comparison matches chronological order.
    pub fn capture_key(&self) -> (&str, &str) {
        (&self.scanned_date, &self.scanned_time)
    }
}
