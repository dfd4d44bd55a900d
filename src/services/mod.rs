// src/services/mod.rs

//! Scanning services: field extraction and page walking.

pub mod extract;
pub mod scan;

pub use extract::FieldExtractor;
pub use scan::{CategoryWalk, ListingScanner, PageProbe};
