// src/models/mod.rs

//! Domain models for the scanner application.

mod config;
mod product;
mod selectors;

// Re-export all public types
pub use config::{
    CategoryConfig, Config, HeaderPair, ScannerConfig, ServerConfig, StorageConfig, StorageMode,
};
pub use product::ProductRecord;
pub use selectors::ListingSelectors;
