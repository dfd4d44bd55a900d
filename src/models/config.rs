// src/models/config.rs

//! Application configuration structures.

use std::fs;
use std::net::SocketAddr;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::ListingSelectors;

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP and scanning behavior settings
    #[serde(default)]
    pub scanner: ScannerConfig,

    /// Listing page marker classes
    #[serde(default)]
    pub selectors: ListingSelectors,

    /// Category definitions, scanned in declaration order
    #[serde(default = "defaults::default_categories")]
    pub categories: Vec<CategoryConfig>,

    /// Product store settings
    #[serde(default)]
    pub storage: StorageConfig,

    /// API server settings
    #[serde(default)]
    pub server: ServerConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.scanner.user_agent.trim().is_empty() {
            return Err(AppError::validation("scanner.user_agent is empty"));
        }
        if self.scanner.probe_timeout_secs == 0 {
            return Err(AppError::validation(
                "scanner.probe_timeout_secs must be > 0",
            ));
        }
        if self.scanner.fetch_timeout_secs == 0 {
            return Err(AppError::validation(
                "scanner.fetch_timeout_secs must be > 0",
            ));
        }
        if self.scanner.page_size == 0 {
            return Err(AppError::validation("scanner.page_size must be > 0"));
        }
        url::Url::parse(&self.scanner.site_origin)
            .map_err(|e| AppError::validation(format!("scanner.site_origin is not a URL: {e}")))?;

        if self.categories.is_empty() {
            return Err(AppError::validation("No categories defined"));
        }
        let mut seen = std::collections::HashSet::new();
        for category in &self.categories {
            if category.name.trim().is_empty() {
                return Err(AppError::validation("category name is empty"));
            }
            if !seen.insert(category.name.as_str()) {
                return Err(AppError::validation(format!(
                    "duplicate category name: {}",
                    category.name
                )));
            }
            url::Url::parse(&category.url).map_err(|e| {
                AppError::validation(format!("category {} url is invalid: {e}", category.name))
            })?;
            if category.max_pages == 0 {
                return Err(AppError::validation(format!(
                    "category {} max_pages must be > 0",
                    category.name
                )));
            }
        }

        if self.storage.mode == StorageMode::File && self.storage.path.trim().is_empty() {
            return Err(AppError::validation(
                "storage.path is required for file mode",
            ));
        }
        self.server
            .bind_addr
            .parse::<SocketAddr>()
            .map_err(|e| AppError::validation(format!("server.bind_addr is invalid: {e}")))?;

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scanner: ScannerConfig::default(),
            selectors: ListingSelectors::default(),
            categories: defaults::default_categories(),
            storage: StorageConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

/// HTTP client and scanning behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Timeout for probe requests in seconds
    #[serde(default = "defaults::probe_timeout")]
    pub probe_timeout_secs: u64,

    /// Timeout for full page fetches in seconds
    #[serde(default = "defaults::fetch_timeout")]
    pub fetch_timeout_secs: u64,

    /// Delay between listing pages in milliseconds
    #[serde(default = "defaults::page_delay")]
    pub page_delay_ms: u64,

    /// Origin used to absolutize relative listing links
    #[serde(default = "defaults::site_origin")]
    pub site_origin: String,

    /// Items per listing page, used for pagination offsets
    #[serde(default = "defaults::page_size")]
    pub page_size: u32,

    /// Additional request headers sent with every request
    #[serde(default = "defaults::default_headers")]
    pub headers: Vec<HeaderPair>,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            probe_timeout_secs: defaults::probe_timeout(),
            fetch_timeout_secs: defaults::fetch_timeout(),
            page_delay_ms: defaults::page_delay(),
            site_origin: defaults::site_origin(),
            page_size: defaults::page_size(),
            headers: defaults::default_headers(),
        }
    }
}

/// One category listing to scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryConfig {
    /// Category name (e.g. "celulares")
    pub name: String,

    /// Base listing URL for page 1
    pub url: String,

    /// Maximum number of pages to probe
    pub max_pages: u32,
}

/// A single request header as a name/value pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeaderPair {
    pub name: String,
    pub value: String,
}

/// Product store lifecycle policy.
///
/// Selected once at process start; never switched during the process
/// lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageMode {
    /// No store; scans return their raw output and diffing is the caller's job
    Stateless,
    /// Process-lifetime map, lost on restart
    #[default]
    Memory,
    /// JSON files partitioned per category, durable across restarts
    File,
}

impl StorageMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageMode::Stateless => "stateless",
            StorageMode::Memory => "memory",
            StorageMode::File => "file",
        }
    }
}

/// Product store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Lifecycle policy for the reconciliation store
    #[serde(default)]
    pub mode: StorageMode,

    /// Directory holding per-category JSON files (file mode only)
    #[serde(default = "defaults::storage_path")]
    pub path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            mode: StorageMode::default(),
            path: defaults::storage_path(),
        }
    }
}

/// API server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Socket address the API listens on
    #[serde(default = "defaults::bind_addr")]
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: defaults::bind_addr(),
        }
    }
}

mod defaults {
    use super::{CategoryConfig, HeaderPair};

    // Scanner defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".into()
    }
    pub fn probe_timeout() -> u64 {
        10
    }
    pub fn fetch_timeout() -> u64 {
        15
    }
    pub fn page_delay() -> u64 {
        250
    }
    pub fn site_origin() -> String {
        "https://www.mercadolibre.cl".into()
    }
    pub fn page_size() -> u32 {
        50
    }

    // Browser-like header set sent with every request
    pub fn default_headers() -> Vec<HeaderPair> {
        [
            ("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8"),
            ("Accept-Language", "es-CL,es;q=0.9,en;q=0.8"),
            ("Upgrade-Insecure-Requests", "1"),
            ("Sec-Fetch-Dest", "document"),
            ("Sec-Fetch-Mode", "navigate"),
            ("Sec-Fetch-Site", "none"),
            ("Sec-Fetch-User", "?1"),
            ("Cache-Control", "max-age=0"),
            ("sec-ch-ua", "\"Not_A Brand\";v=\"8\", \"Chromium\";v=\"120\", \"Google Chrome\";v=\"120\""),
            ("sec-ch-ua-mobile", "?0"),
            ("sec-ch-ua-platform", "\"Windows\""),
        ]
        .into_iter()
        .map(|(name, value)| HeaderPair {
            name: name.to_string(),
            value: value.to_string(),
        })
        .collect()
    }

    // Category defaults
    pub fn default_categories() -> Vec<CategoryConfig> {
        vec![
            CategoryConfig {
                name: "celulares".to_string(),
                url: "https://listado.mercadolibre.cl/celulares-telefonia/celulares-smartphones/usado/celular_OrderId_PRICE_PublishedToday_YES_NoIndex_True".to_string(),
                max_pages: 3,
            },
            CategoryConfig {
                name: "notebooks".to_string(),
                url: "https://listado.mercadolibre.cl/computacion/notebooks-accesorios/notebooks/usado/notebook_OrderId_PRICE_PublishedToday_YES_NoIndex_True".to_string(),
                max_pages: 2,
            },
        ]
    }

    // Storage defaults
    pub fn storage_path() -> String {
        "data/products".to_string()
    }

    // Server defaults
    pub fn bind_addr() -> String {
        "0.0.0.0:8000".to_string()
    }
}
