// src/services/scan.rs

//! Listing page scanner service.
//!
//! Walks one category's listing pages in order, probing each page for
//! existence before paying for a full extraction fetch.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use scraper::{Html, Selector};

use crate::error::Result;
use crate::models::{CategoryConfig, Config, ProductRecord};
use crate::services::extract::{FieldExtractor, parse_selector};
use crate::utils::{http, url};

/// Result of probing a single listing page.
#[derive(Debug, Clone, Copy)]
pub struct PageProbe {
    /// Whether the page exists and contains at least one item
    pub exists: bool,
    /// Number of item containers found
    pub item_count: usize,
    /// Whether the server returned any HTTP response at all
    pub responded: bool,
}

impl PageProbe {
    fn missing(responded: bool) -> Self {
        Self {
            exists: false,
            item_count: 0,
            responded,
        }
    }
}

/// Result of walking one category.
#[derive(Debug, Default)]
pub struct CategoryWalk {
    /// Accepted records in discovery order
    pub records: Vec<ProductRecord>,
    /// Number of pages actually walked (probe said they exist)
    pub pages_walked: u32,
    /// Number of HTTP responses received, successful or not
    pub responses: usize,
}

/// Service for scanning category listings.
pub struct ListingScanner {
    config: Arc<Config>,
    extractor: FieldExtractor,
    probe_client: Client,
    fetch_client: Client,
    item_selector: Selector,
    item_fallback: Selector,
    no_results: Selector,
}

impl ListingScanner {
    /// Create a new scanner with the given configuration.
    ///
    /// Probe and full-fetch requests use separate clients because their
    /// timeout budgets differ.
    pub fn new(config: Arc<Config>) -> Result<Self> {
        let probe_client = http::create_client(&config.scanner, config.scanner.probe_timeout_secs)?;
        let fetch_client = http::create_client(&config.scanner, config.scanner.fetch_timeout_secs)?;

        Ok(Self {
            extractor: FieldExtractor::new(&config)?,
            item_selector: parse_selector(&config.selectors.item_selector)?,
            item_fallback: parse_selector(&config.selectors.item_fallback_selector)?,
            no_results: parse_selector(&config.selectors.no_results_selector)?,
            probe_client,
            fetch_client,
            config,
        })
    }

    /// Probe a listing page for existence and item count.
    ///
    /// Degrades every failure mode (transport error, non-2xx status, body
    /// that is not markup) to "page does not exist"; the error is logged,
    /// never propagated.
    pub async fn probe_page(&self, page_url: &str) -> PageProbe {
        let response = match self.probe_client.get(page_url).send().await {
            Ok(response) => response,
            Err(e) => {
                log::warn!("Probe request failed for {page_url}: {e}");
                return PageProbe::missing(false);
            }
        };

        let status = response.status();
        if !status.is_success() {
            log::warn!("Probe got status {status} for {page_url}");
            return PageProbe::missing(true);
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                log::warn!("Probe body read failed for {page_url}: {e}");
                return PageProbe::missing(true);
            }
        };
        if !body.trim_start().starts_with('<') {
            log::warn!("Probe body for {page_url} does not look like markup");
            return PageProbe::missing(true);
        }

        let document = Html::parse_document(&body);
        let item_count = self.select_items(&document).len();

        if item_count == 0 {
            if let Some(rescue) = document.select(&self.no_results).next() {
                let message: String = rescue.text().collect();
                log::debug!(
                    "No-results marker present for {page_url}: {}",
                    message.trim()
                );
            }
        }

        PageProbe {
            exists: item_count > 0,
            item_count,
            responded: true,
        }
    }

    /// Walk a category's listing pages and extract records from each.
    ///
    /// Pages are requested strictly in increasing order. The first page
    /// whose probe reports non-existence terminates the walk; a failed
    /// full fetch only skips that page's extraction.
    pub async fn walk_category(&self, category: &CategoryConfig) -> CategoryWalk {
        let delay = Duration::from_millis(self.config.scanner.page_delay_ms);
        let page_size = self.config.scanner.page_size;
        let mut walk = CategoryWalk::default();

        let mut page = 1u32;
        while page <= category.max_pages {
            let page_url = url::page_url(&category.url, page, page_size);
            log::debug!("Probing {} page {page}", category.name);

            let probe = self.probe_page(&page_url).await;
            if probe.responded {
                walk.responses += 1;
            }
            if !probe.exists {
                log::info!(
                    "Page {page} of {} does not exist or has no items, stopping",
                    category.name
                );
                break;
            }
            log::debug!("Page {page} of {} has {} items", category.name, probe.item_count);

            match self.fetch_client.get(&page_url).send().await {
                Ok(response) if response.status().is_success() => match response.text().await {
                    Ok(body) => {
                        walk.responses += 1;
                        let records = self.extract_page(&body, &category.name, page);
                        log::info!(
                            "Page {page} of {}: {} records accepted",
                            category.name,
                            records.len()
                        );
                        walk.records.extend(records);
                    }
                    Err(e) => {
                        walk.responses += 1;
                        log::warn!("Body read failed on {} page {page}: {e}", category.name);
                    }
                },
                Ok(response) => {
                    walk.responses += 1;
                    log::warn!(
                        "Fetch got status {} on {} page {page}, skipping page",
                        response.status(),
                        category.name
                    );
                }
                Err(e) => {
                    log::warn!("Fetch failed on {} page {page}: {e}", category.name);
                }
            }

            walk.pages_walked += 1;
            page += 1;

            if delay.as_millis() > 0 && page <= category.max_pages {
                tokio::time::sleep(delay).await;
            }
        }

        log::info!(
            "{}: {} records from {} page(s)",
            category.name,
            walk.records.len(),
            walk.pages_walked
        );
        walk
    }

    /// Parse a page body and extract every acceptable record from it.
    ///
    /// Item-level extraction failures are absorbed here; one bad item
    /// never affects its neighbors.
    fn extract_page(&self, body: &str, category: &str, page: u32) -> Vec<ProductRecord> {
        let document = Html::parse_document(body);
        self.select_items(&document)
            .into_iter()
            .filter_map(|item| self.extractor.extract(&item, category, page))
            .collect()
    }

    /// Select item containers, falling back to the secondary layout class.
    fn select_items<'a>(&self, document: &'a Html) -> Vec<scraper::ElementRef<'a>> {
        let items: Vec<_> = document.select(&self.item_selector).collect();
        if !items.is_empty() {
            return items;
        }
        document.select(&self.item_fallback).collect()
    }
}
