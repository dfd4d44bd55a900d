// src/services/extract.rs

//! Field extraction from listing item fragments.
//!
//! Upstream markup shifts between layout experiments, so every field is
//! extracted through a fallback chain and the record is dropped (not
//! blanked) when the required fields cannot be recovered.

use chrono::Local;
use scraper::{ElementRef, Selector};

use crate::error::{AppError, Result};
use crate::models::{Config, ProductRecord};
use crate::utils::url::{extract_product_id, resolve_link};

/// Extracts product fields from a single listing item node.
pub struct FieldExtractor {
    title_marked: Selector,
    heading: Selector,
    anchor: Selector,
    container: Selector,
    price: Selector,
    image: Selector,
    origin: String,
}

impl FieldExtractor {
    /// Create an extractor with selectors pre-parsed from configuration.
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            title_marked: parse_selector(&config.selectors.title_selector)?,
            heading: parse_selector("h2")?,
            anchor: parse_selector("a[href]")?,
            container: parse_selector("div[class]")?,
            price: parse_selector(&config.selectors.price_selector)?,
            image: parse_selector("img")?,
            origin: config.scanner.site_origin.clone(),
        })
    }

    /// Extract a full product record from one listing item.
    ///
    /// Returns `None` when any of title, link, or id is missing; the drop
    /// is logged but never surfaced as an error.
    pub fn extract(&self, item: &ElementRef, category: &str, page: u32) -> Option<ProductRecord> {
        let title = self.extract_title(item);
        let link = self.extract_link(item);
        let id = link.as_deref().and_then(extract_product_id);

        match (title, link, id) {
            (Some(title), Some(link), Some(id)) => {
                let now = Local::now();
                Some(ProductRecord {
                    id,
                    title,
                    price: self.extract_price(item),
                    link,
                    image: self.extract_image(item),
                    category: category.to_string(),
                    page,
                    scanned_time: now.format("%H:%M:%S").to_string(),
                    scanned_date: now.format("%Y-%m-%d").to_string(),
                })
            }
            (title, link, id) => {
                log::debug!(
                    "Incomplete item dropped on {category} page {page} (title: {}, link: {}, id: {})",
                    title.is_some(),
                    link.is_some(),
                    id.is_some()
                );
                None
            }
        }
    }

    /// Extract the item title through the fallback chain.
    ///
    /// Rules are tried in strict priority order and the first non-empty
    /// trimmed result wins; no further validation is applied to it.
    pub fn extract_title(&self, item: &ElementRef) -> Option<String> {
        let rules: [&dyn Fn(&ElementRef) -> Option<String>; 5] = [
            &|item| self.title_from_marked_heading(item),
            &|item| self.title_from_any_heading(item),
            &|item| self.title_from_anchor_attrs(item),
            &|item| self.title_from_titled_container(item),
            &|item| Self::title_from_leading_text(item),
        ];
        rules.iter().find_map(|rule| rule(item))
    }

    /// Rule 1: heading carrying the item-title marker class.
    fn title_from_marked_heading(&self, item: &ElementRef) -> Option<String> {
        item.select(&self.title_marked)
            .next()
            .and_then(|el| non_empty(el.text().collect()))
    }

    /// Rule 2: any heading element within the item.
    fn title_from_any_heading(&self, item: &ElementRef) -> Option<String> {
        item.select(&self.heading)
            .next()
            .and_then(|el| non_empty(el.text().collect()))
    }

    /// Rule 3: title or aria-label attribute of the first link.
    fn title_from_anchor_attrs(&self, item: &ElementRef) -> Option<String> {
        let anchor = item.select(&self.anchor).next()?;
        anchor
            .value()
            .attr("title")
            .and_then(|s| non_empty(s.to_string()))
            .or_else(|| {
                anchor
                    .value()
                    .attr("aria-label")
                    .and_then(|s| non_empty(s.to_string()))
            })
    }

    /// Rule 4: any div whose class attribute mentions "title".
    fn title_from_titled_container(&self, item: &ElementRef) -> Option<String> {
        item.select(&self.container)
            .find(|el| {
                el.value()
                    .attr("class")
                    .is_some_and(|class| class.to_lowercase().contains("title"))
            })
            .and_then(|el| non_empty(el.text().collect()))
    }

    /// Rule 5: leading words of the item's full text.
    ///
    /// Only fires when the first ten tokens amount to more than ten
    /// characters, which filters out near-empty fragments.
    fn title_from_leading_text(item: &ElementRef) -> Option<String> {
        let text: String = item.text().collect();
        let words: Vec<&str> = text.split_whitespace().collect();
        let probe = words.iter().take(10).copied().collect::<Vec<_>>().join(" ");
        if probe.len() > 10 {
            Some(words.iter().take(15).copied().collect::<Vec<_>>().join(" "))
        } else {
            None
        }
    }

    /// First link of the item, absolutized against the site origin.
    fn extract_link(&self, item: &ElementRef) -> Option<String> {
        item.select(&self.anchor)
            .next()
            .and_then(|el| el.value().attr("href"))
            .map(|href| resolve_link(&self.origin, href))
    }

    /// Price as "$ <digits>", or "$ 0" when the money element is absent.
    fn extract_price(&self, item: &ElementRef) -> String {
        item.select(&self.price)
            .next()
            .map(|el| format!("$ {}", el.text().collect::<String>().trim()))
            .unwrap_or_else(|| "$ 0".to_string())
    }

    /// Image source, preferring the lazy-load attribute; empty when absent.
    fn extract_image(&self, item: &ElementRef) -> String {
        item.select(&self.image)
            .next()
            .and_then(|img| {
                img.value()
                    .attr("data-src")
                    .filter(|src| !src.is_empty())
                    .or_else(|| img.value().attr("src"))
            })
            .unwrap_or_default()
            .to_string()
    }
}

/// Parse a CSS selector, mapping failures onto the application error type.
pub fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

fn non_empty(s: String) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
