// src/models/selectors.rs

//! CSS marker classes for scraping listing pages.

use serde::{Deserialize, Serialize};

/// CSS selectors identifying listing markup on a search results page.
///
/// Defaults match MercadoLibre's current search layout; a markup change
/// upstream can be absorbed by overriding these in the configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingSelectors {
    /// Primary selector for listing item containers
    #[serde(default = "default_item_selector")]
    pub item_selector: String,

    /// Fallback item selector tried when the primary matches nothing
    #[serde(default = "default_item_fallback_selector")]
    pub item_fallback_selector: String,

    /// Selector for the title heading carrying the item-title marker class
    #[serde(default = "default_title_selector")]
    pub title_selector: String,

    /// Selector for the money-fraction element holding the price digits
    #[serde(default = "default_price_selector")]
    pub price_selector: String,

    /// Selector for the "no results" rescue element
    #[serde(default = "default_no_results_selector")]
    pub no_results_selector: String,
}

fn default_item_selector() -> String {
    "li.ui-search-layout__item".to_string()
}

fn default_item_fallback_selector() -> String {
    "div.ui-search-result".to_string()
}

fn default_title_selector() -> String {
    "h2.ui-search-item__title".to_string()
}

fn default_price_selector() -> String {
    "span.andes-money-amount__fraction".to_string()
}

fn default_no_results_selector() -> String {
    "div.ui-search-rescue".to_string()
}

impl Default for ListingSelectors {
    fn default() -> Self {
        Self {
            item_selector: default_item_selector(),
            item_fallback_selector: default_item_fallback_selector(),
            title_selector: default_title_selector(),
            price_selector: default_price_selector(),
            no_results_selector: default_no_results_selector(),
        }
    }
}
