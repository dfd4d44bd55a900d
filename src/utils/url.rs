// src/utils/url.rs

//! URL helpers for listing links and pagination.

use regex::Regex;

/// Absolutize a listing href against the site origin.
///
/// Hrefs that already carry a scheme are returned unchanged; anything else
/// is prefixed with the origin, matching how the marketplace emits
/// site-relative listing links.
pub fn resolve_link(origin: &str, href: &str) -> String {
    if href.starts_with("http") {
        href.to_string()
    } else {
        format!("{}{}", origin.trim_end_matches('/'), href)
    }
}

/// Build the URL for a given listing page.
///
/// Page 1 is the base URL verbatim. Later pages rewrite the `_OrderId`
/// token to `_Desde_{offset}_OrderId`, where the offset is the 1-based
/// index of the first item on that page. A base URL without the token is
/// returned unchanged, which simply re-fetches page 1.
pub fn page_url(base: &str, page: u32, page_size: u32) -> String {
    if page <= 1 {
        return base.to_string();
    }
    let offset = (page - 1) * page_size + 1;
    base.replace("_OrderId", &format!("_Desde_{offset}_OrderId"))
}

/// Extract the marketplace product id from a listing link.
///
/// Ids look like `MLC-123456` or `MLC123456` inside the URL path; the
/// hyphen is stripped from the returned id.
pub fn extract_product_id(link: &str) -> Option<String> {
    let pattern = Regex::new(r"ML[A-Z]-?\d+").ok()?;
    pattern
        .find(link)
        .map(|m| m.as_str().replace('-', ""))
}
