// src/utils/http.rs

//! HTTP client construction.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::error::{AppError, Result};
use crate::models::ScannerConfig;

/// Create a configured asynchronous HTTP client.
///
/// The timeout is passed separately because probe and full-fetch requests
/// use different budgets.
pub fn create_client(config: &ScannerConfig, timeout_secs: u64) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .default_headers(build_headers(config)?)
        .timeout(Duration::from_secs(timeout_secs))
        .build()?;
    Ok(client)
}

/// Build the static request header set from configuration.
fn build_headers(config: &ScannerConfig) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    for pair in &config.headers {
        let name = HeaderName::from_bytes(pair.name.as_bytes())
            .map_err(|e| AppError::config(format!("invalid header name {}: {e}", pair.name)))?;
        let value = HeaderValue::from_str(&pair.value)
            .map_err(|e| AppError::config(format!("invalid header value for {}: {e}", pair.name)))?;
        headers.insert(name, value);
    }
    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::HeaderPair;

    #[test]
    fn test_create_client_with_defaults() {
        let config = ScannerConfig::default();
        assert!(create_client(&config, 10).is_ok());
    }

    #[test]
    fn test_invalid_header_name_rejected() {
        let mut config = ScannerConfig::default();
        config.headers.push(HeaderPair {
            name: "bad header".to_string(),
            value: "x".to_string(),
        });
        assert!(create_client(&config, 10).is_err());
    }
}
