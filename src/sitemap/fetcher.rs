//! Remote sitemap fetching
//!
//! Sitemaps are fetched through an ordered chain of proxy prefixes. The first
//! attempt that returns a successful, non-empty body wins; every failure is
//! logged and the last one is reported if they all fail.

use crate::config::SitemapConfig;
use crate::FetchError;
use reqwest::Client;
use std::time::Duration;

/// Builds the HTTP client used for sitemap downloads
pub fn build_sitemap_client(config: &SitemapConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(concat!("affiliate-scout/", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(config.fetch_timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Builds the request URL for one proxy prefix
///
/// An empty prefix means a direct fetch; otherwise the percent-encoded sitemap
/// URL is appended to the prefix.
pub fn proxied_url(prefix: &str, url: &str) -> String {
    if prefix.is_empty() {
        url.to_string()
    } else {
        format!("{}{}", prefix, urlencoding::encode(url))
    }
}

/// Fetches sitemap XML, trying each proxy prefix in order
///
/// # Arguments
///
/// * `client` - HTTP client; its timeout bounds each attempt
/// * `url` - Absolute sitemap URL
/// * `proxies` - Proxy prefixes, tried in order
///
/// # Returns
///
/// * `Ok(String)` - Body of the first successful attempt
/// * `Err(FetchError)` - Every attempt failed, or no prefixes were given
pub async fn fetch_sitemap(
    client: &Client,
    url: &str,
    proxies: &[String],
) -> Result<String, FetchError> {
    let mut last_error = None;

    for prefix in proxies {
        let target = proxied_url(prefix, url);
        let via = if prefix.is_empty() {
            "direct request"
        } else {
            prefix.as_str()
        };

        match fetch_once(client, &target).await {
            Ok(body) => {
                tracing::info!("Fetched sitemap {} via {} ({} bytes)", url, via, body.len());
                return Ok(body);
            }
            Err(e) => {
                tracing::warn!("Sitemap fetch via {} failed: {}", via, e);
                last_error = Some(e);
            }
        }
    }

    match last_error {
        Some(last) => Err(FetchError::AllProxiesFailed { last }),
        None => Err(FetchError::NoProxies),
    }
}

async fn fetch_once(client: &Client, target: &str) -> Result<String, String> {
    let response = client.get(target).send().await.map_err(|e| {
        if e.is_timeout() {
            format!("request to {} timed out", target)
        } else {
            e.to_string()
        }
    })?;

    let status = response.status();
    if !status.is_success() {
        return Err(format!("HTTP error! status: {}", status.as_u16()));
    }

    let body = response.text().await.map_err(|e| e.to_string())?;
    if body.trim().is_empty() {
        return Err("empty response body".to_string());
    }
    Ok(body)
}
