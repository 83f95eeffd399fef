//! Remote image retrieval.
//!
//! The exporter only decides *where* an asset should live; fetching the
//! bytes goes through the [`ImageFetcher`] seam so tests can substitute a
//! stub and a failed download never aborts a run.

use std::path::Path;
use std::sync::OnceLock;

use anyhow::{Context, Result};
use async_trait::async_trait;
use regex::Regex;

/// Trait for image retrieval backends
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    /// Retrieve `url` and write the bytes to `dest`
    async fn fetch(&self, url: &str, dest: &Path) -> Result<()>;
}

/// HTTP fetcher backed by a shared reqwest client
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpFetcher {
    /// Create a new HTTP fetcher
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl ImageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str, dest: &Path) -> Result<()> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to request {}", url))?
            .error_for_status()
            .with_context(|| format!("Server rejected {}", url))?;

        let bytes = response
            .bytes()
            .await
            .with_context(|| format!("Failed to read body of {}", url))?;

        tokio::fs::write(dest, &bytes)
            .await
            .with_context(|| format!("Failed to write {}", dest.display()))?;

        Ok(())
    }
}

/// Resolve a possibly-relative image src against the blog's base link
pub fn absolutize(base: &str, src: &str) -> String {
    match reqwest::Url::parse(base).and_then(|b| b.join(src)) {
        Ok(url) => url.to_string(),
        Err(_) => src.to_string(),
    }
}

/// Rewrite known CDN URLs into their directly downloadable form.
///
/// Flickr `farmN.static` hosts moved to `live.static`, and the `_b` size
/// suffix selects the large rendition.
pub fn download_url(url: &str) -> String {
    if !url.contains("flickr.com") {
        return url.to_string();
    }

    static FARM: OnceLock<Regex> = OnceLock::new();
    static SIZE: OnceLock<Regex> = OnceLock::new();

    let farm = FARM.get_or_init(|| Regex::new(r"farm\d\.static\.").expect("static regex"));
    let size = SIZE.get_or_init(|| Regex::new(r"\.jpg").expect("static regex"));

    let url = farm.replace_all(url, "live.static.");
    size.replace_all(&url, "_b.jpg").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolutize() {
        assert_eq!(
            absolutize("http://example.com/", "/img/a.png"),
            "http://example.com/img/a.png"
        );
        assert_eq!(
            absolutize("http://example.com/", "http://other.com/b.png"),
            "http://other.com/b.png"
        );
    }

    #[test]
    fn test_flickr_rewrite() {
        assert_eq!(
            download_url("http://farm4.static.flickr.com/31/123_abc.jpg"),
            "http://live.static.flickr.com/31/123_abc_b.jpg"
        );
    }

    #[test]
    fn test_non_flickr_untouched() {
        assert_eq!(
            download_url("http://example.com/a.jpg"),
            "http://example.com/a.jpg"
        );
    }
}
