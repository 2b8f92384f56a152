//! Document fetching.
//!
//! Connectors never talk to the network directly; they ask a [`Fetcher`] for
//! the raw document behind a URL. [`HttpFetcher`] serves `http(s)://` URLs
//! through `reqwest` and reads `file://` URLs from disk, which keeps offline
//! runs and tests on the same code path.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::time::Duration;

/// Source of raw documents.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch the document at `url` as text.
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// `reqwest`-backed fetcher with a per-request timeout.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout_secs: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(concat!("caffeine-lookup/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        if let Some(path) = url.strip_prefix("file://") {
            return tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read {}", path));
        }

        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Request to {} failed", url))?;

        let status = response.status();
        if !status.is_success() {
            bail!("{} returned HTTP {}", url, status);
        }

        response
            .text()
            .await
            .with_context(|| format!("Failed to read body from {}", url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_file_urls_read_from_disk() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("page.html");
        std::fs::write(&path, "<table></table>").unwrap();

        let fetcher = HttpFetcher::new(5).unwrap();
        let body = fetcher
            .fetch(&format!("file://{}", path.display()))
            .await
            .unwrap();
        assert_eq!(body, "<table></table>");
    }

    #[tokio::test]
    async fn test_missing_file_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let fetcher = HttpFetcher::new(5).unwrap();
        let url = format!("file://{}", tmp.path().join("missing.html").display());
        assert!(fetcher.fetch(&url).await.is_err());
    }
}
