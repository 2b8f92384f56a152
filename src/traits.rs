//! The connector seam.
//!
//! Each drink source is a [`Connector`]: it knows where its document lives
//! and how to pull raw rows out of it. Fetching goes through a [`Fetcher`],
//! so a connector can be exercised against fixtures without a network.
//!
//! ```text
//! ┌────────────────┐   ┌────────────────┐
//! │ EmbeddedList   │   │  HtmlTable     │
//! │ (Source A)     │   │  (Source B)    │
//! └───────┬────────┘   └───────┬────────┘
//!         └──────────┬─────────┘
//!                    ▼
//!        ingest_source() → DrinkStore merge
//! ```

use anyhow::Result;
use async_trait::async_trait;

use crate::fetch::Fetcher;
use crate::models::SourceRow;

/// A drink source that produces raw rows for ingestion.
///
/// # Example
///
/// ```rust
/// use anyhow::Result;
/// use async_trait::async_trait;
/// use caffeine_lookup::models::SourceRow;
/// use caffeine_lookup::traits::Connector;
///
/// pub struct CsvConnector {
///     url: String,
/// }
///
/// #[async_trait]
/// impl Connector for CsvConnector {
///     fn name(&self) -> &str { "csv" }
///     fn description(&self) -> &str { "Comma separated drink list" }
///     fn url(&self) -> &str { &self.url }
///     fn cache_slot(&self) -> &str { "csv_cache" }
///
///     fn extract(&self, document: &str) -> Result<Vec<SourceRow>> {
///         Ok(document
///             .lines()
///             .filter_map(|line| {
///                 let mut cols = line.split(',');
///                 Some(SourceRow::new(cols.next()?, cols.next()?, cols.next()?))
///             })
///             .collect())
///     }
/// }
/// ```
#[async_trait]
pub trait Connector: Send + Sync {
    /// Short identifier used in logs and status output.
    fn name(&self) -> &str;

    /// One-line description for `caff sources`.
    fn description(&self) -> &str;

    /// Location of the source document.
    fn url(&self) -> &str;

    /// Logical name of the on-disk cache slot for this source.
    fn cache_slot(&self) -> &str;

    /// Pull raw rows out of a fetched document.
    fn extract(&self, document: &str) -> Result<Vec<SourceRow>>;

    /// Fetch the document and extract its rows.
    async fn scan(&self, fetcher: &dyn Fetcher) -> Result<Vec<SourceRow>> {
        let document = fetcher.fetch(self.url()).await?;
        self.extract(&document)
    }
}
