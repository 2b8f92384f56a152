//! HTML table connector (Source B).
//!
//! The page lists drinks in a plain `<table>`: one cell each for name,
//! serving size in ounces, and caffeine in milligrams. Spacer cells (empty,
//! whitespace, or a lone non-breaking space) are dropped before the cells
//! are grouped into rows of three.

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use scraper::{Html, Selector};
use tracing::warn;

use crate::config::HtmlTableSourceConfig;
use crate::models::SourceRow;
use crate::traits::Connector;

pub const CACHE_SLOT: &str = "source_b_cache";

const SPACER_CELL: &str = "\u{a0}";

pub struct HtmlTableConnector {
    config: HtmlTableSourceConfig,
}

impl HtmlTableConnector {
    pub fn new(config: HtmlTableSourceConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Connector for HtmlTableConnector {
    fn name(&self) -> &str {
        "html_table"
    }

    fn description(&self) -> &str {
        "Drink table rendered as HTML table cells"
    }

    fn url(&self) -> &str {
        &self.config.url
    }

    fn cache_slot(&self) -> &str {
        CACHE_SLOT
    }

    fn extract(&self, document: &str) -> Result<Vec<SourceRow>> {
        extract_table_rows(document)
    }
}

/// Group the cells of the first table in `document` into rows of three.
pub fn extract_table_rows(document: &str) -> Result<Vec<SourceRow>> {
    let html = Html::parse_document(document);
    let table_selector =
        Selector::parse("table").map_err(|e| anyhow!("invalid selector: {:?}", e))?;
    let cell_selector = Selector::parse("td").map_err(|e| anyhow!("invalid selector: {:?}", e))?;

    let table = html
        .select(&table_selector)
        .next()
        .context("no <table> in document")?;

    let cells: Vec<String> = table
        .select(&cell_selector)
        .map(|td| td.text().collect::<String>())
        .filter(|text| text != SPACER_CELL)
        .map(|text| text.to_lowercase().replace('\n', "").trim().to_string())
        .filter(|text| !text.is_empty())
        .collect();

    let leftover = cells.len() % 3;
    if leftover != 0 {
        warn!(leftover, "table cell count is not a multiple of three; trailing cells dropped");
    }

    let rows: Vec<SourceRow> = cells
        .chunks_exact(3)
        .map(|row| SourceRow::new(row[0].as_str(), row[1].as_str(), row[2].as_str()))
        .collect();

    if rows.is_empty() {
        bail!("table contains no drink rows");
    }
    Ok(rows)
}
