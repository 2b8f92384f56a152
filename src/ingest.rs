//! Ingestion: connector → validated records → spoken aliases.
//!
//! A failing source never takes the other one down with it. Errors are
//! logged here and turned into a [`SourceOutcome::Failed`] value, which the
//! store composes with whatever else it has for that source.

use tracing::{debug, info, warn};

use crate::fetch::Fetcher;
use crate::models::{DrinkRecord, SourceRow};
use crate::speech;
use crate::traits::Connector;

/// What one source produced in one refresh cycle.
#[derive(Debug, Clone)]
pub enum SourceOutcome {
    Fetched(Vec<DrinkRecord>),
    Failed { error: String },
}

/// A source's outcome tagged with its identity.
#[derive(Debug, Clone)]
pub struct SourceScan {
    pub source: String,
    pub cache_slot: String,
    pub outcome: SourceOutcome,
}

/// Turn raw rows into records and append spoken-form aliases.
pub fn ingest_rows(rows: &[SourceRow]) -> Vec<DrinkRecord> {
    let mut records: Vec<DrinkRecord> = Vec::with_capacity(rows.len() * 2);
    let mut rejected = 0usize;

    for row in rows {
        if row.is_header() {
            debug!("dropping leaked header row");
            continue;
        }
        match DrinkRecord::from_row(row) {
            Some(record) => records.push(record),
            None => {
                rejected += 1;
                debug!(name = %row.name, volume = %row.volume, caffeine = %row.caffeine, "rejected row");
            }
        }
    }

    if rejected > 0 {
        debug!(rejected, "rows failed validation");
    }

    add_spoken_aliases(&mut records);
    records
}

/// Append a copy of every record whose name reads differently once spoken.
pub fn add_spoken_aliases(records: &mut Vec<DrinkRecord>) {
    let aliases: Vec<DrinkRecord> = records
        .iter()
        .filter_map(|record| {
            speech::spoken_alias(&record.name)
                .map(|alias| DrinkRecord::new(alias, record.volume_oz, record.caffeine_mg))
        })
        .collect();
    records.extend(aliases);
}

/// Scan one connector and ingest its rows. Never returns an error.
pub async fn ingest_source(connector: &dyn Connector, fetcher: &dyn Fetcher) -> SourceScan {
    let outcome = match connector.scan(fetcher).await {
        Ok(rows) => {
            let records = ingest_rows(&rows);
            info!(
                source = connector.name(),
                rows = rows.len(),
                records = records.len(),
                "source ingested"
            );
            SourceOutcome::Fetched(records)
        }
        Err(e) => {
            warn!(source = connector.name(), url = connector.url(), error = %format!("{:#}", e), "source fetch failed");
            SourceOutcome::Failed {
                error: format!("{:#}", e),
            }
        }
    };

    SourceScan {
        source: connector.name().to_string(),
        cache_slot: connector.cache_slot().to_string(),
        outcome,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{bail, Result};
    use async_trait::async_trait;

    struct FixedFetcher(Option<&'static str>);

    #[async_trait]
    impl Fetcher for FixedFetcher {
        async fn fetch(&self, url: &str) -> Result<String> {
            match self.0 {
                Some(body) => Ok(body.to_string()),
                None => bail!("connection refused: {}", url),
            }
        }
    }

    struct LineConnector;

    #[async_trait]
    impl Connector for LineConnector {
        fn name(&self) -> &str {
            "lines"
        }
        fn description(&self) -> &str {
            "one drink per line"
        }
        fn url(&self) -> &str {
            "memory://lines"
        }
        fn cache_slot(&self) -> &str {
            "lines_cache"
        }
        fn extract(&self, document: &str) -> Result<Vec<SourceRow>> {
            Ok(document
                .lines()
                .filter_map(|line| {
                    let mut cols = line.split('|');
                    Some(SourceRow::new(cols.next()?, cols.next()?, cols.next()?))
                })
                .collect())
        }
    }

    #[test]
    fn test_ingest_rows_drops_header_and_invalid() {
        let rows = vec![
            SourceRow::new("beverage", "quantity (oz)", "caffeine content (mg)"),
            SourceRow::new("coffee", "8", "95"),
            SourceRow::new("broken", "", "10"),
        ];
        let records = ingest_rows(&rows);
        assert_eq!(records, vec![DrinkRecord::new("coffee", 8.0, 95.0)]);
    }

    #[test]
    fn test_spoken_aliases_appended_after_originals() {
        let rows = vec![
            SourceRow::new("7-eleven energy shot", "2", "260"),
            SourceRow::new("diet coke", "12", "46"),
            SourceRow::new("coca-cola classic", "12", "34"),
        ];
        let records = ingest_rows(&rows);
        let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "7-eleven energy shot",
                "diet coke",
                "coca-cola classic",
                "7 11 energy shot",
                "coca cola classic",
            ]
        );
        assert_eq!(records[3].caffeine_mg, 260.0);
        assert_eq!(records[4].volume_oz, 12.0);
    }

    #[tokio::test]
    async fn test_ingest_source_success() {
        let fetcher = FixedFetcher(Some("coffee|8|95\ntea|8|47"));
        let scan = ingest_source(&LineConnector, &fetcher).await;
        assert_eq!(scan.source, "lines");
        assert_eq!(scan.cache_slot, "lines_cache");
        match scan.outcome {
            SourceOutcome::Fetched(records) => assert_eq!(records.len(), 2),
            other => panic!("expected fetched, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_ingest_source_failure_is_a_value() {
        let scan = ingest_source(&LineConnector, &FixedFetcher(None)).await;
        match scan.outcome {
            SourceOutcome::Failed { error } => assert!(error.contains("connection refused")),
            other => panic!("expected failure, got {:?}", other),
        }
    }
}
