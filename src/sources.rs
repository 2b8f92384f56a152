use anyhow::Result;
use chrono::Local;

use crate::settings::format_timestamp;
use crate::store::DrinkStore;

/// Status of one configured source.
#[derive(Debug, Clone)]
pub struct SourceStatus {
    pub name: String,
    pub description: String,
    pub url: String,
    pub cache_slot: String,
    /// Records in the slot; `None` when the slot is missing or unreadable.
    pub cached_records: Option<usize>,
}

pub fn get_sources(store: &DrinkStore) -> Vec<SourceStatus> {
    store
        .connectors()
        .iter()
        .map(|connector| {
            let cached_records = store
                .cache()
                .load(connector.cache_slot())
                .ok()
                .map(|records| records.len());
            SourceStatus {
                name: connector.name().to_string(),
                description: connector.description().to_string(),
                url: connector.url().to_string(),
                cache_slot: connector.cache_slot().to_string(),
                cached_records,
            }
        })
        .collect()
}

pub fn list_sources(store: &DrinkStore) -> Result<()> {
    println!("{:<16} {:<16} {:<10} URL", "SOURCE", "CACHE SLOT", "RECORDS");
    for status in get_sources(store) {
        let records = match status.cached_records {
            Some(n) => n.to_string(),
            None => "-".to_string(),
        };
        println!(
            "{:<16} {:<16} {:<10} {}",
            status.name, status.cache_slot, records, status.url
        );
    }

    println!();
    println!("cache dir: {}", store.cache().dir().display());
    match store.last_updated() {
        Some(last) => {
            let age = Local::now().naive_local().signed_duration_since(last);
            println!(
                "last update: {} ({}s ago)",
                format_timestamp(last),
                age.num_seconds()
            );
        }
        None => println!("last update: never"),
    }
    println!("stale: {}", store.is_stale_now());

    Ok(())
}
