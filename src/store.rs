//! The merged drink database.
//!
//! [`DrinkStore`] owns the in-memory merged records, both cache slots and the
//! refresh policy:
//!
//! 1. Fresh data and both slots on disk: rebuild from the slots, no network.
//! 2. Otherwise scan both sources concurrently. A failed source keeps its
//!    previous slot for this cycle.
//! 3. Source B empty: the fallback dataset stands in for it.
//! 4. Merge, install, persist every freshly fetched source, and stamp
//!    `lastUpdate` only when everything was fetched and written.
//!
//! A refresh runs at most once at a time. While one is in flight the
//! readiness signal is down; queries may wait for it, bounded, and then
//! answer from whatever is installed.

use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::cache::CacheSlots;
use crate::config::Config;
use crate::connector_embedded::EmbeddedListConnector;
use crate::connector_table::HtmlTableConnector;
use crate::fetch::Fetcher;
use crate::ingest::{add_spoken_aliases, ingest_source, SourceOutcome};
use crate::models::{DrinkRecord, HEADER_ROW};
use crate::settings::SettingsStore;
use crate::traits::Connector;

/// Synthetic record appended to every merged store.
pub const BONUS_DRINK: (&str, f64, f64) = ("rocket chocolate", 0.4, 150.0);

const BUNDLED_FALLBACK: &str = include_str!("../data/fallback_drinks.json");

/// Whether data last refreshed at `last_updated` must be refreshed at `now`.
pub fn is_stale(last_updated: Option<NaiveDateTime>, now: NaiveDateTime, threshold_secs: i64) -> bool {
    match last_updated {
        None => true,
        Some(last) => now.signed_duration_since(last) > chrono::Duration::seconds(threshold_secs),
    }
}

/// Merge the two source datasets into one store.
///
/// Source B is taken whole; a Source A record is added only when no record
/// with its name is already present. The bonus record is added once, and the
/// result is stably sorted by name. Merging the same inputs again, or merging
/// Source A into an already merged store, adds nothing.
pub fn merge_sources(source_a: &[DrinkRecord], source_b: &[DrinkRecord]) -> Vec<DrinkRecord> {
    let mut merged: Vec<DrinkRecord> = source_b.to_vec();
    let mut names: HashSet<String> = merged.iter().map(|r| r.name.clone()).collect();

    for record in source_a {
        if names.insert(record.name.clone()) {
            merged.push(record.clone());
        }
    }

    let (bonus_name, bonus_oz, bonus_mg) = BONUS_DRINK;
    if !names.contains(bonus_name) {
        merged.push(DrinkRecord::new(bonus_name, bonus_oz, bonus_mg));
    }

    merged.retain(|r| r.name != HEADER_ROW[0]);
    merged.sort_by(|a, b| a.name.cmp(&b.name));
    merged
}

/// How a source fared in one refresh cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceState {
    /// Rebuilt from the cache slot.
    Cached,
    /// Fetched from the network; `persisted` tells whether the slot write succeeded.
    Fetched { persisted: bool },
    /// Fetch failed; the previous slot (possibly empty) was used.
    Failed { error: String },
}

#[derive(Debug, Clone)]
pub struct SourceReport {
    pub source: String,
    pub cache_slot: String,
    pub state: SourceState,
    pub records: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshMode {
    /// Rebuilt from the cache slots.
    Cache,
    /// Sources were scanned.
    Network,
    /// Another refresh was already running; nothing was done.
    Skipped,
}

#[derive(Debug, Clone)]
pub struct RefreshReport {
    pub mode: RefreshMode,
    pub sources: Vec<SourceReport>,
    pub fallback_used: bool,
    pub total_records: usize,
    pub success: bool,
}

impl RefreshReport {
    fn skipped() -> Self {
        Self {
            mode: RefreshMode::Skipped,
            sources: Vec::new(),
            fallback_used: false,
            total_records: 0,
            success: false,
        }
    }
}

struct Inner {
    config: Config,
    fetcher: Arc<dyn Fetcher>,
    settings: Arc<dyn SettingsStore>,
    source_a: Box<dyn Connector>,
    source_b: Box<dyn Connector>,
    cache: CacheSlots,
    records: RwLock<Arc<Vec<DrinkRecord>>>,
    ready: watch::Sender<bool>,
    refreshing: AtomicBool,
}

/// Clears readiness for the duration of one refresh and restores it on drop,
/// whether the refresh finished, failed or was abandoned.
struct RefreshGuard {
    inner: Arc<Inner>,
}

impl RefreshGuard {
    fn acquire(inner: &Arc<Inner>) -> Option<Self> {
        inner
            .refreshing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        inner.ready.send_replace(false);
        Some(Self {
            inner: Arc::clone(inner),
        })
    }
}

impl Drop for RefreshGuard {
    fn drop(&mut self) {
        self.inner.refreshing.store(false, Ordering::Release);
        self.inner.ready.send_replace(true);
    }
}

/// Shared handle to the merged drink database.
#[derive(Clone)]
pub struct DrinkStore {
    inner: Arc<Inner>,
}

impl DrinkStore {
    /// Store over the two configured sources.
    pub fn new(config: Config, fetcher: Arc<dyn Fetcher>, settings: Arc<dyn SettingsStore>) -> Self {
        let source_a = Box::new(EmbeddedListConnector::new(
            config.sources.embedded_list.clone(),
        ));
        let source_b = Box::new(HtmlTableConnector::new(config.sources.html_table.clone()));
        Self::with_connectors(config, fetcher, settings, source_a, source_b)
    }

    pub fn with_connectors(
        config: Config,
        fetcher: Arc<dyn Fetcher>,
        settings: Arc<dyn SettingsStore>,
        source_a: Box<dyn Connector>,
        source_b: Box<dyn Connector>,
    ) -> Self {
        let cache = CacheSlots::new(config.cache.dir.clone());
        let (ready, _) = watch::channel(true);
        Self {
            inner: Arc::new(Inner {
                config,
                fetcher,
                settings,
                source_a,
                source_b,
                cache,
                records: RwLock::new(Arc::new(Vec::new())),
                ready,
                refreshing: AtomicBool::new(false),
            }),
        }
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    pub fn cache(&self) -> &CacheSlots {
        &self.inner.cache
    }

    pub fn connectors(&self) -> [&dyn Connector; 2] {
        [self.inner.source_a.as_ref(), self.inner.source_b.as_ref()]
    }

    pub fn last_updated(&self) -> Option<NaiveDateTime> {
        self.inner.settings.last_update()
    }

    pub fn is_stale_now(&self) -> bool {
        is_stale(
            self.last_updated(),
            Local::now().naive_local(),
            self.inner.config.cache.stale_after_secs,
        )
    }

    /// The currently installed records.
    pub fn snapshot(&self) -> Arc<Vec<DrinkRecord>> {
        let guard = self.inner.records.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&guard)
    }

    pub fn is_refreshing(&self) -> bool {
        self.inner.refreshing.load(Ordering::Acquire)
    }

    /// Wait until no refresh is running. Returns `false` on timeout.
    pub async fn wait_until_ready(&self, timeout: Duration) -> bool {
        let mut rx = self.inner.ready.subscribe();
        let ready = tokio::time::timeout(timeout, rx.wait_for(|ready| *ready))
            .await
            .map(|result| result.is_ok())
            .unwrap_or(false);
        ready
    }

    /// Rebuild the store from both cache slots without touching the network.
    pub fn load_cached(&self) -> Result<Arc<Vec<DrinkRecord>>> {
        let cache = &self.inner.cache;
        let source_a = cache.load(self.inner.source_a.cache_slot())?;
        let source_b = cache.load(self.inner.source_b.cache_slot())?;
        let (source_b, _) = self.with_fallback(source_b);
        Ok(self.install(merge_sources(&source_a, &source_b)))
    }

    /// Run a refresh cycle in the foreground.
    ///
    /// `force` skips the cache even when it is fresh. Returns a
    /// [`RefreshMode::Skipped`] report if a refresh is already running.
    pub async fn refresh(&self, force: bool) -> RefreshReport {
        match RefreshGuard::acquire(&self.inner) {
            Some(guard) => self.refresh_guarded(force, guard).await,
            None => {
                info!("refresh already in progress; skipping");
                RefreshReport::skipped()
            }
        }
    }

    /// Run a refresh cycle on a background task.
    ///
    /// Returns `None` when a refresh is already running.
    pub fn spawn_refresh(&self, force: bool) -> Option<JoinHandle<RefreshReport>> {
        let guard = RefreshGuard::acquire(&self.inner)?;
        let store = self.clone();
        Some(tokio::spawn(async move { store.refresh_guarded(force, guard).await }))
    }

    async fn refresh_guarded(&self, force: bool, _guard: RefreshGuard) -> RefreshReport {
        let now = Local::now().naive_local();
        let last = self.inner.settings.last_update();
        let stale = is_stale(last, now, self.inner.config.cache.stale_after_secs);
        let slots_present = self
            .connectors()
            .iter()
            .all(|c| self.inner.cache.exists(c.cache_slot()));

        debug!(force, stale, slots_present, "refresh starting");

        if !force && !stale && slots_present {
            match self.refresh_from_cache() {
                Ok(report) => return report,
                Err(e) => warn!(error = %format!("{:#}", e), "cache unusable; fetching sources"),
            }
        }

        self.refresh_from_network(now).await
    }

    fn refresh_from_cache(&self) -> Result<RefreshReport> {
        let cache = &self.inner.cache;
        let mut sources = Vec::new();
        let mut datasets = Vec::new();
        for connector in self.connectors() {
            let records = cache
                .load(connector.cache_slot())
                .with_context(|| format!("loading {} from cache", connector.name()))?;
            sources.push(SourceReport {
                source: connector.name().to_string(),
                cache_slot: connector.cache_slot().to_string(),
                state: SourceState::Cached,
                records: records.len(),
            });
            datasets.push(records);
        }

        let source_b = datasets.pop().unwrap_or_default();
        let source_a = datasets.pop().unwrap_or_default();
        let (source_b, fallback_used) = self.with_fallback(source_b);
        let merged = self.install(merge_sources(&source_a, &source_b));

        info!(records = merged.len(), "drink store loaded from cache");
        Ok(RefreshReport {
            mode: RefreshMode::Cache,
            sources,
            fallback_used,
            total_records: merged.len(),
            success: true,
        })
    }

    async fn refresh_from_network(&self, now: NaiveDateTime) -> RefreshReport {
        let fetcher = self.inner.fetcher.as_ref();
        let (scan_a, scan_b) = tokio::join!(
            ingest_source(self.inner.source_a.as_ref(), fetcher),
            ingest_source(self.inner.source_b.as_ref(), fetcher),
        );

        let mut all_persisted = true;
        let mut sources = Vec::new();
        let mut datasets = Vec::new();

        for scan in [scan_a, scan_b] {
            let (state, records) = match scan.outcome {
                SourceOutcome::Fetched(records) => {
                    let persisted = match self.inner.cache.store(&scan.cache_slot, &records) {
                        Ok(()) => true,
                        Err(e) => {
                            error!(slot = %scan.cache_slot, error = %format!("{:#}", e), "failed to persist cache slot");
                            false
                        }
                    };
                    (SourceState::Fetched { persisted }, records)
                }
                SourceOutcome::Failed { error } => {
                    let kept = self
                        .inner
                        .cache
                        .load_or_empty(&scan.cache_slot)
                        .unwrap_or_else(|e| {
                            warn!(slot = %scan.cache_slot, error = %format!("{:#}", e), "previous cache slot unusable");
                            Vec::new()
                        });
                    (SourceState::Failed { error }, kept)
                }
            };
            if state != (SourceState::Fetched { persisted: true }) {
                all_persisted = false;
            }
            sources.push(SourceReport {
                source: scan.source,
                cache_slot: scan.cache_slot,
                state,
                records: records.len(),
            });
            datasets.push(records);
        }

        let source_b = datasets.pop().unwrap_or_default();
        let source_a = datasets.pop().unwrap_or_default();
        let (source_b, fallback_used) = self.with_fallback(source_b);
        let merged = self.install(merge_sources(&source_a, &source_b));

        let mut success = all_persisted;
        if success {
            if let Err(e) = self.inner.settings.set_last_update(now) {
                error!(error = %format!("{:#}", e), "failed to record last update");
                success = false;
            }
        }

        info!(
            records = merged.len(),
            fallback_used,
            success,
            "drink store refreshed"
        );

        RefreshReport {
            mode: RefreshMode::Network,
            sources,
            fallback_used,
            total_records: merged.len(),
            success,
        }
    }

    /// Substitute the fallback dataset for an empty Source B.
    fn with_fallback(&self, source_b: Vec<DrinkRecord>) -> (Vec<DrinkRecord>, bool) {
        if !source_b.is_empty() || !self.inner.config.sources.use_fallback {
            return (source_b, false);
        }
        match load_fallback(&self.inner.config) {
            Ok(fallback) if !fallback.is_empty() => {
                info!(records = fallback.len(), "using fallback drink dataset");
                (fallback, true)
            }
            Ok(_) => (source_b, false),
            Err(e) => {
                warn!(error = %format!("{:#}", e), "fallback dataset unavailable");
                (source_b, false)
            }
        }
    }

    fn install(&self, merged: Vec<DrinkRecord>) -> Arc<Vec<DrinkRecord>> {
        let merged = Arc::new(merged);
        let mut guard = self.inner.records.write().unwrap_or_else(|e| e.into_inner());
        *guard = Arc::clone(&merged);
        merged
    }
}

/// `caff refresh`: run one refresh cycle in the foreground and print a report.
pub async fn run_refresh(store: &DrinkStore, force: bool) -> Result<()> {
    let report = store.refresh(force).await;

    let mode = match report.mode {
        RefreshMode::Cache => "cache",
        RefreshMode::Network => "network",
        RefreshMode::Skipped => {
            println!("refresh skipped: another refresh is in progress");
            return Ok(());
        }
    };

    println!("refresh ({})", mode);
    for source in &report.sources {
        let state = match &source.state {
            SourceState::Cached => "cached".to_string(),
            SourceState::Fetched { persisted: true } => "fetched".to_string(),
            SourceState::Fetched { persisted: false } => "fetched (not persisted)".to_string(),
            SourceState::Failed { error } => format!("failed: {}", error),
        };
        println!("  {} [{}]: {} records, {}", source.source, source.cache_slot, source.records, state);
    }
    if report.fallback_used {
        println!("  fallback dataset used for {}", store.connectors()[1].name());
    }
    println!("  total records: {}", report.total_records);
    if let Some(last) = store.last_updated() {
        println!("  last update: {}", crate::settings::format_timestamp(last));
    }

    if report.success {
        println!("ok");
        Ok(())
    } else {
        anyhow::bail!("refresh incomplete; serving {} records", report.total_records)
    }
}

/// Fallback dataset: the configured file, or the bundled one.
pub fn load_fallback(config: &Config) -> Result<Vec<DrinkRecord>> {
    let records: Vec<DrinkRecord> = match &config.sources.fallback_path {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read fallback dataset: {}", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse fallback dataset: {}", path.display()))?
        }
        None => serde_json::from_str(BUNDLED_FALLBACK).context("Bundled fallback dataset is corrupt")?,
    };
    let mut records: Vec<DrinkRecord> = records
        .into_iter()
        .filter(|r| r.volume_oz > 0.0 && r.caffeine_mg >= 0.0)
        .collect();
    add_spoken_aliases(&mut records);
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn source_a() -> Vec<DrinkRecord> {
        vec![
            DrinkRecord::new("5-hour energy", 1.93, 200.0),
            DrinkRecord::new("diet coke", 12.0, 45.0),
            DrinkRecord::new("5 hour energy", 1.93, 200.0),
        ]
    }

    fn source_b() -> Vec<DrinkRecord> {
        vec![
            DrinkRecord::new("diet coke", 12.0, 46.0),
            DrinkRecord::new("coffee", 8.0, 95.0),
        ]
    }

    #[test]
    fn test_is_stale() {
        assert!(is_stale(None, at(12, 0, 0), 3600));
        assert!(!is_stale(Some(at(11, 0, 0)), at(12, 0, 0), 3600));
        assert!(is_stale(Some(at(11, 0, 0)), at(12, 0, 1), 3600));
        assert!(!is_stale(Some(at(11, 30, 0)), at(12, 0, 0), 3600));
    }

    #[test]
    fn test_merge_prefers_source_b_and_adds_bonus() {
        let merged = merge_sources(&source_a(), &source_b());
        let names: Vec<&str> = merged.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["5 hour energy", "5-hour energy", "coffee", "diet coke", "rocket chocolate"]
        );
        let diet = merged.iter().find(|r| r.name == "diet coke").unwrap();
        assert_eq!(diet.caffeine_mg, 46.0);
        let bonus = merged.iter().find(|r| r.name == "rocket chocolate").unwrap();
        assert_eq!((bonus.volume_oz, bonus.caffeine_mg), (0.4, 150.0));
    }

    #[test]
    fn test_merge_is_idempotent() {
        let once = merge_sources(&source_a(), &source_b());
        let twice = merge_sources(&source_a(), &source_b());
        assert_eq!(once, twice);

        let remerged = merge_sources(&source_a(), &once);
        assert_eq!(remerged, once);
    }

    #[test]
    fn test_merge_of_empty_sources_still_has_bonus() {
        let merged = merge_sources(&[], &[]);
        assert_eq!(merged, vec![DrinkRecord::new("rocket chocolate", 0.4, 150.0)]);
    }

    #[test]
    fn test_merge_strips_header_artifact() {
        let mut b = source_b();
        b.push(DrinkRecord::new(HEADER_ROW[0], 1.0, 1.0));
        let merged = merge_sources(&source_a(), &b);
        assert!(merged.iter().all(|r| r.name != "beverage"));
    }

    #[test]
    fn test_bundled_fallback_is_valid() {
        let records = load_fallback(&Config::minimal()).unwrap();
        assert!(!records.is_empty());
        assert!(records.iter().any(|r| r.name == "coca-cola classic"));
        assert!(records.iter().any(|r| r.name == "diet coke"));
        assert!(records.iter().any(|r| r.name == "5 hour energy"));
        for r in &records {
            assert_eq!(r.name, r.name.to_lowercase());
            assert!(r.volume_oz > 0.0);
        }
    }
}
