//! Request handling.
//!
//! [`CaffeineService`] is what a voice host talks to: it owns a
//! [`DrinkStore`] handle and the answer preferences, resolves slot values
//! into spoken answers and drives manual refreshes. Used by both the
//! `caff drink` CLI command and [`crate::query`].

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::answer;
use crate::config::{Config, UnitSystem};
use crate::fetch::HttpFetcher;
use crate::models::{DrinkRecord, ResolutionOutcome};
use crate::normalize::normalize;
use crate::resolve::resolve;
use crate::settings::FileSettings;
use crate::store::{DrinkStore, RefreshReport};

/// What a lookup came to.
#[derive(Debug, Clone, PartialEq)]
pub enum LookupOutcome {
    /// Nothing usable was heard.
    EmptyQuery,
    Resolved(ResolutionOutcome),
}

#[derive(Debug, Clone)]
pub struct LookupResponse {
    /// The canonical query the store was searched with.
    pub query: String,
    pub outcome: LookupOutcome,
    /// Text to speak.
    pub answer: String,
    /// Prompt offered after the answer, when there is more to say.
    pub follow_up: Option<&'static str>,
}

impl LookupResponse {
    pub fn found(&self) -> Option<&DrinkRecord> {
        match &self.outcome {
            LookupOutcome::Resolved(outcome) => outcome.chosen(),
            LookupOutcome::EmptyQuery => None,
        }
    }
}

/// A manual refresh in flight.
pub struct ManualRefresh {
    /// Message to speak right away, when notification was requested.
    pub started: Option<&'static str>,
    /// Resolves to the completion message, when notification was requested.
    pub task: JoinHandle<Option<String>>,
}

#[derive(Clone)]
pub struct CaffeineService {
    store: DrinkStore,
    units: UnitSystem,
    wait_timeout: Duration,
}

impl CaffeineService {
    pub fn new(store: DrinkStore, units: UnitSystem, wait_timeout: Duration) -> Self {
        Self {
            store,
            units,
            wait_timeout,
        }
    }

    /// Service over HTTP sources, with settings kept in the cache directory.
    pub fn from_config(config: &Config) -> Result<Self> {
        let fetcher = Arc::new(HttpFetcher::new(config.sources.timeout_secs)?);
        let settings = Arc::new(FileSettings::in_dir(&config.cache.dir));
        let store = DrinkStore::new(config.clone(), fetcher, settings);
        Ok(Self::new(
            store,
            config.answers.units,
            Duration::from_secs(config.refresh.wait_timeout_secs),
        ))
    }

    pub fn with_units(mut self, units: UnitSystem) -> Self {
        self.units = units;
        self
    }

    pub fn store(&self) -> &DrinkStore {
        &self.store
    }

    pub fn units(&self) -> UnitSystem {
        self.units
    }

    /// Kick off the startup refresh in the background. Fresh cache slots are
    /// reused; otherwise the sources are fetched.
    pub fn start(&self) -> Option<JoinHandle<RefreshReport>> {
        self.store.spawn_refresh(false)
    }

    /// Answer a drink slot value.
    ///
    /// If a refresh is running, waits for it up to the configured timeout and
    /// then answers from whatever records are installed.
    pub async fn resolve_drink_query(&self, free_text: Option<&str>) -> LookupResponse {
        let query = normalize(free_text);
        if query.is_empty() {
            return LookupResponse {
                query,
                outcome: LookupOutcome::EmptyQuery,
                answer: answer::NO_DRINK_HEARD.to_string(),
                follow_up: None,
            };
        }

        if self.store.is_refreshing() {
            debug!(query = %query, "waiting for refresh to finish");
            if !self.store.wait_until_ready(self.wait_timeout).await {
                warn!(
                    timeout_secs = self.wait_timeout.as_secs(),
                    "refresh still running; answering from loaded data"
                );
            }
        }

        let records = self.store.snapshot();
        let outcome = resolve(&query, &records);
        debug!(query = %query, candidates = outcome.candidates().len(), "resolved");

        let (answer, follow_up) = match &outcome {
            ResolutionOutcome::NoMatch => (answer::not_found(&query), None),
            ResolutionOutcome::SingleMatch(record) => {
                (answer::drink_caffeine(record, self.units), None)
            }
            ResolutionOutcome::MultiMatch { chosen, .. } => (
                answer::drink_caffeine(chosen, self.units),
                Some(answer::MORE_MATCHES),
            ),
        };

        LookupResponse {
            query,
            outcome: LookupOutcome::Resolved(outcome),
            answer,
            follow_up,
        }
    }

    /// Answers for every distinct drink that matched, for the "yes, list
    /// them" reply to [`answer::MORE_MATCHES`].
    pub fn alternates(&self, response: &LookupResponse) -> Vec<String> {
        match &response.outcome {
            LookupOutcome::Resolved(ResolutionOutcome::MultiMatch { candidates, .. }) => {
                answer::alternates(candidates, self.units)
            }
            _ => Vec::new(),
        }
    }

    /// Refresh from the sources regardless of staleness.
    ///
    /// With `notify` set, [`ManualRefresh::started`] carries the start message
    /// and the task yields the completion message. Returns `None` if a
    /// refresh is already running.
    pub fn force_refresh(&self, notify: bool) -> Option<ManualRefresh> {
        let task = self.store.spawn_refresh(true)?;
        let started = notify.then_some(answer::UPDATING);
        let task = tokio::spawn(async move {
            let success = match task.await {
                Ok(report) => report.success,
                Err(e) => {
                    warn!(error = %e, "refresh task aborted");
                    false
                }
            };
            if !notify {
                return None;
            }
            let message = if success {
                answer::UPDATE_COMPLETE
            } else {
                answer::UPDATE_FAILED
            };
            Some(message.to_string())
        });
        Some(ManualRefresh { started, task })
    }
}

/// Print the answer for one `caff drink` invocation.
pub fn print_response(service: &CaffeineService, response: &LookupResponse, all: bool) {
    println!("{}", response.answer);
    if all {
        for line in service.alternates(response) {
            if line != response.answer {
                println!("  {}", line);
            }
        }
    } else if let Some(follow_up) = response.follow_up {
        println!("{}", follow_up);
    }
}

pub async fn run_drink(config: &Config, name: &str, metric: bool, all: bool) -> Result<()> {
    let mut service = CaffeineService::from_config(config)?;
    if metric {
        service = service.with_units(UnitSystem::Metric);
    }
    service.start();

    let response = service.resolve_drink_query(Some(name)).await;
    print_response(&service, &response, all);
    Ok(())
}
