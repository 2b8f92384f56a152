//! Whole-utterance question matching.
//!
//! Hosts that route free questions ("what is the caffeine content of diet
//! coke") to every skill ask each one how well it can answer. The drink is
//! taken from after the last "of" or "in", and the confidence depends on
//! whether the drink was found and whether caffeine was mentioned.

use anyhow::Result;
use regex::Regex;
use std::sync::OnceLock;

use crate::answer;
use crate::config::{Config, UnitSystem};
use crate::service::{print_response, CaffeineService, LookupResponse};

/// How confidently a phrase can be answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchLevel {
    /// Caffeine was asked about and the drink is known.
    Exact,
    /// Caffeine was asked about but the drink is unknown.
    Category,
    /// The drink is known but caffeine was not mentioned.
    General,
}

#[derive(Debug, Clone)]
pub struct PhraseMatch {
    pub level: MatchLevel,
    pub drink: String,
    pub answer: String,
    pub response: LookupResponse,
}

fn drink_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^.*\b(?:of|in)\s+(?P<drink>.+)$").expect("valid drink pattern")
    })
}

/// The drink named after the last "of" or "in", if any.
pub fn extract_drink(phrase: &str) -> Option<String> {
    let captures = drink_pattern().captures(phrase.trim())?;
    let drink = captures.name("drink")?.as_str().trim();
    (!drink.is_empty()).then(|| drink.to_string())
}

pub fn mentions_caffeine(phrase: &str) -> bool {
    phrase.to_lowercase().contains("caffeine")
}

/// Classify a free-text question, answering it when it is about a drink.
pub async fn match_query_phrase(service: &CaffeineService, phrase: &str) -> Option<PhraseMatch> {
    let drink = extract_drink(phrase)?;
    let caffeine = mentions_caffeine(phrase);
    let response = service.resolve_drink_query(Some(drink.as_str())).await;
    let found = response.found().is_some();

    let (level, answer) = match (found, caffeine) {
        (true, true) => (MatchLevel::Exact, response.answer.clone()),
        (true, false) => (MatchLevel::General, response.answer.clone()),
        (false, true) => (MatchLevel::Category, answer::not_found(&drink)),
        (false, false) => return None,
    };

    Some(PhraseMatch {
        level,
        drink,
        answer,
        response,
    })
}

pub async fn run_ask(config: &Config, phrase: &str, metric: bool, all: bool) -> Result<()> {
    let mut service = CaffeineService::from_config(config)?;
    if metric {
        service = service.with_units(UnitSystem::Metric);
    }
    service.start();

    match match_query_phrase(&service, phrase).await {
        Some(matched) => {
            eprintln!("match: {:?} ({})", matched.level, matched.drink);
            if matched.level == MatchLevel::Category {
                println!("{}", matched.answer);
            } else {
                print_response(&service, &matched.response, all);
            }
        }
        None => {
            eprintln!("match: none");
        }
    }
    Ok(())
}
