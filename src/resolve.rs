//! Drink name resolution.
//!
//! Matching is deliberately loose: a record is a candidate when its name
//! contains the query or the query contains its name, so partial or padded
//! speech-to-text output still finds the drink. Only when several records
//! qualify does a fuzzy similarity pick one of them.
//!
//! Short names can match inside longer unrelated ones ("tea" in "matea");
//! that imprecision is accepted in exchange for recall.

use similar::TextDiff;

use crate::models::{DrinkRecord, ResolutionOutcome};
use crate::normalize::normalize;

/// Minimum similarity for the fuzzy tie-break to pick a name.
pub const FUZZY_CUTOFF: f64 = 0.6;

/// Resolve a free-text drink name against `records`.
pub fn resolve(query: &str, records: &[DrinkRecord]) -> ResolutionOutcome {
    let query = normalize(Some(query));
    if query.is_empty() {
        return ResolutionOutcome::NoMatch;
    }

    let candidates = find_candidates(&query, records);
    match candidates.len() {
        0 => ResolutionOutcome::NoMatch,
        1 => ResolutionOutcome::SingleMatch(candidates[0].clone()),
        _ => {
            let chosen = disambiguate(&query, &candidates).clone();
            ResolutionOutcome::MultiMatch {
                candidates: candidates.into_iter().cloned().collect(),
                chosen,
            }
        }
    }
}

/// Records whose name and `query` contain one another, in store order.
pub fn find_candidates<'a>(query: &str, records: &'a [DrinkRecord]) -> Vec<&'a DrinkRecord> {
    if query.is_empty() {
        return Vec::new();
    }
    records
        .iter()
        .filter(|r| !r.name.is_empty() && (query.contains(&r.name) || r.name.contains(query)))
        .collect()
}

/// Sequence-matcher similarity of two strings: `2 * matches / total_len`.
pub fn similarity(a: &str, b: &str) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    f64::from(TextDiff::from_chars(a, b).ratio())
}

/// The single closest name to `query`, if any clears [`FUZZY_CUTOFF`].
///
/// Equal scores go to the lexicographically greater name.
pub fn closest_match<'a, I>(query: &str, names: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut best: Option<(&'a str, f64)> = None;
    for name in names {
        let score = similarity(query, name);
        if score < FUZZY_CUTOFF {
            continue;
        }
        match best {
            Some((best_name, best_score))
                if best_score > score || (best_score == score && best_name >= name) => {}
            _ => best = Some((name, score)),
        }
    }
    best.map(|(name, _)| name)
}

fn disambiguate<'a>(query: &str, candidates: &[&'a DrinkRecord]) -> &'a DrinkRecord {
    if let Some(name) = closest_match(query, candidates.iter().map(|r| r.name.as_str())) {
        if let Some(record) = candidates.iter().find(|r| r.name == name) {
            return record;
        }
    }

    // No close name: take the first candidate contained in the first
    // candidate's name, which is deterministic and never empty.
    let first = candidates[0];
    candidates
        .iter()
        .copied()
        .find(|r| first.name.contains(&r.name))
        .unwrap_or(first)
}
