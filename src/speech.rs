//! Speech-text normalization for drink names.
//!
//! Speech-to-text output writes numbers as digits and drops articles, while
//! the sources spell names the way the label does ("7-eleven energy shot",
//! "the original donut shop"). Normalizing source names the same way lets a
//! heard phrase match either form.

/// Articles dropped from utterances.
const ARTICLES: &[&str] = &["a", "an", "the"];

/// Number words rewritten as digits.
const NUMBER_WORDS: &[&str] = &[
    "zero", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten",
    "eleven", "twelve", "thirteen", "fourteen", "fifteen", "sixteen", "seventeen", "eighteen",
    "nineteen", "twenty",
];

/// Contractions expanded before matching.
const CONTRACTIONS: &[(&str, &str)] = &[
    ("can't", "can not"),
    ("don't", "do not"),
    ("isn't", "is not"),
    ("it's", "it is"),
    ("what's", "what is"),
    ("won't", "will not"),
];

/// Normalize an utterance the way the speech layer renders it.
///
/// Lowercases, expands contractions, drops articles, rewrites number words
/// zero through twenty as digits and collapses whitespace.
pub fn normalize_utterance(text: &str) -> String {
    let lowered = text.to_lowercase();
    let mut words: Vec<String> = Vec::new();

    for word in lowered.split_whitespace() {
        if ARTICLES.contains(&word) {
            continue;
        }
        if let Some((_, expanded)) = CONTRACTIONS.iter().find(|(c, _)| *c == word) {
            words.extend(expanded.split(' ').map(str::to_string));
            continue;
        }
        match NUMBER_WORDS.iter().position(|n| *n == word) {
            Some(value) => words.push(value.to_string()),
            None => words.push(word.to_string()),
        }
    }

    words.join(" ")
}

/// Spoken-form alias for a source drink name, if it differs from the name.
///
/// Hyphens are read as word breaks ("coca-cola" is heard as "coca cola").
pub fn spoken_alias(name: &str) -> Option<String> {
    let spoken = normalize_utterance(&name.replace('-', " "));
    if spoken.is_empty() || spoken == name {
        None
    } else {
        Some(spoken)
    }
}
