//! Drink name canonicalization.
//!
//! Turns whatever the speech layer heard ("a cup of coffee?", "Coke") into
//! the lowercase key used by the resolver. The same function is applied to
//! user queries, so every alias must be keyed on already-cleaned text.

/// Characters that never appear in a canonical drink name.
const STRIPPED_CHARS: &[char] = &['?', ':', '!', '/', ';', '@', '#', '$'];

/// Serving phrases dropped from the front of a request.
const SERVING_PREFIXES: &[&str] = &["cup of", "glass of"];

/// Spoken or common names mapped to the name the sources use.
pub const ALIASES: &[(&str, &str)] = &[
    ("pepsi", "pepsi cola"),
    ("coke", "coca-cola classic"),
    ("coca-cola", "coca-cola classic"),
    ("coca cola", "coca-cola classic"),
    ("starbucks blonde", "starbucks coffee blonde roast"),
    ("starbucks blond", "starbucks coffee blonde roast"),
    ("diet cherry coke", "diet cherry coca-cola"),
    ("and w root beer", "a&w root beer"),
    ("mcdonald's coffee", "mcdonalds coffee"),
    ("okay energy drink", "ok energy drink"),
    ("vitamin water energy drink", "vitaminwater energy drink"),
    ("all day energy shot", "allday energy shot"),
    ("blue energy drinks", "blu energy drinks"),
    ("blue frog energy drink", "blu frog energy drink"),
];

/// Look up the canonical name for a cleaned alias.
pub fn alias_for(name: &str) -> Option<&'static str> {
    ALIASES
        .iter()
        .find(|(alias, _)| *alias == name)
        .map(|(_, canonical)| *canonical)
}

/// Canonicalize a raw drink name.
///
/// Returns an empty string when nothing usable is left; callers treat that
/// as "no drink heard".
pub fn normalize(raw: Option<&str>) -> String {
    let Some(raw) = raw else {
        return String::new();
    };

    let lowered = raw.to_lowercase();
    let mut name = lowered.trim_start();

    if name == "a" {
        return String::new();
    }
    if let Some(rest) = name.strip_prefix("a ") {
        name = rest.trim_start();
    }
    for prefix in SERVING_PREFIXES {
        if let Some(rest) = name.strip_prefix(prefix) {
            if rest.is_empty() || rest.starts_with(' ') {
                name = rest.trim_start();
                break;
            }
        }
    }

    let cleaned: String = name.chars().filter(|c| !STRIPPED_CHARS.contains(c)).collect();
    let cleaned = cleaned.trim().replace(" '", "'");

    match alias_for(&cleaned) {
        Some(canonical) => canonical.to_string(),
        None => cleaned,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_inputs_yield_sentinel() {
        assert_eq!(normalize(None), "");
        assert_eq!(normalize(Some("")), "");
        assert_eq!(normalize(Some("a")), "");
        assert_eq!(normalize(Some("a ")), "");
        assert_eq!(normalize(Some("a cup of")), "");
        assert_eq!(normalize(Some("?!")), "");
    }

    #[test]
    fn test_serving_prefixes_removed() {
        assert_eq!(normalize(Some("a cup of coffee")), "coffee");
        assert_eq!(normalize(Some("a glass of coffee")), "coffee");
        assert_eq!(normalize(Some("a coffee")), "coffee");
        assert_eq!(normalize(Some("a cup of coffee?")), "coffee");
        assert_eq!(normalize(Some("cup of coffee")), "coffee");
    }

    #[test]
    fn test_other_phrases_kept() {
        assert_eq!(normalize(Some("a shot of espresso")), "shot of espresso");
        assert_eq!(normalize(Some("americano")), "americano");
        assert_eq!(normalize(Some("cupofjoe")), "cupofjoe");
    }

    #[test]
    fn test_punctuation_and_possessives() {
        assert_eq!(normalize(Some("Red Bull!")), "red bull");
        assert_eq!(normalize(Some("dunkin '  ")), "dunkin'");
        assert_eq!(normalize(Some("peet 's coffee")), "peet's coffee");
    }

    #[test]
    fn test_every_alias_maps_to_its_canonical_name() {
        for (alias, canonical) in ALIASES {
            assert_eq!(normalize(Some(alias)), *canonical, "alias {}", alias);
        }
    }

    #[test]
    fn test_alias_applied_after_cleanup() {
        assert_eq!(normalize(Some("A Coke?")), "coca-cola classic");
        assert_eq!(normalize(Some("a glass of pepsi")), "pepsi cola");
        assert_eq!(normalize(Some("McDonald 's coffee")), "mcdonalds coffee");
    }
}
