//! Core data models used throughout the caffeine lookup.
//!
//! These types represent the raw rows scraped from a source, the canonical
//! drink records they become, and the outcomes handed back to callers.

use serde::{Deserialize, Serialize};

/// Header row that one of the sources occasionally leaks into its table body.
pub const HEADER_ROW: [&str; 3] = ["beverage", "quantity (oz)", "caffeine content (mg)"];

/// Raw row produced by a connector before validation.
///
/// All three fields are still text exactly as the source rendered them
/// (lowercased, trimmed).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRow {
    pub name: String,
    pub volume: String,
    pub caffeine: String,
}

impl SourceRow {
    pub fn new(name: impl Into<String>, volume: impl Into<String>, caffeine: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            volume: volume.into(),
            caffeine: caffeine.into(),
        }
    }

    /// Whether this row is the leaked table header.
    pub fn is_header(&self) -> bool {
        self.name == HEADER_ROW[0] && self.volume == HEADER_ROW[1] && self.caffeine == HEADER_ROW[2]
    }
}

/// A canonical drink entry in the merged database.
///
/// `volume_oz` is always positive and `caffeine_mg` never negative; rows that
/// violate either are rejected by [`DrinkRecord::from_row`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrinkRecord {
    pub name: String,
    pub volume_oz: f64,
    pub caffeine_mg: f64,
}

impl DrinkRecord {
    pub fn new(name: impl Into<String>, volume_oz: f64, caffeine_mg: f64) -> Self {
        Self {
            name: name.into(),
            volume_oz,
            caffeine_mg,
        }
    }

    /// Validate a raw row. Returns `None` for the header artifact, empty
    /// names, and non-numeric or out-of-range quantities.
    pub fn from_row(row: &SourceRow) -> Option<Self> {
        if row.is_header() || row.name.trim().is_empty() {
            return None;
        }
        let volume_oz = parse_quantity(&row.volume)?;
        let caffeine_mg = parse_quantity(&row.caffeine)?;
        if volume_oz <= 0.0 || caffeine_mg < 0.0 {
            return None;
        }
        Some(Self::new(row.name.trim(), volume_oz, caffeine_mg))
    }
}

/// Parse a scraped numeric cell such as `"12"`, `".4"` or `"1,000"`.
fn parse_quantity(text: &str) -> Option<f64> {
    let cleaned: String = text.trim().chars().filter(|c| *c != ',').collect();
    let value = cleaned.parse::<f64>().ok()?;
    value.is_finite().then_some(value)
}

/// Result of matching a query against the drink database.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolutionOutcome {
    NoMatch,
    SingleMatch(DrinkRecord),
    MultiMatch {
        candidates: Vec<DrinkRecord>,
        chosen: DrinkRecord,
    },
}

impl ResolutionOutcome {
    /// The record the answer should be about, if any.
    pub fn chosen(&self) -> Option<&DrinkRecord> {
        match self {
            ResolutionOutcome::NoMatch => None,
            ResolutionOutcome::SingleMatch(record) => Some(record),
            ResolutionOutcome::MultiMatch { chosen, .. } => Some(chosen),
        }
    }

    /// Every record that matched, in store order.
    pub fn candidates(&self) -> &[DrinkRecord] {
        match self {
            ResolutionOutcome::NoMatch => &[],
            ResolutionOutcome::SingleMatch(record) => std::slice::from_ref(record),
            ResolutionOutcome::MultiMatch { candidates, .. } => candidates,
        }
    }
}

/// Metric serving size an answer is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricUnit {
    Milliliters250,
    Milliliters500,
    Liter1,
}

impl MetricUnit {
    /// Serving volume in milliliters.
    pub fn milliliters(self) -> f64 {
        match self {
            MetricUnit::Milliliters250 => 250.0,
            MetricUnit::Milliliters500 => 500.0,
            MetricUnit::Liter1 => 1000.0,
        }
    }

    /// Spoken volume figure for the serving.
    pub fn volume_label(self) -> &'static str {
        match self {
            MetricUnit::Milliliters250 => "250",
            MetricUnit::Milliliters500 => "500",
            MetricUnit::Liter1 => "1",
        }
    }

    /// Spoken unit word for the serving.
    pub fn unit_word(self) -> &'static str {
        match self {
            MetricUnit::Milliliters250 | MetricUnit::Milliliters500 => "milliliters",
            MetricUnit::Liter1 => "liter",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_row_rejected() {
        let row = SourceRow::new("beverage", "quantity (oz)", "caffeine content (mg)");
        assert!(row.is_header());
        assert!(DrinkRecord::from_row(&row).is_none());
    }

    #[test]
    fn test_from_row_parses_quantities() {
        let row = SourceRow::new("rocket chocolate", ".4", "150");
        let record = DrinkRecord::from_row(&row).unwrap();
        assert_eq!(record.name, "rocket chocolate");
        assert!((record.volume_oz - 0.4).abs() < 1e-9);
        assert!((record.caffeine_mg - 150.0).abs() < 1e-9);
    }

    #[test]
    fn test_from_row_rejects_invalid_quantities() {
        assert!(DrinkRecord::from_row(&SourceRow::new("water", "0", "0")).is_none());
        assert!(DrinkRecord::from_row(&SourceRow::new("water", "8", "-1")).is_none());
        assert!(DrinkRecord::from_row(&SourceRow::new("water", "n/a", "0")).is_none());
        assert!(DrinkRecord::from_row(&SourceRow::new("  ", "8", "1")).is_none());
    }

    #[test]
    fn test_from_row_accepts_thousands_separator() {
        let record = DrinkRecord::from_row(&SourceRow::new("death wish", "128", "1,320")).unwrap();
        assert!((record.caffeine_mg - 1320.0).abs() < 1e-9);
    }

    #[test]
    fn test_outcome_accessors() {
        let a = DrinkRecord::new("coffee", 8.0, 95.0);
        let b = DrinkRecord::new("iced coffee", 16.0, 165.0);
        assert!(ResolutionOutcome::NoMatch.chosen().is_none());
        assert!(ResolutionOutcome::NoMatch.candidates().is_empty());

        let single = ResolutionOutcome::SingleMatch(a.clone());
        assert_eq!(single.chosen(), Some(&a));
        assert_eq!(single.candidates().len(), 1);

        let multi = ResolutionOutcome::MultiMatch {
            candidates: vec![a.clone(), b],
            chosen: a.clone(),
        };
        assert_eq!(multi.chosen(), Some(&a));
        assert_eq!(multi.candidates().len(), 2);
    }
}
