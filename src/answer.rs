//! Spoken answer text.
//!
//! The host renders dialog; these are the plain-text answers the lookup
//! hands it, one per outcome.

use crate::config::UnitSystem;
use crate::models::DrinkRecord;
use crate::units;

pub const NO_DRINK_HEARD: &str = "I could not understand the drink that you requested.";
pub const MORE_MATCHES: &str = "I have more drinks that match. Would you like to hear them?";
pub const UPDATING: &str = "Sure. Updating the caffeine database.";
pub const UPDATE_COMPLETE: &str = "Update completed.";
pub const UPDATE_FAILED: &str = "Update failed. I will keep using the drinks I already know.";

/// Serving figures as spoken: `(caffeine, size, size unit)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Serving {
    pub caffeine_mg: String,
    pub size: String,
    pub size_unit: &'static str,
}

pub fn serving(record: &DrinkRecord, units: UnitSystem) -> Serving {
    match units {
        UnitSystem::Imperial => Serving {
            caffeine_mg: record.caffeine_mg.to_string(),
            size: record.volume_oz.to_string(),
            size_unit: "ounces",
        },
        UnitSystem::Metric => {
            let (caffeine_mg, size, unit) = units::to_metric(record.volume_oz, record.caffeine_mg);
            Serving {
                caffeine_mg,
                size,
                size_unit: unit.unit_word(),
            }
        }
    }
}

/// "coffee has 95 milligrams of caffeine in 8 ounces."
pub fn drink_caffeine(record: &DrinkRecord, units: UnitSystem) -> String {
    let s = serving(record, units);
    format!(
        "{} has {} milligrams of caffeine in {} {}.",
        record.name, s.caffeine_mg, s.size, s.size_unit
    )
}

pub fn not_found(drink: &str) -> String {
    format!("I am sorry, {} is not on my list.", drink)
}

/// One answer per distinct drink name, in candidate order.
pub fn alternates(candidates: &[DrinkRecord], units: UnitSystem) -> Vec<String> {
    let mut spoken: Vec<&str> = Vec::new();
    let mut lines = Vec::new();
    for record in candidates {
        if spoken.contains(&record.name.as_str()) {
            continue;
        }
        spoken.push(&record.name);
        lines.push(drink_caffeine(record, units));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_imperial_answer() {
        let record = DrinkRecord::new("coca-cola classic", 12.0, 34.0);
        assert_eq!(
            drink_caffeine(&record, UnitSystem::Imperial),
            "coca-cola classic has 34 milligrams of caffeine in 12 ounces."
        );
        let record = DrinkRecord::new("rocket chocolate", 0.4, 150.0);
        assert_eq!(
            drink_caffeine(&record, UnitSystem::Imperial),
            "rocket chocolate has 150 milligrams of caffeine in 0.4 ounces."
        );
    }

    #[test]
    fn test_metric_answer() {
        let record = DrinkRecord::new("big soda", 36.0, 102.0);
        assert_eq!(
            drink_caffeine(&record, UnitSystem::Metric),
            "big soda has 95 milligrams of caffeine in 1 liter."
        );
        let record = DrinkRecord::new("coca-cola classic", 12.0, 34.0);
        assert_eq!(
            serving(&record, UnitSystem::Metric),
            Serving {
                caffeine_mg: "23".to_string(),
                size: "250".to_string(),
                size_unit: "milliliters",
            }
        );
    }

    #[test]
    fn test_alternates_skip_repeated_names() {
        let candidates = vec![
            DrinkRecord::new("coffee", 8.0, 95.0),
            DrinkRecord::new("iced coffee", 16.0, 165.0),
            DrinkRecord::new("coffee", 12.0, 140.0),
        ];
        let lines = alternates(&candidates, UnitSystem::Imperial);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("coffee has 95"));
        assert!(lines[1].starts_with("iced coffee has 165"));
    }

    #[test]
    fn test_not_found() {
        assert_eq!(not_found("software"), "I am sorry, software is not on my list.");
    }
}
