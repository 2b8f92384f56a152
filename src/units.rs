//! Imperial to metric serving conversion.
//!
//! Answers in metric are given per fixed serving (250 mL, 500 mL or 1 L)
//! picked from the drink's size in ounces, with the caffeine scaled to that
//! serving and truncated to whole milligrams.

use crate::models::MetricUnit;

pub const ML_PER_FL_OZ: f64 = 29.5735;

/// Upper bound (exclusive) in ounces of the 250 mL serving.
const SMALL_SERVING_MAX_OZ: f64 = 16.0;
/// Upper bound (exclusive) in ounces of the 500 mL serving.
const MEDIUM_SERVING_MAX_OZ: f64 = 32.0;

pub fn bucket_for(volume_oz: f64) -> MetricUnit {
    if volume_oz < SMALL_SERVING_MAX_OZ {
        MetricUnit::Milliliters250
    } else if volume_oz < MEDIUM_SERVING_MAX_OZ {
        MetricUnit::Milliliters500
    } else {
        MetricUnit::Liter1
    }
}

/// Caffeine in `target_ml` of a drink with `caffeine_mg` per `volume_oz`.
pub fn scale_caffeine(volume_oz: f64, caffeine_mg: f64, target_ml: f64) -> i64 {
    (caffeine_mg / (volume_oz * ML_PER_FL_OZ) * target_ml) as i64
}

/// Convert a serving to `(caffeine mg, volume, unit)` spoken strings.
pub fn to_metric(volume_oz: f64, caffeine_mg: f64) -> (String, String, MetricUnit) {
    let unit = bucket_for(volume_oz);
    let scaled = scale_caffeine(volume_oz, caffeine_mg, unit.milliliters());
    (scaled.to_string(), unit.volume_label().to_string(), unit)
}
