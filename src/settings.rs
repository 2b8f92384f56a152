//! Persisted settings (the `lastUpdate` timestamp).
//!
//! Settings belong to the host, so they sit behind [`SettingsStore`].
//! [`FileSettings`] keeps them in a small JSON object on disk and leaves
//! unknown keys alone.

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;

use crate::cache::write_atomic;

pub const LAST_UPDATE_KEY: &str = "lastUpdate";

/// Format of the stored timestamp, e.g. `2019-04-04 14:55:06.686601`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

pub trait SettingsStore: Send + Sync {
    /// When the drink data was last refreshed, if ever.
    fn last_update(&self) -> Option<NaiveDateTime>;

    /// Record a successful refresh.
    fn set_last_update(&self, at: NaiveDateTime) -> Result<()>;
}

pub fn format_timestamp(at: NaiveDateTime) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a stored timestamp; the fractional part is optional.
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text.trim(), "%Y-%m-%d %H:%M:%S%.f").ok()
}

pub struct FileSettings {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileSettings {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Settings file inside a cache directory.
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join("settings.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<Map<String, Value>> {
        if !self.path.exists() {
            return Ok(Map::new());
        }
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read settings: {}", self.path.display()))?;
        if content.trim().is_empty() {
            return Ok(Map::new());
        }
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse settings: {}", self.path.display()))
    }
}

impl SettingsStore for FileSettings {
    fn last_update(&self) -> Option<NaiveDateTime> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let map = match self.read_map() {
            Ok(map) => map,
            Err(e) => {
                warn!(error = %format!("{:#}", e), "settings unreadable; treating data as stale");
                return None;
            }
        };
        let raw = map.get(LAST_UPDATE_KEY)?.as_str()?;
        let parsed = parse_timestamp(raw);
        if parsed.is_none() {
            warn!(value = raw, "unparseable {} setting", LAST_UPDATE_KEY);
        }
        parsed
    }

    fn set_last_update(&self, at: NaiveDateTime) -> Result<()> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut map = self.read_map().unwrap_or_default();
        map.insert(
            LAST_UPDATE_KEY.to_string(),
            Value::String(format_timestamp(at)),
        );
        let body = serde_json::to_vec_pretty(&map).context("Failed to serialize settings")?;
        write_atomic(&self.path, &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn at(h: u32, m: u32, s: u32, micro: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2019, 4, 4)
            .unwrap()
            .and_hms_micro_opt(h, m, s, micro)
            .unwrap()
    }

    #[test]
    fn test_timestamp_format() {
        let ts = at(14, 55, 6, 686_601);
        assert_eq!(format_timestamp(ts), "2019-04-04 14:55:06.686601");
        assert_eq!(parse_timestamp("2019-04-04 14:55:06.686601"), Some(ts));
        assert_eq!(parse_timestamp("2019-04-04 14:55:06"), Some(at(14, 55, 6, 0)));
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn test_round_trip_keeps_other_keys() {
        let tmp = TempDir::new().unwrap();
        let settings = FileSettings::in_dir(tmp.path());
        assert_eq!(settings.last_update(), None);

        std::fs::write(settings.path(), r#"{"units": "metric"}"#).unwrap();
        settings.set_last_update(at(9, 0, 0, 0)).unwrap();

        assert_eq!(settings.last_update(), Some(at(9, 0, 0, 0)));
        let raw = std::fs::read_to_string(settings.path()).unwrap();
        assert!(raw.contains("\"units\""));
        assert!(raw.contains("\"lastUpdate\""));
    }

    #[test]
    fn test_garbage_settings_read_as_never_updated() {
        let tmp = TempDir::new().unwrap();
        let settings = FileSettings::in_dir(tmp.path());
        std::fs::write(settings.path(), "{{{").unwrap();
        assert_eq!(settings.last_update(), None);

        std::fs::write(settings.path(), r#"{"lastUpdate": "soon"}"#).unwrap();
        assert_eq!(settings.last_update(), None);
    }
}
