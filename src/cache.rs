//! On-disk cache slots.
//!
//! Each source is snapshotted to its own slot (`<dir>/<slot>.json`) so a
//! restart inside the staleness window can rebuild the store without the
//! network. Writes go to a temporary file that is renamed over the slot, so
//! a reader sees either the old snapshot or the new one.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::models::DrinkRecord;

#[derive(Debug, Clone)]
pub struct CacheSlots {
    dir: PathBuf,
}

impl CacheSlots {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn slot_path(&self, slot: &str) -> PathBuf {
        self.dir.join(format!("{}.json", slot))
    }

    pub fn exists(&self, slot: &str) -> bool {
        self.slot_path(slot).is_file()
    }

    pub fn load(&self, slot: &str) -> Result<Vec<DrinkRecord>> {
        let path = self.slot_path(slot);
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read cache slot: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Corrupt cache slot: {}", path.display()))
    }

    /// Load a slot if it exists, treating a missing slot as empty.
    pub fn load_or_empty(&self, slot: &str) -> Result<Vec<DrinkRecord>> {
        if self.exists(slot) {
            self.load(slot)
        } else {
            Ok(Vec::new())
        }
    }

    pub fn store(&self, slot: &str, records: &[DrinkRecord]) -> Result<()> {
        let path = self.slot_path(slot);
        let body = serde_json::to_vec(records).context("Failed to serialize cache slot")?;
        write_atomic(&path, &body)
    }
}

/// Write `contents` to `path` through a sibling temp file and a rename.
pub(crate) fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    std::fs::write(&tmp, contents)
        .with_context(|| format!("Failed to write {}", tmp.display()))?;
    std::fs::rename(&tmp, path)
        .with_context(|| format!("Failed to replace {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_store_then_load() {
        let tmp = TempDir::new().unwrap();
        let slots = CacheSlots::new(tmp.path().join("nested"));
        let records = vec![
            DrinkRecord::new("coffee", 8.0, 95.0),
            DrinkRecord::new("rocket chocolate", 0.4, 150.0),
        ];

        assert!(!slots.exists("source_b_cache"));
        slots.store("source_b_cache", &records).unwrap();
        assert!(slots.exists("source_b_cache"));
        assert_eq!(slots.load("source_b_cache").unwrap(), records);
        assert!(!tmp.path().join("nested/source_b_cache.json.tmp").exists());
    }

    #[test]
    fn test_overwrite_replaces_snapshot() {
        let tmp = TempDir::new().unwrap();
        let slots = CacheSlots::new(tmp.path());
        slots
            .store("source_a_cache", &[DrinkRecord::new("tea", 8.0, 47.0)])
            .unwrap();
        slots.store("source_a_cache", &[]).unwrap();
        assert!(slots.load("source_a_cache").unwrap().is_empty());
    }

    #[test]
    fn test_missing_and_corrupt_slots() {
        let tmp = TempDir::new().unwrap();
        let slots = CacheSlots::new(tmp.path());
        assert!(slots.load("source_a_cache").is_err());
        assert!(slots.load_or_empty("source_a_cache").unwrap().is_empty());

        std::fs::write(slots.slot_path("source_a_cache"), "not json").unwrap();
        let err = slots.load("source_a_cache").unwrap_err();
        assert!(format!("{:#}", err).contains("Corrupt cache slot"));
    }
}
