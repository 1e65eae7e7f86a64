//! JSON file cache that forgets everything when the calendar day changes.
//!
//! File layout: `{"_date": "YYYY-MM-DD", "items": {"AAPL": {...}}}`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::entities::hv_info::HvInfo;
use crate::domain::error::DomainError;
use crate::domain::ports::hv_cache::HvCache;

pub const HV_CACHE_FILE: &str = "hv_cache.json";

#[derive(Debug, Default, Serialize, Deserialize)]
struct CacheFile {
    #[serde(rename = "_date")]
    date: String,
    #[serde(default)]
    items: BTreeMap<String, HvInfo>,
}

pub struct JsonDailyCache {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonDailyCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// `<cache_dir>/hv_cache.json`
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(HV_CACHE_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current file contents when stamped `today`; otherwise an empty file
    /// for `today`. Unreadable or corrupt files count as empty.
    fn load(&self, today: &str) -> CacheFile {
        let fresh = || CacheFile {
            date: today.to_string(),
            items: BTreeMap::new(),
        };
        let Ok(text) = std::fs::read_to_string(&self.path) else {
            return fresh();
        };
        match serde_json::from_str::<CacheFile>(&text) {
            Ok(file) if file.date == today => file,
            Ok(_) => fresh(),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "discarding corrupt cache file");
                fresh()
            }
        }
    }

    fn save(&self, file: &CacheFile) -> Result<(), DomainError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| DomainError::Config(format!("create {}: {e}", parent.display())))?;
        }
        let text = serde_json::to_string_pretty(file).map_err(|e| DomainError::Parse(e.to_string()))?;
        std::fs::write(&self.path, text).map_err(|e| DomainError::Config(format!("write {}: {e}", self.path.display())))
    }
}

impl HvCache for JsonDailyCache {
    fn get(&self, symbol: &str, today: NaiveDate) -> Result<Option<HvInfo>, DomainError> {
        let _guard = self.lock.lock().map_err(|e| DomainError::Config(e.to_string()))?;
        let file = self.load(&today.format("%Y-%m-%d").to_string());
        Ok(file.items.get(&symbol.to_uppercase()).cloned())
    }

    fn put(&self, symbol: &str, today: NaiveDate, info: &HvInfo) -> Result<(), DomainError> {
        let _guard = self.lock.lock().map_err(|e| DomainError::Config(e.to_string()))?;
        let mut file = self.load(&today.format("%Y-%m-%d").to_string());
        file.items.insert(symbol.to_uppercase(), info.clone());
        self.save(&file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    #[test]
    fn test_hit_same_day_miss_next_day() {
        let dir = tempfile::tempdir().unwrap();
        let cache = JsonDailyCache::in_dir(&dir.path().join("nested"));
        let info = HvInfo::success(22.0, 40.0, 15.0, 32.5);

        assert_eq!(cache.get("spy", day(3)).unwrap(), None);
        cache.put("spy", day(3), &info).unwrap();
        assert_eq!(cache.get("SPY", day(3)).unwrap(), Some(info.clone()));
        assert_eq!(cache.get("SPY", day(4)).unwrap(), None);

        // writing on a new day drops the stale items
        cache.put("QQQ", day(4), &info).unwrap();
        assert_eq!(cache.get("SPY", day(4)).unwrap(), None);
        let raw = std::fs::read_to_string(cache.path()).unwrap();
        assert!(raw.contains("\"_date\": \"2025-03-04\""));
    }

    #[test]
    fn test_corrupt_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(HV_CACHE_FILE);
        std::fs::write(&path, "{not json").unwrap();
        let cache = JsonDailyCache::new(&path);
        assert_eq!(cache.get("SPY", day(3)).unwrap(), None);
        cache.put("SPY", day(3), &HvInfo::error("boom")).unwrap();
        assert!(!cache.get("SPY", day(3)).unwrap().unwrap().is_ok());
    }
}
