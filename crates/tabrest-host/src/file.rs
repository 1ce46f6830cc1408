//! File-backed storage.
//!
//! Each area lives in its own JSON file (`local.json`, `sync.json`) inside
//! a directory. Values are cached in memory and the area's file is
//! rewritten on every change.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{HostError, HostResult};
use crate::storage::{KeyValueStore, StorageArea};

type AreaCache = BTreeMap<String, Value>;

/// Key-value storage persisted as JSON files.
#[derive(Debug)]
pub struct JsonFileStore {
    dir: PathBuf,
    cache: Mutex<HashMap<StorageArea, AreaCache>>,
}

impl JsonFileStore {
    /// Open a store rooted at `dir`, loading any existing area files.
    ///
    /// A missing directory is created on the first write. An area file that
    /// cannot be parsed is an error rather than silently discarded.
    pub fn open(dir: impl Into<PathBuf>) -> HostResult<Self> {
        let dir = dir.into();
        let mut cache = HashMap::new();

        for area in [StorageArea::Local, StorageArea::Sync] {
            let path = area_path(&dir, area);
            if path.exists() {
                let contents = fs::read_to_string(&path)?;
                let values: AreaCache = serde_json::from_str(&contents)?;
                debug!(area = %area, keys = values.len(), path = %path.display(), "Loaded storage area");
                cache.insert(area, values);
            }
        }

        Ok(Self {
            dir,
            cache: Mutex::new(cache),
        })
    }

    /// The directory holding the area files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of one area's file.
    pub fn path_for(&self, area: StorageArea) -> PathBuf {
        area_path(&self.dir, area)
    }

    fn flush(&self, area: StorageArea, values: &AreaCache) -> HostResult<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(area);
        let contents = serde_json::to_string_pretty(values)?;
        fs::write(&path, contents).map_err(|e| {
            warn!(area = %area, path = %path.display(), error = %e, "Failed to write storage");
            HostError::Io(e)
        })
    }
}

fn area_path(dir: &Path, area: StorageArea) -> PathBuf {
    dir.join(format!("{}.json", area.as_str()))
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, area: StorageArea, key: &str) -> HostResult<Option<Value>> {
        Ok(self
            .cache
            .lock()
            .get(&area)
            .and_then(|values| values.get(key))
            .cloned())
    }

    fn set(&self, area: StorageArea, key: &str, value: Value) -> HostResult<()> {
        let mut cache = self.cache.lock();
        let mut values = cache.get(&area).cloned().unwrap_or_default();
        values.insert(key.to_string(), value);
        self.flush(area, &values)?;
        cache.insert(area, values);
        Ok(())
    }

    fn remove(&self, area: StorageArea, key: &str) -> HostResult<()> {
        let mut cache = self.cache.lock();
        let Some(current) = cache.get(&area) else {
            return Ok(());
        };
        if !current.contains_key(key) {
            return Ok(());
        }
        let mut values = current.clone();
        values.remove(key);
        self.flush(area, &values)?;
        cache.insert(area, values);
        Ok(())
    }

    fn keys(&self, area: StorageArea) -> HostResult<Vec<String>> {
        Ok(self
            .cache
            .lock()
            .get(&area)
            .map(|values| values.keys().cloned().collect())
            .unwrap_or_default())
    }
}
