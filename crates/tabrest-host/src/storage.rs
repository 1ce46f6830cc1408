//! The storage half of the host seam.
//!
//! The browser offers two key-value areas: `local`, private to this
//! machine, and `sync`, replicated across the user's devices by the
//! browser itself. Values are opaque JSON.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::HostResult;

/// One of the host's storage areas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageArea {
    /// Device-local storage.
    Local,
    /// Storage synced by the browser.
    Sync,
}

impl StorageArea {
    /// Area name.
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageArea::Local => "local",
            StorageArea::Sync => "sync",
        }
    }
}

impl fmt::Display for StorageArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key-value storage provided by the host.
pub trait KeyValueStore: Send + Sync {
    /// Read a value.
    fn get(&self, area: StorageArea, key: &str) -> HostResult<Option<Value>>;

    /// Write a value.
    fn set(&self, area: StorageArea, key: &str, value: Value) -> HostResult<()>;

    /// Delete a value. Deleting a missing key is not an error.
    fn remove(&self, area: StorageArea, key: &str) -> HostResult<()>;

    /// All keys in an area.
    fn keys(&self, area: StorageArea) -> HostResult<Vec<String>>;
}

/// Typed helpers over any [`KeyValueStore`].
pub trait KeyValueStoreExt: KeyValueStore {
    /// Read and deserialize a value.
    fn get_as<T: DeserializeOwned>(&self, area: StorageArea, key: &str) -> HostResult<Option<T>> {
        match self.get(area, key)? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Serialize and write a value.
    fn set_as<T: Serialize>(&self, area: StorageArea, key: &str, value: &T) -> HostResult<()> {
        self.set(area, key, serde_json::to_value(value)?)
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStoreExt for S {}
