//! Tabrest Host
//!
//! The seam between the suspender and the browser. Everything the
//! suspender needs from the outside world goes through two traits:
//!
//! - [`TabHost`]: query tabs and windows, navigate, reload, focus, badge
//! - [`KeyValueStore`]: the browser's `local` and `sync` storage areas
//!
//! # Implementations
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`MemoryTabHost`] | Simulated windows and tabs, records every call |
//! | [`MemoryStore`] | Both storage areas in memory |
//! | [`JsonFileStore`] | Both storage areas as JSON files on disk |
//!
//! # Example
//!
//! ```ignore
//! use tabrest_host::prelude::*;
//!
//! let host = MemoryTabHost::default();
//! let window = host.open_window(true);
//! let tab = host.open_tab(window, "https://example.com")?;
//! host.navigate(tab, &host.extension_url("suspended.html?url=..."))?;
//! ```

pub mod error;
pub mod file;
pub mod memory;
pub mod storage;
pub mod tabs;

// Re-export main types
pub use error::{HostError, HostResult};
pub use file::JsonFileStore;
pub use memory::{HostCall, MemoryStore, MemoryTabHost};
pub use storage::{KeyValueStore, KeyValueStoreExt, StorageArea};
pub use tabs::{BADGE_COLOR, Badge, TabHost, TabQuery};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::error::{HostError, HostResult};
    pub use crate::memory::{MemoryStore, MemoryTabHost};
    pub use crate::storage::{KeyValueStore, KeyValueStoreExt, StorageArea};
    pub use crate::tabs::{Badge, TabHost, TabQuery};
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_traits_are_object_safe() {
        let host: Arc<dyn TabHost> = Arc::new(MemoryTabHost::default());
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());

        assert!(host.windows().unwrap().is_empty());
        store.set_as(StorageArea::Local, "n", &3_u32).unwrap();
        assert_eq!(store.get_as::<u32>(StorageArea::Local, "n").unwrap(), Some(3));
    }
}
