//! In-process host implementations.
//!
//! [`MemoryTabHost`] models windows and tabs the way a browser reports
//! them, and records every navigation and reload so callers can see what
//! the suspender asked for. [`MemoryStore`] keeps both storage areas in
//! maps.

use std::collections::{BTreeMap, HashMap, HashSet};

use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use tracing::debug;

use tabrest_core::{Tab, TabId, Window, WindowId};

use crate::error::{HostError, HostResult};
use crate::storage::{KeyValueStore, StorageArea};
use crate::tabs::{Badge, TabHost, TabQuery};

/// Something the host was asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCall {
    /// A tab was navigated.
    Navigate {
        /// The tab.
        tab: TabId,
        /// Destination URL.
        url: String,
    },
    /// A tab was reloaded.
    Reload(TabId),
    /// A tab was opened.
    Create {
        /// The new tab.
        tab: TabId,
        /// Its URL.
        url: String,
    },
    /// A tab was focused.
    Focus(TabId),
}

#[derive(Debug, Default)]
struct BrowserState {
    windows: Vec<Window>,
    next_tab_id: i64,
    next_window_id: i64,
    badge: Badge,
    calls: Vec<HostCall>,
    broken: HashSet<TabId>,
}

impl BrowserState {
    fn tab_mut(&mut self, id: TabId) -> HostResult<&mut Tab> {
        self.windows
            .iter_mut()
            .flat_map(|w| w.tabs.iter_mut())
            .find(|t| t.id == id)
            .ok_or(HostError::TabNotFound(id))
    }

    fn check_broken(&self, id: TabId) -> HostResult<()> {
        if self.broken.contains(&id) {
            return Err(HostError::Unavailable(format!("tab {id} is not responding")));
        }
        Ok(())
    }

    fn focused_window(&self) -> Option<WindowId> {
        self.windows
            .iter()
            .find(|w| w.focused)
            .or_else(|| self.windows.first())
            .map(|w| w.id)
    }
}

/// A simulated browser.
///
/// # Example
///
/// ```ignore
/// let host = MemoryTabHost::new("chrome-extension://test/");
/// let window = host.open_window(true);
/// let tab = host.open_tab(window, "https://example.com")?;
/// host.activate(tab)?;
/// ```
#[derive(Debug)]
pub struct MemoryTabHost {
    extension_base: String,
    state: Mutex<BrowserState>,
}

impl MemoryTabHost {
    /// Create a browser with no windows.
    pub fn new(extension_base: impl Into<String>) -> Self {
        Self {
            extension_base: extension_base.into(),
            state: Mutex::new(BrowserState {
                next_tab_id: 1,
                next_window_id: 1,
                ..Default::default()
            }),
        }
    }

    /// Open a window. A focused window takes focus from the others.
    pub fn open_window(&self, focused: bool) -> WindowId {
        let mut state = self.state.lock();
        let id = WindowId(state.next_window_id);
        state.next_window_id += 1;
        if focused {
            state.windows.iter_mut().for_each(|w| w.focused = false);
        }
        state.windows.push(Window {
            id,
            focused,
            tabs: Vec::new(),
        });
        id
    }

    /// Open an inactive tab at the end of a window's strip.
    pub fn open_tab(&self, window: WindowId, url: &str) -> HostResult<TabId> {
        self.insert_tab(window, |id| Tab::new(id, window, url))
    }

    /// Insert a fully described tab, assigning it a fresh ID.
    pub fn insert_tab(&self, window: WindowId, build: impl FnOnce(TabId) -> Tab) -> HostResult<TabId> {
        let mut state = self.state.lock();
        let id = TabId(state.next_tab_id);
        let mut tab = build(id);
        tab.id = id;
        tab.window_id = window;

        let target = state
            .windows
            .iter_mut()
            .find(|w| w.id == window)
            .ok_or(HostError::WindowNotFound(window))?;
        if tab.active {
            target.tabs.iter_mut().for_each(|t| t.active = false);
        }
        target.tabs.push(tab);
        state.next_tab_id += 1;
        Ok(id)
    }

    /// Close a tab.
    pub fn close_tab(&self, id: TabId) -> HostResult<Tab> {
        let mut state = self.state.lock();
        for window in state.windows.iter_mut() {
            if let Some(index) = window.tabs.iter().position(|t| t.id == id) {
                return Ok(window.tabs.remove(index));
            }
        }
        Err(HostError::TabNotFound(id))
    }

    /// Make a tab the active one in its window without focusing the window.
    pub fn activate(&self, id: TabId) -> HostResult<()> {
        let mut state = self.state.lock();
        let window_id = state.tab_mut(id)?.window_id;
        for window in state.windows.iter_mut().filter(|w| w.id == window_id) {
            for tab in window.tabs.iter_mut() {
                tab.active = tab.id == id;
            }
        }
        Ok(())
    }

    /// Change a tab's audible flag.
    pub fn set_audible(&self, id: TabId, audible: bool) -> HostResult<()> {
        self.state.lock().tab_mut(id)?.audible = audible;
        Ok(())
    }

    /// Change a tab's pinned flag.
    pub fn set_pinned(&self, id: TabId, pinned: bool) -> HostResult<()> {
        self.state.lock().tab_mut(id)?.pinned = pinned;
        Ok(())
    }

    /// Make every operation on a tab fail, as if its renderer hung.
    pub fn break_tab(&self, id: TabId) {
        self.state.lock().broken.insert(id);
    }

    /// Current badge.
    pub fn badge(&self) -> Badge {
        self.state.lock().badge.clone()
    }

    /// Everything the host was asked to do, oldest first.
    pub fn calls(&self) -> Vec<HostCall> {
        self.state.lock().calls.clone()
    }

    /// Forget recorded calls.
    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    /// Snapshot of one tab.
    pub fn tab(&self, id: TabId) -> Option<Tab> {
        self.get_tab(id).ok()
    }
}

impl Default for MemoryTabHost {
    fn default() -> Self {
        Self::new("chrome-extension://tabrest/")
    }
}

impl TabHost for MemoryTabHost {
    fn query_tabs(&self, query: &TabQuery) -> HostResult<Vec<Tab>> {
        let state = self.state.lock();
        Ok(state
            .windows
            .iter()
            .flat_map(|w| w.tabs.iter().map(move |t| (w.focused, t)))
            .filter(|(focused, tab)| query.matches(tab, *focused))
            .map(|(_, tab)| tab.clone())
            .collect())
    }

    fn get_tab(&self, id: TabId) -> HostResult<Tab> {
        let mut state = self.state.lock();
        state.check_broken(id)?;
        state.tab_mut(id).map(|t| t.clone())
    }

    fn navigate(&self, id: TabId, url: &str) -> HostResult<()> {
        let mut state = self.state.lock();
        state.check_broken(id)?;
        state.tab_mut(id)?.url = Some(url.to_string());
        state.calls.push(HostCall::Navigate {
            tab: id,
            url: url.to_string(),
        });
        debug!(tab_id = %id, url, "Navigated tab");
        Ok(())
    }

    fn reload(&self, id: TabId) -> HostResult<()> {
        let mut state = self.state.lock();
        state.check_broken(id)?;
        state.tab_mut(id)?;
        state.calls.push(HostCall::Reload(id));
        Ok(())
    }

    fn create_tab(&self, url: &str) -> HostResult<TabId> {
        let focused = self.state.lock().focused_window();
        let window = match focused {
            Some(id) => id,
            None => self.open_window(true),
        };
        let id = self.open_tab(window, url)?;
        self.state.lock().calls.push(HostCall::Create {
            tab: id,
            url: url.to_string(),
        });
        Ok(id)
    }

    fn focus_tab(&self, id: TabId) -> HostResult<()> {
        self.activate(id)?;
        let mut state = self.state.lock();
        let window_id = state.tab_mut(id)?.window_id;
        for window in state.windows.iter_mut() {
            window.focused = window.id == window_id;
        }
        state.calls.push(HostCall::Focus(id));
        Ok(())
    }

    fn windows(&self) -> HostResult<Vec<Window>> {
        Ok(self.state.lock().windows.clone())
    }

    fn extension_url(&self, path: &str) -> String {
        format!("{}{}", self.extension_base, path.trim_start_matches('/'))
    }

    fn set_badge(&self, badge: &Badge) -> HostResult<()> {
        self.state.lock().badge = badge.clone();
        Ok(())
    }
}

/// Both storage areas held in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    areas: RwLock<HashMap<StorageArea, BTreeMap<String, Value>>>,
    read_only: RwLock<bool>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every write fail, as when the browser's quota is exhausted.
    pub fn set_read_only(&self, read_only: bool) {
        *self.read_only.write() = read_only;
    }

    fn check_writable(&self, area: StorageArea, key: &str) -> HostResult<()> {
        if *self.read_only.read() {
            return Err(HostError::Storage {
                area,
                key: key.to_string(),
                reason: "storage is read-only".to_string(),
            });
        }
        Ok(())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, area: StorageArea, key: &str) -> HostResult<Option<Value>> {
        Ok(self
            .areas
            .read()
            .get(&area)
            .and_then(|values| values.get(key))
            .cloned())
    }

    fn set(&self, area: StorageArea, key: &str, value: Value) -> HostResult<()> {
        self.check_writable(area, key)?;
        self.areas
            .write()
            .entry(area)
            .or_default()
            .insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, area: StorageArea, key: &str) -> HostResult<()> {
        self.check_writable(area, key)?;
        if let Some(values) = self.areas.write().get_mut(&area) {
            values.remove(key);
        }
        Ok(())
    }

    fn keys(&self, area: StorageArea) -> HostResult<Vec<String>> {
        Ok(self
            .areas
            .read()
            .get(&area)
            .map(|values| values.keys().cloned().collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::KeyValueStoreExt;
    use serde_json::json;

    #[test]
    fn test_open_and_query_tabs() {
        let host = MemoryTabHost::default();
        let w1 = host.open_window(true);
        let w2 = host.open_window(false);
        let a = host.open_tab(w1, "https://a.test").unwrap();
        let b = host.open_tab(w1, "https://b.test").unwrap();
        let c = host.open_tab(w2, "https://c.test").unwrap();
        host.activate(b).unwrap();
        host.activate(c).unwrap();

        let all = host.query_tabs(&TabQuery::all()).unwrap();
        assert_eq!(all.iter().map(|t| t.id).collect::<Vec<_>>(), vec![a, b, c]);

        let current = host.query_tabs(&TabQuery::active_in_current_window()).unwrap();
        assert_eq!(current.len(), 1);
        assert_eq!(current[0].id, b);
    }

    #[test]
    fn test_activate_is_exclusive_per_window() {
        let host = MemoryTabHost::default();
        let w = host.open_window(true);
        let a = host.open_tab(w, "https://a.test").unwrap();
        let b = host.open_tab(w, "https://b.test").unwrap();

        host.activate(a).unwrap();
        host.activate(b).unwrap();
        assert!(!host.tab(a).unwrap().active);
        assert!(host.tab(b).unwrap().active);
    }

    #[test]
    fn test_navigate_records_call() {
        let host = MemoryTabHost::default();
        let w = host.open_window(true);
        let a = host.open_tab(w, "https://a.test").unwrap();

        host.navigate(a, "https://b.test").unwrap();
        host.reload(a).unwrap();

        assert_eq!(host.tab(a).unwrap().url.as_deref(), Some("https://b.test"));
        assert_eq!(
            host.calls(),
            vec![
                HostCall::Navigate {
                    tab: a,
                    url: "https://b.test".to_string()
                },
                HostCall::Reload(a),
            ]
        );
    }

    #[test]
    fn test_missing_and_broken_tabs() {
        let host = MemoryTabHost::default();
        assert!(matches!(host.get_tab(TabId(99)), Err(HostError::TabNotFound(_))));

        let w = host.open_window(true);
        let a = host.open_tab(w, "https://a.test").unwrap();
        host.break_tab(a);
        assert!(matches!(host.navigate(a, "x"), Err(HostError::Unavailable(_))));

        assert!(host.close_tab(a).is_ok());
        assert!(host.close_tab(a).is_err());
    }

    #[test]
    fn test_create_tab_opens_window_when_needed() {
        let host = MemoryTabHost::default();
        let id = host.create_tab("chrome-extension://tabrest/onboarding.html").unwrap();

        let windows = host.windows().unwrap();
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].tabs[0].id, id);
    }

    #[test]
    fn test_focus_tab_moves_window_focus() {
        let host = MemoryTabHost::default();
        let w1 = host.open_window(true);
        let w2 = host.open_window(false);
        host.open_tab(w1, "https://a.test").unwrap();
        let b = host.open_tab(w2, "https://b.test").unwrap();

        host.focus_tab(b).unwrap();
        let windows = host.windows().unwrap();
        assert!(!windows[0].focused);
        assert!(windows[1].focused);
        assert!(host.tab(b).unwrap().active);
    }

    #[test]
    fn test_extension_url() {
        let host = MemoryTabHost::new("chrome-extension://abc/");
        assert_eq!(host.extension_url("/suspended.html"), "chrome-extension://abc/suspended.html");
    }

    #[test]
    fn test_memory_store_areas_are_separate() {
        let store = MemoryStore::new();
        store.set(StorageArea::Local, "k", json!(1)).unwrap();
        store.set(StorageArea::Sync, "k", json!(2)).unwrap();

        assert_eq!(store.get(StorageArea::Local, "k").unwrap(), Some(json!(1)));
        assert_eq!(store.get_as::<i32>(StorageArea::Sync, "k").unwrap(), Some(2));
        assert_eq!(store.keys(StorageArea::Local).unwrap(), vec!["k".to_string()]);

        store.remove(StorageArea::Local, "k").unwrap();
        assert_eq!(store.get(StorageArea::Local, "k").unwrap(), None);
    }

    #[test]
    fn test_read_only_store_rejects_writes() {
        let store = MemoryStore::new();
        store.set_read_only(true);
        let err = store.set(StorageArea::Sync, "settings", json!({})).unwrap_err();
        assert!(matches!(err, HostError::Storage { area: StorageArea::Sync, .. }));
    }
}
