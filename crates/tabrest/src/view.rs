//! What the popup shows.
//!
//! The tab list groups tabs by window and annotates each with its status
//! and last activity. Filtering by status and search text happens on the
//! listing, not on the live browser state.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use tabrest_core::{Tab, TabId, TabStatus, Timestamp, Window, WindowId};

pub use tabrest_observe::format_bytes;

/// Title shown for a tab that has none.
pub const UNTITLED: &str = "Untitled";

/// One row of the tab list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabView {
    /// Tab ID.
    pub id: TabId,
    /// Owning window.
    pub window_id: WindowId,
    /// Current URL, empty when unknown.
    pub url: String,
    /// Title, `Untitled` when unknown.
    pub title: String,
    /// Favicon URL, empty when unknown.
    pub fav_icon_url: String,
    /// Whether the tab is active in its window.
    pub active: bool,
    /// Whether the tab is pinned.
    pub pinned: bool,
    /// Whether the tab is playing audio.
    pub audible: bool,
    /// Display status.
    pub status: TabStatus,
    /// Last recorded activity.
    pub last_activity: Timestamp,
}

impl TabView {
    /// Describe a tab. `last_activity` defaults to `now` when unknown.
    pub fn new(tab: &Tab, last_activity: Option<Timestamp>, now: Timestamp) -> Self {
        Self {
            id: tab.id,
            window_id: tab.window_id,
            url: tab.url.clone().unwrap_or_default(),
            title: tab
                .title
                .clone()
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| UNTITLED.to_string()),
            fav_icon_url: tab.fav_icon_url.clone().unwrap_or_default(),
            active: tab.active,
            pinned: tab.pinned,
            audible: tab.audible,
            status: tab.status(),
            last_activity: last_activity.unwrap_or(now),
        }
    }

    fn matches_search(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle) || self.url.to_lowercase().contains(needle)
    }
}

/// One window of the tab list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowView {
    /// Window ID.
    pub id: WindowId,
    /// Whether the window has focus.
    pub focused: bool,
    /// Its tabs in strip order.
    pub tabs: Vec<TabView>,
}

impl WindowView {
    /// Describe a window, looking up each tab's last activity.
    pub fn new(
        window: &Window,
        last_activity: impl Fn(TabId) -> Option<Timestamp>,
        now: Timestamp,
    ) -> Self {
        Self {
            id: window.id,
            focused: window.focused,
            tabs: window
                .tabs
                .iter()
                .map(|tab| TabView::new(tab, last_activity(tab.id), now))
                .collect(),
        }
    }
}

/// Status filter for the tab list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TabFilter {
    /// Every tab.
    #[default]
    All,
    /// The active tab of each window.
    Active,
    /// Loaded, not active.
    Idle,
    /// Suspended.
    Suspended,
}

impl TabFilter {
    /// Whether a status passes.
    pub fn admits(&self, status: TabStatus) -> bool {
        match self {
            TabFilter::All => true,
            TabFilter::Active => status == TabStatus::Active,
            TabFilter::Idle => status == TabStatus::Idle,
            TabFilter::Suspended => status == TabStatus::Suspended,
        }
    }
}

impl FromStr for TabFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(TabFilter::All),
            "active" => Ok(TabFilter::Active),
            "idle" => Ok(TabFilter::Idle),
            "suspended" => Ok(TabFilter::Suspended),
            other => Err(format!("unknown tab filter '{other}'")),
        }
    }
}

impl fmt::Display for TabFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TabFilter::All => "all",
            TabFilter::Active => "active",
            TabFilter::Idle => "idle",
            TabFilter::Suspended => "suspended",
        };
        f.write_str(name)
    }
}

/// Keep tabs passing the status filter whose title or URL contains
/// `search` (case-insensitive). Windows left empty are dropped.
pub fn filter_windows(windows: &[WindowView], filter: TabFilter, search: &str) -> Vec<WindowView> {
    let needle = search.to_lowercase();

    windows
        .iter()
        .filter_map(|window| {
            let tabs: Vec<TabView> = window
                .tabs
                .iter()
                .filter(|tab| filter.admits(tab.status))
                .filter(|tab| needle.is_empty() || tab.matches_search(&needle))
                .cloned()
                .collect();

            (!tabs.is_empty()).then(|| WindowView {
                id: window.id,
                focused: window.focused,
                tabs,
            })
        })
        .collect()
}
