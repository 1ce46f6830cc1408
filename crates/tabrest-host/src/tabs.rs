//! The tab and window half of the host seam.

use serde::{Deserialize, Serialize};

use tabrest_core::{Tab, TabId, Window};

use crate::error::HostResult;

/// Filter for [`TabHost::query_tabs`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TabQuery {
    /// Only tabs whose `active` flag equals this.
    pub active: Option<bool>,
    /// Only tabs in the focused window.
    pub current_window: bool,
}

impl TabQuery {
    /// Every tab in every window.
    pub fn all() -> Self {
        Self::default()
    }

    /// The active tab of the focused window.
    pub fn active_in_current_window() -> Self {
        Self {
            active: Some(true),
            current_window: true,
        }
    }

    /// Check whether a tab passes the filter.
    ///
    /// `in_current_window` tells whether the tab's window is focused.
    pub fn matches(&self, tab: &Tab, in_current_window: bool) -> bool {
        if let Some(active) = self.active {
            if tab.active != active {
                return false;
            }
        }
        !self.current_window || in_current_window
    }
}

/// Toolbar badge contents.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Badge {
    /// Badge text; empty hides the badge.
    pub text: String,
    /// Background colour as a CSS hex string.
    pub color: String,
}

/// Badge background colour.
pub const BADGE_COLOR: &str = "#7C3BED";

impl Badge {
    /// Badge showing how many tabs are suspended.
    pub fn for_suspended_count(count: usize) -> Self {
        Self {
            text: if count > 0 { count.to_string() } else { String::new() },
            color: BADGE_COLOR.to_string(),
        }
    }
}

/// Tab, window and toolbar operations provided by the browser.
///
/// Implementations wrap the real extension API; [`MemoryTabHost`](crate::MemoryTabHost)
/// is an in-process stand-in for tests and simulation.
pub trait TabHost: Send + Sync {
    /// Tabs matching a query, in window then strip order.
    fn query_tabs(&self, query: &TabQuery) -> HostResult<Vec<Tab>>;

    /// Look up one tab.
    fn get_tab(&self, id: TabId) -> HostResult<Tab>;

    /// Navigate a tab to a URL.
    fn navigate(&self, id: TabId, url: &str) -> HostResult<()>;

    /// Reload a tab.
    fn reload(&self, id: TabId) -> HostResult<()>;

    /// Open a new tab in the focused window.
    fn create_tab(&self, url: &str) -> HostResult<TabId>;

    /// Make a tab active and focus its window.
    fn focus_tab(&self, id: TabId) -> HostResult<()>;

    /// All windows with their tabs.
    fn windows(&self) -> HostResult<Vec<Window>>;

    /// Absolute URL of a file bundled with the extension.
    fn extension_url(&self, path: &str) -> String;

    /// Update the toolbar badge.
    fn set_badge(&self, badge: &Badge) -> HostResult<()>;
}
