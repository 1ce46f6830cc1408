//! Tab and window model.
//!
//! These types mirror what the extension host reports about open tabs.
//! Identifiers are opaque: the host assigns them and they are only compared.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::page::is_suspended_page;

/// Host-assigned tab identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabId(pub i64);

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Host-assigned window identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowId(pub i64);

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle status of a tab as shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TabStatus {
    /// The tab is the active tab of its window.
    Active,
    /// The tab is loaded but not active.
    Idle,
    /// The tab shows the suspended placeholder page.
    Suspended,
}

impl TabStatus {
    /// Status name as used in the popup filter.
    pub fn as_str(&self) -> &'static str {
        match self {
            TabStatus::Active => "active",
            TabStatus::Idle => "idle",
            TabStatus::Suspended => "suspended",
        }
    }
}

impl fmt::Display for TabStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A browser tab as reported by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tab {
    /// Tab identifier.
    pub id: TabId,
    /// Owning window.
    pub window_id: WindowId,
    /// Current URL, absent while the host has not committed one.
    #[serde(default)]
    pub url: Option<String>,
    /// Page title.
    #[serde(default)]
    pub title: Option<String>,
    /// Favicon URL.
    #[serde(default)]
    pub fav_icon_url: Option<String>,
    /// Whether this is the active tab of its window.
    #[serde(default)]
    pub active: bool,
    /// Whether the tab is pinned.
    #[serde(default)]
    pub pinned: bool,
    /// Whether the tab is currently playing sound.
    #[serde(default)]
    pub audible: bool,
}

impl Tab {
    /// Create an inactive, unpinned, silent tab at the given URL.
    pub fn new(id: TabId, window_id: WindowId, url: impl Into<String>) -> Self {
        Self {
            id,
            window_id,
            url: Some(url.into()),
            title: None,
            fav_icon_url: None,
            active: false,
            pinned: false,
            audible: false,
        }
    }

    /// Set the URL.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the favicon URL.
    pub fn with_fav_icon(mut self, fav_icon_url: impl Into<String>) -> Self {
        self.fav_icon_url = Some(fav_icon_url.into());
        self
    }

    /// Mark the tab active.
    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// Mark the tab pinned.
    pub fn with_pinned(mut self, pinned: bool) -> Self {
        self.pinned = pinned;
        self
    }

    /// Mark the tab audible.
    pub fn with_audible(mut self, audible: bool) -> Self {
        self.audible = audible;
        self
    }

    /// URL as a string slice, empty when absent.
    pub fn url_or_empty(&self) -> &str {
        self.url.as_deref().unwrap_or("")
    }

    /// Whether the tab currently shows the suspended page.
    pub fn is_suspended(&self) -> bool {
        is_suspended_page(self.url.as_deref())
    }

    /// Derive the user-facing status.
    pub fn status(&self) -> TabStatus {
        if self.is_suspended() {
            TabStatus::Suspended
        } else if self.active {
            TabStatus::Active
        } else {
            TabStatus::Idle
        }
    }
}

/// A browser window and its tabs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Window {
    /// Window identifier.
    pub id: WindowId,
    /// Whether the window has focus.
    #[serde(default)]
    pub focused: bool,
    /// Tabs in strip order.
    #[serde(default)]
    pub tabs: Vec<Tab>,
}
