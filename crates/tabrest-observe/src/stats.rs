//! Memory-savings statistics.
//!
//! Nothing is measured: every suspension is credited with a fixed
//! estimate, the way the extension's popup has always reported it.

use serde::{Deserialize, Serialize};

use tabrest_core::{Timestamp, same_local_day};

/// Bytes credited per suspension (50 MiB).
pub const ESTIMATED_TAB_BYTES: u64 = 50 * 1024 * 1024;

/// History entries kept.
pub const HISTORY_LIMIT: usize = 500;

/// Storage key for [`MemoryStats`] in the local area.
pub const STATS_KEY: &str = "memoryStats";

/// One suspension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    /// When it happened.
    pub timestamp: Timestamp,
    /// The page that was unloaded.
    pub url: String,
    /// Bytes credited.
    pub memory_saved: u64,
}

/// Lifetime savings, persisted between sessions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MemoryStats {
    /// Bytes credited over the extension's lifetime.
    pub total_saved: u64,
    /// Suspensions over the extension's lifetime.
    pub tabs_suspended: u64,
    /// Most recent suspensions, oldest first.
    pub history: Vec<HistoryEntry>,
}

impl MemoryStats {
    /// Zeroed statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit one suspension.
    pub fn record(&mut self, url: impl Into<String>, at: Timestamp) {
        self.total_saved = self.total_saved.saturating_add(ESTIMATED_TAB_BYTES);
        self.tabs_suspended = self.tabs_suspended.saturating_add(1);
        self.history.push(HistoryEntry {
            timestamp: at,
            url: url.into(),
            memory_saved: ESTIMATED_TAB_BYTES,
        });

        if self.history.len() > HISTORY_LIMIT {
            let excess = self.history.len() - HISTORY_LIMIT;
            self.history.drain(..excess);
        }
    }

    /// Bytes credited on the local calendar day containing `now`.
    pub fn saved_on_day_of(&self, now: Timestamp) -> u64 {
        self.history
            .iter()
            .filter(|entry| same_local_day(entry.timestamp, now))
            .map(|entry| entry.memory_saved)
            .sum()
    }
}

/// The numbers shown in the popup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSummary {
    /// Lifetime bytes credited.
    pub total_saved: u64,
    /// Bytes credited today.
    pub today_saved: u64,
    /// Tabs suspended right now.
    pub tabs_suspended: usize,
    /// Tabs open right now.
    pub total_tabs: usize,
    /// Open tabs that are not suspended.
    pub active_tabs: usize,
    /// Lifetime suspensions.
    pub lifetime_tabs_suspended: u64,
}

impl StatsSummary {
    /// Combine stored statistics with a count of open tabs.
    pub fn new(stats: &MemoryStats, now: Timestamp, total_tabs: usize, suspended_tabs: usize) -> Self {
        Self {
            total_saved: stats.total_saved,
            today_saved: stats.saved_on_day_of(now),
            tabs_suspended: suspended_tabs,
            total_tabs,
            active_tabs: total_tabs.saturating_sub(suspended_tabs),
            lifetime_tabs_suspended: stats.tabs_suspended,
        }
    }

    /// Format as human-readable text.
    pub fn to_text(&self) -> String {
        let mut output = String::new();
        output.push_str(&format!("Memory saved:      {}\n", format_bytes(self.total_saved)));
        output.push_str(&format!("Saved today:       {}\n", format_bytes(self.today_saved)));
        output.push_str(&format!(
            "Tabs:              {} open, {} suspended, {} active\n",
            self.total_tabs, self.tabs_suspended, self.active_tabs
        ));
        output.push_str(&format!("Lifetime suspends: {}\n", self.lifetime_tabs_suspended));
        output
    }
}

/// Human-readable byte count: `0 MB`, `512 B`, `1.5 KB`, `50 MB`.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

    if bytes == 0 {
        return "0 MB".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = format!("{value:.1}");
    let trimmed = rounded.strip_suffix(".0").unwrap_or(&rounded);
    format!("{} {}", trimmed, UNITS[unit])
}
