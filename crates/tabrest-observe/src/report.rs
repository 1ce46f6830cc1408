//! Reports for bulk operations.
//!
//! Idle sweeps and "suspend others" touch many tabs at once. A
//! [`SweepReport`] records what happened to each so a caller can show or
//! log the result in one piece.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tabrest_core::{TabId, Timestamp};
use tabrest_policy::{DenialReason, RuleId};

/// Unique identifier for a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SweepId(Uuid);

impl SweepId {
    /// Create a new random sweep ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SweepId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SweepId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What started the sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepKind {
    /// Idle timers expired.
    Idle,
    /// Every inactive tab was asked to suspend.
    SuspendInactive,
    /// Every suspended tab was asked to restore.
    RestoreAll,
}

impl std::fmt::Display for SweepKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SweepKind::Idle => write!(f, "idle"),
            SweepKind::SuspendInactive => write!(f, "suspend-inactive"),
            SweepKind::RestoreAll => write!(f, "restore-all"),
        }
    }
}

/// A tab the sweep changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangedTab {
    /// The tab.
    pub tab: TabId,
    /// Its original page.
    pub url: String,
}

/// A tab the sweep left alone on purpose.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedTab {
    /// The tab.
    pub tab: TabId,
    /// The rule that kept it.
    pub rule: RuleId,
    /// Why.
    pub reason: String,
}

/// A tab the sweep failed on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedTab {
    /// The tab.
    pub tab: TabId,
    /// Error message.
    pub message: String,
}

/// Outcome of one bulk operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepReport {
    /// Unique sweep ID.
    pub sweep_id: SweepId,
    /// What started it.
    pub kind: SweepKind,
    /// When it ran.
    pub at: Timestamp,
    /// Tabs suspended or restored.
    pub changed: Vec<ChangedTab>,
    /// Tabs kept by a rule.
    pub skipped: Vec<SkippedTab>,
    /// Tabs that errored.
    pub failed: Vec<FailedTab>,
}

impl SweepReport {
    /// Start an empty report.
    pub fn new(kind: SweepKind, at: Timestamp) -> Self {
        Self {
            sweep_id: SweepId::new(),
            kind,
            at,
            changed: Vec::new(),
            skipped: Vec::new(),
            failed: Vec::new(),
        }
    }

    /// Record a changed tab.
    pub fn record_changed(&mut self, tab: TabId, url: impl Into<String>) {
        self.changed.push(ChangedTab { tab, url: url.into() });
    }

    /// Record a tab a rule kept.
    pub fn record_skipped(&mut self, reason: &DenialReason) {
        self.skipped.push(SkippedTab {
            tab: reason.tab,
            rule: reason.rule.clone(),
            reason: reason.message.clone(),
        });
    }

    /// Record a failure.
    pub fn record_failed(&mut self, tab: TabId, message: impl Into<String>) {
        self.failed.push(FailedTab {
            tab,
            message: message.into(),
        });
    }

    /// Number of tabs changed.
    pub fn changed_count(&self) -> usize {
        self.changed.len()
    }

    /// Fold another report's entries into this one.
    pub fn absorb(&mut self, other: SweepReport) {
        self.changed.extend(other.changed);
        self.skipped.extend(other.skipped);
        self.failed.extend(other.failed);
    }

    /// Whether nothing failed.
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    /// Format as human-readable text.
    pub fn to_text(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("Sweep {} ({}) at {}\n", self.sweep_id, self.kind, self.at));
        output.push_str(&format!(
            "  changed: {}  skipped: {}  failed: {}\n",
            self.changed.len(),
            self.skipped.len(),
            self.failed.len()
        ));

        for entry in &self.changed {
            output.push_str(&format!("  [OK]   tab {} {}\n", entry.tab, entry.url));
        }
        for entry in &self.skipped {
            output.push_str(&format!("  [KEPT] tab {} ({}) {}\n", entry.tab, entry.rule, entry.reason));
        }
        for entry in &self.failed {
            output.push_str(&format!("  [FAIL] tab {} {}\n", entry.tab, entry.message));
        }

        output
    }

    /// Format as JSON.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    /// Format as pretty JSON string.
    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}
