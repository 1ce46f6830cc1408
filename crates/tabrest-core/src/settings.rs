//! User settings.
//!
//! Settings are stored as a camelCase JSON object. Stored objects may be
//! partial or come from an older version; every missing field falls back
//! to its default.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{SettingsError, SettingsResult};

/// Domains that are never suspended out of the box.
pub const DEFAULT_WHITELIST: [&str; 3] = ["mail.google.com", "calendar.google.com", "docs.google.com"];

/// User preferences controlling when tabs are suspended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Minutes of inactivity before a tab is suspended.
    ///
    /// Defaults to 30.
    pub suspension_timeout: u64,

    /// Restore a suspended tab as soon as it is focused.
    pub auto_unsuspend_on_focus: bool,

    /// Allow pinned tabs to be suspended.
    pub suspend_pinned_tabs: bool,

    /// Host name fragments that are never suspended.
    pub whitelisted_domains: Vec<String>,

    /// Never suspend tabs that are playing sound.
    pub never_suspend_audio: bool,

    /// Never suspend the active tab of a window.
    pub never_suspend_active_tab: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            suspension_timeout: 30,
            auto_unsuspend_on_focus: true,
            suspend_pinned_tabs: false,
            whitelisted_domains: DEFAULT_WHITELIST.iter().map(|d| d.to_string()).collect(),
            never_suspend_audio: true,
            never_suspend_active_tab: true,
        }
    }
}

impl Settings {
    /// Create settings with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the suspension timeout in minutes.
    pub fn with_timeout_minutes(mut self, minutes: u64) -> Self {
        self.suspension_timeout = minutes;
        self
    }

    /// Set whether pinned tabs may be suspended.
    pub fn with_suspend_pinned(mut self, enabled: bool) -> Self {
        self.suspend_pinned_tabs = enabled;
        self
    }

    /// Set whether audible tabs are protected.
    pub fn with_never_suspend_audio(mut self, enabled: bool) -> Self {
        self.never_suspend_audio = enabled;
        self
    }

    /// Set whether the active tab is protected.
    pub fn with_never_suspend_active(mut self, enabled: bool) -> Self {
        self.never_suspend_active_tab = enabled;
        self
    }

    /// Set whether focusing a suspended tab restores it.
    pub fn with_auto_unsuspend(mut self, enabled: bool) -> Self {
        self.auto_unsuspend_on_focus = enabled;
        self
    }

    /// Replace the whitelist.
    pub fn with_whitelist<I, D>(mut self, domains: I) -> Self
    where
        I: IntoIterator<Item = D>,
        D: Into<String>,
    {
        self.whitelisted_domains = domains.into_iter().map(Into::into).collect();
        self
    }

    /// Inactivity period before suspension.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.suspension_timeout.saturating_mul(60))
    }

    /// Inactivity period in milliseconds.
    pub fn timeout_ms(&self) -> i64 {
        i64::try_from(self.timeout().as_millis()).unwrap_or(i64::MAX)
    }

    /// Check the settings are usable.
    pub fn validate(&self) -> SettingsResult<()> {
        if self.suspension_timeout == 0 {
            return Err(SettingsError::InvalidTimeout(self.suspension_timeout));
        }
        Ok(())
    }

    /// Parse a stored settings object, filling gaps with defaults.
    pub fn from_json(value: serde_json::Value) -> SettingsResult<Self> {
        let settings: Settings = serde_json::from_value(value)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Serialize for storage.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    /// Apply a partial update.
    ///
    /// The result is validated before it replaces `self`.
    pub fn apply(&mut self, patch: &SettingsPatch) -> SettingsResult<()> {
        let mut next = self.clone();
        if let Some(timeout) = patch.suspension_timeout {
            next.suspension_timeout = timeout;
        }
        if let Some(enabled) = patch.auto_unsuspend_on_focus {
            next.auto_unsuspend_on_focus = enabled;
        }
        if let Some(enabled) = patch.suspend_pinned_tabs {
            next.suspend_pinned_tabs = enabled;
        }
        if let Some(domains) = &patch.whitelisted_domains {
            next.whitelisted_domains = domains.clone();
        }
        if let Some(enabled) = patch.never_suspend_audio {
            next.never_suspend_audio = enabled;
        }
        if let Some(enabled) = patch.never_suspend_active_tab {
            next.never_suspend_active_tab = enabled;
        }
        next.validate()?;
        *self = next;
        Ok(())
    }

    /// Whether a domain is already whitelisted (exact entry match).
    pub fn has_whitelist_entry(&self, domain: &str) -> bool {
        self.whitelisted_domains.iter().any(|d| d == domain)
    }
}

/// Partial settings update. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    /// New suspension timeout in minutes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suspension_timeout: Option<u64>,
    /// New auto-unsuspend flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_unsuspend_on_focus: Option<bool>,
    /// New pinned-tab flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suspend_pinned_tabs: Option<bool>,
    /// Replacement whitelist.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub whitelisted_domains: Option<Vec<String>>,
    /// New audio flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub never_suspend_audio: Option<bool>,
    /// New active-tab flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub never_suspend_active_tab: Option<bool>,
}

impl SettingsPatch {
    /// Create an empty patch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Parse a `key=value` assignment.
    ///
    /// Keys accept both the stored camelCase name and snake_case.
    /// `whitelistedDomains` takes a comma separated list.
    pub fn from_assignment(assignment: &str) -> SettingsResult<Self> {
        let (key, value) = assignment
            .split_once('=')
            .ok_or_else(|| SettingsError::InvalidValue {
                key: assignment.to_string(),
                value: String::new(),
            })?;
        let key = key.trim();
        let value = value.trim();

        let invalid = || SettingsError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        };
        let flag = || value.parse::<bool>().map_err(|_| invalid());

        let mut patch = Self::default();
        match key {
            "suspensionTimeout" | "suspension_timeout" => {
                patch.suspension_timeout = Some(value.parse().map_err(|_| invalid())?);
            }
            "autoUnsuspendOnFocus" | "auto_unsuspend_on_focus" => {
                patch.auto_unsuspend_on_focus = Some(flag()?);
            }
            "suspendPinnedTabs" | "suspend_pinned_tabs" => {
                patch.suspend_pinned_tabs = Some(flag()?);
            }
            "whitelistedDomains" | "whitelisted_domains" => {
                patch.whitelisted_domains = Some(
                    value
                        .split(',')
                        .map(str::trim)
                        .filter(|d| !d.is_empty())
                        .map(str::to_string)
                        .collect(),
                );
            }
            "neverSuspendAudio" | "never_suspend_audio" => {
                patch.never_suspend_audio = Some(flag()?);
            }
            "neverSuspendActiveTab" | "never_suspend_active_tab" => {
                patch.never_suspend_active_tab = Some(flag()?);
            }
            other => return Err(SettingsError::UnknownKey(other.to_string())),
        }
        Ok(patch)
    }

    /// Combine two patches; fields set in `other` win.
    pub fn merge(mut self, other: SettingsPatch) -> Self {
        self.suspension_timeout = other.suspension_timeout.or(self.suspension_timeout);
        self.auto_unsuspend_on_focus = other.auto_unsuspend_on_focus.or(self.auto_unsuspend_on_focus);
        self.suspend_pinned_tabs = other.suspend_pinned_tabs.or(self.suspend_pinned_tabs);
        self.whitelisted_domains = other.whitelisted_domains.or(self.whitelisted_domains);
        self.never_suspend_audio = other.never_suspend_audio.or(self.never_suspend_audio);
        self.never_suspend_active_tab = other
            .never_suspend_active_tab
            .or(self.never_suspend_active_tab);
        self
    }
}
