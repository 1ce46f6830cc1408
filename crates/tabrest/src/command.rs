//! Context menu and keyboard shortcut dispatch.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use tabrest_core::Tab;
use tabrest_host::{KeyValueStore, TabHost, TabQuery};

use crate::error::{TabrestError, TabrestResult};
use crate::suspender::Suspender;

/// Entries of the page context menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MenuAction {
    /// Suspend the clicked tab.
    SuspendTab,
    /// Suspend every other inactive tab.
    SuspendOthers,
    /// Never suspend the clicked tab's site.
    WhitelistSite,
    /// Restore every suspended tab.
    RestoreAll,
}

impl MenuAction {
    /// All entries in menu order.
    pub const ALL: [MenuAction; 4] = [
        MenuAction::SuspendTab,
        MenuAction::SuspendOthers,
        MenuAction::WhitelistSite,
        MenuAction::RestoreAll,
    ];

    /// Menu item ID.
    pub fn id(&self) -> &'static str {
        match self {
            MenuAction::SuspendTab => "suspendTab",
            MenuAction::SuspendOthers => "suspendOthers",
            MenuAction::WhitelistSite => "whitelistSite",
            MenuAction::RestoreAll => "restoreAll",
        }
    }

    /// Menu item label.
    pub fn title(&self) -> &'static str {
        match self {
            MenuAction::SuspendTab => "Suspend this tab",
            MenuAction::SuspendOthers => "Suspend other tabs",
            MenuAction::WhitelistSite => "Never suspend this site",
            MenuAction::RestoreAll => "Restore all tabs",
        }
    }
}

impl FromStr for MenuAction {
    type Err = TabrestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|action| action.id() == s)
            .ok_or_else(|| TabrestError::InvalidMessage(format!("unknown menu item '{s}'")))
    }
}

impl fmt::Display for MenuAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Keyboard shortcuts declared by the extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShortcutCommand {
    /// Suspend the active tab.
    SuspendCurrent,
    /// Suspend every other inactive tab.
    SuspendOthers,
    /// Restore every suspended tab.
    RestoreAll,
    /// Never suspend the active tab's site.
    WhitelistSite,
}

impl ShortcutCommand {
    /// All commands.
    pub const ALL: [ShortcutCommand; 4] = [
        ShortcutCommand::SuspendCurrent,
        ShortcutCommand::SuspendOthers,
        ShortcutCommand::RestoreAll,
        ShortcutCommand::WhitelistSite,
    ];

    /// Command name.
    pub fn name(&self) -> &'static str {
        match self {
            ShortcutCommand::SuspendCurrent => "suspend_current",
            ShortcutCommand::SuspendOthers => "suspend_others",
            ShortcutCommand::RestoreAll => "restore_all",
            ShortcutCommand::WhitelistSite => "whitelist_site",
        }
    }
}

impl FromStr for ShortcutCommand {
    type Err = TabrestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|command| command.name() == s)
            .ok_or_else(|| TabrestError::InvalidMessage(format!("unknown command '{s}'")))
    }
}

impl fmt::Display for ShortcutCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl<H: TabHost, S: KeyValueStore> Suspender<H, S> {
    /// Run a context menu entry against the tab it was opened on.
    pub fn on_menu_clicked(&self, action: MenuAction, tab: &Tab) -> TabrestResult<()> {
        debug!(action = %action, tab_id = %tab.id, "Menu clicked");
        match action {
            MenuAction::SuspendTab => {
                self.suspend_tab(tab.id)?;
            }
            MenuAction::SuspendOthers => {
                self.suspend_all_except(tab.id)?;
            }
            MenuAction::WhitelistSite => {
                self.whitelist_site(tab)?;
            }
            MenuAction::RestoreAll => {
                self.restore_all()?;
            }
        }
        Ok(())
    }

    /// Run a keyboard shortcut against the active tab of the focused
    /// window. Commands that need a tab do nothing when there is none.
    pub fn on_command(&self, command: ShortcutCommand) -> TabrestResult<()> {
        let active = self
            .host()
            .query_tabs(&TabQuery::active_in_current_window())?
            .into_iter()
            .next();
        debug!(command = %command, active = ?active.as_ref().map(|t| t.id.0), "Shortcut pressed");

        match (command, active) {
            (ShortcutCommand::RestoreAll, _) => {
                self.restore_all()?;
            }
            (_, None) => {}
            (ShortcutCommand::SuspendCurrent, Some(tab)) => {
                self.suspend_tab(tab.id)?;
            }
            (ShortcutCommand::SuspendOthers, Some(tab)) => {
                self.suspend_all_except(tab.id)?;
            }
            (ShortcutCommand::WhitelistSite, Some(tab)) => {
                self.whitelist_site(&tab)?;
            }
        }
        Ok(())
    }
}
