//! The suspender: timers, policy and the host wired together.
//!
//! Every browser event ends up here. Handlers run to completion one at a
//! time; shared state sits behind `parking_lot` locks and a `DashMap`
//! timer table so a [`Suspender`] can still be shared across threads.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use tabrest_core::{
    SharedClock, Settings, SettingsPatch, SuspendedPage, Tab, TabId, Timestamp, hostname,
    is_internal_page,
};
use tabrest_host::{Badge, KeyValueStore, KeyValueStoreExt, StorageArea, TabHost, TabQuery};
use tabrest_observe::{
    ESTIMATED_TAB_BYTES, EventDispatcher, MemoryStats, STATS_KEY, StatsSummary, SuspenderEvent,
    SweepKind, SweepReport,
};
use tabrest_policy::{DenialReason, RuleSet, Verdict};
use tabrest_timer::IdleTimers;

use crate::builder::SuspenderBuilder;
use crate::error::TabrestResult;
use crate::view::WindowView;

/// Sync storage key holding [`Settings`].
pub const SETTINGS_KEY: &str = "tabSuspenderSettings";

/// Local storage key holding the install timestamp.
pub const INSTALL_DATE_KEY: &str = "installDate";

/// Page opened after a fresh install.
pub const ONBOARDING_PAGE: &str = "onboarding.html";

/// Why the extension's install hook fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallReason {
    /// First install.
    Install,
    /// The extension was updated.
    Update,
    /// The browser was updated.
    ChromeUpdate,
    /// A shared module was updated.
    SharedModuleUpdate,
}

/// Load state reported with a tab update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadStatus {
    /// Navigation in progress.
    Loading,
    /// The page finished loading.
    Complete,
}

/// Result of asking for a suspension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuspendOutcome {
    /// The tab now shows its placeholder.
    Suspended {
        /// The page that was unloaded.
        original_url: String,
        /// The placeholder it was replaced with.
        placeholder_url: String,
    },
    /// A rule kept the tab loaded.
    Skipped(DenialReason),
}

impl SuspendOutcome {
    /// Whether the tab was suspended.
    pub fn is_suspended(&self) -> bool {
        matches!(self, SuspendOutcome::Suspended { .. })
    }
}

/// Result of asking for a restore.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreOutcome {
    /// The tab navigated back to its original page.
    Restored {
        /// The original page.
        url: String,
    },
    /// The tab was not suspended and was reloaded instead.
    Reloaded,
    /// The placeholder carried no original URL; the tab was left alone.
    MissingUrl,
}

impl RestoreOutcome {
    /// Whether the tab is now showing real content.
    pub fn is_success(&self) -> bool {
        !matches!(self, RestoreOutcome::MissingUrl)
    }
}

/// Suspends idle tabs and restores them on demand.
///
/// # Example
///
/// ```ignore
/// use tabrest::prelude::*;
///
/// let suspender = Suspender::builder(host, store)
///     .with_settings(Settings::default().with_timeout_minutes(15))
///     .build()?;
///
/// suspender.on_startup()?;
/// loop {
///     let report = suspender.tick();
///     // ...
/// }
/// ```
pub struct Suspender<H, S> {
    host: Arc<H>,
    store: Arc<S>,
    clock: SharedClock,
    settings: RwLock<Settings>,
    timers: Arc<IdleTimers>,
    rules: RuleSet,
    events: Arc<EventDispatcher>,
}

impl<H: TabHost, S: KeyValueStore> Suspender<H, S> {
    /// Start configuring a suspender over a host and its storage.
    pub fn builder(host: Arc<H>, store: Arc<S>) -> SuspenderBuilder<H, S> {
        SuspenderBuilder::new(host, store)
    }

    pub(crate) fn from_parts(
        host: Arc<H>,
        store: Arc<S>,
        clock: SharedClock,
        settings: Settings,
        timers: IdleTimers,
        rules: RuleSet,
        events: Arc<EventDispatcher>,
    ) -> Self {
        Self {
            host,
            store,
            clock,
            settings: RwLock::new(settings),
            timers: Arc::new(timers),
            rules,
            events,
        }
    }

    /// The browser.
    pub fn host(&self) -> &Arc<H> {
        &self.host
    }

    /// The browser's storage.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Idle timers.
    pub fn timers(&self) -> &IdleTimers {
        &self.timers
    }

    /// Eligibility rules.
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Event dispatcher.
    pub fn events(&self) -> &Arc<EventDispatcher> {
        &self.events
    }

    /// Current time according to the configured clock.
    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// A copy of the settings in force.
    pub fn settings(&self) -> Settings {
        self.settings.read().clone()
    }

    // Lifecycle

    /// Handle the install hook.
    ///
    /// A fresh install opens the onboarding page and zeroes the stored
    /// statistics before monitoring starts.
    pub fn on_installed(&self, reason: InstallReason) -> TabrestResult<()> {
        info!(reason = ?reason, "Extension installed");
        self.load_settings();

        if reason == InstallReason::Install {
            let onboarding = self.host.extension_url(ONBOARDING_PAGE);
            self.host.create_tab(&onboarding)?;
            self.store
                .set_as(StorageArea::Local, STATS_KEY, &MemoryStats::new())?;
            self.store
                .set_as(StorageArea::Local, INSTALL_DATE_KEY, &self.now())?;
        }

        self.start_monitoring()?;
        Ok(())
    }

    /// Handle browser startup.
    pub fn on_startup(&self) -> TabrestResult<()> {
        info!("Suspender starting up");
        self.load_settings();
        self.start_monitoring()?;
        self.refresh_badge();
        Ok(())
    }

    /// When the extension was first installed.
    pub fn install_date(&self) -> TabrestResult<Option<Timestamp>> {
        Ok(self.store.get_as(StorageArea::Local, INSTALL_DATE_KEY)?)
    }

    // Settings

    /// Reload settings from sync storage.
    ///
    /// Stored fields override defaults one by one. Unreadable or invalid
    /// settings are logged and the current ones kept.
    pub fn load_settings(&self) -> Settings {
        match self.store.get(StorageArea::Sync, SETTINGS_KEY) {
            Ok(Some(value)) => match Settings::from_json(value) {
                Ok(settings) => {
                    if let Err(e) = self.replace_settings(settings) {
                        warn!(error = %e, "Stored settings rejected");
                    }
                }
                Err(e) => warn!(error = %e, "Stored settings rejected, keeping current"),
            },
            Ok(None) => debug!("No stored settings, using defaults"),
            Err(e) => {
                error!(error = %e, "Failed to load settings");
                self.emit_error("load_settings", &e);
            }
        }
        self.settings()
    }

    /// Write the settings in force to sync storage.
    pub fn save_settings(&self) -> TabrestResult<()> {
        let settings = self.settings();
        self.persist_settings(&settings)
    }

    fn persist_settings(&self, settings: &Settings) -> TabrestResult<()> {
        if let Err(e) = self.store.set(StorageArea::Sync, SETTINGS_KEY, settings.to_json()) {
            error!(error = %e, "Failed to save settings");
            return Err(e.into());
        }
        Ok(())
    }

    /// Apply a partial update, then persist it.
    ///
    /// Timers already running keep their deadline; the new timeout applies
    /// from the next activity.
    pub fn apply_settings(&self, patch: &SettingsPatch) -> TabrestResult<Settings> {
        let mut next = self.settings();
        next.apply(patch)?;
        self.replace_settings(next.clone())?;
        self.save_settings()?;

        self.events.emit(SuspenderEvent::SettingsChanged {
            timeout_minutes: next.suspension_timeout,
            whitelist_len: next.whitelisted_domains.len(),
        });
        Ok(next)
    }

    fn replace_settings(&self, settings: Settings) -> TabrestResult<()> {
        self.timers.set_timeout(settings.timeout())?;
        *self.settings.write() = settings;
        Ok(())
    }

    // Monitoring

    /// Arm a timer for every tab showing real content.
    pub fn start_monitoring(&self) -> TabrestResult<usize> {
        let now = self.now();
        let tabs = self.host.query_tabs(&TabQuery::all())?;

        let mut armed = 0;
        for tab in tabs
            .iter()
            .filter(|t| !is_internal_page(t.url.as_deref()) && !t.is_suspended())
        {
            self.arm(tab.id, now);
            armed += 1;
        }

        info!(armed, total = tabs.len(), "Monitoring tabs");
        Ok(armed)
    }

    fn arm(&self, tab: TabId, now: Timestamp) {
        let deadline = self.timers.start(tab, now);
        self.events
            .emit(SuspenderEvent::TimerStarted { tab, deadline });
    }

    fn rearm(&self, tab: TabId, now: Timestamp) {
        let deadline = self.timers.reset(tab, now);
        self.events
            .emit(SuspenderEvent::TimerStarted { tab, deadline });
    }

    /// Record activity on a tab.
    pub fn touch(&self, tab: TabId) {
        self.rearm(tab, self.now());
    }

    // Tab events

    /// A tab became active. Restores it when it is suspended and
    /// auto-unsuspend is on.
    pub fn on_activated(&self, tab_id: TabId) -> TabrestResult<Option<RestoreOutcome>> {
        self.touch(tab_id);

        let auto_unsuspend = self.settings.read().auto_unsuspend_on_focus;
        if !auto_unsuspend {
            return Ok(None);
        }

        let tab = self.host.get_tab(tab_id)?;
        if tab.is_suspended() {
            return self.restore_tab(tab_id).map(Some);
        }
        Ok(None)
    }

    /// A tab changed. Only a finished load of real content counts as
    /// activity.
    pub fn on_updated(&self, tab: &Tab, status: Option<LoadStatus>) {
        if status == Some(LoadStatus::Complete) && !is_internal_page(tab.url.as_deref()) {
            self.touch(tab.id);
        }
    }

    /// A tab was closed.
    pub fn on_removed(&self, tab_id: TabId) {
        self.timers.forget(tab_id);
        debug!(tab_id = %tab_id, "Tab removed");
    }

    /// A tab was opened.
    pub fn on_created(&self, tab: &Tab) {
        if !is_internal_page(tab.url.as_deref()) {
            self.arm(tab.id, self.now());
        }
    }

    // Suspension

    /// Suspend every tab whose idle timer has expired.
    ///
    /// Failures are recorded in the report and do not stop the sweep.
    pub fn tick(&self) -> SweepReport {
        let due = self.timers.take_due(self.now());
        self.handle_expired(due)
    }

    /// Suspend tabs whose timers were already taken from the table.
    pub fn handle_expired(&self, due: Vec<TabId>) -> SweepReport {
        let mut report = SweepReport::new(SweepKind::Idle, self.now());
        for tab in due {
            self.events.emit(SuspenderEvent::TimerExpired { tab });
            self.suspend_into(tab, &mut report);
        }

        if report.changed_count() > 0 || !report.is_clean() {
            info!(
                suspended = report.changed_count(),
                skipped = report.skipped.len(),
                failed = report.failed.len(),
                "Idle sweep finished"
            );
        }
        report
    }

    /// Suspend one tab if the rules allow it.
    pub fn suspend_tab(&self, tab_id: TabId) -> TabrestResult<SuspendOutcome> {
        let tab = self.host.get_tab(tab_id)?;

        let verdict = {
            let settings = self.settings.read();
            self.rules.check(&tab, &settings)
        };
        if let Verdict::Denied(reason) = verdict {
            self.events.emit(SuspenderEvent::SuspendSkipped {
                tab: tab_id,
                rule: reason.rule.clone(),
                reason: reason.message.clone(),
            });
            return Ok(SuspendOutcome::Skipped(reason));
        }

        let now = self.now();
        let placeholder_url =
            SuspendedPage::from_tab(&tab, now).encode(&self.host.extension_url(""));
        self.host.navigate(tab_id, &placeholder_url)?;

        let original_url = tab.url_or_empty().to_string();
        self.record_suspension(&original_url, now);
        self.timers.clear(tab_id);
        self.refresh_badge();

        info!(tab_id = %tab_id, url = %original_url, "Tab suspended");
        self.events.emit(SuspenderEvent::TabSuspended {
            tab: tab_id,
            url: original_url.clone(),
            memory_saved: ESTIMATED_TAB_BYTES,
        });

        Ok(SuspendOutcome::Suspended {
            original_url,
            placeholder_url,
        })
    }

    fn suspend_into(&self, tab: TabId, report: &mut SweepReport) {
        match self.suspend_tab(tab) {
            Ok(SuspendOutcome::Suspended { original_url, .. }) => {
                report.record_changed(tab, original_url);
            }
            Ok(SuspendOutcome::Skipped(reason)) => report.record_skipped(&reason),
            Err(e) => {
                warn!(tab_id = %tab, error = %e, "Failed to suspend tab");
                self.emit_error("suspend_tab", &e);
                report.record_failed(tab, e.to_string());
            }
        }
    }

    fn record_suspension(&self, url: &str, at: Timestamp) {
        let result = self.memory_stats().and_then(|mut stats| {
            stats.record(url, at);
            Ok(self.store.set_as(StorageArea::Local, STATS_KEY, &stats)?)
        });
        if let Err(e) = result {
            warn!(error = %e, "Failed to update memory stats");
            self.emit_error("record_suspension", &e);
        }
    }

    /// Bring a tab back from its placeholder.
    ///
    /// A tab that is not suspended is simply reloaded.
    pub fn restore_tab(&self, tab_id: TabId) -> TabrestResult<RestoreOutcome> {
        let tab = self.host.get_tab(tab_id)?;

        if !tab.is_suspended() {
            self.host.reload(tab_id)?;
            debug!(tab_id = %tab_id, "Reloaded tab that was not suspended");
            return Ok(RestoreOutcome::Reloaded);
        }

        let now = self.now();
        let original = match SuspendedPage::decode(tab.url_or_empty(), now) {
            Ok(page) => page.original_url,
            Err(e) => {
                warn!(tab_id = %tab_id, error = %e, "Unreadable suspended page");
                None
            }
        };
        let Some(url) = original else {
            warn!(tab_id = %tab_id, "Suspended page has no original URL");
            return Ok(RestoreOutcome::MissingUrl);
        };

        self.host.navigate(tab_id, &url)?;
        self.arm(tab_id, now);
        self.refresh_badge();

        info!(tab_id = %tab_id, url = %url, "Tab restored");
        self.events.emit(SuspenderEvent::TabRestored {
            tab: tab_id,
            url: url.clone(),
        });
        Ok(RestoreOutcome::Restored { url })
    }

    /// Suspend every inactive tab except `except`.
    pub fn suspend_all_inactive(&self, except: Option<TabId>) -> TabrestResult<SweepReport> {
        let tabs = self.host.query_tabs(&TabQuery::all())?;
        let mut report = SweepReport::new(SweepKind::SuspendInactive, self.now());

        for tab in tabs.iter().filter(|t| Some(t.id) != except && !t.active) {
            self.suspend_into(tab.id, &mut report);
        }

        info!(suspended = report.changed_count(), "Suspended inactive tabs");
        Ok(report)
    }

    /// Suspend every inactive tab other than `tab`.
    pub fn suspend_all_except(&self, tab: TabId) -> TabrestResult<SweepReport> {
        self.suspend_all_inactive(Some(tab))
    }

    /// Restore every suspended tab.
    pub fn restore_all(&self) -> TabrestResult<SweepReport> {
        let tabs = self.host.query_tabs(&TabQuery::all())?;
        let mut report = SweepReport::new(SweepKind::RestoreAll, self.now());

        for tab in tabs.iter().filter(|t| t.is_suspended()) {
            match self.restore_tab(tab.id) {
                Ok(RestoreOutcome::Restored { url }) => report.record_changed(tab.id, url),
                Ok(RestoreOutcome::Reloaded) => report.record_changed(tab.id, tab.url_or_empty()),
                Ok(RestoreOutcome::MissingUrl) => {
                    report.record_failed(tab.id, "suspended page has no original URL");
                }
                Err(e) => {
                    warn!(tab_id = %tab.id, error = %e, "Failed to restore tab");
                    self.emit_error("restore_tab", &e);
                    report.record_failed(tab.id, e.to_string());
                }
            }
        }

        info!(restored = report.changed_count(), "Restored suspended tabs");
        Ok(report)
    }

    // Whitelist

    /// Add a domain to the whitelist. Returns false if it was already there.
    pub fn add_to_whitelist(&self, domain: &str) -> TabrestResult<bool> {
        let domain = domain.trim();
        if domain.is_empty() {
            warn!("Ignoring empty whitelist entry");
            return Ok(false);
        }

        let mut next = self.settings();
        if next.has_whitelist_entry(domain) {
            return Ok(false);
        }
        next.whitelisted_domains.push(domain.to_string());
        self.persist_settings(&next)?;
        *self.settings.write() = next;

        self.events.emit(SuspenderEvent::WhitelistChanged {
            domain: domain.to_string(),
            added: true,
        });
        Ok(true)
    }

    /// Remove every copy of a domain from the whitelist. Returns whether
    /// anything was removed.
    pub fn remove_from_whitelist(&self, domain: &str) -> TabrestResult<bool> {
        let mut next = self.settings();
        let before = next.whitelisted_domains.len();
        next.whitelisted_domains.retain(|d| d != domain);
        let removed = next.whitelisted_domains.len() != before;
        self.persist_settings(&next)?;
        *self.settings.write() = next;

        if removed {
            self.events.emit(SuspenderEvent::WhitelistChanged {
                domain: domain.to_string(),
                added: false,
            });
        }
        Ok(removed)
    }

    /// Whitelist the host of a tab's page.
    ///
    /// Returns the host added, or `None` when the tab's URL has no host.
    pub fn whitelist_site(&self, tab: &Tab) -> TabrestResult<Option<String>> {
        let Some(host) = tab.url.as_deref().and_then(hostname) else {
            warn!(tab_id = %tab.id, url = ?tab.url, "Cannot whitelist a page without a host");
            return Ok(None);
        };
        self.add_to_whitelist(&host)?;
        Ok(Some(host))
    }

    // Reporting

    /// Stored lifetime statistics.
    pub fn memory_stats(&self) -> TabrestResult<MemoryStats> {
        Ok(self
            .store
            .get_as(StorageArea::Local, STATS_KEY)?
            .unwrap_or_default())
    }

    /// The popup's statistics.
    pub fn stats(&self) -> TabrestResult<StatsSummary> {
        let stats = self.memory_stats()?;
        let tabs = self.host.query_tabs(&TabQuery::all())?;
        let suspended = tabs.iter().filter(|t| t.is_suspended()).count();
        Ok(StatsSummary::new(&stats, self.now(), tabs.len(), suspended))
    }

    /// Every window with its tabs, status and last activity.
    pub fn tab_list(&self) -> TabrestResult<Vec<WindowView>> {
        let now = self.now();
        Ok(self
            .host
            .windows()?
            .iter()
            .map(|window| WindowView::new(window, |id| self.timers.last_activity(id), now))
            .collect())
    }

    /// Show the number of suspended tabs on the toolbar badge.
    pub fn update_badge(&self) -> TabrestResult<usize> {
        let count = self
            .host
            .query_tabs(&TabQuery::all())?
            .iter()
            .filter(|t| t.is_suspended())
            .count();
        self.host.set_badge(&Badge::for_suspended_count(count))?;
        self.events.emit(SuspenderEvent::BadgeUpdated { count });
        Ok(count)
    }

    fn refresh_badge(&self) {
        if let Err(e) = self.update_badge() {
            warn!(error = %e, "Failed to update badge");
            self.emit_error("update_badge", &e);
        }
    }

    pub(crate) fn emit_error(&self, operation: &str, error: &dyn fmt::Display) {
        self.events.emit(SuspenderEvent::Error {
            operation: operation.to_string(),
            message: error.to_string(),
        });
    }
}

#[cfg(feature = "async")]
impl<H: TabHost + 'static, S: KeyValueStore + 'static> Suspender<H, S> {
    /// Drive idle expiry from a tokio interval instead of calling
    /// [`tick`](Self::tick) by hand.
    pub fn spawn_ticker(
        self: &Arc<Self>,
        period: std::time::Duration,
    ) -> TabrestResult<tabrest_timer::Ticker> {
        let suspender = Arc::clone(self);
        let ticker = tabrest_timer::Ticker::spawn(
            Arc::clone(&self.timers),
            Arc::clone(&self.clock),
            period,
            move |due| {
                suspender.handle_expired(due);
            },
        )?;
        Ok(ticker)
    }
}

impl<H, S> fmt::Debug for Suspender<H, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Suspender")
            .field("settings", &*self.settings.read())
            .field("timers", &self.timers.stats())
            .field("rules", &self.rules)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{Fixture, START};
    use serde_json::json;
    use tabrest_host::{HostCall, MemoryStore, MemoryTabHost};
    use tabrest_policy::standard_ids;

    #[test]
    fn test_suspend_tab_encodes_placeholder() {
        let fixture = Fixture::new();
        let tab = fixture.open_with(|t| {
            t.with_url("https://example.com/a?b=c")
                .with_title("Example")
        });

        let outcome = fixture.suspender.suspend_tab(tab).unwrap();
        let SuspendOutcome::Suspended {
            original_url,
            placeholder_url,
        } = outcome
        else {
            panic!("tab was not suspended");
        };

        assert_eq!(original_url, "https://example.com/a?b=c");
        assert!(placeholder_url.starts_with("chrome-extension://tabrest/suspended.html?"));
        let page = SuspendedPage::decode(&placeholder_url, 0).unwrap();
        assert_eq!(page.original_url.as_deref(), Some("https://example.com/a?b=c"));
        assert_eq!(page.title, "Example");
        assert_eq!(page.suspended_at, START);
        assert!(!fixture.suspender.timers().is_armed(tab));
    }

    #[test]
    fn test_rules_keep_tabs_loaded() {
        let fixture = Fixture::new();
        let active = fixture.open_active("https://example.com/active");
        let pinned = fixture.open_with(|t| t.with_url("https://example.com/p").with_pinned(true));
        let audible = fixture.open_with(|t| t.with_url("https://music.example/").with_audible(true));
        let mail = fixture.open("https://mail.google.com/inbox");
        let settings = fixture.open("chrome://settings");

        let expected = [
            (active, standard_ids::ACTIVE_TAB),
            (pinned, standard_ids::PINNED_TAB),
            (audible, standard_ids::AUDIBLE_TAB),
            (mail, standard_ids::WHITELIST),
            (settings, standard_ids::INTERNAL_PAGE),
        ];
        for (tab, rule) in expected {
            match fixture.suspender.suspend_tab(tab).unwrap() {
                SuspendOutcome::Skipped(reason) => assert_eq!(reason.rule, rule),
                other => panic!("tab {tab} unexpectedly {other:?}"),
            }
            assert!(!fixture.tab(tab).is_suspended());
        }
        assert_eq!(fixture.events.of_type("suspend_skipped").len(), 5);
        assert!(fixture.host.calls().is_empty());
    }

    #[test]
    fn test_relaxed_settings_allow_pinned_and_audible() {
        let fixture = Fixture::with_settings(
            Settings::default()
                .with_suspend_pinned(true)
                .with_never_suspend_audio(false),
        );
        let pinned = fixture.open_with(|t| t.with_url("https://example.com/p").with_pinned(true));
        let audible = fixture.open_with(|t| t.with_url("https://music.example/").with_audible(true));

        assert!(fixture.suspender.suspend_tab(pinned).unwrap().is_suspended());
        assert!(fixture.suspender.suspend_tab(audible).unwrap().is_suspended());
    }

    #[test]
    fn test_suspend_already_suspended_tab_is_skipped() {
        let fixture = Fixture::new();
        let tab = fixture.open("https://example.com");
        fixture.suspender.suspend_tab(tab).unwrap();

        // The placeholder lives under chrome-extension://, so the internal
        // page rule answers before the already-suspended one.
        match fixture.suspender.suspend_tab(tab).unwrap() {
            SuspendOutcome::Skipped(reason) => {
                assert_eq!(reason.rule, standard_ids::INTERNAL_PAGE)
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(fixture.suspender.memory_stats().unwrap().tabs_suspended, 1);
    }

    #[test]
    fn test_already_suspended_rule_on_other_extension_scheme() {
        let host = Arc::new(MemoryTabHost::new("moz-extension://tabrest/"));
        let window = host.open_window(true);
        let tab = host.open_tab(window, "https://example.com").unwrap();
        let suspender = Suspender::builder(Arc::clone(&host), Arc::new(MemoryStore::new()))
            .build()
            .unwrap();

        assert!(suspender.suspend_tab(tab).unwrap().is_suspended());
        assert!(host.tab(tab).unwrap().url_or_empty().starts_with("moz-extension://"));

        match suspender.suspend_tab(tab).unwrap() {
            SuspendOutcome::Skipped(reason) => {
                assert_eq!(reason.rule, standard_ids::ALREADY_SUSPENDED)
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_suspend_unknown_tab_fails() {
        let fixture = Fixture::new();
        let result = fixture.suspender.suspend_tab(TabId(404));
        assert!(matches!(
            result,
            Err(crate::TabrestError::Host(tabrest_host::HostError::TabNotFound(_)))
        ));
    }

    #[test]
    fn test_restore_without_original_url() {
        let fixture = Fixture::new();
        let tab = fixture.open("chrome-extension://tabrest/suspended.html?title=Lost");

        let outcome = fixture.suspender.restore_tab(tab).unwrap();
        assert_eq!(outcome, RestoreOutcome::MissingUrl);
        assert!(!outcome.is_success());
        assert!(fixture.tab(tab).is_suspended());
        assert!(fixture.host.calls().is_empty());
    }

    #[test]
    fn test_restore_with_undecodable_favicon() {
        let fixture = Fixture::new();
        let tab = fixture.open(
            "chrome-extension://tabrest/suspended.html?url=https%3A%2F%2Fexample.com%2F&favicon=%25FF&time=1",
        );

        let outcome = fixture.suspender.restore_tab(tab).unwrap();
        assert_eq!(
            outcome,
            RestoreOutcome::Restored {
                url: "https://example.com/".to_string()
            }
        );
        assert_eq!(fixture.tab(tab).url.as_deref(), Some("https://example.com/"));
    }

    #[test]
    fn test_restore_live_tab_reloads() {
        let fixture = Fixture::new();
        let tab = fixture.open("https://example.com");

        let outcome = fixture.suspender.restore_tab(tab).unwrap();
        assert_eq!(outcome, RestoreOutcome::Reloaded);
        assert_eq!(fixture.host.calls(), vec![HostCall::Reload(tab)]);
    }

    #[test]
    fn test_activation_without_auto_unsuspend() {
        let fixture = Fixture::with_settings(Settings::default().with_auto_unsuspend(false));
        let tab = fixture.open("https://example.com");
        fixture.suspender.suspend_tab(tab).unwrap();

        fixture.host.activate(tab).unwrap();
        assert_eq!(fixture.suspender.on_activated(tab).unwrap(), None);
        assert!(fixture.tab(tab).is_suspended());
    }

    #[test]
    fn test_suspend_all_inactive() {
        let fixture = Fixture::new();
        let active = fixture.open_active("https://example.com/active");
        let first = fixture.open("https://example.com/1");
        let second = fixture.open("https://example.com/2");
        let pinned = fixture.open_with(|t| t.with_url("https://example.com/p").with_pinned(true));

        let report = fixture.suspender.suspend_all_inactive(None).unwrap();
        assert_eq!(report.kind, SweepKind::SuspendInactive);
        assert_eq!(report.changed_count(), 2);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].tab, pinned);

        assert!(!fixture.tab(active).is_suspended());
        assert!(fixture.tab(first).is_suspended());
        assert!(fixture.tab(second).is_suspended());
        assert_eq!(fixture.host.badge().text, "2");
    }

    #[test]
    fn test_suspend_all_except() {
        let fixture = Fixture::new();
        let keep = fixture.open("https://example.com/keep");
        let other = fixture.open("https://example.com/other");

        let report = fixture.suspender.suspend_all_except(keep).unwrap();
        assert_eq!(report.changed_count(), 1);
        assert!(!fixture.tab(keep).is_suspended());
        assert!(fixture.tab(other).is_suspended());
    }

    #[test]
    fn test_restore_all() {
        let fixture = Fixture::new();
        let first = fixture.open("https://example.com/1");
        let second = fixture.open("https://example.com/2");
        let lost = fixture.open("chrome-extension://tabrest/suspended.html?title=Lost");
        fixture.open("https://example.com/live");
        fixture.suspender.suspend_all_inactive(None).unwrap();

        let report = fixture.suspender.restore_all().unwrap();
        assert_eq!(report.kind, SweepKind::RestoreAll);
        assert_eq!(report.changed_count(), 3);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].tab, lost);

        assert_eq!(fixture.tab(first).url.as_deref(), Some("https://example.com/1"));
        assert_eq!(fixture.tab(second).url.as_deref(), Some("https://example.com/2"));
        assert!(fixture.suspender.timers().is_armed(first));
        assert_eq!(fixture.host.badge().text, "1");
    }

    #[test]
    fn test_tick_records_failures_and_continues() {
        let fixture = Fixture::new();
        let broken = fixture.open("https://example.com/broken");
        let healthy = fixture.open("https://example.com/healthy");
        fixture.suspender.start_monitoring().unwrap();
        fixture.host.break_tab(broken);

        fixture.advance_minutes(30);
        let report = fixture.suspender.tick();

        assert_eq!(report.changed_count(), 1);
        assert_eq!(report.changed[0].tab, healthy);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].tab, broken);
        assert!(!fixture.suspender.timers().is_armed(broken));
        assert_eq!(fixture.events.of_type("error").len(), 1);
    }

    #[test]
    fn test_tick_before_deadline_is_empty() {
        let fixture = Fixture::new();
        fixture.open("https://example.com");
        fixture.suspender.start_monitoring().unwrap();

        fixture.advance_minutes(29);
        let report = fixture.suspender.tick();
        assert_eq!(report.changed_count(), 0);
        assert!(report.is_clean());
    }

    #[test]
    fn test_activity_pushes_deadline_back() {
        let fixture = Fixture::new();
        let tab = fixture.open("https://example.com");
        fixture.suspender.start_monitoring().unwrap();

        fixture.advance_minutes(20);
        fixture.suspender.touch(tab);
        fixture.advance_minutes(20);
        assert_eq!(fixture.suspender.tick().changed_count(), 0);

        fixture.advance_minutes(10);
        assert_eq!(fixture.suspender.tick().changed_count(), 1);
    }

    #[test]
    fn test_expired_ineligible_tab_is_not_rearmed() {
        let fixture = Fixture::new();
        let tab = fixture.open_active("https://example.com");
        fixture.suspender.start_monitoring().unwrap();

        fixture.advance_minutes(30);
        let report = fixture.suspender.tick();
        assert_eq!(report.skipped.len(), 1);
        assert!(!fixture.suspender.timers().is_armed(tab));
    }

    #[test]
    fn test_start_monitoring_skips_internal_and_suspended() {
        let fixture = Fixture::new();
        let page = fixture.open("https://example.com");
        let internal = fixture.open("chrome://extensions");
        let suspended = fixture.open("chrome-extension://tabrest/suspended.html?url=x");
        fixture.open_with(|t| Tab { url: None, ..t });

        assert_eq!(fixture.suspender.start_monitoring().unwrap(), 1);
        assert!(fixture.suspender.timers().is_armed(page));
        assert!(!fixture.suspender.timers().is_armed(internal));
        assert!(!fixture.suspender.timers().is_armed(suspended));
    }

    #[test]
    fn test_tab_events() {
        let fixture = Fixture::new();
        let tab = fixture.open("https://example.com");

        fixture.suspender.on_created(&fixture.tab(tab));
        assert_eq!(fixture.suspender.timers().deadline(tab), Some(START + 30 * 60_000));

        fixture.advance_minutes(5);
        fixture.suspender.on_updated(&fixture.tab(tab), Some(LoadStatus::Loading));
        assert_eq!(fixture.suspender.timers().deadline(tab), Some(START + 30 * 60_000));

        fixture.suspender.on_updated(&fixture.tab(tab), Some(LoadStatus::Complete));
        assert_eq!(fixture.suspender.timers().deadline(tab), Some(START + 35 * 60_000));

        fixture.suspender.on_removed(tab);
        assert!(!fixture.suspender.timers().is_armed(tab));
        assert_eq!(fixture.suspender.timers().last_activity(tab), None);
    }

    #[test]
    fn test_created_internal_tab_is_not_armed() {
        let fixture = Fixture::new();
        let tab = fixture.open("chrome://newtab");
        fixture.suspender.on_created(&fixture.tab(tab));
        assert!(!fixture.suspender.timers().is_armed(tab));
    }

    #[test]
    fn test_on_installed_fresh() {
        let fixture = Fixture::new();
        fixture.open("https://example.com");

        fixture.suspender.on_installed(InstallReason::Install).unwrap();

        assert_eq!(fixture.suspender.install_date().unwrap(), Some(START));
        assert_eq!(fixture.suspender.memory_stats().unwrap(), MemoryStats::new());
        let created = fixture
            .host
            .calls()
            .into_iter()
            .find_map(|call| match call {
                HostCall::Create { url, .. } => Some(url),
                _ => None,
            });
        assert_eq!(created.as_deref(), Some("chrome-extension://tabrest/onboarding.html"));
        assert_eq!(fixture.suspender.timers().stats().armed, 1);
    }

    #[test]
    fn test_on_installed_update_keeps_data() {
        let fixture = Fixture::new();
        fixture.suspender.on_installed(InstallReason::Update).unwrap();

        assert_eq!(fixture.suspender.install_date().unwrap(), None);
        assert!(fixture.host.calls().is_empty());
    }

    #[test]
    fn test_load_settings_merges_stored_fields() {
        let fixture = Fixture::new();
        fixture
            .store
            .set(
                StorageArea::Sync,
                SETTINGS_KEY,
                json!({"suspensionTimeout": 5, "suspendPinnedTabs": true}),
            )
            .unwrap();

        let settings = fixture.suspender.load_settings();
        assert_eq!(settings.suspension_timeout, 5);
        assert!(settings.suspend_pinned_tabs);
        assert!(settings.never_suspend_audio);
        assert_eq!(settings.whitelisted_domains.len(), 3);
        assert_eq!(fixture.suspender.timers().timeout().as_secs(), 300);
    }

    #[test]
    fn test_load_settings_rejects_invalid() {
        let fixture = Fixture::new();
        fixture
            .store
            .set(StorageArea::Sync, SETTINGS_KEY, json!({"suspensionTimeout": 0}))
            .unwrap();

        let settings = fixture.suspender.load_settings();
        assert_eq!(settings.suspension_timeout, 30);
    }

    #[test]
    fn test_apply_settings_persists_without_rearming() {
        let fixture = Fixture::new();
        let tab = fixture.open("https://example.com");
        fixture.suspender.start_monitoring().unwrap();

        let patch = SettingsPatch {
            suspension_timeout: Some(5),
            ..SettingsPatch::default()
        };
        let settings = fixture.suspender.apply_settings(&patch).unwrap();
        assert_eq!(settings.suspension_timeout, 5);

        let stored: Settings = fixture
            .store
            .get_as(StorageArea::Sync, SETTINGS_KEY)
            .unwrap()
            .unwrap();
        assert_eq!(stored.suspension_timeout, 5);

        // The running timer keeps its 30 minute deadline.
        fixture.advance_minutes(10);
        assert_eq!(fixture.suspender.tick().changed_count(), 0);

        fixture.suspender.touch(tab);
        assert_eq!(fixture.suspender.timers().deadline(tab), Some(START + 15 * 60_000));
        assert_eq!(fixture.events.of_type("settings_changed").len(), 1);
    }

    #[test]
    fn test_apply_invalid_settings_changes_nothing() {
        let fixture = Fixture::new();
        let patch = SettingsPatch {
            suspension_timeout: Some(0),
            ..SettingsPatch::default()
        };

        assert!(fixture.suspender.apply_settings(&patch).is_err());
        assert_eq!(fixture.suspender.settings().suspension_timeout, 30);
        assert_eq!(fixture.store.get(StorageArea::Sync, SETTINGS_KEY).unwrap(), None);
    }

    #[test]
    fn test_whitelist_add_and_remove() {
        let fixture = Fixture::new();

        assert!(fixture.suspender.add_to_whitelist("news.example").unwrap());
        assert!(!fixture.suspender.add_to_whitelist("news.example").unwrap());
        assert!(!fixture.suspender.add_to_whitelist("  ").unwrap());
        assert_eq!(fixture.suspender.settings().whitelisted_domains.len(), 4);

        let tab = fixture.open("https://news.example/today");
        assert!(!fixture.suspender.suspend_tab(tab).unwrap().is_suspended());

        assert!(fixture.suspender.remove_from_whitelist("news.example").unwrap());
        assert!(!fixture.suspender.remove_from_whitelist("news.example").unwrap());
        assert!(fixture.suspender.suspend_tab(tab).unwrap().is_suspended());

        let stored: Settings = fixture
            .store
            .get_as(StorageArea::Sync, SETTINGS_KEY)
            .unwrap()
            .unwrap();
        assert!(!stored.has_whitelist_entry("news.example"));
        assert_eq!(fixture.events.of_type("whitelist_changed").len(), 2);
    }

    #[test]
    fn test_whitelist_save_failure_propagates() {
        let fixture = Fixture::new();
        fixture.store.set_read_only(true);
        assert!(fixture.suspender.add_to_whitelist("news.example").is_err());
        assert!(!fixture.suspender.settings().has_whitelist_entry("news.example"));
    }

    #[test]
    fn test_whitelist_retry_after_failed_save() {
        let fixture = Fixture::new();
        fixture.store.set_read_only(true);
        assert!(fixture.suspender.add_to_whitelist("news.example").is_err());

        fixture.store.set_read_only(false);
        assert!(fixture.suspender.add_to_whitelist("news.example").unwrap());
        let stored = fixture.store.get(StorageArea::Sync, SETTINGS_KEY).unwrap().unwrap();
        let domains = stored["whitelistedDomains"].as_array().unwrap();
        assert!(domains.contains(&json!("news.example")));

        fixture.store.set_read_only(true);
        assert!(fixture.suspender.remove_from_whitelist("news.example").is_err());
        assert!(fixture.suspender.settings().has_whitelist_entry("news.example"));

        fixture.store.set_read_only(false);
        assert!(fixture.suspender.remove_from_whitelist("news.example").unwrap());
        assert!(!fixture.suspender.settings().has_whitelist_entry("news.example"));
    }

    #[test]
    fn test_whitelist_site() {
        let fixture = Fixture::new();
        let tab = fixture.open("https://www.rust-lang.org/learn");
        let blank = fixture.open("about:blank");

        let host = fixture.suspender.whitelist_site(&fixture.tab(tab)).unwrap();
        assert_eq!(host.as_deref(), Some("www.rust-lang.org"));
        assert!(fixture.suspender.settings().has_whitelist_entry("www.rust-lang.org"));

        assert_eq!(fixture.suspender.whitelist_site(&fixture.tab(blank)).unwrap(), None);
    }

    #[test]
    fn test_stats_count_today() {
        let fixture = Fixture::new();
        let first = fixture.open("https://example.com/1");
        let second = fixture.open("https://example.com/2");
        fixture.open_active("https://example.com/3");

        fixture.suspender.suspend_tab(first).unwrap();
        fixture.suspender.suspend_tab(second).unwrap();

        let stats = fixture.suspender.stats().unwrap();
        assert_eq!(stats.total_saved, 2 * ESTIMATED_TAB_BYTES);
        assert_eq!(stats.today_saved, 2 * ESTIMATED_TAB_BYTES);
        assert_eq!(stats.tabs_suspended, 2);
        assert_eq!(stats.total_tabs, 3);
        assert_eq!(stats.active_tabs, 1);
        assert_eq!(stats.lifetime_tabs_suspended, 2);

        fixture.advance_minutes(2 * 24 * 60);
        let stats = fixture.suspender.stats().unwrap();
        assert_eq!(stats.today_saved, 0);
        assert_eq!(stats.total_saved, 2 * ESTIMATED_TAB_BYTES);
    }

    #[test]
    fn test_stats_failure_does_not_block_suspension() {
        let fixture = Fixture::new();
        let tab = fixture.open("https://example.com");
        fixture.store.set_read_only(true);

        assert!(fixture.suspender.suspend_tab(tab).unwrap().is_suspended());
        assert_eq!(fixture.suspender.memory_stats().unwrap().tabs_suspended, 0);
        assert_eq!(fixture.events.of_type("error").len(), 1);
    }

    #[test]
    fn test_tab_list_reports_last_activity() {
        let fixture = Fixture::new();
        let tab = fixture.open("https://example.com");
        let quiet = fixture.open("https://example.com/quiet");
        fixture.suspender.start_monitoring().unwrap();
        fixture.advance_minutes(3);
        fixture.suspender.touch(tab);

        let windows = fixture.suspender.tab_list().unwrap();
        assert_eq!(windows.len(), 1);
        let views = &windows[0].tabs;
        let touched = views.iter().find(|v| v.id == tab).unwrap();
        let untouched = views.iter().find(|v| v.id == quiet).unwrap();
        assert_eq!(touched.last_activity, START + 3 * 60_000);
        assert_eq!(untouched.last_activity, START);
    }

    #[cfg(feature = "async")]
    #[tokio::test(start_paused = true)]
    async fn test_ticker_suspends_idle_tab() {
        use std::time::Duration;
        use tabrest_core::ManualClock;

        let clock = Arc::new(ManualClock::new(START));
        let host = Arc::new(MemoryTabHost::default());
        let window = host.open_window(true);
        let tab = host.open_tab(window, "https://example.com/idle").unwrap();
        let suspender = Arc::new(
            Suspender::builder(Arc::clone(&host), Arc::new(MemoryStore::new()))
                .with_clock(clock.clone())
                .build()
                .unwrap(),
        );
        suspender.on_startup().unwrap();

        let ticker = suspender.spawn_ticker(Duration::from_millis(100)).unwrap();
        clock.advance(Duration::from_secs(31 * 60));

        for _ in 0..50 {
            if host.tab(tab).unwrap().is_suspended() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        assert!(host.tab(tab).unwrap().is_suspended());
        assert!(!suspender.timers().is_armed(tab));

        ticker.stop().await;
        assert!(!ticker.is_running());
    }

    #[test]
    fn test_debug_output() {
        let fixture = Fixture::new();
        let debug = format!("{:?}", fixture.suspender);
        assert!(debug.contains("Suspender"));
        assert!(debug.contains("suspension_timeout: 30"));
    }
}
