//! Scripted browser sessions for `tabrest simulate`.
//!
//! A scenario lists the windows and tabs open at startup and a timeline of
//! events in minutes from the start. The run uses the in-memory host and a
//! virtual clock, so idle timers fire exactly at their deadlines.
//!
//! ```toml
//! name = "reading session"
//!
//! [[windows]]
//! focused = true
//! tabs = [
//!     { name = "mail", url = "https://mail.google.com/", active = true },
//!     { name = "docs", url = "https://docs.rs/tokio" },
//! ]
//!
//! [[events]]
//! at = 45
//! action = "activate"
//! tab = "docs"
//! ```

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use tabrest::{
    LoadStatus, MenuAction, RestoreOutcome, ShortcutCommand, SuspendOutcome, Suspender,
    TabrestError, TabrestResult, WindowView,
};
use tabrest_core::{
    Clock, ManualClock, Settings, SettingsPatch, SystemClock, Tab, TabId, Timestamp, WindowId,
};
use tabrest_host::{MemoryStore, MemoryTabHost};
use tabrest_observe::{CollectingSubscriber, StatsSummary, SweepReport};

const MINUTE_MS: i64 = 60_000;

/// A scripted session.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Scenario {
    /// Label shown in the report.
    pub name: Option<String>,
    /// Virtual start time; the wall clock when absent.
    pub start: Option<Timestamp>,
    /// Settings applied on top of the CLI's base settings.
    pub settings: SettingsPatch,
    /// Windows open at startup.
    pub windows: Vec<ScenarioWindow>,
    /// Timeline.
    pub events: Vec<TimedEvent>,
    /// Minute at which the run stops. Defaults to one suspension timeout
    /// after the last event.
    pub until: Option<u64>,
}

/// A window open at startup.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScenarioWindow {
    /// Whether the window has focus.
    pub focused: bool,
    /// Its tabs.
    pub tabs: Vec<ScenarioTab>,
}

/// A tab open at startup.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioTab {
    /// Name events use to refer to the tab.
    pub name: String,
    /// Page URL.
    pub url: String,
    /// Page title.
    #[serde(default)]
    pub title: Option<String>,
    /// Whether the tab is active in its window.
    #[serde(default)]
    pub active: bool,
    /// Whether the tab is pinned.
    #[serde(default)]
    pub pinned: bool,
    /// Whether the tab is playing audio.
    #[serde(default)]
    pub audible: bool,
}

/// An action at a point on the timeline.
#[derive(Debug, Clone, Deserialize)]
pub struct TimedEvent {
    /// Minutes from the start.
    pub at: u64,
    /// What happens.
    #[serde(flatten)]
    pub action: Action,
}

/// Something the user or browser does.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Open a new tab.
    Open {
        /// Name for later events.
        tab: String,
        /// Page URL.
        url: String,
        /// Index of the window in the scenario.
        #[serde(default)]
        window: usize,
        /// Whether to switch to it.
        #[serde(default)]
        active: bool,
    },
    /// Close a tab.
    Close { tab: String },
    /// Switch to a tab.
    Activate { tab: String },
    /// User input on a tab's page.
    Activity { tab: String },
    /// A tab finished loading.
    Load { tab: String },
    /// Audio started or stopped.
    SetAudible { tab: String, audible: bool },
    /// The tab was pinned or unpinned.
    SetPinned { tab: String, pinned: bool },
    /// Suspend a tab now.
    Suspend { tab: String },
    /// Restore a tab now.
    Restore { tab: String },
    /// Suspend every inactive tab.
    SuspendAll,
    /// Restore every suspended tab.
    RestoreAll,
    /// Whitelist a domain.
    Whitelist { domain: String },
    /// Remove a domain from the whitelist.
    Unwhitelist { domain: String },
    /// Context menu click on a tab.
    Menu { item: MenuAction, tab: String },
    /// Keyboard shortcut.
    Command { command: ShortcutCommand },
    /// Raw runtime message.
    Message {
        message: Value,
        #[serde(default)]
        sender: Option<String>,
    },
}

impl Action {
    /// Short label for reports.
    pub fn label(&self) -> String {
        match self {
            Action::Open { tab, .. } => format!("open {tab}"),
            Action::Close { tab } => format!("close {tab}"),
            Action::Activate { tab } => format!("activate {tab}"),
            Action::Activity { tab } => format!("activity {tab}"),
            Action::Load { tab } => format!("load {tab}"),
            Action::SetAudible { tab, audible } => format!("audible {tab}={audible}"),
            Action::SetPinned { tab, pinned } => format!("pinned {tab}={pinned}"),
            Action::Suspend { tab } => format!("suspend {tab}"),
            Action::Restore { tab } => format!("restore {tab}"),
            Action::SuspendAll => "suspend all".to_string(),
            Action::RestoreAll => "restore all".to_string(),
            Action::Whitelist { domain } => format!("whitelist {domain}"),
            Action::Unwhitelist { domain } => format!("unwhitelist {domain}"),
            Action::Menu { item, tab } => format!("menu {item} on {tab}"),
            Action::Command { command } => format!("command {command}"),
            Action::Message { message, .. } => format!(
                "message {}",
                message.get("type").and_then(Value::as_str).unwrap_or("?")
            ),
        }
    }
}

impl Scenario {
    /// Load a scenario, as JSON when the file ends in `.json` and TOML
    /// otherwise.
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario {}", path.display()))?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let scenario = if is_json {
            serde_json::from_str(&text).context("Invalid JSON scenario")?
        } else {
            toml::from_str(&text).context("Invalid TOML scenario")?
        };
        Ok(scenario)
    }
}

/// What an action did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionRecord {
    /// Minute it ran at.
    pub at: u64,
    /// The action.
    pub action: String,
    /// Its result.
    pub outcome: String,
}

/// Result of a simulation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationReport {
    /// Scenario label.
    pub name: Option<String>,
    /// Virtual start time.
    pub started_at: Timestamp,
    /// Minutes simulated.
    pub minutes: u64,
    /// Actions in order.
    pub actions: Vec<ActionRecord>,
    /// Idle sweeps that did something, and bulk actions.
    pub sweeps: Vec<SweepReport>,
    /// Windows and tabs at the end.
    pub windows: Vec<WindowView>,
    /// Statistics at the end.
    pub stats: StatsSummary,
    /// Count of each event type dispatched.
    pub events: BTreeMap<String, usize>,
}

impl SimulationReport {
    /// Format as human-readable text.
    pub fn to_text(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!(
            "Simulation: {}\n",
            self.name.as_deref().unwrap_or("(unnamed)")
        ));
        output.push_str(&format!("  Duration: {} minutes\n", self.minutes));

        if !self.actions.is_empty() {
            output.push_str("\nActions:\n");
            for record in &self.actions {
                output.push_str(&format!(
                    "  [{:>4}m] {}: {}\n",
                    record.at, record.action, record.outcome
                ));
            }
        }

        if !self.sweeps.is_empty() {
            output.push_str("\nSweeps:\n");
            for sweep in &self.sweeps {
                output.push_str(&sweep.to_text());
            }
        }

        output.push_str("\nTabs:\n");
        for window in &self.windows {
            output.push_str(&format!(
                "  Window {}{}\n",
                window.id,
                if window.focused { " (focused)" } else { "" }
            ));
            for tab in &window.tabs {
                output.push_str(&format!(
                    "    [{:<9}] {} {}\n",
                    tab.status.as_str(),
                    tab.title,
                    tab.url
                ));
            }
        }

        output.push_str("\nStats:\n");
        for line in self.stats.to_text().lines() {
            output.push_str(&format!("  {line}\n"));
        }

        if !self.events.is_empty() {
            let counts: Vec<String> = self
                .events
                .iter()
                .map(|(event, count)| format!("{event}={count}"))
                .collect();
            output.push_str(&format!("\nEvents: {}\n", counts.join(", ")));
        }

        output
    }

    /// Format as JSON.
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Run a scenario. `base` is the settings the scenario's own overrides
/// are applied to.
pub fn run(scenario: &Scenario, base: Settings) -> Result<SimulationReport> {
    let mut settings = base;
    settings
        .apply(&scenario.settings)
        .context("Invalid scenario settings")?;
    let timeout_minutes = settings.suspension_timeout;

    let mut simulation = Simulation::new(scenario, settings)?;
    simulation
        .suspender
        .on_startup()
        .context("Failed to start suspender")?;

    let mut events: Vec<&TimedEvent> = scenario.events.iter().collect();
    events.sort_by_key(|event| event.at);

    for event in events {
        simulation.advance_to(event.at);
        let outcome = simulation.apply(&event.action)?;
        debug!(at = event.at, action = %event.action.label(), outcome = %outcome, "Applied action");
        simulation.actions.push(ActionRecord {
            at: event.at,
            action: event.action.label(),
            outcome,
        });
    }

    let last = scenario.events.iter().map(|e| e.at).max().unwrap_or(0);
    let until = scenario
        .until
        .unwrap_or_else(|| last.saturating_add(timeout_minutes));
    simulation.advance_to(until.max(last));

    simulation.finish(scenario.name.clone())
}

struct Simulation {
    clock: Arc<ManualClock>,
    host: Arc<MemoryTabHost>,
    events: Arc<CollectingSubscriber>,
    suspender: Suspender<MemoryTabHost, MemoryStore>,
    windows: Vec<WindowId>,
    names: HashMap<String, TabId>,
    start: Timestamp,
    minute: u64,
    actions: Vec<ActionRecord>,
    sweeps: Vec<SweepReport>,
}

impl Simulation {
    fn new(scenario: &Scenario, settings: Settings) -> Result<Self> {
        let start = scenario.start.unwrap_or_else(|| SystemClock.now());
        let clock = Arc::new(ManualClock::new(start));
        let host = Arc::new(MemoryTabHost::default());
        let store = Arc::new(MemoryStore::new());
        let events = Arc::new(CollectingSubscriber::new(10_000));

        let mut windows = Vec::new();
        let mut names = HashMap::new();
        for window in &scenario.windows {
            let id = host.open_window(window.focused);
            windows.push(id);
            for tab in &window.tabs {
                let tab_id = host.insert_tab(id, |tab_id| {
                    let mut built = Tab::new(tab_id, id, tab.url.clone())
                        .with_active(tab.active)
                        .with_pinned(tab.pinned)
                        .with_audible(tab.audible);
                    if let Some(title) = &tab.title {
                        built = built.with_title(title.clone());
                    }
                    built
                })?;
                if names.insert(tab.name.clone(), tab_id).is_some() {
                    bail!("Duplicate tab name '{}'", tab.name);
                }
            }
        }
        if windows.is_empty() {
            windows.push(host.open_window(true));
        }

        let suspender = Suspender::builder(Arc::clone(&host), store)
            .with_clock(clock.clone())
            .with_settings(settings)
            .with_event_subscriber(events.clone())
            .build()
            .context("Failed to build suspender")?;

        info!(windows = windows.len(), tabs = names.len(), "Simulation ready");

        Ok(Self {
            clock,
            host,
            events,
            suspender,
            windows,
            names,
            start,
            minute: 0,
            actions: Vec::new(),
            sweeps: Vec::new(),
        })
    }

    fn at_minute(&self, minute: u64) -> Timestamp {
        let offset = i64::try_from(minute).unwrap_or(i64::MAX / MINUTE_MS);
        self.start.saturating_add(offset.saturating_mul(MINUTE_MS))
    }

    /// Move the clock forward, firing every timer that falls due on the way.
    fn advance_to(&mut self, minute: u64) {
        let target = self.at_minute(minute.max(self.minute));

        while let Some(deadline) = self.suspender.timers().next_deadline() {
            if deadline > target {
                break;
            }
            self.clock.set(deadline.max(self.clock.now()));
            let report = self.suspender.tick();
            if report.changed_count() > 0 || !report.skipped.is_empty() || !report.is_clean() {
                self.sweeps.push(report);
            }
        }

        self.clock.set(target);
        self.minute = self.minute.max(minute);
    }

    fn tab_id(&self, name: &str) -> Result<TabId> {
        self.names
            .get(name)
            .copied()
            .ok_or_else(|| anyhow!("Unknown tab '{name}'"))
    }

    fn tab(&self, name: &str) -> Result<Tab> {
        let id = self.tab_id(name)?;
        self.host
            .tab(id)
            .ok_or_else(|| anyhow!("Tab '{name}' is closed"))
    }

    /// Apply one action. Scenario mistakes abort the run; suspender
    /// failures are reported as the action's outcome.
    fn apply(&mut self, action: &Action) -> Result<String> {
        let outcome = match action {
            Action::Open {
                tab,
                url,
                window,
                active,
            } => {
                let window_id = *self
                    .windows
                    .get(*window)
                    .ok_or_else(|| anyhow!("No window at index {window}"))?;
                let id = self.host.open_tab(window_id, url)?;
                if self.names.insert(tab.clone(), id).is_some() {
                    bail!("Duplicate tab name '{tab}'");
                }
                let opened = self.tab(tab)?;
                self.suspender.on_created(&opened);
                if *active {
                    self.host.activate(id)?;
                    describe(self.suspender.on_activated(id).map(|_| format!("opened tab {id}")))
                } else {
                    format!("opened tab {id}")
                }
            }
            Action::Close { tab } => {
                let id = self.tab_id(tab)?;
                self.host.close_tab(id)?;
                self.suspender.on_removed(id);
                "closed".to_string()
            }
            Action::Activate { tab } => {
                let id = self.tab_id(tab)?;
                self.host.activate(id)?;
                describe(self.suspender.on_activated(id).map(|outcome| match outcome {
                    Some(outcome) => restore_text(&outcome),
                    None => "activated".to_string(),
                }))
            }
            Action::Activity { tab } => {
                self.suspender.touch(self.tab_id(tab)?);
                "timer reset".to_string()
            }
            Action::Load { tab } => {
                self.suspender.on_updated(&self.tab(tab)?, Some(LoadStatus::Complete));
                "loaded".to_string()
            }
            Action::SetAudible { tab, audible } => {
                self.host.set_audible(self.tab_id(tab)?, *audible)?;
                format!("audible={audible}")
            }
            Action::SetPinned { tab, pinned } => {
                self.host.set_pinned(self.tab_id(tab)?, *pinned)?;
                format!("pinned={pinned}")
            }
            Action::Suspend { tab } => describe(
                self.suspender
                    .suspend_tab(self.tab_id(tab)?)
                    .map(|outcome| match outcome {
                        SuspendOutcome::Suspended { .. } => "suspended".to_string(),
                        SuspendOutcome::Skipped(reason) => format!("kept ({})", reason.message),
                    }),
            ),
            Action::Restore { tab } => describe(
                self.suspender
                    .restore_tab(self.tab_id(tab)?)
                    .map(|outcome| restore_text(&outcome)),
            ),
            Action::SuspendAll => {
                let result = self.suspender.suspend_all_inactive(None);
                self.bulk(result, "suspended")
            }
            Action::RestoreAll => {
                let result = self.suspender.restore_all();
                self.bulk(result, "restored")
            }
            Action::Whitelist { domain } => describe(self.suspender.add_to_whitelist(domain).map(
                |added| if added { "added" } else { "already listed" }.to_string(),
            )),
            Action::Unwhitelist { domain } => {
                describe(self.suspender.remove_from_whitelist(domain).map(|removed| {
                    if removed { "removed" } else { "not listed" }.to_string()
                }))
            }
            Action::Menu { item, tab } => {
                let target = self.tab(tab)?;
                describe(
                    self.suspender
                        .on_menu_clicked(*item, &target)
                        .map(|()| "done".to_string()),
                )
            }
            Action::Command { command } => {
                describe(self.suspender.on_command(*command).map(|()| "done".to_string()))
            }
            Action::Message { message, sender } => {
                let sender = sender.as_deref().map(|name| self.tab_id(name)).transpose()?;
                self.suspender.handle_json(message.clone(), sender).to_string()
            }
        };
        Ok(outcome)
    }

    fn bulk(&mut self, result: TabrestResult<SweepReport>, verb: &str) -> String {
        match result {
            Ok(report) => {
                let text = format!("{verb} {}", report.changed_count());
                self.sweeps.push(report);
                text
            }
            Err(e) => format!("error: {e}"),
        }
    }

    fn finish(self, name: Option<String>) -> Result<SimulationReport> {
        let windows = self.suspender.tab_list().context("Failed to list tabs")?;
        let stats = self.suspender.stats().context("Failed to read stats")?;

        let mut events = BTreeMap::new();
        for event in self.events.events() {
            *events.entry(event.event_type().to_string()).or_insert(0) += 1;
        }

        Ok(SimulationReport {
            name,
            started_at: self.start,
            minutes: self.minute,
            actions: self.actions,
            sweeps: self.sweeps,
            windows,
            stats,
            events,
        })
    }
}

fn describe(result: TabrestResult<String>) -> String {
    result.unwrap_or_else(|e: TabrestError| format!("error: {e}"))
}

fn restore_text(outcome: &RestoreOutcome) -> String {
    match outcome {
        RestoreOutcome::Restored { url } => format!("restored {url}"),
        RestoreOutcome::Reloaded => "reloaded".to_string(),
        RestoreOutcome::MissingUrl => "placeholder has no URL".to_string(),
    }
}
