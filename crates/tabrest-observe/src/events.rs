//! Observable suspender lifecycle events.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;

use tabrest_core::{TabId, Timestamp};
use tabrest_policy::RuleId;

/// Things that happen to tabs and settings.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SuspenderEvent {
    /// An idle timer was armed.
    TimerStarted {
        /// The tab.
        tab: TabId,
        /// When it will expire.
        deadline: Timestamp,
    },
    /// An idle timer expired.
    TimerExpired {
        /// The tab.
        tab: TabId,
    },
    /// A tab was replaced by its suspended page.
    TabSuspended {
        /// The tab.
        tab: TabId,
        /// The page that was unloaded.
        url: String,
        /// Estimated bytes freed.
        memory_saved: u64,
    },
    /// A tab was kept loaded.
    SuspendSkipped {
        /// The tab.
        tab: TabId,
        /// The rule that vetoed suspension.
        rule: RuleId,
        /// Why.
        reason: String,
    },
    /// A suspended tab was brought back.
    TabRestored {
        /// The tab.
        tab: TabId,
        /// The page it returned to.
        url: String,
    },
    /// Settings were replaced or patched.
    SettingsChanged {
        /// Idle timeout in minutes after the change.
        timeout_minutes: u64,
        /// Whitelist size after the change.
        whitelist_len: usize,
    },
    /// A domain was added to or removed from the whitelist.
    WhitelistChanged {
        /// The domain.
        domain: String,
        /// True when added.
        added: bool,
    },
    /// The badge count changed.
    BadgeUpdated {
        /// Suspended tabs.
        count: usize,
    },
    /// An operation failed and was swallowed.
    Error {
        /// What was being done.
        operation: String,
        /// Error message.
        message: String,
    },
}

impl SuspenderEvent {
    /// Get the event type name.
    pub fn event_type(&self) -> &'static str {
        match self {
            SuspenderEvent::TimerStarted { .. } => "timer_started",
            SuspenderEvent::TimerExpired { .. } => "timer_expired",
            SuspenderEvent::TabSuspended { .. } => "tab_suspended",
            SuspenderEvent::SuspendSkipped { .. } => "suspend_skipped",
            SuspenderEvent::TabRestored { .. } => "tab_restored",
            SuspenderEvent::SettingsChanged { .. } => "settings_changed",
            SuspenderEvent::WhitelistChanged { .. } => "whitelist_changed",
            SuspenderEvent::BadgeUpdated { .. } => "badge_updated",
            SuspenderEvent::Error { .. } => "error",
        }
    }

    /// The tab the event concerns, if any.
    pub fn tab(&self) -> Option<TabId> {
        match self {
            SuspenderEvent::TimerStarted { tab, .. }
            | SuspenderEvent::TimerExpired { tab }
            | SuspenderEvent::TabSuspended { tab, .. }
            | SuspenderEvent::SuspendSkipped { tab, .. }
            | SuspenderEvent::TabRestored { tab, .. } => Some(*tab),
            _ => None,
        }
    }
}

/// Subscriber for suspender events.
pub trait EventSubscriber: Send + Sync {
    /// Called when an event occurs.
    fn on_event(&self, event: &SuspenderEvent);

    /// Event types this subscriber wants. `None` receives everything.
    fn event_filter(&self) -> Option<Vec<&'static str>> {
        None
    }
}

/// Forwards events to `tracing`.
pub struct LoggingSubscriber {
    /// Level used for routine events.
    pub log_level: tracing::Level,
}

impl LoggingSubscriber {
    /// Create a new logging subscriber.
    pub fn new() -> Self {
        Self {
            log_level: tracing::Level::DEBUG,
        }
    }

    /// Set the level used for routine events.
    pub fn with_level(mut self, level: tracing::Level) -> Self {
        self.log_level = level;
        self
    }

    fn routine(&self, event: &SuspenderEvent) {
        let kind = event.event_type();
        let tab = event.tab().map(|t| t.0);
        if self.log_level == tracing::Level::TRACE {
            tracing::trace!(event = kind, tab_id = ?tab, "Suspender event");
        } else if self.log_level == tracing::Level::DEBUG {
            tracing::debug!(event = kind, tab_id = ?tab, "Suspender event");
        } else {
            tracing::info!(event = kind, tab_id = ?tab, "Suspender event");
        }
    }
}

impl Default for LoggingSubscriber {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSubscriber for LoggingSubscriber {
    fn on_event(&self, event: &SuspenderEvent) {
        match event {
            SuspenderEvent::TabSuspended { tab, url, memory_saved } => {
                tracing::info!(
                    event = "tab_suspended",
                    tab_id = %tab,
                    url = url,
                    memory_saved = memory_saved,
                    "Tab suspended"
                );
            }
            SuspenderEvent::TabRestored { tab, url } => {
                tracing::info!(event = "tab_restored", tab_id = %tab, url = url, "Tab restored");
            }
            SuspenderEvent::SuspendSkipped { tab, rule, reason } => {
                tracing::debug!(
                    event = "suspend_skipped",
                    tab_id = %tab,
                    rule = %rule,
                    reason = reason,
                    "Suspension skipped"
                );
            }
            SuspenderEvent::SettingsChanged {
                timeout_minutes,
                whitelist_len,
            } => {
                tracing::info!(
                    event = "settings_changed",
                    timeout_minutes = timeout_minutes,
                    whitelist = whitelist_len,
                    "Settings changed"
                );
            }
            SuspenderEvent::WhitelistChanged { domain, added } => {
                tracing::info!(
                    event = "whitelist_changed",
                    domain = domain,
                    added = added,
                    "Whitelist changed"
                );
            }
            SuspenderEvent::Error { operation, message } => {
                tracing::error!(event = "error", operation = operation, message = message, "Operation failed");
            }
            other => self.routine(other),
        }
    }
}

/// Keeps events in memory, up to a limit.
pub struct CollectingSubscriber {
    events: RwLock<Vec<SuspenderEvent>>,
    max_events: usize,
}

impl CollectingSubscriber {
    /// Create a new collecting subscriber.
    pub fn new(max_events: usize) -> Self {
        Self {
            events: RwLock::new(Vec::new()),
            max_events,
        }
    }

    /// Get collected events.
    pub fn events(&self) -> Vec<SuspenderEvent> {
        self.events.read().clone()
    }

    /// Collected events of one type.
    pub fn of_type(&self, event_type: &str) -> Vec<SuspenderEvent> {
        self.events
            .read()
            .iter()
            .filter(|e| e.event_type() == event_type)
            .cloned()
            .collect()
    }

    /// Clear collected events.
    pub fn clear(&self) {
        self.events.write().clear();
    }

    /// Get event count.
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }
}

impl EventSubscriber for CollectingSubscriber {
    fn on_event(&self, event: &SuspenderEvent) {
        let mut events = self.events.write();
        if events.len() < self.max_events {
            events.push(event.clone());
        }
    }
}

/// Fans events out to subscribers.
#[derive(Default)]
pub struct EventDispatcher {
    subscribers: RwLock<Vec<Arc<dyn EventSubscriber>>>,
}

impl EventDispatcher {
    /// Create a new event dispatcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a subscriber.
    pub fn subscribe(&self, subscriber: Arc<dyn EventSubscriber>) {
        self.subscribers.write().push(subscriber);
    }

    /// Remove all subscribers.
    pub fn clear_subscribers(&self) {
        self.subscribers.write().clear();
    }

    /// Get subscriber count.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    /// Emit an event to all interested subscribers.
    pub fn emit(&self, event: SuspenderEvent) {
        let subscribers = self.subscribers.read();
        for subscriber in subscribers.iter() {
            if let Some(filter) = subscriber.event_filter() {
                if !filter.contains(&event.event_type()) {
                    continue;
                }
            }
            subscriber.on_event(&event);
        }
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}
