//! Suspender configuration.

use std::sync::Arc;

use tabrest_core::{SharedClock, Settings, SystemClock};
use tabrest_host::{KeyValueStore, TabHost};
use tabrest_observe::{EventDispatcher, EventSubscriber};
use tabrest_policy::{BoxedRule, Rule, RuleSet};
use tabrest_timer::IdleTimers;

use crate::error::TabrestResult;
use crate::suspender::Suspender;

/// Builder for a [`Suspender`].
pub struct SuspenderBuilder<H, S> {
    host: Arc<H>,
    store: Arc<S>,
    clock: SharedClock,
    settings: Settings,
    base_rules: Option<RuleSet>,
    extra_rules: Vec<BoxedRule>,
    event_subscribers: Vec<Arc<dyn EventSubscriber>>,
}

impl<H: TabHost, S: KeyValueStore> SuspenderBuilder<H, S> {
    /// Create a builder with default settings, the system clock and the
    /// built-in rules.
    pub fn new(host: Arc<H>, store: Arc<S>) -> Self {
        Self {
            host,
            store,
            clock: Arc::new(SystemClock),
            settings: Settings::default(),
            base_rules: None,
            extra_rules: Vec::new(),
            event_subscribers: Vec::new(),
        }
    }

    /// Use a different clock.
    pub fn with_clock(mut self, clock: SharedClock) -> Self {
        self.clock = clock;
        self
    }

    /// Start from these settings instead of the defaults.
    ///
    /// Stored settings still win once `load_settings` runs.
    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// Replace the built-in rules.
    pub fn with_rule_set(mut self, rules: RuleSet) -> Self {
        self.base_rules = Some(rules);
        self
    }

    /// Append a rule after the others.
    pub fn with_rule<R: Rule + 'static>(mut self, rule: R) -> Self {
        self.extra_rules.push(Box::new(rule));
        self
    }

    /// Add an event subscriber.
    pub fn with_event_subscriber(mut self, subscriber: Arc<dyn EventSubscriber>) -> Self {
        self.event_subscribers.push(subscriber);
        self
    }

    /// Build the suspender.
    ///
    /// # Errors
    ///
    /// Fails on invalid settings or a duplicate rule ID.
    pub fn build(self) -> TabrestResult<Suspender<H, S>> {
        self.settings.validate()?;
        let timers = IdleTimers::new(self.settings.timeout())?;

        let rules = self.base_rules.unwrap_or_else(RuleSet::standard);
        for rule in self.extra_rules {
            rules.add_shared(rule.into())?;
        }

        let events = EventDispatcher::new();
        for subscriber in self.event_subscribers {
            events.subscribe(subscriber);
        }

        Ok(Suspender::from_parts(
            self.host,
            self.store,
            self.clock,
            self.settings,
            timers,
            rules,
            Arc::new(events),
        ))
    }
}
