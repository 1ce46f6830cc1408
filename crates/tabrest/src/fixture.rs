//! Shared setup for suspender tests.

use std::sync::Arc;
use std::time::Duration;

use tabrest_core::{ManualClock, Settings, Tab, TabId, WindowId};
use tabrest_host::{MemoryStore, MemoryTabHost};
use tabrest_observe::CollectingSubscriber;

use crate::suspender::Suspender;

pub(crate) const START: i64 = 1_700_000_000_000;

pub(crate) struct Fixture {
    pub clock: Arc<ManualClock>,
    pub host: Arc<MemoryTabHost>,
    pub store: Arc<MemoryStore>,
    pub events: Arc<CollectingSubscriber>,
    pub window: WindowId,
    pub suspender: Suspender<MemoryTabHost, MemoryStore>,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_settings(Settings::default())
    }

    pub fn with_settings(settings: Settings) -> Self {
        let clock = Arc::new(ManualClock::new(START));
        let host = Arc::new(MemoryTabHost::default());
        let store = Arc::new(MemoryStore::new());
        let events = Arc::new(CollectingSubscriber::new(1_000));
        let window = host.open_window(true);

        let suspender = Suspender::builder(Arc::clone(&host), Arc::clone(&store))
            .with_clock(clock.clone())
            .with_settings(settings)
            .with_event_subscriber(events.clone())
            .build()
            .unwrap();

        Self {
            clock,
            host,
            store,
            events,
            window,
            suspender,
        }
    }

    pub fn open(&self, url: &str) -> TabId {
        self.host.open_tab(self.window, url).unwrap()
    }

    pub fn open_active(&self, url: &str) -> TabId {
        let id = self.open(url);
        self.host.activate(id).unwrap();
        id
    }

    pub fn open_with(&self, build: impl FnOnce(Tab) -> Tab) -> TabId {
        let window = self.window;
        self.host
            .insert_tab(window, |id| build(Tab::new(id, window, "")))
            .unwrap()
    }

    pub fn advance_minutes(&self, minutes: u64) {
        self.clock.advance(Duration::from_secs(minutes * 60));
    }

    pub fn tab(&self, id: TabId) -> Tab {
        self.host.tab(id).unwrap()
    }
}
