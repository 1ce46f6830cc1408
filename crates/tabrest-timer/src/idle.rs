//! Per-tab idle deadlines.
//!
//! Every tab that can be suspended carries at most one armed deadline.
//! Timers are one-shot: [`IdleTimers::take_due`] disarms whatever it
//! returns, and nothing re-arms a timer except fresh activity.

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use tracing::{debug, trace};

use tabrest_core::{TabId, Timestamp};

use crate::error::{TimerError, TimerResult};

/// Counters describing timer activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimerStats {
    /// Timers currently armed.
    pub armed: usize,
    /// Tabs with recorded activity.
    pub tracked: usize,
    /// Timers armed since creation.
    pub started: u64,
    /// Timers that expired.
    pub expired: u64,
}

/// Idle deadlines and last-activity times for every known tab.
///
/// # Example
///
/// ```ignore
/// use tabrest_timer::IdleTimers;
///
/// let timers = IdleTimers::new(Duration::from_secs(30 * 60))?;
/// timers.start(tab, clock.now());
/// for tab in timers.take_due(clock.now()) {
///     // try to suspend
/// }
/// ```
#[derive(Debug)]
pub struct IdleTimers {
    timeout_ms: AtomicI64,
    deadlines: DashMap<TabId, Timestamp>,
    last_activity: DashMap<TabId, Timestamp>,
    started: AtomicU64,
    expired: AtomicU64,
}

impl IdleTimers {
    /// Create a timer table with the given idle timeout.
    pub fn new(timeout: Duration) -> TimerResult<Self> {
        let timers = Self {
            timeout_ms: AtomicI64::new(0),
            deadlines: DashMap::new(),
            last_activity: DashMap::new(),
            started: AtomicU64::new(0),
            expired: AtomicU64::new(0),
        };
        timers.set_timeout(timeout)?;
        Ok(timers)
    }

    /// The idle timeout applied to newly armed timers.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms.load(Ordering::Relaxed) as u64)
    }

    /// Change the idle timeout. Timers already armed keep their deadline.
    pub fn set_timeout(&self, timeout: Duration) -> TimerResult<()> {
        let ms = i64::try_from(timeout.as_millis()).unwrap_or(i64::MAX);
        if ms <= 0 {
            return Err(TimerError::InvalidTimeout(ms));
        }
        self.timeout_ms.store(ms, Ordering::Relaxed);
        debug!(timeout_ms = ms, "Idle timeout set");
        Ok(())
    }

    /// Arm a timer for a tab, replacing any existing one.
    pub fn start(&self, tab: TabId, now: Timestamp) -> Timestamp {
        let deadline = now.saturating_add(self.timeout_ms.load(Ordering::Relaxed));
        self.deadlines.insert(tab, deadline);
        self.last_activity.insert(tab, now);
        self.started.fetch_add(1, Ordering::Relaxed);
        trace!(tab_id = %tab, deadline, "Timer armed");
        deadline
    }

    /// Disarm a tab's timer. Its last activity is kept.
    pub fn clear(&self, tab: TabId) -> bool {
        let cleared = self.deadlines.remove(&tab).is_some();
        if cleared {
            trace!(tab_id = %tab, "Timer cleared");
        }
        cleared
    }

    /// Record activity on a tab and re-arm its timer.
    pub fn reset(&self, tab: TabId, now: Timestamp) -> Timestamp {
        self.clear(tab);
        self.start(tab, now)
    }

    /// Drop everything known about a tab.
    pub fn forget(&self, tab: TabId) {
        self.deadlines.remove(&tab);
        self.last_activity.remove(&tab);
        trace!(tab_id = %tab, "Tab forgotten");
    }

    /// Disarm and return every tab whose deadline has passed, earliest first.
    pub fn take_due(&self, now: Timestamp) -> Vec<TabId> {
        let mut due: Vec<(Timestamp, TabId)> = self
            .deadlines
            .iter()
            .filter(|entry| *entry.value() <= now)
            .map(|entry| (*entry.value(), *entry.key()))
            .collect();
        due.sort();

        // A concurrent reset may have moved the deadline since the scan.
        due.retain(|(deadline, tab)| {
            self.deadlines
                .remove_if(tab, |_, current| current == deadline)
                .is_some()
        });

        if !due.is_empty() {
            self.expired.fetch_add(due.len() as u64, Ordering::Relaxed);
            debug!(count = due.len(), now, "Timers expired");
        }
        due.into_iter().map(|(_, tab)| tab).collect()
    }

    /// Earliest armed deadline.
    pub fn next_deadline(&self) -> Option<Timestamp> {
        self.deadlines.iter().map(|entry| *entry.value()).min()
    }

    /// A tab's armed deadline.
    pub fn deadline(&self, tab: TabId) -> Option<Timestamp> {
        self.deadlines.get(&tab).map(|d| *d)
    }

    /// Whether a tab has an armed timer.
    pub fn is_armed(&self, tab: TabId) -> bool {
        self.deadlines.contains_key(&tab)
    }

    /// When a tab was last active.
    pub fn last_activity(&self, tab: TabId) -> Option<Timestamp> {
        self.last_activity.get(&tab).map(|t| *t)
    }

    /// Disarm every timer and forget all activity.
    pub fn clear_all(&self) {
        self.deadlines.clear();
        self.last_activity.clear();
    }

    /// Current counters.
    pub fn stats(&self) -> TimerStats {
        TimerStats {
            armed: self.deadlines.len(),
            tracked: self.last_activity.len(),
            started: self.started.load(Ordering::Relaxed),
            expired: self.expired.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINUTE: i64 = 60_000;

    fn timers(minutes: u64) -> IdleTimers {
        IdleTimers::new(Duration::from_secs(minutes * 60)).unwrap()
    }

    #[test]
    fn test_zero_timeout_rejected() {
        assert!(matches!(
            IdleTimers::new(Duration::ZERO),
            Err(TimerError::InvalidTimeout(0))
        ));
    }

    #[test]
    fn test_start_sets_deadline_and_activity() {
        let timers = timers(30);
        let deadline = timers.start(TabId(1), 1_000);

        assert_eq!(deadline, 1_000 + 30 * MINUTE);
        assert_eq!(timers.deadline(TabId(1)), Some(deadline));
        assert_eq!(timers.last_activity(TabId(1)), Some(1_000));
    }

    #[test]
    fn test_clear_keeps_activity() {
        let timers = timers(1);
        timers.start(TabId(1), 0);

        assert!(timers.clear(TabId(1)));
        assert!(!timers.clear(TabId(1)));
        assert!(!timers.is_armed(TabId(1)));
        assert_eq!(timers.last_activity(TabId(1)), Some(0));
    }

    #[test]
    fn test_forget_drops_everything() {
        let timers = timers(1);
        timers.start(TabId(1), 0);
        timers.forget(TabId(1));

        assert!(!timers.is_armed(TabId(1)));
        assert_eq!(timers.last_activity(TabId(1)), None);
    }

    #[test]
    fn test_reset_pushes_deadline() {
        let timers = timers(1);
        timers.start(TabId(1), 0);
        timers.reset(TabId(1), 45_000);

        assert!(timers.take_due(MINUTE).is_empty());
        assert_eq!(timers.take_due(45_000 + MINUTE), vec![TabId(1)]);
    }

    #[test]
    fn test_take_due_is_ordered_and_one_shot() {
        let timers = timers(1);
        timers.start(TabId(3), 10);
        timers.start(TabId(1), 20);
        timers.start(TabId(2), 0);
        timers.start(TabId(4), 5 * MINUTE);

        assert_eq!(timers.take_due(MINUTE + 20), vec![TabId(2), TabId(3), TabId(1)]);
        assert!(timers.take_due(MINUTE + 20).is_empty());
        assert!(timers.is_armed(TabId(4)));
        assert_eq!(timers.next_deadline(), Some(6 * MINUTE));

        let stats = timers.stats();
        assert_eq!(stats.armed, 1);
        assert_eq!(stats.tracked, 4);
        assert_eq!(stats.expired, 3);
    }

    #[test]
    fn test_new_timeout_applies_to_new_timers_only() {
        let timers = timers(30);
        timers.start(TabId(1), 0);
        timers.set_timeout(Duration::from_secs(60)).unwrap();
        timers.start(TabId(2), 0);

        assert_eq!(timers.deadline(TabId(1)), Some(30 * MINUTE));
        assert_eq!(timers.deadline(TabId(2)), Some(MINUTE));
        assert_eq!(timers.timeout(), Duration::from_secs(60));
    }
}
