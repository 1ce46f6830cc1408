//! Tabrest Timer
//!
//! Idle timers for the tab suspender. Each tab that may be suspended gets
//! a one-shot deadline `timeout` after its last activity; the suspender
//! collects expired deadlines and decides what to do with them.
//!
//! ```text
//!  created / loaded ──► start ──► deadline armed
//!  activity ─────────► reset ──► deadline moved
//!  suspended ────────► clear ──► disarmed, activity kept
//!  closed ───────────► forget ─► nothing kept
//!  take_due(now) ────► expired tabs, disarmed
//! ```
//!
//! Time is passed in explicitly, so the table is driven equally well by
//! a real clock, a test clock, or the optional tokio [`Ticker`]
//! (feature `async`).

pub mod error;
pub mod idle;
#[cfg(feature = "async")]
pub mod ticker;

// Re-export main types
pub use error::{TimerError, TimerResult};
pub use idle::{IdleTimers, TimerStats};
#[cfg(feature = "async")]
pub use ticker::{DEFAULT_TICK, Ticker};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::error::{TimerError, TimerResult};
    pub use crate::idle::IdleTimers;
    #[cfg(feature = "async")]
    pub use crate::ticker::Ticker;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tabrest_core::TabId;

    #[test]
    fn test_prelude_imports() {
        use crate::prelude::*;

        let timers = IdleTimers::new(Duration::from_secs(1)).unwrap();
        timers.start(TabId(1), 0);
        assert_eq!(timers.take_due(1_000), vec![TabId(1)]);
    }
}
