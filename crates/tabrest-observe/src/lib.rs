//! Tabrest Observability
//!
//! What the suspender did, and what it saved:
//!
//! - [`EventDispatcher`]: lifecycle events fanned out to subscribers
//! - [`MemoryStats`]: lifetime savings persisted in local storage
//! - [`StatsSummary`]: the popup's numbers
//! - [`SweepReport`]: the outcome of a bulk suspend or restore
//!
//! # Event Subscription
//!
//! ```ignore
//! use tabrest_observe::{EventDispatcher, LoggingSubscriber, SuspenderEvent};
//! use std::sync::Arc;
//!
//! let dispatcher = EventDispatcher::new();
//! dispatcher.subscribe(Arc::new(LoggingSubscriber::new()));
//! dispatcher.emit(SuspenderEvent::BadgeUpdated { count: 3 });
//! ```
//!
//! # Statistics
//!
//! ```ignore
//! use tabrest_observe::{MemoryStats, StatsSummary, format_bytes};
//!
//! let mut stats = MemoryStats::new();
//! stats.record("https://example.com", now);
//! println!("{}", format_bytes(stats.total_saved)); // "50 MB"
//! ```

pub mod events;
pub mod report;
pub mod stats;

// Re-export main types
pub use events::{
    CollectingSubscriber, EventDispatcher, EventSubscriber, LoggingSubscriber, SuspenderEvent,
};
pub use report::{ChangedTab, FailedTab, SkippedTab, SweepId, SweepKind, SweepReport};
pub use stats::{
    ESTIMATED_TAB_BYTES, HISTORY_LIMIT, HistoryEntry, MemoryStats, STATS_KEY, StatsSummary,
    format_bytes,
};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::events::{EventDispatcher, EventSubscriber, SuspenderEvent};
    pub use crate::report::{SweepKind, SweepReport};
    pub use crate::stats::{MemoryStats, StatsSummary};
}
