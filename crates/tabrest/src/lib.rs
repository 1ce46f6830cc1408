//! # Tabrest - Idle Tab Suspender
//!
//! Tabrest frees browser memory by replacing tabs that have sat idle with
//! a lightweight placeholder page, and brings them back when the user
//! returns.
//!
//! ## Features
//!
//! - **Idle timers**: every tab gets a deadline that activity pushes back
//! - **Policy**: active, pinned, audible, internal and whitelisted tabs
//!   are kept loaded
//! - **Restore**: on focus, on request, or all at once
//! - **Statistics**: estimated memory saved, per day and overall
//! - **Host-agnostic**: the browser is reached only through
//!   [`TabHost`](tabrest_host::TabHost) and
//!   [`KeyValueStore`](tabrest_host::KeyValueStore)
//!
//! ## Quick Start
//!
//! ```ignore
//! use tabrest::prelude::*;
//!
//! let host = Arc::new(MemoryTabHost::default());
//! let store = Arc::new(MemoryStore::new());
//!
//! let suspender = Suspender::builder(host, store)
//!     .with_settings(Settings::default().with_timeout_minutes(15))
//!     .with_event_subscriber(Arc::new(LoggingSubscriber::new()))
//!     .build()?;
//!
//! suspender.on_startup()?;
//! let report = suspender.tick();
//! println!("{}", report.to_text());
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │        Browser events, messages, menus, shortcuts       │
//! ├─────────────────────────────────────────────────────────┤
//! │                    tabrest (Suspender)                  │
//! │                    ┌─────────────────┐                  │
//! │                    │ SuspenderBuilder│                  │
//! │                    └────────┬────────┘                  │
//! │                             │                           │
//! │  ┌──────────────┬───────────┴──┬──────────────┬───────┐ │
//! │  │ tabrest-core │ tabrest-     │ tabrest-     │tabrest│ │
//! │  │ (tabs, URLs, │ policy       │ timer        │observe│ │
//! │  │  settings)   │ (rules)      │ (deadlines)  │(stats)│ │
//! │  └──────────────┴──────────────┴──────────────┴───────┘ │
//! ├─────────────────────────────────────────────────────────┤
//! │              tabrest-host (TabHost, storage)            │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod builder;
pub mod command;
pub mod error;
pub mod message;
pub mod suspender;
pub mod view;

#[cfg(test)]
mod fixture;

// Re-export from sub-crates
pub use tabrest_core;
pub use tabrest_host;
pub use tabrest_observe;
pub use tabrest_policy;
pub use tabrest_timer;

pub use builder::SuspenderBuilder;
pub use command::{MenuAction, ShortcutCommand};
pub use error::{TabrestError, TabrestResult};
pub use message::{Message, Response, UNKNOWN_MESSAGE};
pub use suspender::{
    INSTALL_DATE_KEY, InstallReason, LoadStatus, ONBOARDING_PAGE, RestoreOutcome, SETTINGS_KEY,
    SuspendOutcome, Suspender,
};
pub use view::{TabFilter, TabView, WindowView, filter_windows, format_bytes};

/// Prelude module for convenient imports.
pub mod prelude {
    // Main types
    pub use crate::{
        InstallReason, LoadStatus, MenuAction, Message, Response, RestoreOutcome,
        ShortcutCommand, SuspendOutcome, Suspender, SuspenderBuilder, TabrestError,
        TabrestResult,
    };

    // Core types
    pub use tabrest_core::{
        Clock, ManualClock, Settings, SettingsPatch, SharedClock, SuspendedPage, SystemClock,
        Tab, TabId, TabStatus, Window, WindowId,
    };

    // Policy types
    pub use tabrest_policy::{Rule, RuleId, RuleSet, Verdict};

    // Host types
    pub use tabrest_host::{
        JsonFileStore, KeyValueStore, MemoryStore, MemoryTabHost, StorageArea, TabHost,
    };

    // Observability types
    pub use tabrest_observe::{
        CollectingSubscriber, EventSubscriber, LoggingSubscriber, MemoryStats, StatsSummary,
        SuspenderEvent, SweepReport,
    };

    // Common std types
    pub use std::sync::Arc;
    pub use std::time::Duration;
}
