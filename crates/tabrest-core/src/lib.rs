//! Tabrest Core - Tab Suspender Model
//!
//! This crate provides the shared vocabulary of the Tabrest tab suspender.
//! It includes:
//!
//! - [`Tab`], [`Window`] and [`TabStatus`]: the host's view of open tabs
//! - [`Settings`]: user preferences, persisted as camelCase JSON
//! - [`SuspendedPage`]: the codec for the placeholder page a suspended tab shows
//! - [`Clock`]: wall-clock abstraction so timers can be driven deterministically
//!
//! # Quick Start
//!
//! ```ignore
//! use tabrest_core::prelude::*;
//!
//! let settings = Settings::default();
//! assert_eq!(settings.suspension_timeout, 30);
//!
//! let page = SuspendedPage::new("https://example.com/a", Some("Example"), None, 1_000);
//! let url = page.encode("chrome-extension://abc/");
//! assert!(is_suspended_page(Some(&url)));
//! ```
//!
//! # Lifecycle
//!
//! ```text
//!            created / activity
//!   ┌──────────────────────────────┐
//!   │                              ▼
//! (idle) ── timer expires ──▶ (suspended) ── restore ──▶ (idle)
//!   ▲         + eligible                                   │
//!   └──────────── activated / page load ───────────────────┘
//! ```

pub mod clock;
pub mod error;
pub mod page;
pub mod settings;
pub mod suspended;
pub mod tab;

// Re-export main types at crate root
pub use clock::{Clock, ManualClock, SharedClock, SystemClock, Timestamp, same_local_day};
pub use error::{CoreError, Result, SettingsError, SettingsResult, SuspendedUrlError};
pub use page::{display_domain, hostname, is_internal_page, is_suspended_page};
pub use settings::{Settings, SettingsPatch, DEFAULT_WHITELIST};
pub use suspended::{SuspendedPage, format_elapsed, SUSPENDED_PAGE, DEFAULT_SUSPENDED_TITLE};
pub use tab::{Tab, TabId, TabStatus, Window, WindowId};

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```ignore
/// use tabrest_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::clock::{Clock, ManualClock, SystemClock, Timestamp};
    pub use crate::error::{CoreError, Result, SettingsError};
    pub use crate::page::{is_internal_page, is_suspended_page};
    pub use crate::settings::{Settings, SettingsPatch};
    pub use crate::suspended::SuspendedPage;
    pub use crate::tab::{Tab, TabId, TabStatus, Window, WindowId};
}
