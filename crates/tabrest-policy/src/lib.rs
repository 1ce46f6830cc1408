//! Tabrest Policy
//!
//! This crate decides whether a tab may be suspended. Every suspension,
//! automatic or requested, passes through a [`RuleSet`].
//!
//! # Eligibility
//!
//! A tab is kept loaded when any rule vetoes it:
//!
//! - It shows a browser-internal page, or no page at all
//! - It is already suspended
//! - It is the active tab and `neverSuspendActiveTab` is set
//! - It is pinned and `suspendPinnedTabs` is not set
//! - It is playing audio and `neverSuspendAudio` is set
//! - Its host name contains a whitelisted domain
//!
//! Rules read the current [`Settings`](tabrest_core::Settings) on every
//! check, so changed preferences apply immediately.
//!
//! # Custom Rules
//!
//! Implement [`Rule`] and append it with [`RuleSetBuilder::with`]. Custom
//! rules run after the built-in ones.
//!
//! # Usage
//!
//! ```ignore
//! use tabrest_policy::RuleSet;
//!
//! let rules = RuleSet::standard();
//! match rules.check(&tab, &settings) {
//!     Verdict::Denied(reason) => println!("kept: {reason}"),
//!     _ => suspend(&tab),
//! }
//! ```

pub mod builtin;
pub mod error;
pub mod rule;
pub mod set;

// Re-export main types
pub use builtin::{
    ActiveTabRule, AlreadySuspendedRule, AudibleTabRule, InternalPageRule, PinnedTabRule,
    WhitelistRule, matching_entry,
};
pub use error::{PolicyError, PolicyResult};
pub use rule::{
    BoxedRule, Candidate, DenialReason, Rule, RuleId, SharedRule, Verdict, standard_ids,
};
pub use set::{RuleSet, RuleSetBuilder};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::error::{PolicyError, PolicyResult};
    pub use crate::rule::{Candidate, DenialReason, Rule, RuleId, Verdict};
    pub use crate::set::{RuleSet, RuleSetBuilder};
}
