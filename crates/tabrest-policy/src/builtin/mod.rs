//! Built-in suspension rules.
//!
//! The standard rule set, in evaluation order:
//!
//! - [`InternalPageRule`]: browser-internal pages
//! - [`AlreadySuspendedRule`]: tabs already showing the placeholder
//! - [`ActiveTabRule`]: the active tab of a window
//! - [`PinnedTabRule`]: pinned tabs
//! - [`AudibleTabRule`]: tabs playing sound
//! - [`WhitelistRule`]: whitelisted domains

mod page;
mod state;
mod whitelist;

pub use page::{AlreadySuspendedRule, InternalPageRule};
pub use state::{ActiveTabRule, AudibleTabRule, PinnedTabRule};
pub use whitelist::{WhitelistRule, matching_entry};
