//! Core rule trait and types.
//!
//! A rule inspects one tab against the current settings and either vetoes
//! suspension, explicitly allows it, or abstains.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use tabrest_core::{Settings, Tab, TabId};

use crate::error::PolicyError;

/// Unique identifier for a rule.
///
/// # Example
///
/// ```
/// use tabrest_policy::RuleId;
///
/// let pinned = RuleId::new("pinned_tab");
/// let audible = RuleId::new("audible_tab");
///
/// assert_ne!(pinned, audible);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RuleId(Cow<'static, str>);

impl RuleId {
    /// Create a new rule ID.
    pub fn new(id: impl Into<Cow<'static, str>>) -> Self {
        Self(id.into())
    }

    /// Get the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&'static str> for RuleId {
    fn from(s: &'static str) -> Self {
        Self::new(s)
    }
}

impl From<String> for RuleId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// What a rule gets to look at.
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    /// The tab being considered for suspension.
    pub tab: &'a Tab,
    /// Settings in force right now.
    pub settings: &'a Settings,
}

impl<'a> Candidate<'a> {
    /// Pair a tab with the settings to judge it by.
    pub fn new(tab: &'a Tab, settings: &'a Settings) -> Self {
        Self { tab, settings }
    }
}

/// Outcome of a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// The tab may be suspended.
    Allowed,
    /// The tab must not be suspended.
    Denied(DenialReason),
    /// The rule has no opinion about this tab.
    NotApplicable,
}

impl Verdict {
    /// Check if the verdict allows suspension.
    pub fn is_allowed(&self) -> bool {
        matches!(self, Verdict::Allowed)
    }

    /// Check if the verdict vetoes suspension.
    pub fn is_denied(&self) -> bool {
        matches!(self, Verdict::Denied(_))
    }

    /// The denial reason, if any.
    pub fn reason(&self) -> Option<&DenialReason> {
        match self {
            Verdict::Denied(reason) => Some(reason),
            _ => None,
        }
    }

    /// Convert to a Result type.
    pub fn to_result(&self) -> Result<(), PolicyError> {
        match self {
            Verdict::Denied(reason) => Err(PolicyError::Denied {
                reason: reason.clone(),
            }),
            Verdict::Allowed | Verdict::NotApplicable => Ok(()),
        }
    }
}

/// Why a tab was kept alive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DenialReason {
    /// The rule that vetoed suspension.
    pub rule: RuleId,
    /// The tab in question.
    pub tab: TabId,
    /// Human-readable explanation.
    pub message: String,
}

impl DenialReason {
    /// Create a new denial reason.
    pub fn new(rule: RuleId, tab: TabId, message: impl Into<String>) -> Self {
        Self {
            rule,
            tab,
            message: message.into(),
        }
    }
}

impl fmt::Display for DenialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] tab {} - {}", self.rule, self.tab, self.message)
    }
}

/// A suspension eligibility rule.
///
/// # Implementing a Rule
///
/// ```ignore
/// use tabrest_policy::{Candidate, DenialReason, Rule, RuleId, Verdict};
///
/// #[derive(Debug)]
/// struct KeepLocalhost;
///
/// impl Rule for KeepLocalhost {
///     fn id(&self) -> RuleId {
///         RuleId::new("localhost")
///     }
///
///     fn name(&self) -> &str {
///         "Localhost"
///     }
///
///     fn description(&self) -> &str {
///         "Never suspend local development servers"
///     }
///
///     fn evaluate(&self, candidate: &Candidate<'_>) -> Verdict {
///         if candidate.tab.url_or_empty().contains("localhost") {
///             Verdict::Denied(DenialReason::new(self.id(), candidate.tab.id, "local dev server"))
///         } else {
///             Verdict::NotApplicable
///         }
///     }
/// }
/// ```
pub trait Rule: Send + Sync + fmt::Debug {
    /// Get the unique identifier for this rule.
    fn id(&self) -> RuleId;

    /// Get the human-readable name of this rule.
    fn name(&self) -> &str;

    /// Get a description of what this rule protects.
    fn description(&self) -> &str;

    /// Judge one tab.
    fn evaluate(&self, candidate: &Candidate<'_>) -> Verdict;

    /// Validate that this rule's configuration is valid.
    fn validate(&self) -> Result<(), PolicyError> {
        Ok(())
    }
}

/// A boxed rule trait object.
pub type BoxedRule = Box<dyn Rule>;

/// A shared rule reference.
pub type SharedRule = Arc<dyn Rule>;

/// IDs of the built-in rules.
pub mod standard_ids {
    use super::RuleId;

    /// Browser-internal pages.
    pub const INTERNAL_PAGE: RuleId = RuleId(std::borrow::Cow::Borrowed("internal_page"));

    /// Tabs already showing the suspended page.
    pub const ALREADY_SUSPENDED: RuleId = RuleId(std::borrow::Cow::Borrowed("already_suspended"));

    /// The active tab of a window.
    pub const ACTIVE_TAB: RuleId = RuleId(std::borrow::Cow::Borrowed("active_tab"));

    /// Pinned tabs.
    pub const PINNED_TAB: RuleId = RuleId(std::borrow::Cow::Borrowed("pinned_tab"));

    /// Tabs playing sound.
    pub const AUDIBLE_TAB: RuleId = RuleId(std::borrow::Cow::Borrowed("audible_tab"));

    /// Whitelisted domains.
    pub const WHITELIST: RuleId = RuleId(std::borrow::Cow::Borrowed("whitelist"));
}
