//! Ordered rule sets.
//!
//! A `RuleSet` runs its rules in insertion order. The first denial wins;
//! a tab no rule objects to may be suspended.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info};

use tabrest_core::{Settings, Tab};

use crate::builtin::{
    ActiveTabRule, AlreadySuspendedRule, AudibleTabRule, InternalPageRule, PinnedTabRule,
    WhitelistRule,
};
use crate::error::{PolicyError, PolicyResult};
use crate::rule::{BoxedRule, Candidate, Rule, RuleId, SharedRule, Verdict};

/// The rules that gate suspension.
///
/// # Example
///
/// ```ignore
/// use tabrest_policy::RuleSet;
///
/// let rules = RuleSet::standard();
/// if rules.check(&tab, &settings).is_allowed() {
///     // safe to suspend
/// }
/// ```
#[derive(Default)]
pub struct RuleSet {
    rules: RwLock<Vec<SharedRule>>,
}

impl RuleSet {
    /// Create an empty rule set. It allows everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in rules, in their canonical order.
    pub fn standard() -> Self {
        let rules: Vec<SharedRule> = vec![
            Arc::new(InternalPageRule),
            Arc::new(AlreadySuspendedRule),
            Arc::new(ActiveTabRule),
            Arc::new(PinnedTabRule),
            Arc::new(AudibleTabRule),
            Arc::new(WhitelistRule),
        ];
        Self {
            rules: RwLock::new(rules),
        }
    }

    /// Create a rule set with the given rules.
    pub fn with_rules(rules: Vec<BoxedRule>) -> PolicyResult<Self> {
        let set = Self::new();
        for rule in rules {
            set.add_shared(rule.into())?;
        }
        Ok(set)
    }

    /// Append a rule.
    ///
    /// # Errors
    ///
    /// Returns an error if a rule with the same ID already exists.
    pub fn add<R: Rule + 'static>(&self, rule: R) -> PolicyResult<()> {
        self.add_shared(Arc::new(rule))
    }

    /// Append a shared rule.
    pub fn add_shared(&self, rule: SharedRule) -> PolicyResult<()> {
        let id = rule.id();
        let mut rules = self.rules.write();

        if rules.iter().any(|existing| existing.id() == id) {
            return Err(PolicyError::AlreadyExists(id));
        }

        rule.validate()?;
        rules.push(rule);

        info!(rule = %id, "Rule added");
        Ok(())
    }

    /// Remove a rule.
    pub fn remove(&self, id: &RuleId) -> Option<SharedRule> {
        let mut rules = self.rules.write();
        let index = rules.iter().position(|rule| rule.id() == *id)?;
        info!(rule = %id, "Rule removed");
        Some(rules.remove(index))
    }

    /// Check if a rule is present.
    pub fn has(&self, id: &RuleId) -> bool {
        self.rules.read().iter().any(|rule| rule.id() == *id)
    }

    /// Get the number of rules.
    pub fn len(&self) -> usize {
        self.rules.read().len()
    }

    /// Check if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.rules.read().is_empty()
    }

    /// All rule IDs in evaluation order.
    pub fn ids(&self) -> Vec<RuleId> {
        self.rules.read().iter().map(|rule| rule.id()).collect()
    }

    /// Judge a tab.
    pub fn check(&self, tab: &Tab, settings: &Settings) -> Verdict {
        let candidate = Candidate::new(tab, settings);

        for rule in self.rules.read().iter() {
            if let Verdict::Denied(reason) = rule.evaluate(&candidate) {
                debug!(tab_id = %tab.id, rule = %reason.rule, reason = %reason.message, "Suspension denied");
                return Verdict::Denied(reason);
            }
        }

        debug!(tab_id = %tab.id, "Tab eligible for suspension");
        Verdict::Allowed
    }

    /// Whether a tab may be suspended.
    pub fn should_suspend(&self, tab: &Tab, settings: &Settings) -> bool {
        self.check(tab, settings).is_allowed()
    }

    /// Require that a tab may be suspended.
    pub fn require(&self, tab: &Tab, settings: &Settings) -> PolicyResult<()> {
        self.check(tab, settings).to_result()
    }
}

impl Clone for RuleSet {
    fn clone(&self) -> Self {
        Self {
            rules: RwLock::new(self.rules.read().clone()),
        }
    }
}

impl std::fmt::Debug for RuleSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleSet").field("rules", &self.ids()).finish()
    }
}

/// Builder for constructing rule sets.
#[derive(Default)]
pub struct RuleSetBuilder {
    standard: bool,
    rules: Vec<BoxedRule>,
}

impl RuleSetBuilder {
    /// Create a new builder with no rules.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from the built-in rules.
    pub fn standard() -> Self {
        Self {
            standard: true,
            rules: Vec::new(),
        }
    }

    /// Add a rule after those already configured.
    pub fn with<R: Rule + 'static>(mut self, rule: R) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    /// Add a boxed rule.
    pub fn with_boxed(mut self, rule: BoxedRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Build the rule set.
    pub fn build(self) -> PolicyResult<RuleSet> {
        let set = if self.standard {
            RuleSet::standard()
        } else {
            RuleSet::new()
        };
        for rule in self.rules {
            set.add_shared(rule.into())?;
        }
        Ok(set)
    }
}
