//! Rules about what page a tab is showing.

use tabrest_core::{is_internal_page, is_suspended_page};

use crate::rule::{Candidate, DenialReason, Rule, RuleId, Verdict, standard_ids};

/// Never touch browser-internal pages or tabs without a URL.
#[derive(Debug, Clone, Copy, Default)]
pub struct InternalPageRule;

impl Rule for InternalPageRule {
    fn id(&self) -> RuleId {
        standard_ids::INTERNAL_PAGE
    }

    fn name(&self) -> &str {
        "Internal Page"
    }

    fn description(&self) -> &str {
        "Browser and extension pages are never suspended"
    }

    fn evaluate(&self, candidate: &Candidate<'_>) -> Verdict {
        if is_internal_page(candidate.tab.url.as_deref()) {
            Verdict::Denied(DenialReason::new(
                self.id(),
                candidate.tab.id,
                "internal browser page",
            ))
        } else {
            Verdict::NotApplicable
        }
    }
}

/// A suspended tab cannot be suspended again.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlreadySuspendedRule;

impl Rule for AlreadySuspendedRule {
    fn id(&self) -> RuleId {
        standard_ids::ALREADY_SUSPENDED
    }

    fn name(&self) -> &str {
        "Already Suspended"
    }

    fn description(&self) -> &str {
        "Tabs showing the suspended page are left alone"
    }

    fn evaluate(&self, candidate: &Candidate<'_>) -> Verdict {
        if is_suspended_page(candidate.tab.url.as_deref()) {
            Verdict::Denied(DenialReason::new(
                self.id(),
                candidate.tab.id,
                "tab is already suspended",
            ))
        } else {
            Verdict::NotApplicable
        }
    }
}
