//! Rules about the tab's own state, each switchable in settings.

use crate::rule::{Candidate, DenialReason, Rule, RuleId, Verdict, standard_ids};

/// Keep the active tab loaded when `neverSuspendActiveTab` is set.
#[derive(Debug, Clone, Copy, Default)]
pub struct ActiveTabRule;

impl Rule for ActiveTabRule {
    fn id(&self) -> RuleId {
        standard_ids::ACTIVE_TAB
    }

    fn name(&self) -> &str {
        "Active Tab"
    }

    fn description(&self) -> &str {
        "The tab the user is looking at stays loaded"
    }

    fn evaluate(&self, candidate: &Candidate<'_>) -> Verdict {
        if candidate.settings.never_suspend_active_tab && candidate.tab.active {
            Verdict::Denied(DenialReason::new(self.id(), candidate.tab.id, "tab is active"))
        } else {
            Verdict::NotApplicable
        }
    }
}

/// Keep pinned tabs loaded unless `suspendPinnedTabs` is set.
#[derive(Debug, Clone, Copy, Default)]
pub struct PinnedTabRule;

impl Rule for PinnedTabRule {
    fn id(&self) -> RuleId {
        standard_ids::PINNED_TAB
    }

    fn name(&self) -> &str {
        "Pinned Tab"
    }

    fn description(&self) -> &str {
        "Pinned tabs stay loaded unless explicitly allowed"
    }

    fn evaluate(&self, candidate: &Candidate<'_>) -> Verdict {
        if !candidate.settings.suspend_pinned_tabs && candidate.tab.pinned {
            Verdict::Denied(DenialReason::new(self.id(), candidate.tab.id, "tab is pinned"))
        } else {
            Verdict::NotApplicable
        }
    }
}

/// Keep tabs playing sound loaded when `neverSuspendAudio` is set.
#[derive(Debug, Clone, Copy, Default)]
pub struct AudibleTabRule;

impl Rule for AudibleTabRule {
    fn id(&self) -> RuleId {
        standard_ids::AUDIBLE_TAB
    }

    fn name(&self) -> &str {
        "Audible Tab"
    }

    fn description(&self) -> &str {
        "Tabs playing audio stay loaded"
    }

    fn evaluate(&self, candidate: &Candidate<'_>) -> Verdict {
        if candidate.settings.never_suspend_audio && candidate.tab.audible {
            Verdict::Denied(DenialReason::new(self.id(), candidate.tab.id, "tab is playing audio"))
        } else {
            Verdict::NotApplicable
        }
    }
}
