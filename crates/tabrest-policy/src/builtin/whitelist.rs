//! Domain whitelist rule.

use tabrest_core::hostname;

use crate::rule::{Candidate, DenialReason, Rule, RuleId, Verdict, standard_ids};

/// Find the whitelist entry that covers a URL.
///
/// An entry matches when it occurs anywhere in the URL's host name, so
/// `google.com` covers `mail.google.com`. URLs without a host never match.
pub fn matching_entry<'a>(url: &str, whitelist: &'a [String]) -> Option<&'a str> {
    let host = hostname(url)?;
    whitelist
        .iter()
        .find(|entry| !entry.is_empty() && host.contains(entry.as_str()))
        .map(String::as_str)
}

/// Keep tabs on whitelisted domains loaded.
#[derive(Debug, Clone, Copy, Default)]
pub struct WhitelistRule;

impl Rule for WhitelistRule {
    fn id(&self) -> RuleId {
        standard_ids::WHITELIST
    }

    fn name(&self) -> &str {
        "Whitelist"
    }

    fn description(&self) -> &str {
        "Sites on the whitelist are never suspended"
    }

    fn evaluate(&self, candidate: &Candidate<'_>) -> Verdict {
        let url = candidate.tab.url_or_empty();
        match matching_entry(url, &candidate.settings.whitelisted_domains) {
            Some(entry) => Verdict::Denied(DenialReason::new(
                self.id(),
                candidate.tab.id,
                format!("whitelisted domain '{}'", entry),
            )),
            None => Verdict::NotApplicable,
        }
    }
}
