//! Page classification helpers.

use url::Url;

use crate::suspended::SUSPENDED_PAGE;

/// URL prefixes of browser-internal pages that are never tracked.
const INTERNAL_PREFIXES: [&str; 4] = ["chrome://", "chrome-extension://", "edge://", "about:"];

/// Check whether a URL belongs to the browser itself.
///
/// A tab without a committed URL counts as internal.
pub fn is_internal_page(url: Option<&str>) -> bool {
    match url {
        None | Some("") => true,
        Some(url) => INTERNAL_PREFIXES.iter().any(|prefix| url.starts_with(prefix)),
    }
}

/// Check whether a URL is the suspended placeholder page.
pub fn is_suspended_page(url: Option<&str>) -> bool {
    url.is_some_and(|url| url.contains(SUSPENDED_PAGE))
}

/// Host name of an absolute URL.
pub fn hostname(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(str::to_string))
}

/// Domain to show for a tab.
///
/// Suspended pages show the domain of the page they stand in for.
pub fn display_domain(url: Option<&str>) -> String {
    let Some(url) = url.filter(|u| !u.is_empty()) else {
        return "Unknown".to_string();
    };

    if is_suspended_page(Some(url)) {
        let original = Url::parse(url).ok().and_then(|parsed| {
            parsed
                .query_pairs()
                .find(|(key, _)| key == "url")
                .map(|(_, value)| value.into_owned())
        });
        if let Some(host) = original.as_deref().and_then(hostname) {
            return host;
        }
    }

    hostname(url).unwrap_or_else(|| url.to_string())
}
