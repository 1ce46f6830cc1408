//! Suspended placeholder page codec.
//!
//! A suspended tab is navigated to a lightweight page bundled with the
//! extension. Everything needed to bring the tab back travels in that
//! page's query string:
//!
//! ```text
//! <extension base>suspended.html?url=<original>&title=<title>&favicon=<icon>&time=<ms>
//! ```
//!
//! The favicon is percent-encoded once before the query is form-encoded,
//! so it is decoded twice on the way back.

use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use crate::clock::Timestamp;
use crate::error::SuspendedUrlError;
use crate::page::is_suspended_page;
use crate::tab::Tab;

/// File name of the placeholder page inside the extension bundle.
pub const SUSPENDED_PAGE: &str = "suspended.html";

/// Title used when the tab had none.
pub const DEFAULT_SUSPENDED_TITLE: &str = "Suspended Tab";

/// Everything the placeholder page knows about the tab it replaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuspendedPage {
    /// URL to navigate back to. Absent if the query was tampered with.
    pub original_url: Option<String>,
    /// Title of the original page.
    pub title: String,
    /// Favicon of the original page, empty when unknown.
    pub favicon: String,
    /// When the tab was suspended.
    pub suspended_at: Timestamp,
}

impl SuspendedPage {
    /// Describe a page about to be suspended.
    pub fn new(
        original_url: impl Into<String>,
        title: Option<&str>,
        favicon: Option<&str>,
        suspended_at: Timestamp,
    ) -> Self {
        Self {
            original_url: Some(original_url.into()),
            title: title
                .filter(|t| !t.is_empty())
                .unwrap_or(DEFAULT_SUSPENDED_TITLE)
                .to_string(),
            favicon: favicon.unwrap_or_default().to_string(),
            suspended_at,
        }
    }

    /// Describe a tab about to be suspended.
    pub fn from_tab(tab: &Tab, suspended_at: Timestamp) -> Self {
        Self::new(
            tab.url_or_empty(),
            tab.title.as_deref(),
            tab.fav_icon_url.as_deref(),
            suspended_at,
        )
    }

    /// Build the placeholder URL under the given extension base URL.
    ///
    /// `base` is the extension root, e.g. `chrome-extension://<id>/`.
    pub fn encode(&self, base: &str) -> String {
        let favicon = urlencoding::encode(&self.favicon);
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("url", self.original_url.as_deref().unwrap_or_default())
            .append_pair("title", &self.title)
            .append_pair("favicon", &favicon)
            .append_pair("time", &self.suspended_at.to_string())
            .finish();

        let separator = if base.is_empty() || base.ends_with('/') { "" } else { "/" };
        format!("{base}{separator}{SUSPENDED_PAGE}?{query}")
    }

    /// Decode a placeholder URL.
    ///
    /// A missing or unparsable `time` falls back to `now`.
    pub fn decode(url: &str, now: Timestamp) -> Result<Self, SuspendedUrlError> {
        if !is_suspended_page(Some(url)) {
            return Err(SuspendedUrlError::NotSuspendedPage(url.to_string()));
        }

        let query = url.split_once('?').map(|(_, q)| q).unwrap_or_default();
        let query = query.split_once('#').map(|(q, _)| q).unwrap_or(query);

        let mut page = Self {
            original_url: None,
            title: DEFAULT_SUSPENDED_TITLE.to_string(),
            favicon: String::new(),
            suspended_at: now,
        };

        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "url" if !value.is_empty() => page.original_url = Some(value.into_owned()),
                "title" if !value.is_empty() => page.title = value.into_owned(),
                "favicon" => {
                    // A favicon that is not valid UTF-8 after decoding is kept as sent.
                    page.favicon = match urlencoding::decode(&value) {
                        Ok(decoded) => decoded.into_owned(),
                        Err(_) => value.to_string(),
                    };
                }
                "time" => {
                    if let Ok(time) = value.parse::<Timestamp>() {
                        page.suspended_at = time;
                    }
                }
                _ => {}
            }
        }

        Ok(page)
    }

    /// How long the tab has been suspended, for display.
    pub fn elapsed_label(&self, now: Timestamp) -> String {
        format_elapsed(now.saturating_sub(self.suspended_at))
    }
}

/// Format an elapsed duration in milliseconds, keeping the two largest units.
pub fn format_elapsed(ms: i64) -> String {
    let seconds = ms.max(0) / 1000;
    let minutes = seconds / 60;
    let hours = minutes / 60;
    let days = hours / 24;

    if days > 0 {
        format!("{}d {}h", days, hours % 24)
    } else if hours > 0 {
        format!("{}h {}m", hours, minutes % 60)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds % 60)
    } else if seconds > 0 {
        format!("{}s", seconds)
    } else {
        "Just now".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tab::{TabId, WindowId};

    const BASE: &str = "chrome-extension://abcdef/";

    #[test]
    fn test_encode_shape() {
        let page = SuspendedPage::new("https://example.com/a?b=c", Some("Hello World"), None, 1700);
        let url = page.encode(BASE);

        assert!(url.starts_with("chrome-extension://abcdef/suspended.html?url=https%3A%2F%2Fexample.com"));
        assert!(url.contains("title=Hello+World"));
        assert!(url.ends_with("&favicon=&time=1700"));
    }

    #[test]
    fn test_decode_restores_fields() {
        let tab = Tab::new(TabId(1), WindowId(1), "https://example.com/path?q=1&r=2#frag")
            .with_title("Example & Co")
            .with_fav_icon("https://example.com/icon.png?v=3");
        let url = SuspendedPage::from_tab(&tab, 123_456).encode(BASE);

        let page = SuspendedPage::decode(&url, 0).unwrap();
        assert_eq!(page.original_url.as_deref(), Some("https://example.com/path?q=1&r=2#frag"));
        assert_eq!(page.title, "Example & Co");
        assert_eq!(page.favicon, "https://example.com/icon.png?v=3");
        assert_eq!(page.suspended_at, 123_456);
    }

    #[test]
    fn test_favicon_is_double_encoded() {
        let page = SuspendedPage::new("https://a.test", None, Some("https://a.test/f.ico"), 1);
        let url = page.encode(BASE);
        // ':' -> %3A by the first pass, '%' -> %25 by the form pass
        assert!(url.contains("favicon=https%253A%252F%252Fa.test%252Ff.ico"));
    }

    #[test]
    fn test_decode_defaults() {
        let page = SuspendedPage::decode("chrome-extension://x/suspended.html?time=oops", 99).unwrap();
        assert_eq!(page.original_url, None);
        assert_eq!(page.title, DEFAULT_SUSPENDED_TITLE);
        assert_eq!(page.suspended_at, 99);
    }

    #[test]
    fn test_bad_favicon_keeps_original_url() {
        let page = SuspendedPage::decode(
            "chrome-extension://x/suspended.html?url=https%3A%2F%2Fexample.com%2F&favicon=%25FF&time=1",
            0,
        )
        .unwrap();
        assert_eq!(page.original_url.as_deref(), Some("https://example.com/"));
        assert_eq!(page.favicon, "%FF");
        assert_eq!(page.suspended_at, 1);
    }

    #[test]
    fn test_decode_rejects_other_pages() {
        let err = SuspendedPage::decode("https://example.com/", 0).unwrap_err();
        assert!(matches!(err, SuspendedUrlError::NotSuspendedPage(_)));
    }

    #[test]
    fn test_empty_title_uses_default() {
        let page = SuspendedPage::new("https://a.test", Some(""), None, 0);
        assert_eq!(page.title, DEFAULT_SUSPENDED_TITLE);
    }

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(0), "Just now");
        assert_eq!(format_elapsed(999), "Just now");
        assert_eq!(format_elapsed(45_000), "45s");
        assert_eq!(format_elapsed(125_000), "2m 5s");
        assert_eq!(format_elapsed(3 * 3_600_000 + 7 * 60_000), "3h 7m");
        assert_eq!(format_elapsed(50 * 3_600_000), "2d 2h");
        assert_eq!(format_elapsed(-5), "Just now");
    }

    #[test]
    fn test_elapsed_label() {
        let page = SuspendedPage::new("https://a.test", None, None, 10_000);
        assert_eq!(page.elapsed_label(70_000), "1m 0s");
    }
}
