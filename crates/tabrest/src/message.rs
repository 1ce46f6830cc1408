//! The runtime message protocol.
//!
//! The popup, content scripts and placeholder page talk to the suspender
//! with JSON messages tagged by `type`. Every message gets exactly one
//! JSON response.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, warn};

use tabrest_core::{Settings, SettingsPatch, TabId};
use tabrest_host::{KeyValueStore, TabHost};
use tabrest_observe::StatsSummary;

use crate::suspender::Suspender;
use crate::view::WindowView;

/// Error text for a message whose `type` is not recognised.
pub const UNKNOWN_MESSAGE: &str = "Unknown message type";

/// A request sent to the suspender.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Message {
    /// The user interacted with the sender tab.
    TabActivity {
        /// When, according to the page.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timestamp: Option<i64>,
    },
    /// The sender tab's form state changed.
    FormStatus {
        /// Whether a form has unsaved input.
        #[serde(default, rename = "hasUnsavedForms")]
        has_unsaved_forms: bool,
    },
    /// A content script finished loading.
    ContentScriptReady {},
    /// Suspend a tab.
    SuspendTab {
        /// The tab.
        #[serde(rename = "tabId")]
        tab_id: TabId,
    },
    /// Restore a tab.
    RestoreTab {
        /// The tab.
        #[serde(rename = "tabId")]
        tab_id: TabId,
    },
    /// Suspend every inactive tab.
    SuspendAll {},
    /// Restore every suspended tab.
    RestoreAll {},
    /// List windows and tabs.
    GetTabList {},
    /// Report statistics.
    GetStats {},
    /// Report settings.
    GetSettings {},
    /// Merge a partial settings object.
    SaveSettings {
        /// Fields to change.
        settings: SettingsPatch,
    },
    /// Whitelist a domain.
    WhitelistDomain {
        /// The domain.
        domain: String,
    },
    /// Remove a domain from the whitelist.
    RemoveWhitelist {
        /// The domain.
        domain: String,
    },
}

impl Message {
    /// Every recognised `type` value.
    pub const TYPES: [&'static str; 13] = [
        "TAB_ACTIVITY",
        "FORM_STATUS",
        "CONTENT_SCRIPT_READY",
        "SUSPEND_TAB",
        "RESTORE_TAB",
        "SUSPEND_ALL",
        "RESTORE_ALL",
        "GET_TAB_LIST",
        "GET_STATS",
        "GET_SETTINGS",
        "SAVE_SETTINGS",
        "WHITELIST_DOMAIN",
        "REMOVE_WHITELIST",
    ];

    /// The `type` tag.
    pub fn message_type(&self) -> &'static str {
        let index = match self {
            Message::TabActivity { .. } => 0,
            Message::FormStatus { .. } => 1,
            Message::ContentScriptReady {} => 2,
            Message::SuspendTab { .. } => 3,
            Message::RestoreTab { .. } => 4,
            Message::SuspendAll {} => 5,
            Message::RestoreAll {} => 6,
            Message::GetTabList {} => 7,
            Message::GetStats {} => 8,
            Message::GetSettings {} => 9,
            Message::SaveSettings { .. } => 10,
            Message::WhitelistDomain { .. } => 11,
            Message::RemoveWhitelist { .. } => 12,
        };
        Self::TYPES[index]
    }
}

/// The answer to a [`Message`].
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// `{success: true}`
    Ack,
    /// `{success: true, count}`
    Count(usize),
    /// The tab list, as a bare array.
    TabList(Vec<WindowView>),
    /// Statistics object.
    Stats(StatsSummary),
    /// `{settings}`
    Settings(Settings),
    /// `{error}`
    Error(String),
}

impl Response {
    /// Whether this is an error response.
    pub fn is_error(&self) -> bool {
        matches!(self, Response::Error(_))
    }

    /// The JSON sent back to the caller.
    pub fn to_json(&self) -> Value {
        match self {
            Response::Ack => json!({ "success": true }),
            Response::Count(count) => json!({ "success": true, "count": count }),
            Response::TabList(windows) => serde_json::to_value(windows).unwrap_or(Value::Null),
            Response::Stats(stats) => serde_json::to_value(stats).unwrap_or(Value::Null),
            Response::Settings(settings) => json!({ "settings": settings }),
            Response::Error(message) => json!({ "error": message }),
        }
    }
}

impl<E: std::fmt::Display> From<Result<Response, E>> for Response {
    fn from(result: Result<Response, E>) -> Self {
        result.unwrap_or_else(|e| Response::Error(e.to_string()))
    }
}

impl<H: TabHost, S: KeyValueStore> Suspender<H, S> {
    /// Answer a message. `sender` is the tab the message came from, if any.
    pub fn handle_message(&self, message: Message, sender: Option<TabId>) -> Response {
        debug!(message = message.message_type(), sender = ?sender.map(|t| t.0), "Received message");

        match message {
            Message::TabActivity { .. } => {
                if let Some(tab) = sender {
                    self.touch(tab);
                }
                Response::Ack
            }
            Message::FormStatus { .. } | Message::ContentScriptReady {} => Response::Ack,
            Message::SuspendTab { tab_id } => {
                if let Err(e) = self.suspend_tab(tab_id) {
                    warn!(tab_id = %tab_id, error = %e, "Failed to suspend tab");
                    self.emit_error("suspend_tab", &e);
                }
                Response::Ack
            }
            Message::RestoreTab { tab_id } => {
                if let Err(e) = self.restore_tab(tab_id) {
                    warn!(tab_id = %tab_id, error = %e, "Failed to restore tab");
                    self.emit_error("restore_tab", &e);
                }
                Response::Ack
            }
            Message::SuspendAll {} => self
                .suspend_all_inactive(None)
                .map(|report| Response::Count(report.changed_count()))
                .into(),
            Message::RestoreAll {} => self
                .restore_all()
                .map(|report| Response::Count(report.changed_count()))
                .into(),
            Message::GetTabList {} => match self.tab_list() {
                Ok(windows) => Response::TabList(windows),
                Err(e) => {
                    warn!(error = %e, "Failed to list tabs");
                    Response::TabList(Vec::new())
                }
            },
            Message::GetStats {} => self.stats().map(Response::Stats).into(),
            Message::GetSettings {} => Response::Settings(self.settings()),
            Message::SaveSettings { settings } => {
                self.apply_settings(&settings).map(|_| Response::Ack).into()
            }
            Message::WhitelistDomain { domain } => {
                self.add_to_whitelist(&domain).map(|_| Response::Ack).into()
            }
            Message::RemoveWhitelist { domain } => self
                .remove_from_whitelist(&domain)
                .map(|_| Response::Ack)
                .into(),
        }
    }

    /// Answer a raw JSON message.
    ///
    /// Unrecognised types get the `Unknown message type` error; a known
    /// type with bad fields gets the parse error.
    pub fn handle_json(&self, message: Value, sender: Option<TabId>) -> Value {
        let known = message
            .get("type")
            .and_then(Value::as_str)
            .is_some_and(|t| Message::TYPES.contains(&t));
        if !known {
            warn!(message = %message, "Unknown message type");
            return Response::Error(UNKNOWN_MESSAGE.to_string()).to_json();
        }

        match serde_json::from_value::<Message>(message) {
            Ok(message) => self.handle_message(message, sender).to_json(),
            Err(e) => Response::Error(e.to_string()).to_json(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_messages() {
        let message: Message =
            serde_json::from_value(json!({"type": "SUSPEND_TAB", "tabId": 12})).unwrap();
        assert_eq!(message, Message::SuspendTab { tab_id: TabId(12) });

        let message: Message =
            serde_json::from_value(json!({"type": "TAB_ACTIVITY", "timestamp": 5})).unwrap();
        assert_eq!(message.message_type(), "TAB_ACTIVITY");

        let message: Message =
            serde_json::from_value(json!({"type": "SAVE_SETTINGS", "settings": {"suspensionTimeout": 5}}))
                .unwrap();
        match message {
            Message::SaveSettings { settings } => assert_eq!(settings.suspension_timeout, Some(5)),
            other => panic!("unexpected message {other:?}"),
        }
    }

    #[test]
    fn test_unit_messages_tolerate_extra_fields() {
        let message: Message =
            serde_json::from_value(json!({"type": "CONTENT_SCRIPT_READY", "url": "x"})).unwrap();
        assert_eq!(message, Message::ContentScriptReady {});
    }

    #[test]
    fn test_message_types_round_trip_through_tag() {
        let message = Message::WhitelistDomain {
            domain: "example.com".to_string(),
        };
        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["type"], message.message_type());
    }

    #[test]
    fn test_response_shapes() {
        assert_eq!(Response::Ack.to_json(), json!({"success": true}));
        assert_eq!(Response::Count(3).to_json(), json!({"success": true, "count": 3}));
        assert_eq!(
            Response::Error("boom".to_string()).to_json(),
            json!({"error": "boom"})
        );
        assert_eq!(Response::TabList(Vec::new()).to_json(), json!([]));

        let settings = Response::Settings(Settings::default()).to_json();
        assert_eq!(settings["settings"]["suspensionTimeout"], 30);
    }

    #[test]
    fn test_unknown_and_malformed_messages() {
        let fixture = crate::fixture::Fixture::new();
        let suspender = &fixture.suspender;

        assert_eq!(
            suspender.handle_json(json!({"type": "MAKE_COFFEE"}), None),
            json!({"error": UNKNOWN_MESSAGE})
        );
        assert_eq!(
            suspender.handle_json(json!({"tabId": 1}), None),
            json!({"error": UNKNOWN_MESSAGE})
        );

        let response = suspender.handle_json(json!({"type": "SUSPEND_TAB"}), None);
        let error = response["error"].as_str().unwrap();
        assert!(error.contains("tabId"));
    }

    #[test]
    fn test_suspend_and_restore_all_report_counts() {
        let fixture = crate::fixture::Fixture::new();
        fixture.open_active("https://example.com/active");
        fixture.open("https://example.com/1");
        fixture.open("https://example.com/2");

        let response = fixture
            .suspender
            .handle_json(json!({"type": "SUSPEND_ALL"}), None);
        assert_eq!(response, json!({"success": true, "count": 2}));

        let stats = fixture.suspender.handle_json(json!({"type": "GET_STATS"}), None);
        assert_eq!(stats["tabsSuspended"], 2);
        assert_eq!(stats["totalTabs"], 3);

        let response = fixture
            .suspender
            .handle_json(json!({"type": "RESTORE_ALL"}), None);
        assert_eq!(response, json!({"success": true, "count": 2}));
    }

    #[test]
    fn test_single_tab_requests_always_ack() {
        let fixture = crate::fixture::Fixture::new();
        let tab = fixture.open("https://example.com");

        let response = fixture.suspender.handle_message(Message::SuspendTab { tab_id: tab }, None);
        assert_eq!(response, Response::Ack);
        assert!(fixture.tab(tab).is_suspended());

        let response = fixture.suspender.handle_message(Message::RestoreTab { tab_id: tab }, None);
        assert_eq!(response, Response::Ack);
        assert!(!fixture.tab(tab).is_suspended());

        let response = fixture
            .suspender
            .handle_message(Message::SuspendTab { tab_id: TabId(999) }, None);
        assert_eq!(response, Response::Ack);
        assert_eq!(fixture.events.of_type("error").len(), 1);
    }

    #[test]
    fn test_tab_activity_resets_sender_timer() {
        let fixture = crate::fixture::Fixture::new();
        let tab = fixture.open("https://example.com");
        fixture.suspender.start_monitoring().unwrap();
        fixture.advance_minutes(10);

        let response = fixture
            .suspender
            .handle_json(json!({"type": "TAB_ACTIVITY", "timestamp": 1}), Some(tab));
        assert_eq!(response, json!({"success": true}));
        assert_eq!(
            fixture.suspender.timers().last_activity(tab),
            Some(crate::fixture::START + 10 * 60_000)
        );

        let response = fixture
            .suspender
            .handle_json(json!({"type": "FORM_STATUS", "hasUnsavedForms": true}), Some(tab));
        assert_eq!(response, json!({"success": true}));
    }

    #[test]
    fn test_settings_messages() {
        let fixture = crate::fixture::Fixture::new();
        let suspender = &fixture.suspender;

        let response = suspender.handle_json(
            json!({"type": "SAVE_SETTINGS", "settings": {"suspensionTimeout": 10}}),
            None,
        );
        assert_eq!(response, json!({"success": true}));

        let response = suspender.handle_json(json!({"type": "GET_SETTINGS"}), None);
        assert_eq!(response["settings"]["suspensionTimeout"], 10);
        assert_eq!(response["settings"]["neverSuspendAudio"], true);

        let response = suspender.handle_json(
            json!({"type": "SAVE_SETTINGS", "settings": {"suspensionTimeout": 0}}),
            None,
        );
        assert!(response.get("error").is_some());
        assert_eq!(suspender.settings().suspension_timeout, 10);
    }

    #[test]
    fn test_whitelist_messages() {
        let fixture = crate::fixture::Fixture::new();
        let suspender = &fixture.suspender;

        let response =
            suspender.handle_json(json!({"type": "WHITELIST_DOMAIN", "domain": "example.org"}), None);
        assert_eq!(response, json!({"success": true}));
        assert!(suspender.settings().has_whitelist_entry("example.org"));

        let response =
            suspender.handle_json(json!({"type": "REMOVE_WHITELIST", "domain": "example.org"}), None);
        assert_eq!(response, json!({"success": true}));
        assert!(!suspender.settings().has_whitelist_entry("example.org"));

        fixture.store.set_read_only(true);
        let response =
            suspender.handle_json(json!({"type": "WHITELIST_DOMAIN", "domain": "example.net"}), None);
        assert!(response["error"].as_str().unwrap().contains("read-only"));
    }
}
