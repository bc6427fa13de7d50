//! Newline-delimited JSON frames exchanged with the browser side.
//!
//! Inbound frames are either browser events (`{"event": "tab_updated", "url": ...}`)
//! or UI commands (`{"type": "START_SESSION", ...}`, optionally with an `id`
//! that is echoed back). Outbound frames carry a `kind` tag.

use fg_core::rules::BLOCKING_RULE_ID;
use fg_core::{BlockingRule, Event, Response};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Browser events the host understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BrowserEvent {
    Installed,
    Startup,
    Tick,
    FocusChanged,
    TabUpdated,
    WindowBlurred,
}

impl From<BrowserEvent> for Event {
    fn from(event: BrowserEvent) -> Self {
        match event {
            BrowserEvent::Installed => Self::Installed,
            BrowserEvent::Startup => Self::Startup,
            BrowserEvent::Tick => Self::Tick,
            BrowserEvent::FocusChanged => Self::FocusChanged,
            BrowserEvent::TabUpdated => Self::TabUpdated,
            BrowserEvent::WindowBlurred => Self::WindowBlurred,
        }
    }
}

#[derive(Debug, Deserialize)]
struct EventFrame {
    event: BrowserEvent,
    #[serde(default, deserialize_with = "present")]
    url: Option<Option<String>>,
}

/// Distinguishes `"url": null` (no focused tab) from a missing field.
fn present<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

/// A parsed inbound line.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Event {
        event: BrowserEvent,
        /// `Some` when the frame reported the focused tab's URL.
        url: Option<Option<String>>,
    },
    Command {
        id: Option<Value>,
        message: Value,
    },
}

impl Inbound {
    pub fn parse(line: &str) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_str(line)?;
        if value.get("event").is_some() {
            let frame = EventFrame::deserialize(&value)?;
            return Ok(Self::Event {
                event: frame.event,
                url: frame.url,
            });
        }
        Ok(Self::Command {
            id: value.get("id").cloned(),
            message: value,
        })
    }
}

/// Frames written to stdout.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outbound {
    /// Reply to a command.
    Response {
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<Value>,
        #[serde(flatten)]
        response: Response,
    },
    /// Replacement for the dynamic rule set.
    #[serde(rename_all = "camelCase")]
    Rules {
        remove_rule_ids: Vec<u32>,
        add_rules: Vec<BlockingRule>,
    },
    /// A persisted key changed.
    Changed { key: String },
}

impl Outbound {
    pub fn install(rule: BlockingRule) -> Self {
        Self::Rules {
            remove_rule_ids: vec![BLOCKING_RULE_ID],
            add_rules: vec![rule],
        }
    }

    pub fn clear() -> Self {
        Self::Rules {
            remove_rule_ids: vec![BLOCKING_RULE_ID],
            add_rules: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use fg_core::Allowlist;
    use insta::assert_snapshot;
    use serde_json::json;

    #[test]
    fn event_frames_track_url_presence() {
        assert_eq!(
            Inbound::parse(r#"{"event":"tab_updated","url":"https://github.com"}"#).unwrap(),
            Inbound::Event {
                event: BrowserEvent::TabUpdated,
                url: Some(Some("https://github.com".to_string())),
            }
        );
        assert_eq!(
            Inbound::parse(r#"{"event":"window_blurred","url":null}"#).unwrap(),
            Inbound::Event {
                event: BrowserEvent::WindowBlurred,
                url: Some(None),
            }
        );
        assert_eq!(
            Inbound::parse(r#"{"event":"tick"}"#).unwrap(),
            Inbound::Event {
                event: BrowserEvent::Tick,
                url: None,
            }
        );
    }

    #[test]
    fn unknown_event_is_an_error() {
        assert!(Inbound::parse(r#"{"event":"bookmark_added"}"#).is_err());
        assert!(Inbound::parse("not json").is_err());
    }

    #[test]
    fn anything_else_is_a_command() {
        let inbound = Inbound::parse(r#"{"type":"GET_SESSION","id":7}"#).unwrap();
        assert_eq!(
            inbound,
            Inbound::Command {
                id: Some(json!(7)),
                message: json!({"type": "GET_SESSION", "id": 7}),
            }
        );
    }

    #[test]
    fn outbound_frames_serialize_flat() {
        let response = Outbound::Response {
            id: Some(json!("a1")),
            response: Response::error("Unknown message type."),
        };
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({"kind": "response", "id": "a1", "ok": false, "error": "Unknown message type."})
        );

        let changed = Outbound::Changed {
            key: "statsByDate".to_string(),
        };
        assert_eq!(
            serde_json::to_string(&changed).unwrap(),
            r#"{"kind":"changed","key":"statsByDate"}"#
        );
    }

    #[test]
    fn rules_frame_matches_dynamic_rule_update() {
        let rule = BlockingRule::for_allowlist(
            &Allowlist::from_raw(["github.com"]),
            "chrome-extension://focusguard/block.html",
        );
        let json = serde_json::to_string_pretty(&Outbound::install(rule)).unwrap();
        assert_snapshot!(json, @r#"
        {
          "kind": "rules",
          "removeRuleIds": [
            1
          ],
          "addRules": [
            {
              "id": 1,
              "priority": 1,
              "action": {
                "type": "redirect",
                "redirect": {
                  "url": "chrome-extension://focusguard/block.html"
                }
              },
              "condition": {
                "urlFilter": "*",
                "resourceTypes": [
                  "main_frame"
                ],
                "excludedDomains": [
                  "github.com"
                ]
              }
            }
          ]
        }
        "#);

        assert_eq!(
            serde_json::to_value(Outbound::clear()).unwrap(),
            json!({"kind": "rules", "removeRuleIds": [1], "addRules": []})
        );
    }
}
