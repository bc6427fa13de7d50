//! The "block everything except the allowlist" redirect rule.
//!
//! Serialized in the shape the browser's declarative network request API
//! expects for dynamic rules.

use serde::{Deserialize, Serialize};

use crate::allowlist::Allowlist;

/// Identifier of the single dynamic rule owned by focus sessions.
pub const BLOCKING_RULE_ID: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockingRule {
    pub id: u32,
    pub priority: u32,
    pub action: RuleAction,
    pub condition: RuleCondition,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleAction {
    #[serde(rename = "type")]
    pub kind: RuleActionType,
    pub redirect: Redirect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleActionType {
    Redirect,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Redirect {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleCondition {
    pub url_filter: String,
    pub resource_types: Vec<ResourceType>,
    /// Empty means nothing is exempt; omitted from the JSON in that case.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub excluded_domains: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    MainFrame,
}

impl BlockingRule {
    /// Redirects every top-level navigation outside `allowlist` to the block page.
    pub fn for_allowlist(allowlist: &Allowlist, block_page_url: &str) -> Self {
        Self {
            id: BLOCKING_RULE_ID,
            priority: 1,
            action: RuleAction {
                kind: RuleActionType::Redirect,
                redirect: Redirect {
                    url: block_page_url.to_string(),
                },
            },
            condition: RuleCondition {
                url_filter: "*".to_string(),
                resource_types: vec![ResourceType::MainFrame],
                excluded_domains: allowlist.to_strings(),
            },
        }
    }
}
