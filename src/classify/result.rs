//! Classification outcome types.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Why the agent touched the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    /// A person followed a link attributed to the agent.
    Browse,
    /// The agent fetched the page itself.
    Crawl,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Browse => "browse",
            Intent::Crawl => "crawl",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Click,
    Crawl,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Click => "click",
            EventType::Crawl => "crawl",
        }
    }
}

/// A request attributed to one agent family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationResult {
    pub filter_name: String,
    pub intent: Intent,
    pub event_type: EventType,
    pub destination_url: String,
    pub user_agent: Option<String>,
    pub highlighted_text: Option<String>,
    pub headers: Option<BTreeMap<String, String>>,
}
