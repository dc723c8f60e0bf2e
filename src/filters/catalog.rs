//! Built-in agent families.
//!
//! User-agent and UTM markers for the AI agents we know about. IP ranges are
//! not built in; they change often and come from the vendors' published
//! prefix lists (see [`crate::filters::prefixes`]).

use crate::filters::AgentFilter;

/// Static description of a known agent family.
#[derive(Debug, Clone, Copy)]
pub struct KnownAgent {
    pub name: &'static str,
    pub user_agents: &'static [&'static str],
    pub utm: &'static [&'static str],
}

pub const KNOWN_AGENTS: &[KnownAgent] = &[
    KnownAgent {
        name: "openai",
        user_agents: &[
            "OAI-SearchBot/1.0",
            "ChatGPT-User/1.0",
            "+https://openai.com/bot",
            "+https://openai.com/searchbot",
            "GPTBot/1.1",
            "+https://openai.com/gptbot",
        ],
        utm: &["chatgpt.com", "openai.com"],
    },
    KnownAgent {
        name: "google",
        user_agents: &["Google-CloudVertexBot", "Googlebot", "Google-Extended"],
        utm: &["google.com"],
    },
    KnownAgent {
        name: "bing",
        user_agents: &["bingbot/2.0", "+http://www.bing.com/bingbot"],
        utm: &["bing.com"],
    },
    KnownAgent {
        name: "perplexity",
        user_agents: &[
            "PerplexityBot/1.0",
            "+https://perplexity.ai/perplexitybot",
            "Perplexity-User/1.0",
            "+https://perplexity.ai/perplexity-user",
        ],
        utm: &["perplexity.ai", "perplexity.com"],
    },
];

/// Look up a known family by name (case-insensitive).
pub fn lookup(name: &str) -> Option<&'static KnownAgent> {
    KNOWN_AGENTS.iter().find(|a| a.name.eq_ignore_ascii_case(name))
}

impl KnownAgent {
    /// Build a filter for this family with the given IP ranges.
    pub fn to_filter(&self, ip_ranges: Vec<String>) -> AgentFilter {
        AgentFilter::new(
            self.name,
            ip_ranges,
            self.user_agents.iter().map(|s| s.to_string()).collect(),
            self.utm.iter().map(|s| s.to_string()).collect(),
        )
        // Every catalog entry carries markers, so it is never empty.
        .unwrap_or_else(|e| unreachable!("invalid built-in agent {}: {}", self.name, e))
    }
}

/// Catalog filters in catalog order, without IP ranges.
pub fn builtin_filters() -> Vec<AgentFilter> {
    KNOWN_AGENTS.iter().map(|a| a.to_filter(Vec::new())).collect()
}
