//! Agent filter records.
//!
//! One record per agent family. Records are validated when built and are
//! immutable afterwards; a refresh replaces whole records, never fields.

use std::net::IpAddr;

use serde::{Deserialize, Serialize};

use crate::filters::cidr::RangeSpec;
use crate::filters::FilterError;

/// On-disk / config representation of an agent filter.
///
/// Field names follow the filter files written by the IP-list refresher
/// (`ips`, `userAgents`, `utm`); the longer names are accepted as aliases.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct AgentFilterDef {
    pub name: String,

    #[serde(rename = "ips", alias = "ipRanges", alias = "ip_ranges")]
    pub ip_ranges: Vec<String>,

    #[serde(rename = "userAgents", alias = "userAgentMarkers", alias = "user_agents")]
    pub user_agents: Vec<String>,

    #[serde(rename = "utm", alias = "utmMarkers", alias = "utm_markers")]
    pub utm: Vec<String>,
}

/// A validated agent filter.
#[derive(Debug, Clone)]
pub struct AgentFilter {
    name: String,
    ip_ranges: Vec<String>,
    ranges: Vec<RangeSpec>,
    user_agent_markers: Vec<String>,
    /// Lowercased copies of `user_agent_markers`, same order.
    user_agent_needles: Vec<String>,
    utm_markers: Vec<String>,
}

impl AgentFilter {
    /// Build a filter. Empty strings are dropped from every list; a filter
    /// left with no ranges and no markers is rejected.
    pub fn new(
        name: impl Into<String>,
        ip_ranges: Vec<String>,
        user_agent_markers: Vec<String>,
        utm_markers: Vec<String>,
    ) -> Result<Self, FilterError> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(FilterError::MissingName);
        }

        let ip_ranges = drop_blank(ip_ranges);
        let user_agent_markers = drop_blank(user_agent_markers);
        let utm_markers = drop_blank(utm_markers);

        if ip_ranges.is_empty() && user_agent_markers.is_empty() && utm_markers.is_empty() {
            return Err(FilterError::EmptyFilter(name));
        }

        let ranges = ip_ranges.iter().map(|r| RangeSpec::parse(r)).collect::<Vec<_>>();
        let invalid = ranges.iter().filter(|r| **r == RangeSpec::Invalid).count();
        if invalid > 0 {
            tracing::debug!(filter = %name, invalid, "Filter has unparseable ranges; they will never match");
        }

        let user_agent_needles = user_agent_markers.iter().map(|m| m.to_lowercase()).collect();

        Ok(Self {
            name,
            ip_ranges,
            ranges,
            user_agent_markers,
            user_agent_needles,
            utm_markers,
        })
    }

    /// Build a filter from its serialized form, using `fallback_name` when
    /// the record carries none.
    pub fn from_def(def: AgentFilterDef, fallback_name: Option<&str>) -> Result<Self, FilterError> {
        let name = if def.name.trim().is_empty() {
            fallback_name.unwrap_or_default().to_string()
        } else {
            def.name
        };
        Self::new(name, def.ip_ranges, def.user_agents, def.utm)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ip_ranges(&self) -> &[String] {
        &self.ip_ranges
    }

    pub fn user_agent_markers(&self) -> &[String] {
        &self.user_agent_markers
    }

    pub fn utm_markers(&self) -> &[String] {
        &self.utm_markers
    }

    /// True if any range covers the address.
    pub fn matches_address(&self, address: &str, parsed: Option<IpAddr>) -> bool {
        !address.is_empty() && self.ranges.iter().any(|r| r.contains(address, parsed))
    }

    /// Case-insensitive substring match against the user-agent markers.
    pub fn matches_user_agent(&self, user_agent: &str) -> bool {
        if user_agent.is_empty() {
            return false;
        }
        let haystack = user_agent.to_lowercase();
        self.user_agent_needles.iter().any(|n| haystack.contains(n.as_str()))
    }

    /// First UTM marker contained in `utm_source` (case-sensitive).
    pub fn matching_utm_marker(&self, utm_source: &str) -> Option<&str> {
        self.utm_markers
            .iter()
            .find(|m| utm_source.contains(m.as_str()))
            .map(String::as_str)
    }

    pub fn to_def(&self) -> AgentFilterDef {
        AgentFilterDef {
            name: self.name.clone(),
            ip_ranges: self.ip_ranges.clone(),
            user_agents: self.user_agent_markers.clone(),
            utm: self.utm_markers.clone(),
        }
    }
}

impl TryFrom<AgentFilterDef> for AgentFilter {
    type Error = FilterError;

    fn try_from(def: AgentFilterDef) -> Result<Self, Self::Error> {
        Self::from_def(def, None)
    }
}

fn drop_blank(values: Vec<String>) -> Vec<String> {
    values.into_iter().filter(|v| !v.trim().is_empty()).collect()
}
