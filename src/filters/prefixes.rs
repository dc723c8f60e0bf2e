//! Vendor IP prefix documents.
//!
//! Crawler operators publish their address ranges as JSON:
//! `{"prefixes": [{"ipv4Prefix": "66.249.64.0/27"}, {"ipv6Prefix": "2001:4860:4801:10::/64"}]}`.
//! This module turns such documents (already on disk) into range lists.

use std::path::Path;

use serde::Deserialize;

use crate::filters::FilterError;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PrefixDocument {
    #[serde(default)]
    pub prefixes: Vec<PrefixEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrefixEntry {
    pub ipv4_prefix: Option<String>,
    pub ipv6_prefix: Option<String>,
}

impl PrefixDocument {
    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    pub fn from_file(path: &Path) -> Result<Self, FilterError> {
        let content = std::fs::read_to_string(path).map_err(|source| FilterError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content).map_err(|source| FilterError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Prefixes in document order. Entries with neither key are skipped.
    pub fn ranges(&self) -> Vec<String> {
        self.prefixes
            .iter()
            .filter_map(|p| p.ipv4_prefix.clone().or_else(|| p.ipv6_prefix.clone()))
            .filter(|p| !p.trim().is_empty())
            .collect()
    }
}
