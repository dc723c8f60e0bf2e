//! Agent filter subsystem.
//!
//! # Data Flow
//! ```text
//! filter sources (inline config, directory of JSON files, built-in catalog)
//!     → loader.rs (parse, validate, order, de-duplicate)
//!     → FilterSet (immutable, load-ordered)
//!     → store.rs (atomic swap of Arc<FilterSet>)
//!     → classifier reads a snapshot per request
//!
//! On refresh (file change, SIGHUP, admin API):
//!     watcher.rs / signals / admin
//!     → loader.rs builds a new FilterSet
//!     → store.rs swaps it in whole
//! ```
//!
//! # Design Decisions
//! - Load order is significant: the first matching filter wins
//! - Stored as a Vec, never a map, to keep that order
//! - Bad entries are skipped at the smallest granularity possible

pub mod catalog;
pub mod cidr;
pub mod loader;
pub mod prefixes;
pub mod record;
pub mod store;
pub mod watcher;

use std::path::PathBuf;

use thiserror::Error;

pub use loader::FilterLoader;
pub use record::{AgentFilter, AgentFilterDef};
pub use store::FilterStore;

/// Errors raised while building filters.
#[derive(Debug, Error)]
pub enum FilterError {
    /// Record has no name and none could be derived.
    #[error("filter record has no name")]
    MissingName,

    /// Record has no ranges and no markers.
    #[error("filter '{0}' has no ip ranges, user-agent markers or utm markers")]
    EmptyFilter(String),

    /// Two records share a name.
    #[error("duplicate filter name '{0}'")]
    Duplicate(String),

    /// Filter file or directory could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Filter file is not valid JSON for a filter record.
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// An ordered, immutable set of agent filters.
#[derive(Debug, Clone, Default)]
pub struct FilterSet {
    filters: Vec<AgentFilter>,
}

impl FilterSet {
    /// Build a set, rejecting duplicate names.
    pub fn new(filters: Vec<AgentFilter>) -> Result<Self, FilterError> {
        for (i, filter) in filters.iter().enumerate() {
            if filters[..i].iter().any(|f| f.name() == filter.name()) {
                return Err(FilterError::Duplicate(filter.name().to_string()));
            }
        }
        Ok(Self { filters })
    }

    pub fn filters(&self) -> &[AgentFilter] {
        &self.filters
    }

    pub fn get(&self, name: &str) -> Option<&AgentFilter> {
        self.filters.iter().find(|f| f.name() == name)
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}
