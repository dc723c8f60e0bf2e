//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses, URLs and value ranges
//! - Check inline filters are well-formed and uniquely named
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::{ProxyConfig, ADMIN_KEY_PLACEHOLDER};
use crate::filters::AgentFilter;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: '{value}' is not a valid socket address")]
    InvalidAddress { field: &'static str, value: String },

    #[error("collector.endpoint: '{0}' is not an http(s) URL")]
    InvalidEndpoint(String),

    #[error("upstream.default_scheme: '{0}' must be http or https")]
    InvalidScheme(String),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("filters.agents: {0}")]
    InvalidFilter(String),

    #[error("filters.agents: duplicate filter name '{0}'")]
    DuplicateFilter(String),

    #[error("filters.watch requires filters.directory")]
    WatchWithoutDirectory,

    #[error("admin.api_key must be changed from the placeholder when the admin API is enabled")]
    AdminKeyPlaceholder,
}

/// Validate a configuration, collecting every error.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_address(&mut errors, "listener.bind_address", &config.listener.bind_address);
    check_address(&mut errors, "upstream.address", &config.upstream.address);

    if !matches!(config.upstream.default_scheme.as_str(), "http" | "https") {
        errors.push(ValidationError::InvalidScheme(config.upstream.default_scheme.clone()));
    }

    match Url::parse(&config.collector.endpoint) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        _ => errors.push(ValidationError::InvalidEndpoint(config.collector.endpoint.clone())),
    }

    let positives = [
        ("upstream.connect_timeout_secs", config.upstream.connect_timeout_secs as usize),
        ("collector.timeout_secs", config.collector.timeout_secs as usize),
        ("collector.queue_capacity", config.collector.queue_capacity),
        ("collector.max_in_flight", config.collector.max_in_flight),
        ("timeouts.request_secs", config.timeouts.request_secs as usize),
    ];
    for (field, value) in positives {
        if value == 0 {
            errors.push(ValidationError::Zero(field));
        }
    }

    let mut names: Vec<String> = Vec::new();
    for def in &config.filters.agents {
        match AgentFilter::from_def(def.clone(), None) {
            Ok(filter) => {
                if names.iter().any(|n| n == filter.name()) {
                    errors.push(ValidationError::DuplicateFilter(filter.name().to_string()));
                } else {
                    names.push(filter.name().to_string());
                }
            }
            Err(e) => errors.push(ValidationError::InvalidFilter(e.to_string())),
        }
    }

    if config.filters.watch && config.filters.directory.is_none() {
        errors.push(ValidationError::WatchWithoutDirectory);
    }

    if config.observability.metrics_enabled {
        check_address(&mut errors, "observability.metrics_address", &config.observability.metrics_address);
    }

    if config.admin.enabled {
        check_address(&mut errors, "admin.bind_address", &config.admin.bind_address);
        if config.admin.api_key.is_empty() || config.admin.api_key == ADMIN_KEY_PLACEHOLDER {
            errors.push(ValidationError::AdminKeyPlaceholder);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_address(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}
