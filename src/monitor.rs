//! Per-request traffic monitoring.
//!
//! Ties the active filter set, the classifier and the event emitter together
//! for the HTTP layer. Everything here is best-effort: nothing returned from
//! [`TrafficMonitor::observe`] can fail the request.

use std::sync::Arc;

use crate::classify::{classify, ClassificationResult, RequestContext};
use crate::events::EventEmitter;
use crate::filters::FilterStore;
use crate::observability::metrics;

/// Response header value applied when a request is attributed to an agent.
pub const CACHE_BYPASS: &str = "no-cache, must-revalidate, max-age=0";

pub struct TrafficMonitor {
    filters: Arc<FilterStore>,
    emitter: EventEmitter,
    has_credential: bool,
}

impl TrafficMonitor {
    /// `api_key` is the collector credential; blank disables classification.
    pub fn new(filters: Arc<FilterStore>, emitter: EventEmitter, api_key: &str) -> Self {
        Self {
            filters,
            emitter,
            has_credential: !api_key.trim().is_empty(),
        }
    }

    pub fn filters(&self) -> &Arc<FilterStore> {
        &self.filters
    }

    pub fn has_credential(&self) -> bool {
        self.has_credential
    }

    /// False without a credential or without filters; requests then pass
    /// through unclassified.
    pub fn is_enabled(&self) -> bool {
        self.has_credential && !self.filters.is_empty()
    }

    /// Classify a request and queue its event. Returns the result so the
    /// caller can mark the response non-cacheable.
    ///
    /// With a credential but no filters every request is still logged as
    /// unmatched, so an empty set shows up in the request log.
    pub fn observe(&self, ctx: &RequestContext) -> Option<ClassificationResult> {
        if !self.has_credential {
            return None;
        }

        let snapshot = self.filters.snapshot();
        let result = if snapshot.is_empty() {
            None
        } else {
            classify(ctx, snapshot.filters())
        };

        metrics::record_request(result.is_some());
        if let Some(result) = &result {
            metrics::record_classification(&result.filter_name, result.intent.as_str());
            self.emitter.emit(result);
        }

        tracing::info!(
            ip = %ctx.client_address(),
            user_agent = %ctx.user_agent(),
            matched = result.is_some(),
            source = result.as_ref().map(|r| r.filter_name.as_str()).unwrap_or("-"),
            filters = snapshot.len(),
            "Request classified"
        );

        result
    }
}
