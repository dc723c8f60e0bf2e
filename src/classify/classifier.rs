//! Request classification.
//!
//! # Algorithm
//! 1. UTM path: a non-empty `utm_source` containing a filter's UTM marker
//!    yields a browse/click result.
//! 2. Crawl path (only when 1 found nothing): the caller address must fall in
//!    one of a filter's ranges AND the user agent must contain one of its
//!    markers.
//!
//! Filters are scanned in load order and the first match ends the scan.

use crate::classify::context::RequestContext;
use crate::classify::result::{ClassificationResult, EventType, Intent};
use crate::classify::url;
use crate::filters::AgentFilter;

/// Classify one request against an ordered filter list.
pub fn classify(ctx: &RequestContext, filters: &[AgentFilter]) -> Option<ClassificationResult> {
    let utm_source = url::utm_source(ctx.url()).unwrap_or_default();
    let highlighted_text = url::highlighted_text(ctx.url());

    classify_click(ctx, filters, &utm_source, highlighted_text).or_else(|| classify_crawl(ctx, filters))
}

fn classify_click(
    ctx: &RequestContext,
    filters: &[AgentFilter],
    utm_source: &str,
    highlighted_text: Option<String>,
) -> Option<ClassificationResult> {
    if utm_source.is_empty() {
        return None;
    }

    let filter = filters.iter().find(|f| f.matching_utm_marker(utm_source).is_some())?;

    Some(ClassificationResult {
        filter_name: filter.name().to_string(),
        intent: Intent::Browse,
        event_type: EventType::Click,
        destination_url: ctx.destination_url().to_string(),
        user_agent: None,
        highlighted_text,
        headers: None,
    })
}

fn classify_crawl(ctx: &RequestContext, filters: &[AgentFilter]) -> Option<ClassificationResult> {
    let address = ctx.client_address();
    let ip = ctx.client_ip();
    let user_agent = ctx.user_agent();

    let filter = filters
        .iter()
        .find(|f| f.matches_address(address, ip) && f.matches_user_agent(user_agent))?;

    Some(ClassificationResult {
        filter_name: filter.name().to_string(),
        intent: Intent::Crawl,
        event_type: EventType::Crawl,
        destination_url: ctx.destination_url().to_string(),
        user_agent: Some(user_agent.to_string()),
        highlighted_text: None,
        headers: Some(ctx.header_snapshot()),
    })
}
