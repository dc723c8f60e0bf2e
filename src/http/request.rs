//! Request identification and context extraction.
//!
//! # Responsibilities
//! - Generate a request ID (UUID v4) and echo it on the response
//! - Build the classifier's [`RequestContext`] from an inbound request
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - An upstream-supplied `x-request-id` is kept, not replaced

use std::net::SocketAddr;

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{header, Request},
};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};

use crate::classify::RequestContext;

pub const X_REQUEST_ID: &str = "x-request-id";
pub const X_FORWARDED_PROTO: &str = "x-forwarded-proto";

/// Layer assigning `x-request-id` to requests that lack one.
pub fn set_request_id_layer() -> SetRequestIdLayer<MakeRequestUuid> {
    SetRequestIdLayer::x_request_id(MakeRequestUuid)
}

/// Layer copying `x-request-id` onto the response.
pub fn propagate_request_id_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::x_request_id()
}

pub fn request_id(request: &Request<Body>) -> &str {
    request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// Classifier input for `request`.
///
/// The peer address comes from the connection info inserted by
/// `into_make_service_with_connect_info`; it is empty when absent. The
/// destination URL is rebuilt from `X-Forwarded-Proto` (or
/// `default_scheme`), the `Host` header and the request target.
pub fn request_context(request: &Request<Body>, default_scheme: &str) -> RequestContext {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_default();

    let target = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/")
        .to_string();

    let headers = request.headers();
    let scheme = headers
        .get(X_FORWARDED_PROTO)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(default_scheme);
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .or_else(|| request.uri().authority().map(|a| a.as_str()));

    let ctx = RequestContext::new(peer, headers.clone(), target.clone());
    match host {
        Some(host) => ctx.with_destination_url(format!("{}://{}{}", scheme, host, target)),
        None => ctx,
    }
}
