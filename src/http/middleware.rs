//! Traffic classification middleware.
//!
//! Runs before the request is forwarded. Classification and event queueing
//! are in-memory; the upstream response is never held back by the collector.
//! A match marks the response non-cacheable so page caches keep letting
//! agent traffic through to the classifier.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, Request},
    middleware::Next,
    response::Response,
};

use crate::http::request::request_context;
use crate::http::server::AppState;
use crate::monitor::CACHE_BYPASS;

pub async fn classify_middleware(State(state): State<AppState>, request: Request<Body>, next: Next) -> Response {
    if !state.monitor.has_credential() {
        return next.run(request).await;
    }

    let ctx = request_context(&request, &state.default_scheme);
    let matched = state.monitor.observe(&ctx).is_some();

    let mut response = next.run(request).await;
    if matched {
        response
            .headers_mut()
            .insert(header::CACHE_CONTROL, HeaderValue::from_static(CACHE_BYPASS));
    }
    response
}
