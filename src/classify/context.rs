//! Per-request input to the classifier.

use std::collections::BTreeMap;
use std::net::IpAddr;

use axum::http::{header, HeaderMap};

pub const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// What the classifier needs to know about one inbound request.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Transport-level peer address.
    address: String,
    /// Header names are case-insensitive by construction.
    headers: HeaderMap,
    /// Raw path, query and fragment.
    url: String,
    /// Absolute URL reported to the collector. Defaults to `url`.
    destination_url: Option<String>,
}

impl RequestContext {
    pub fn new(address: impl Into<String>, headers: HeaderMap, url: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            headers,
            url: url.into(),
            destination_url: None,
        }
    }

    pub fn with_destination_url(mut self, destination: impl Into<String>) -> Self {
        self.destination_url = Some(destination.into());
        self
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn destination_url(&self) -> &str {
        self.destination_url.as_deref().unwrap_or(&self.url)
    }

    /// `User-Agent` header, empty when absent or not valid text.
    pub fn user_agent(&self) -> &str {
        self.header(header::USER_AGENT.as_str())
    }

    pub fn header(&self, name: &str) -> &str {
        self.headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
    }

    /// Caller address: first `X-Forwarded-For` entry when present, else the
    /// peer address.
    pub fn client_address(&self) -> &str {
        let forwarded = self.header(X_FORWARDED_FOR);
        match forwarded.split(',').next().map(str::trim) {
            Some(first) if !first.is_empty() => first,
            _ => self.address.trim(),
        }
    }

    /// `client_address` parsed, if it is a valid IP address.
    pub fn client_ip(&self) -> Option<IpAddr> {
        self.client_address().parse().ok()
    }

    /// Header set as name → value. Repeated headers are joined with ", ".
    pub fn header_snapshot(&self) -> BTreeMap<String, String> {
        let mut snapshot: BTreeMap<String, String> = BTreeMap::new();
        for (name, value) in &self.headers {
            let value = String::from_utf8_lossy(value.as_bytes());
            snapshot
                .entry(name.as_str().to_string())
                .and_modify(|existing| {
                    existing.push_str(", ");
                    existing.push_str(&value);
                })
                .or_insert_with(|| value.into_owned());
        }
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.append(*k, HeaderValue::from_static(*v));
        }
        map
    }

    #[test]
    fn test_forwarded_for_first_entry() {
        let ctx = RequestContext::new("10.0.0.1", headers(&[("x-forwarded-for", "1.2.3.4, 10.0.0.1")]), "/");
        assert_eq!(ctx.client_address(), "1.2.3.4");
        assert_eq!(ctx.client_ip(), Some("1.2.3.4".parse().unwrap()));
    }

    #[test]
    fn test_peer_address_fallback() {
        let ctx = RequestContext::new("203.0.113.9", HeaderMap::new(), "/");
        assert_eq!(ctx.client_address(), "203.0.113.9");

        let ctx = RequestContext::new("203.0.113.9", headers(&[("x-forwarded-for", " , 1.2.3.4")]), "/");
        assert_eq!(ctx.client_address(), "203.0.113.9");
    }

    #[test]
    fn test_case_insensitive_headers() {
        let mut map = HeaderMap::new();
        let name = axum::http::HeaderName::from_bytes(b"User-Agent").unwrap();
        map.insert(name, HeaderValue::from_static("Googlebot/2.1"));
        let ctx = RequestContext::new("1.1.1.1", map, "/");
        assert_eq!(ctx.user_agent(), "Googlebot/2.1");
        assert_eq!(ctx.header("USER-AGENT"), "Googlebot/2.1");
    }

    #[test]
    fn test_header_snapshot_joins_repeats() {
        let ctx = RequestContext::new(
            "1.1.1.1",
            headers(&[("accept", "text/html"), ("accept", "*/*"), ("user-agent", "bot")]),
            "/",
        );
        let snapshot = ctx.header_snapshot();
        assert_eq!(snapshot["accept"], "text/html, */*");
        assert_eq!(snapshot["user-agent"], "bot");
    }

    #[test]
    fn test_destination_defaults_to_url() {
        let ctx = RequestContext::new("1.1.1.1", HeaderMap::new(), "/a?b=c");
        assert_eq!(ctx.destination_url(), "/a?b=c");
        let ctx = ctx.with_destination_url("https://example.com/a?b=c");
        assert_eq!(ctx.destination_url(), "https://example.com/a?b=c");
    }
}
