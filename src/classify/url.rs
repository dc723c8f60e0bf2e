//! Request URL inspection: `utm_source` and text-fragment extraction.

use percent_encoding::percent_decode_str;
use ::url::form_urlencoded;

const UTM_SOURCE: &str = "utm_source";
const TEXT_FRAGMENT_MARKER: &str = "#:~:text=";

/// Query string of a raw URL: after the first `?`, before any `#`.
pub fn query(url: &str) -> Option<&str> {
    let before_fragment = url.split('#').next().unwrap_or_default();
    before_fragment.split_once('?').map(|(_, q)| q)
}

/// `utm_source` value, key matched case-insensitively. The last occurrence
/// wins when the key repeats.
pub fn utm_source(url: &str) -> Option<String> {
    let query = query(url)?;
    form_urlencoded::parse(query.as_bytes())
        .filter(|(key, _)| key.eq_ignore_ascii_case(UTM_SOURCE))
        .map(|(_, value)| value.into_owned())
        .last()
}

/// Text highlighted via a `#:~:text=` fragment, decoded.
///
/// Captures up to the next `&` or the end of the URL; `+` decodes to a space.
pub fn highlighted_text(url: &str) -> Option<String> {
    let start = url.find(TEXT_FRAGMENT_MARKER)? + TEXT_FRAGMENT_MARKER.len();
    let raw = url[start..].split('&').next().unwrap_or_default();
    if raw.is_empty() {
        return None;
    }
    let spaced = raw.replace('+', " ");
    Some(percent_decode_str(&spaced).decode_utf8_lossy().into_owned())
}
