//! Collector wire format.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::classify::{ClassificationResult, EventType, Intent};

/// JSON body posted to the collector.
///
/// Optional fields serialize as `null`, never omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrafficEvent {
    pub source: String,
    pub intent: Intent,
    #[serde(rename = "type")]
    pub event_type: EventType,
    #[serde(rename = "userAgent")]
    pub user_agent: Option<String>,
    #[serde(rename = "destinationURL")]
    pub destination_url: String,
    #[serde(rename = "highlightedText")]
    pub highlighted_text: Option<String>,
    pub headers: Option<BTreeMap<String, String>>,
}

impl From<&ClassificationResult> for TrafficEvent {
    fn from(result: &ClassificationResult) -> Self {
        Self {
            source: result.filter_name.clone(),
            intent: result.intent,
            event_type: result.event_type,
            user_agent: result.user_agent.clone(),
            destination_url: result.destination_url.clone(),
            highlighted_text: result.highlighted_text.clone(),
            headers: result.headers.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_click_payload_keeps_nulls() {
        let result = ClassificationResult {
            filter_name: "openai".into(),
            intent: Intent::Browse,
            event_type: EventType::Click,
            destination_url: "https://example.com/?utm_source=chatgpt.com".into(),
            user_agent: None,
            highlighted_text: None,
            headers: None,
        };

        let body = serde_json::to_value(TrafficEvent::from(&result)).unwrap();
        assert_eq!(
            body,
            json!({
                "source": "openai",
                "intent": "browse",
                "type": "click",
                "userAgent": null,
                "destinationURL": "https://example.com/?utm_source=chatgpt.com",
                "highlightedText": null,
                "headers": null,
            })
        );
    }

    #[test]
    fn test_crawl_payload() {
        let mut headers = BTreeMap::new();
        headers.insert("user-agent".to_string(), "Googlebot/2.1".to_string());
        let result = ClassificationResult {
            filter_name: "google".into(),
            intent: Intent::Crawl,
            event_type: EventType::Crawl,
            destination_url: "http://example.com/".into(),
            user_agent: Some("Googlebot/2.1".into()),
            highlighted_text: None,
            headers: Some(headers),
        };

        let body = serde_json::to_value(TrafficEvent::from(&result)).unwrap();
        assert_eq!(body["intent"], "crawl");
        assert_eq!(body["type"], "crawl");
        assert_eq!(body["userAgent"], "Googlebot/2.1");
        assert_eq!(body["headers"]["user-agent"], "Googlebot/2.1");
        assert!(body["highlightedText"].is_null());
    }
}
