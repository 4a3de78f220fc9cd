//! Research data types
//!
//! Requests, responses and the records persisted by the JSON stores.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One item returned by the search provider.
///
/// Only `url` is required. Anything else the provider sends back is kept in
/// `extra` so the archive holds the raw result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SearchResult {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: None,
            content: None,
            score: None,
            extra: Map::new(),
        }
    }
}

/// Query-focused summary of one fetched page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub url: String,
    pub summary: String,
}

/// Pipeline step at which a URL was dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureStage {
    Fetch,
    Summarize,
}

/// A search result that produced no summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlFailure {
    pub url: String,
    pub stage: FailureStage,
    pub reason: String,
}

/// Orchestrator input: `{"query": "..."}`
///
/// `query` is optional at the type level so a request missing the key still
/// deserializes and gets rejected by the orchestrator with a typed error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResearchRequest {
    #[serde(default)]
    pub query: Option<String>,
}

impl ResearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: Some(query.into()),
        }
    }
}

/// Orchestrator output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchResponse {
    pub query: String,
    pub summaries: Vec<Summary>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<UrlFailure>,
    /// Set when the answer came out of the memory store instead of a fresh run
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub from_memory: bool,
}

/// Memory store entry, keyed by query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub query: String,
    pub results: Vec<SearchResult>,
    pub summaries: Vec<Summary>,
    /// ISO-8601, local time
    pub timestamp: String,
}

/// Archive store entry, keyed by query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchiveRecord {
    pub results: Vec<SearchResult>,
    pub summaries: Vec<Summary>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_result_keeps_provider_fields() {
        let raw = serde_json::json!({
            "url": "https://example.com",
            "title": "Example",
            "score": 0.87,
            "raw_content": null,
            "published_date": "2024-05-01"
        });

        let result: SearchResult = serde_json::from_value(raw).unwrap();
        assert_eq!(result.url, "https://example.com");
        assert_eq!(result.title.as_deref(), Some("Example"));
        assert_eq!(result.extra["published_date"], "2024-05-01");

        let back = serde_json::to_value(&result).unwrap();
        assert_eq!(back["published_date"], "2024-05-01");
        assert!(back.get("content").is_none());
    }

    #[test]
    fn test_request_without_query_deserializes() {
        let request: ResearchRequest = serde_json::from_str(r#"{"topic": "x"}"#).unwrap();
        assert!(request.query.is_none());
    }

    #[test]
    fn test_response_omits_empty_failures() {
        let response = ResearchResponse {
            query: "test".into(),
            summaries: vec![Summary {
                url: "http://a.test".into(),
                summary: "greeting".into(),
            }],
            failures: Vec::new(),
            from_memory: false,
        };

        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "query": "test",
                "summaries": [{"url": "http://a.test", "summary": "greeting"}]
            })
        );
    }

    #[test]
    fn test_failure_stage_lowercase() {
        let failure = UrlFailure {
            url: "http://b.test".into(),
            stage: FailureStage::Summarize,
            reason: "quota".into(),
        };
        let value = serde_json::to_value(&failure).unwrap();
        assert_eq!(value["stage"], "summarize");
    }
}
