//! Tavily web search
//!
//! Thin client over `POST /search`. Returns results in provider order.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::agent::tools::{SearchProvider, ToolError};
use crate::types::config::ResearchConfig;
use crate::types::research::SearchResult;

pub const DEFAULT_NUM_RESULTS: usize = 5;

const SEARCH_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<Value>,
}

pub struct TavilySearch {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl TavilySearch {
    pub fn new(config: &ResearchConfig) -> Result<Self, ToolError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(SEARCH_TIMEOUT_SECS))
            .build()
            .map_err(|e| ToolError::ExecutionFailed(format!("Failed to create HTTP client: {}", e)))?;
        Self::with_client(config, client)
    }

    pub fn with_client(config: &ResearchConfig, client: reqwest::Client) -> Result<Self, ToolError> {
        let api_key = config
            .tavily_api_key
            .clone()
            .ok_or_else(|| ToolError::NotConfigured("TAVILY_API_KEY is not set".into()))?;

        Ok(Self {
            client,
            api_key,
            endpoint: config.tavily_api_url.clone(),
        })
    }
}

/// Build a search client, logging instead of failing when that is not possible.
///
/// Callers must treat `None` as "search unavailable".
pub fn get_search_client(config: &ResearchConfig) -> Option<TavilySearch> {
    match TavilySearch::new(config) {
        Ok(client) => Some(client),
        Err(e) => {
            tracing::error!("Error initializing Tavily search: {}", e);
            None
        }
    }
}

#[async_trait]
impl SearchProvider for TavilySearch {
    fn name(&self) -> &str {
        "tavily"
    }

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>, ToolError> {
        if query.trim().is_empty() {
            return Err(ToolError::InvalidParameters("query is required".into()));
        }
        let max_results = max_results.max(1);

        let body = serde_json::json!({
            "query": query,
            "api_key": self.api_key,
            "max_results": max_results,
            "include_answer": false,
            "include_raw_content": false,
        });

        tracing::debug!("Tavily search: {:?} (max {})", query, max_results);

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(ToolError::Api {
                status: status.as_u16(),
                message: text,
            });
        }

        let parsed: TavilyResponse = serde_json::from_str(&text)
            .map_err(|e| ToolError::ExecutionFailed(format!("Failed to parse Tavily response: {}", e)))?;

        let results = parse_results(parsed.results, max_results);
        tracing::info!("Tavily returned {} results for {:?}", results.len(), query);
        Ok(results)
    }
}

/// Keep entries that carry a URL, in order, up to `limit`
fn parse_results(raw: Vec<Value>, limit: usize) -> Vec<SearchResult> {
    raw.into_iter().filter_map(parse_result).take(limit).collect()
}

const TYPED_FIELDS: [(&str, fn(&Value) -> bool); 3] = [
    ("title", Value::is_string),
    ("content", Value::is_string),
    ("score", Value::is_number),
];

/// Known fields with an unexpected type are moved into `extra` untouched
fn parse_result(item: Value) -> Option<SearchResult> {
    let Value::Object(mut fields) = item else {
        tracing::debug!("Skipping search result that is not an object");
        return None;
    };

    let has_url = fields
        .get("url")
        .and_then(|u| u.as_str())
        .map(|u| !u.trim().is_empty())
        .unwrap_or(false);
    if !has_url {
        tracing::debug!("Skipping search result without url");
        return None;
    }

    let mut mistyped = Map::new();
    for (key, expected) in TYPED_FIELDS {
        let wrong = fields.get(key).map(|v| !v.is_null() && !expected(v)).unwrap_or(false);
        if wrong {
            if let Some(value) = fields.remove(key) {
                mistyped.insert(key.to_string(), value);
            }
        }
    }

    match serde_json::from_value::<SearchResult>(Value::Object(fields)) {
        Ok(mut result) => {
            if !mistyped.is_empty() {
                tracing::debug!(
                    "Search result {} has unexpected types for {:?}",
                    result.url,
                    mistyped.keys().collect::<Vec<_>>()
                );
                result.extra.extend(mistyped);
            }
            Some(result)
        }
        Err(e) => {
            tracing::warn!("Dropping unreadable search result: {}", e);
            None
        }
    }
}
