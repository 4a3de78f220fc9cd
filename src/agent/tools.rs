use async_trait::async_trait;
use thiserror::Error;

use crate::types::research::SearchResult;

/// Web search backend
#[async_trait]
pub trait SearchProvider: Send + Sync {
    fn name(&self) -> &str;
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>, ToolError>;
}

/// Downloads a page and returns its visible text
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// Condenses page text into a summary focused on the query
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, text: &str, query: &str) -> Result<String, ToolError>;
}

/// Search and summarizer errors
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Not configured: {0}")]
    NotConfigured(String),
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),
    #[error("Execution failed: {0}")]
    ExecutionFailed(String),
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("Timeout")]
    Timeout,
}

impl From<reqwest::Error> for ToolError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ToolError::Timeout
        } else {
            ToolError::ExecutionFailed(format!("HTTP request failed: {}", e))
        }
    }
}

/// Page fetch errors
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("Request failed: {0}")]
    Request(String),
    #[error("Timed out")]
    Timeout,
    #[error("HTTP status {0}")]
    Status(u16),
    #[error("Unreadable body: {0}")]
    Body(String),
}

/// Tavily search client
pub mod tavily;

/// Page fetching and HTML text extraction
pub mod web;

/// Gemini summarizer
pub mod gemini;
