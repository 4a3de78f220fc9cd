//! Configuration types
//!
//! Runtime configuration for the research pipeline. Built once at startup and
//! passed by reference into each component.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const TAVILY_API_KEY_VAR: &str = "TAVILY_API_KEY";
pub const GEMINI_API_KEY_VAR: &str = "GEMINI_API_KEY";

pub const DEFAULT_TAVILY_URL: &str = "https://api.tavily.com/search";
pub const DEFAULT_GEMINI_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";

/// Research pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchConfig {
    /// Tavily search API key
    #[serde(skip_serializing)]
    pub tavily_api_key: Option<String>,
    /// Gemini API key used by the summarizer
    #[serde(skip_serializing)]
    pub gemini_api_key: Option<String>,
    /// Tavily search endpoint
    pub tavily_api_url: String,
    /// Gemini REST base URL (without the `/models/...` suffix)
    pub gemini_api_base: String,
    /// Gemini model name
    pub gemini_model: String,
    /// Directory holding the memory and archive files
    pub data_dir: PathBuf,
    /// Number of search results per query
    pub max_results: usize,
    /// Per-page fetch timeout
    pub fetch_timeout_secs: u64,
    /// Answer known queries from the memory store instead of searching again
    pub reuse_memory: bool,
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            tavily_api_key: None,
            gemini_api_key: None,
            tavily_api_url: DEFAULT_TAVILY_URL.to_string(),
            gemini_api_base: DEFAULT_GEMINI_BASE.to_string(),
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            data_dir: PathBuf::from("data"),
            max_results: crate::agent::tools::tavily::DEFAULT_NUM_RESULTS,
            fetch_timeout_secs: 10,
            reuse_memory: false,
        }
    }
}

impl ResearchConfig {
    /// Build from process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        let mut config = Self {
            tavily_api_key: get(TAVILY_API_KEY_VAR),
            gemini_api_key: get(GEMINI_API_KEY_VAR),
            tavily_api_url: get("TAVILY_API_URL").unwrap_or(defaults.tavily_api_url),
            gemini_api_base: get("GEMINI_API_BASE").unwrap_or(defaults.gemini_api_base),
            gemini_model: get("GEMINI_MODEL").unwrap_or(defaults.gemini_model),
            data_dir: get("RESEARCH_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            max_results: get("RESEARCH_MAX_RESULTS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_results),
            fetch_timeout_secs: get("RESEARCH_FETCH_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.fetch_timeout_secs),
            reuse_memory: false,
        };
        config.validate();
        config
    }

    /// Clamp numeric settings into usable ranges
    pub fn validate(&mut self) {
        self.max_results = self.max_results.clamp(1, 20);
        self.fetch_timeout_secs = self.fetch_timeout_secs.clamp(1, 120);
        self.gemini_api_base = self.gemini_api_base.trim_end_matches('/').to_string();
        if self.gemini_model.trim().is_empty() {
            self.gemini_model = DEFAULT_GEMINI_MODEL.to_string();
        }
    }

    /// Report which API keys were found. Absence is only logged; the
    /// component that needs the key fails when it is used.
    pub fn log_key_status(&self) {
        log_key(TAVILY_API_KEY_VAR, self.tavily_api_key.as_deref());
        log_key(GEMINI_API_KEY_VAR, self.gemini_api_key.as_deref());
    }

    pub fn memory_path(&self) -> PathBuf {
        self.data_dir.join("memory_store.json")
    }

    pub fn archive_path(&self) -> PathBuf {
        self.data_dir.join("queries_results.json")
    }
}

fn log_key(name: &str, value: Option<&str>) {
    match value {
        Some(key) => tracing::info!("{} found (...{})", name, key_suffix(key)),
        None => tracing::warn!("{} not set", name),
    }
}

/// Last six characters of a secret, enough to tell keys apart in logs
pub fn key_suffix(key: &str) -> &str {
    let count = key.chars().count();
    if count <= 6 {
        return key;
    }
    let start = key
        .char_indices()
        .nth(count - 6)
        .map(|(i, _)| i)
        .unwrap_or(0);
    &key[start..]
}
