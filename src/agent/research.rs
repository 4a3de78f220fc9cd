//! Research orchestrator
//!
//! search -> (fetch -> summarize) per result -> persist -> respond.
//! Results are processed one at a time, in search order. A URL that fails to
//! fetch or summarize is reported in `failures` and does not abort the run.

use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::agent::tools::gemini::GeminiSummarizer;
use crate::agent::tools::tavily::get_search_client;
use crate::agent::tools::web::WebFetcher;
use crate::agent::tools::{PageFetcher, SearchProvider, Summarizer, ToolError};
use crate::storage::{ArchiveStore, MemoryStore, StorageError};
use crate::types::config::ResearchConfig;
use crate::types::research::{
    FailureStage, ResearchRequest, ResearchResponse, SearchResult, SessionRecord, Summary,
    UrlFailure,
};

/// Orchestrator errors
#[derive(Debug, Error)]
pub enum ResearchError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Search client unavailable (check TAVILY_API_KEY)")]
    SearchUnavailable,
    #[error("Search failed: {0}")]
    Search(#[source] ToolError),
    #[error("Setup failed: {0}")]
    Setup(#[source] ToolError),
    #[error("Failed to encode response: {0}")]
    Encode(#[source] serde_json::Error),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub struct ResearchAgent {
    search: Option<Arc<dyn SearchProvider>>,
    fetcher: Arc<dyn PageFetcher>,
    summarizer: Arc<dyn Summarizer>,
    memory: MemoryStore,
    archive: ArchiveStore,
    max_results: usize,
    reuse_memory: bool,
}

impl ResearchAgent {
    pub fn new(
        search: Option<Arc<dyn SearchProvider>>,
        fetcher: Arc<dyn PageFetcher>,
        summarizer: Arc<dyn Summarizer>,
        config: &ResearchConfig,
    ) -> Self {
        Self {
            search,
            fetcher,
            summarizer,
            memory: MemoryStore::new(config.memory_path()),
            archive: ArchiveStore::new(config.archive_path()),
            max_results: config.max_results,
            reuse_memory: config.reuse_memory,
        }
    }

    /// Wire up Tavily, the web fetcher and Gemini from configuration.
    ///
    /// A search client that cannot be built is logged and left out; `research`
    /// then fails with `SearchUnavailable`.
    pub fn from_config(config: &ResearchConfig) -> Result<Self, ResearchError> {
        let search = get_search_client(config).map(|c| Arc::new(c) as Arc<dyn SearchProvider>);
        let fetcher = WebFetcher::new(Duration::from_secs(config.fetch_timeout_secs))
            .map_err(ResearchError::Setup)?;
        let summarizer = GeminiSummarizer::new(config).map_err(ResearchError::Setup)?;

        tracing::info!(
            "Research agent ready (search: {}, model: {}, data: {})",
            search.as_ref().map(|s| s.name()).unwrap_or("unavailable"),
            summarizer.model(),
            config.data_dir.display()
        );

        Ok(Self::new(search, Arc::new(fetcher), Arc::new(summarizer), config))
    }

    pub fn memory(&self) -> &MemoryStore {
        &self.memory
    }

    pub fn archive(&self) -> &ArchiveStore {
        &self.archive
    }

    /// Stored session for `query`, without running anything
    pub fn recall(&self, query: &str) -> Result<Option<SessionRecord>, ResearchError> {
        Ok(self.memory.load(query)?)
    }

    /// JSON entry point: `{"query": ...}` in, `{"query", "summaries"}` out
    pub async fn research_json(&self, input: Value) -> Result<Value, ResearchError> {
        if !input.is_object() {
            return Err(ResearchError::InvalidRequest("expected a JSON object".into()));
        }
        let request: ResearchRequest = serde_json::from_value(input)
            .map_err(|e| ResearchError::InvalidRequest(e.to_string()))?;
        let response = self.research(request).await?;
        serde_json::to_value(&response).map_err(ResearchError::Encode)
    }

    pub async fn research(&self, request: ResearchRequest) -> Result<ResearchResponse, ResearchError> {
        let query = request
            .query
            .ok_or_else(|| ResearchError::InvalidRequest("missing \"query\"".into()))?;
        if query.trim().is_empty() {
            return Err(ResearchError::InvalidRequest("\"query\" is empty".into()));
        }

        if self.reuse_memory {
            if let Some(record) = self.memory.load(&query)? {
                tracing::info!("Answering {:?} from memory ({})", query, record.timestamp);
                return Ok(ResearchResponse {
                    query,
                    summaries: record.summaries,
                    failures: Vec::new(),
                    from_memory: true,
                });
            }
        }

        let search = self.search.as_ref().ok_or(ResearchError::SearchUnavailable)?;
        let results = search
            .search(&query, self.max_results)
            .await
            .map_err(ResearchError::Search)?;
        tracing::info!("Researching {:?}: {} results", query, results.len());

        let mut summaries = Vec::with_capacity(results.len());
        let mut failures = Vec::new();
        for (index, result) in results.iter().enumerate() {
            tracing::debug!("[{}/{}] {}", index + 1, results.len(), result.url);
            match self.process_result(result, &query).await {
                Ok(summary) => summaries.push(summary),
                Err(failure) => {
                    tracing::warn!(
                        "Skipping {} ({:?}): {}",
                        failure.url,
                        failure.stage,
                        failure.reason
                    );
                    failures.push(failure);
                }
            }
        }

        self.archive.save(&query, &results, &summaries)?;
        self.memory.save(&query, &results, &summaries)?;

        tracing::info!(
            "Finished {:?}: {} summaries, {} failures",
            query,
            summaries.len(),
            failures.len()
        );

        Ok(ResearchResponse {
            query,
            summaries,
            failures,
            from_memory: false,
        })
    }

    async fn process_result(&self, result: &SearchResult, query: &str) -> Result<Summary, UrlFailure> {
        let url = result.url.clone();

        let text = self.fetcher.fetch(&url).await.map_err(|e| UrlFailure {
            url: url.clone(),
            stage: FailureStage::Fetch,
            reason: e.to_string(),
        })?;

        let summary = self
            .summarizer
            .summarize(&text, query)
            .await
            .map_err(|e| UrlFailure {
                url: url.clone(),
                stage: FailureStage::Summarize,
                reason: e.to_string(),
            })?;

        Ok(Summary { url, summary })
    }
}
