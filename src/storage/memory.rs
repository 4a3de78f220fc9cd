//! Session memory store
//!
//! One timestamped record per query. Repeat queries overwrite.

use crate::storage::{JsonFileStore, StorageError};
use crate::types::research::{SearchResult, SessionRecord, Summary};
use std::path::{Path, PathBuf};

pub struct MemoryStore {
    file: JsonFileStore<SessionRecord>,
}

impl MemoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            file: JsonFileStore::new(path),
        }
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Previous session for `query`, if any
    pub fn load(&self, query: &str) -> Result<Option<SessionRecord>, StorageError> {
        self.file.load(query)
    }

    /// Stamp and store a session, returning the record as written
    pub fn save(
        &self,
        query: &str,
        results: &[SearchResult],
        summaries: &[Summary],
    ) -> Result<SessionRecord, StorageError> {
        let record = SessionRecord {
            query: query.to_string(),
            results: results.to_vec(),
            summaries: summaries.to_vec(),
            timestamp: now_iso8601(),
        };
        self.file.insert(query, &record)?;
        Ok(record)
    }

    /// Every query that has a stored session
    pub fn queries(&self) -> Result<Vec<String>, StorageError> {
        self.file.keys()
    }
}

fn now_iso8601() -> String {
    chrono::Local::now()
        .naive_local()
        .format("%Y-%m-%dT%H:%M:%S%.6f")
        .to_string()
}
