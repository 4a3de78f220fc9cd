//! Results archive
//!
//! Cumulative record of raw search results and summaries, keyed by query.

use crate::storage::{JsonFileStore, StorageError};
use crate::types::research::{ArchiveRecord, SearchResult, Summary};
use std::path::{Path, PathBuf};

pub struct ArchiveStore {
    file: JsonFileStore<ArchiveRecord>,
}

impl ArchiveStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            file: JsonFileStore::new(path),
        }
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn save(
        &self,
        query: &str,
        results: &[SearchResult],
        summaries: &[Summary],
    ) -> Result<(), StorageError> {
        let record = ArchiveRecord {
            results: results.to_vec(),
            summaries: summaries.to_vec(),
        };
        self.file.insert(query, &record)
    }

    pub fn load(&self, query: &str) -> Result<Option<ArchiveRecord>, StorageError> {
        self.file.load(query)
    }

    pub fn queries(&self) -> Result<Vec<String>, StorageError> {
        self.file.keys()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_rerun_rekeys_instead_of_appending() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("queries_results.json");
        let store = ArchiveStore::new(&path);

        let first = vec![Summary {
            url: "http://a.test".into(),
            summary: "v1".into(),
        }];
        let second = vec![Summary {
            url: "http://a.test".into(),
            summary: "v2".into(),
        }];
        store.save("test", &[SearchResult::new("http://a.test")], &first).unwrap();
        store.save("test", &[SearchResult::new("http://a.test")], &second).unwrap();

        let raw: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let object = raw.as_object().unwrap();
        assert_eq!(object.len(), 1);
        assert_eq!(raw["test"]["summaries"][0]["summary"], "v2");
        assert!(raw["test"].get("timestamp").is_none());
        assert!(raw["test"].get("query").is_none());
    }

    #[test]
    fn test_distinct_queries_accumulate() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArchiveStore::new(dir.path().join("queries_results.json"));

        store.save("first", &[], &[]).unwrap();
        store.save("second", &[], &[]).unwrap();

        assert_eq!(store.queries().unwrap().len(), 2);
        let record = store.load("second").unwrap().unwrap();
        assert!(record.results.is_empty());
    }
}
