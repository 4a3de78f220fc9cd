//! Persistent storage
//!
//! Flat JSON files keyed by query text. Each file is a single JSON object;
//! writes re-read the whole file, replace one key and publish the result with
//! an atomic rename.

pub mod archive;
pub mod memory;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fs;
use std::io::Write;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

pub use archive::ArchiveStore;
pub use memory::MemoryStore;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{path} does not contain a JSON object")]
    NotAnObject { path: PathBuf },
}

/// A JSON object file mapping query strings to records of type `V`.
///
/// Read-modify-write cycles are serialized per store instance. Entries that do
/// not match `V` are carried through untouched on rewrite.
pub struct JsonFileStore<V> {
    path: PathBuf,
    lock: Mutex<()>,
    _marker: PhantomData<fn() -> V>,
}

impl<V> JsonFileStore<V>
where
    V: Serialize + DeserializeOwned,
{
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
            _marker: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record stored under `key`, or `None` if the file or key is missing
    pub fn load(&self, key: &str) -> Result<Option<V>, StorageError> {
        let contents = self.read_object()?;
        match contents.get(key) {
            Some(value) => {
                let record = serde_json::from_value(value.clone()).map_err(|source| {
                    StorageError::Json {
                        path: self.path.clone(),
                        source,
                    }
                })?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    /// Store `record` under `key`, replacing any previous entry
    pub fn insert(&self, key: &str, record: &V) -> Result<(), StorageError> {
        let value = serde_json::to_value(record).map_err(|source| StorageError::Json {
            path: self.path.clone(),
            source,
        })?;

        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut contents = self.read_object()?;
        contents.insert(key.to_string(), value);
        self.write_object(&contents)?;

        tracing::debug!("Stored entry for {:?} in {}", key, self.path.display());
        Ok(())
    }

    /// All keys currently in the file
    pub fn keys(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.read_object()?.keys().cloned().collect())
    }

    fn read_object(&self) -> Result<Map<String, Value>, StorageError> {
        if !self.path.exists() {
            return Ok(Map::new());
        }

        let json = fs::read_to_string(&self.path).map_err(|source| StorageError::Io {
            path: self.path.clone(),
            source,
        })?;
        let value: Value = serde_json::from_str(&json).map_err(|source| StorageError::Json {
            path: self.path.clone(),
            source,
        })?;

        match value {
            Value::Object(map) => Ok(map),
            _ => Err(StorageError::NotAnObject {
                path: self.path.clone(),
            }),
        }
    }

    fn write_object(&self, contents: &Map<String, Value>) -> Result<(), StorageError> {
        let bytes = to_pretty_json(contents).map_err(|source| StorageError::Json {
            path: self.path.clone(),
            source,
        })?;
        write_atomic(&self.path, &bytes).map_err(|source| StorageError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

/// Pretty-print with four-space indentation
pub fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, serde_json::Error> {
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    value.serialize(&mut serializer)?;
    Ok(out)
}

/// Write to a sibling temp file, then rename over `path`
fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent)?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "store.json".to_string());
    let tmp_path = parent.join(format!(".{}.{}.tmp", file_name, uuid::Uuid::new_v4()));

    let result = (|| {
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        fs::rename(&tmp_path, path)
    })();

    if result.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    result
}
