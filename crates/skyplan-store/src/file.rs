//! File-backed JSON document store.
//!
//! One `<key>.json` file per key under a root directory. Keys are restricted
//! to a filename-safe alphabet, so a key can never address a path outside
//! the store root.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::Value;

use skyplan_core::error::{Result, SkyplanError};
use skyplan_core::ports::DocumentStore;

/// File-per-key implementation of `DocumentStore`.
#[derive(Debug, Clone)]
pub struct FileDocumentStore {
    root: PathBuf,
}

impl FileDocumentStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        tracing::debug!(root = %root.display(), "Opened file document store");
        Ok(Self { root })
    }

    fn document_path(&self, key: &str) -> Result<PathBuf> {
        check_key(key)?;
        Ok(self.root.join(format!("{key}.json")))
    }
}

/// Containment check: a key must be a plain filename-safe token (no path
/// separators, no leading dot), so the document path stays inside the root.
fn check_key(key: &str) -> Result<()> {
    let safe = !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));

    if safe {
        Ok(())
    } else {
        Err(SkyplanError::InvalidStoreKey {
            key: key.to_string(),
        })
    }
}

#[async_trait]
impl DocumentStore for FileDocumentStore {
    async fn get_document(&self, key: &str) -> Result<Option<Value>> {
        let path = self.document_path(key)?;
        let raw = match fs::read(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let value = serde_json::from_slice(&raw).map_err(|e| {
            SkyplanError::Serialization(format!("{}: {e}", path.display()))
        })?;
        Ok(Some(value))
    }

    async fn put_document(&self, key: &str, document: Value) -> Result<()> {
        let path = self.document_path(key)?;
        let raw = serde_json::to_vec(&document)
            .map_err(|e| SkyplanError::Serialization(e.to_string()))?;
        fs::write(&path, raw)?;
        Ok(())
    }
}
