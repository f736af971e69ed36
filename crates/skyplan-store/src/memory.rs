//! In-memory document store for development and testing.
//!
//! This implementation uses `RwLock::unwrap()` intentionally. Lock poisoning
//! only occurs when another thread panicked while holding the lock, which is
//! an unrecoverable state. For persistent deployments, use the file-backed
//! store.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde_json::Value;

use skyplan_core::error::Result;
use skyplan_core::ports::DocumentStore;

/// In-memory implementation of `DocumentStore`.
#[derive(Debug, Clone, Default)]
pub struct MemoryDocumentStore {
    documents: Arc<RwLock<HashMap<String, Value>>>,
}

impl MemoryDocumentStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get_document(&self, key: &str) -> Result<Option<Value>> {
        let documents = self.documents.read().unwrap();
        Ok(documents.get(key).cloned())
    }

    async fn put_document(&self, key: &str, document: Value) -> Result<()> {
        let mut documents = self.documents.write().unwrap();
        documents.insert(key.to_string(), document);
        Ok(())
    }
}
