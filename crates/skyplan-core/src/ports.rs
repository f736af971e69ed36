use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

/// Port for the opaque JSON document store mission collections persist into.
///
/// The store enforces no schema; documents round-trip as raw JSON values
/// under string keys. Callers own the read-modify-write discipline.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch the document stored under `key`, if any.
    async fn get_document(&self, key: &str) -> Result<Option<Value>>;

    /// Store `document` under `key`, replacing any previous value.
    async fn put_document(&self, key: &str, document: Value) -> Result<()>;
}
