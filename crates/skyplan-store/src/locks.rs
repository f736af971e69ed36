//! Per-key write serialization.
//!
//! The document store itself is last-write-wins at whole-document
//! granularity, so two concurrent read-modify-write cycles against the same
//! key can lose updates. Every mutation of a project's mission collection
//! must run under that project's lock.
//!
//! The registry mutex uses `unwrap()` for the same reason the in-memory
//! store does: poisoning means another thread panicked while holding it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Hands out one async mutex per store key.
///
/// Entries live for the lifetime of the process; the key space is one entry
/// per project.
#[derive(Debug, Default)]
pub struct KeyedLocks {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock for `key`, waiting until any current holder releases
    /// it. The guard is owned and may be held across await points.
    pub async fn acquire(&self, key: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap();
            Arc::clone(locks.entry(key.to_string()).or_default())
        };
        lock.lock_owned().await
    }
}
