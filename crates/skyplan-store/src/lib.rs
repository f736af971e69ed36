//! Skyplan Store - Storage adapters and write serialization
//!
//! This crate provides adapter implementations of the core `DocumentStore`
//! port plus the per-key lock that serializes read-modify-write cycles.

pub mod file;
pub mod locks;
pub mod memory;

pub use file::FileDocumentStore;
pub use locks::KeyedLocks;
pub use memory::MemoryDocumentStore;
