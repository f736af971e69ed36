//! Skyplan Core - Mission domain models, geometry ingestion, and ports
//!
//! This crate contains the domain logic for mission planning: the canonical
//! geometry model, the GeoJSON/KML ingestion pipeline, the mission record
//! builder, and the storage port definition.

pub mod error;
pub mod formats;
pub mod ingest;
pub mod models;
pub mod ports;

pub use error::{Result, SkyplanError};
