//! Error types for Skyplan

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SkyplanError {
    // Geometry ingestion errors
    #[error("Invalid geometry payload: {reason}")]
    InvalidPayload { reason: String },

    #[error("Unsupported geometry format")]
    UnsupportedFormat,

    #[error("No valid features found in geometry")]
    EmptyGeometry,

    #[error("No supported geometries were found in the KML file")]
    NoSupportedGeometry,

    // Mission errors
    #[error("A mission plan requires a geometry or a GeoJSON/KML file")]
    MissingGeometry,

    #[error("Invalid capture date format. Use YYYY-MM-DD")]
    InvalidDate,

    #[error("Mission not found: {id}")]
    MissionNotFound { id: String },

    // Storage errors
    #[error("Invalid store key: {key}")]
    InvalidStoreKey { key: String },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SkyplanError>;
