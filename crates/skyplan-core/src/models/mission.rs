use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::geometry::FeatureCollection;

/// How a mission's geometry entered the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissionSource {
    /// Drawn or pasted as an inline GeoJSON payload.
    Manual,
    /// Extracted from an uploaded GeoJSON or KML file.
    Upload,
}

/// A planned flight mission, persisted inside a project-scoped collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mission {
    /// Assigned once at creation, immutable afterwards.
    pub id: Uuid,

    pub name: String,

    pub notes: String,

    /// Planned capture date, normalized to a calendar date.
    pub capture_date: Option<NaiveDate>,

    /// Canonical mission geometry.
    pub geometry: FeatureCollection,

    pub source: MissionSource,

    /// Original filename when the geometry came from an upload.
    pub file_name: Option<String>,

    /// Immutable after creation.
    pub created_at: DateTime<Utc>,

    /// Refreshed on every update.
    pub updated_at: DateTime<Utc>,
}
