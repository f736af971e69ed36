//! Canonical geometry types used across all skyplan crates.
//!
//! These types mirror the GeoJSON wire shapes: a `Feature` serializes to
//! `{"type": "Feature", "properties": ..., "geometry": ...}` and a geometry
//! to `{"type": ..., "coordinates": ...}`.

use serde::de;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// A single longitude/latitude position with an optional altitude.
///
/// Serializes as a JSON array of two or three numbers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub lon: f64,
    pub lat: f64,
    pub alt: Option<f64>,
}

impl Position {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat, alt: None }
    }

    pub fn with_alt(lon: f64, lat: f64, alt: f64) -> Self {
        Self { lon, lat, alt: Some(alt) }
    }
}

impl Serialize for Position {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.alt {
            Some(alt) => (self.lon, self.lat, alt).serialize(serializer),
            None => (self.lon, self.lat).serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Position {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Vec::<f64>::deserialize(deserializer)?;
        // Tokens past the third (e.g. GeoJSON's discouraged extra dimensions)
        // are dropped rather than rejected.
        match raw.as_slice() {
            [lon, lat] => Ok(Position::new(*lon, *lat)),
            [lon, lat, alt, ..] => Ok(Position::with_alt(*lon, *lat, *alt)),
            _ => Err(de::Error::invalid_length(
                raw.len(),
                &"an array of 2 or 3 numbers",
            )),
        }
    }
}

/// Canonical geometry, tagged by its GeoJSON `type`.
///
/// Only the three kinds the mission planner works with are modeled; anything
/// else is filtered out during ingestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point { coordinates: Position },
    LineString { coordinates: Vec<Position> },
    Polygon { coordinates: Vec<Vec<Position>> },
}

impl Geometry {
    /// GeoJSON type name for this geometry.
    pub fn kind(&self) -> &'static str {
        match self {
            Geometry::Point { .. } => "Point",
            Geometry::LineString { .. } => "LineString",
            Geometry::Polygon { .. } => "Polygon",
        }
    }

    /// Structural minimums: a LineString needs at least two positions and a
    /// Polygon an outer ring of at least four. Inner rings carry no minimum.
    pub fn is_valid(&self) -> bool {
        match self {
            Geometry::Point { .. } => true,
            Geometry::LineString { coordinates } => coordinates.len() >= 2,
            Geometry::Polygon { coordinates } => {
                coordinates.first().is_some_and(|outer| outer.len() >= 4)
            }
        }
    }
}

/// A geometry with arbitrary JSON properties.
///
/// Serializes with an explicit `"type": "Feature"` tag; the tag is ignored
/// when deserializing stored records.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Feature {
    #[serde(default)]
    pub properties: Map<String, Value>,
    pub geometry: Geometry,
}

impl Serialize for Feature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Feature", 3)?;
        state.serialize_field("type", "Feature")?;
        state.serialize_field("properties", &self.properties)?;
        state.serialize_field("geometry", &self.geometry)?;
        state.end()
    }
}

impl Feature {
    /// Feature with empty properties.
    pub fn bare(geometry: Geometry) -> Self {
        Self {
            properties: Map::new(),
            geometry,
        }
    }
}

/// Ordered set of features, the canonical output of ingestion.
///
/// Ingestion never produces an empty collection; callers constructing one by
/// hand are expected to uphold that too.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

impl Serialize for FeatureCollection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("FeatureCollection", 2)?;
        state.serialize_field("type", "FeatureCollection")?;
        state.serialize_field("features", &self.features)?;
        state.end()
    }
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        Self { features }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}
