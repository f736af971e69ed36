//! Geometry ingestion formats.
//!
//! Uploaded mission plans arrive as raw bytes plus a filename. The filename
//! extension alone decides the parser: `.kml` goes to the KML reader and
//! everything else is decoded as UTF-8 text and handed to the GeoJSON
//! normalizer. There is deliberately no content sniffing.

pub mod geojson;
pub mod kml;

use crate::error::Result;
use crate::models::FeatureCollection;

/// Normalize an uploaded plan file into the canonical feature collection.
pub fn normalize_upload(file_name: &str, data: &[u8]) -> Result<FeatureCollection> {
    tracing::debug!(file_name = %file_name, bytes = data.len(), "Normalizing uploaded plan");

    if file_name.to_ascii_lowercase().ends_with(".kml") {
        kml::parse(data)
    } else {
        // Undecodable bytes are replaced rather than failing the upload.
        let text = String::from_utf8_lossy(data);
        geojson::normalize_text(&text)
    }
}
