//! GeoJSON payload normalization.
//!
//! Inline mission geometry arrives in several shapes: a full
//! FeatureCollection, a single Feature, a bare geometry object, a JSON string
//! encoding any of those, or a plain list of features. Everything funnels
//! into one canonical [`FeatureCollection`].
//!
//! Filtering happens in two distinct passes: structurally unusable features
//! are dropped one by one without error, then the surviving set must be
//! non-empty.

use serde_json::{json, Map, Value};

use crate::error::{Result, SkyplanError};
use crate::models::{Feature, FeatureCollection, Geometry};

/// Normalize an inline geometry payload.
///
/// String payloads are decoded as JSON first; everything else is normalized
/// as-is.
pub fn normalize_payload(payload: &Value) -> Result<FeatureCollection> {
    match payload {
        Value::String(text) => normalize_text(text),
        other => normalize_value(other),
    }
}

/// Normalize a JSON-encoded geometry payload.
pub fn normalize_text(text: &str) -> Result<FeatureCollection> {
    let value: Value = serde_json::from_str(text).map_err(|e| SkyplanError::InvalidPayload {
        reason: e.to_string(),
    })?;
    normalize_value(&value)
}

/// Normalize an already-parsed geometry payload.
pub fn normalize_value(value: &Value) -> Result<FeatureCollection> {
    let candidates: Vec<Value> = match value {
        Value::Object(members) if members.contains_key("type") => {
            match members.get("type").and_then(Value::as_str) {
                Some("FeatureCollection") => members
                    .get("features")
                    .and_then(Value::as_array)
                    .cloned()
                    .unwrap_or_default(),
                Some("Feature") => vec![value.clone()],
                // A bare geometry: wrap it in a synthesized feature.
                _ => vec![json!({
                    "type": "Feature",
                    "properties": {},
                    "geometry": value,
                })],
            }
        }
        // Assume an already-extracted list of features.
        Value::Array(items) => items.clone(),
        _ => return Err(SkyplanError::UnsupportedFormat),
    };

    let features: Vec<Feature> = candidates.iter().filter_map(reduce_feature).collect();

    if features.is_empty() {
        return Err(SkyplanError::EmptyGeometry);
    }

    Ok(FeatureCollection::new(features))
}

/// Reduce one candidate to the canonical feature shape, or drop it.
fn reduce_feature(candidate: &Value) -> Option<Feature> {
    let members = candidate.as_object()?;
    let geometry = reduce_geometry(members.get("geometry")?)?;
    let properties = members
        .get("properties")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_else(Map::new);
    Some(Feature {
        properties,
        geometry,
    })
}

/// Reduce a raw geometry object to exactly `{type, coordinates}`, dropping
/// every other member, and apply the structural minimums.
fn reduce_geometry(raw: &Value) -> Option<Geometry> {
    let members = raw.as_object()?;
    let kind = members.get("type")?.as_str()?;
    let coordinates = members.get("coordinates").filter(|c| !c.is_null())?;

    let geometry: Geometry = serde_json::from_value(json!({
        "type": kind,
        "coordinates": coordinates,
    }))
    .ok()?;

    geometry.is_valid().then_some(geometry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Position;
    use proptest::prelude::*;

    #[test]
    fn test_bare_geometry_becomes_single_feature() {
        let payload = json!({"type": "Point", "coordinates": [1.5, 2.5]});
        let result = normalize_value(&payload).unwrap();

        assert_eq!(result.len(), 1);
        assert!(result.features[0].properties.is_empty());
        assert_eq!(
            result.features[0].geometry,
            Geometry::Point {
                coordinates: Position::new(1.5, 2.5)
            }
        );
    }

    #[test]
    fn test_feature_wraps_into_singleton_collection() {
        let payload = json!({
            "type": "Feature",
            "properties": {"name": "corridor"},
            "geometry": {"type": "LineString", "coordinates": [[0.0, 0.0], [1.0, 1.0]]}
        });
        let result = normalize_value(&payload).unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result.features[0].properties["name"], "corridor");
    }

    #[test]
    fn test_feature_collection_keeps_valid_features_in_order() {
        let payload = json!({
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "properties": {"n": 1},
                 "geometry": {"type": "Point", "coordinates": [0.0, 0.0]}},
                {"type": "Feature", "properties": {"n": 2}, "geometry": null},
                "not even an object",
                {"type": "Feature", "properties": {"n": 4},
                 "geometry": {"type": "Point", "coordinates": [4.0, 4.0]}},
                {"type": "Feature", "properties": {"n": 5},
                 "geometry": {"type": "Point"}}
            ]
        });
        let result = normalize_value(&payload).unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(result.features[0].properties["n"], 1);
        assert_eq!(result.features[1].properties["n"], 4);
    }

    #[test]
    fn test_list_payload_is_a_feature_list() {
        let payload = json!([
            {"type": "Feature", "properties": {},
             "geometry": {"type": "Point", "coordinates": [9.0, 9.0]}}
        ]);
        let result = normalize_value(&payload).unwrap();
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn test_string_payload_is_parsed_as_json() {
        let text = r#"{"type": "Point", "coordinates": [3.0, 4.0]}"#;
        let result = normalize_payload(&Value::String(text.to_string())).unwrap();
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn test_malformed_json_string_fails_with_invalid_payload() {
        let err = normalize_text("{not json").unwrap_err();
        assert!(matches!(err, SkyplanError::InvalidPayload { .. }));
    }

    #[test]
    fn test_scalar_payload_is_unsupported() {
        let err = normalize_value(&json!(42)).unwrap_err();
        assert!(matches!(err, SkyplanError::UnsupportedFormat));

        let err = normalize_value(&json!({"no_type_member": true})).unwrap_err();
        assert!(matches!(err, SkyplanError::UnsupportedFormat));
    }

    #[test]
    fn test_zero_surviving_features_is_an_error_not_empty() {
        let payload = json!({
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "properties": {}, "geometry": null},
                {"type": "Feature", "properties": {}}
            ]
        });
        let err = normalize_value(&payload).unwrap_err();
        assert!(matches!(err, SkyplanError::EmptyGeometry));

        let empty = json!({"type": "FeatureCollection", "features": []});
        assert!(matches!(
            normalize_value(&empty).unwrap_err(),
            SkyplanError::EmptyGeometry
        ));
    }

    #[test]
    fn test_geometry_is_reduced_to_type_and_coordinates() {
        let payload = json!({
            "type": "Feature",
            "properties": {},
            "geometry": {
                "type": "Point",
                "coordinates": [1.0, 2.0],
                "bbox": [1.0, 2.0, 1.0, 2.0],
                "crs": "EPSG:4326"
            }
        });
        let result = normalize_value(&payload).unwrap();
        let emitted = serde_json::to_value(&result.features[0].geometry).unwrap();
        assert_eq!(
            emitted,
            json!({"type": "Point", "coordinates": [1.0, 2.0]})
        );
    }

    #[test]
    fn test_unmodeled_geometry_kinds_are_filtered() {
        let payload = json!({
            "type": "MultiPolygon",
            "coordinates": [[[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]]]
        });
        let err = normalize_value(&payload).unwrap_err();
        assert!(matches!(err, SkyplanError::EmptyGeometry));
    }

    #[test]
    fn test_structural_minimums_filter_features() {
        // A one-point LineString and a three-point Polygon ring are dropped
        let payload = json!({
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "properties": {},
                 "geometry": {"type": "LineString", "coordinates": [[0.0, 0.0]]}},
                {"type": "Feature", "properties": {},
                 "geometry": {"type": "Polygon",
                              "coordinates": [[[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]]]}},
                {"type": "Feature", "properties": {},
                 "geometry": {"type": "Point", "coordinates": [2.0, 2.0]}}
            ]
        });
        let result = normalize_value(&payload).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result.features[0].geometry.kind(), "Point");
    }

    #[test]
    fn test_null_properties_default_to_empty_mapping() {
        let payload = json!({
            "type": "Feature",
            "properties": null,
            "geometry": {"type": "Point", "coordinates": [0.5, 0.5]}
        });
        let result = normalize_value(&payload).unwrap();
        assert!(result.features[0].properties.is_empty());
    }

    fn arb_position() -> impl Strategy<Value = Position> {
        (
            -180.0f64..180.0,
            -90.0f64..90.0,
            proptest::option::of(-500.0f64..9000.0),
        )
            .prop_map(|(lon, lat, alt)| Position { lon, lat, alt })
    }

    fn arb_geometry() -> impl Strategy<Value = Geometry> {
        let point = arb_position().prop_map(|coordinates| Geometry::Point { coordinates });
        let line = proptest::collection::vec(arb_position(), 2..12)
            .prop_map(|coordinates| Geometry::LineString { coordinates });
        let polygon = (
            proptest::collection::vec(arb_position(), 4..12),
            proptest::collection::vec(proptest::collection::vec(arb_position(), 0..6), 0..3),
        )
            .prop_map(|(outer, inners)| {
                let mut rings = vec![outer];
                rings.extend(inners);
                Geometry::Polygon { coordinates: rings }
            });
        prop_oneof![point, line, polygon]
    }

    proptest! {
        // Any structurally valid geometry passes through normalization as a
        // single bare feature, bit-for-bit.
        #[test]
        fn prop_valid_geometry_round_trips(geometry in arb_geometry()) {
            let payload = serde_json::to_value(&geometry).unwrap();
            let result = normalize_value(&payload).unwrap();

            prop_assert_eq!(result.len(), 1);
            prop_assert!(result.features[0].properties.is_empty());
            prop_assert_eq!(&result.features[0].geometry, &geometry);
        }
    }
}
