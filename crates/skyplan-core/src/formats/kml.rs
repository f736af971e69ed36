//! KML (Keyhole Markup Language) mission plan reader.
//!
//! Parses KML 2.2 documents, including the Google `gx` extension namespace,
//! into the canonical feature collection. Only the geometry kinds a mission
//! plan can carry are extracted: LineString, gx:Track, Polygon and Point.

use quick_xml::events::Event;
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::reader::NsReader;
use serde_json::{Map, Value};

use crate::error::{Result, SkyplanError};
use crate::models::{Feature, FeatureCollection, Geometry, Position};

const KML_NS: &str = "http://www.opengis.net/kml/2.2";
const GX_NS: &str = "http://www.google.com/kml/ext/2.2";

/// Parse a KML document into the canonical feature collection.
///
/// Every `Placemark`, at any depth, contributes at most one feature. A
/// Placemark yielding no usable geometry is skipped; a document yielding no
/// features at all fails with [`SkyplanError::NoSupportedGeometry`].
pub fn parse(data: &[u8]) -> Result<FeatureCollection> {
    let root = parse_tree(data)?;

    let mut features = Vec::new();
    for placemark in root.descendants(KML_NS, "Placemark") {
        let Some(geometry) = placemark_geometry(placemark) else {
            continue;
        };

        let mut properties = Map::new();
        if let Some(name) = placemark
            .find_child(KML_NS, "name")
            .map(XmlElement::text)
            .filter(|text| !text.is_empty())
        {
            properties.insert("name".to_string(), Value::String(name.to_string()));
        }

        features.push(Feature {
            properties,
            geometry,
        });
    }

    if features.is_empty() {
        return Err(SkyplanError::NoSupportedGeometry);
    }

    Ok(FeatureCollection::new(features))
}

/// Geometry resolution for one Placemark. The priority order LineString,
/// gx:Track, Polygon, Point is fixed: a Placemark with several geometry
/// children picks the first kind found in this list, not the first in
/// document order.
fn placemark_geometry(placemark: &XmlElement) -> Option<Geometry> {
    if let Some(line) = placemark.find_descendant(KML_NS, "LineString") {
        let coordinates = coordinates_text(line)
            .map(parse_coordinate_text)
            .unwrap_or_default();
        if coordinates.len() >= 2 {
            return Some(Geometry::LineString { coordinates });
        }
    }

    if let Some(track) = placemark.find_descendant(GX_NS, "Track") {
        let coordinates: Vec<Position> = track
            .children
            .iter()
            .filter(|child| child.is(GX_NS, "coord"))
            .filter_map(|child| parse_track_sample(child.text()))
            .collect();
        if coordinates.len() >= 2 {
            return Some(Geometry::LineString { coordinates });
        }
    }

    if let Some(polygon) = placemark.find_descendant(KML_NS, "Polygon") {
        if let Some(coordinates) = polygon_rings(polygon) {
            return Some(Geometry::Polygon { coordinates });
        }
    }

    if let Some(point) = placemark.find_descendant(KML_NS, "Point") {
        let mut coordinates = coordinates_text(point)
            .map(parse_coordinate_text)
            .unwrap_or_default();
        if !coordinates.is_empty() {
            return Some(Geometry::Point {
                coordinates: coordinates.remove(0),
            });
        }
    }

    None
}

fn coordinates_text(element: &XmlElement) -> Option<&str> {
    element.find_child(KML_NS, "coordinates").map(XmlElement::text)
}

/// Outer ring from `outerBoundaryIs/LinearRing/coordinates`, requiring at
/// least four positions. Every `innerBoundaryIs/LinearRing/coordinates` is
/// appended as parsed, with no minimum.
fn polygon_rings(polygon: &XmlElement) -> Option<Vec<Vec<Position>>> {
    let outer = polygon
        .find_descendant(KML_NS, "outerBoundaryIs")
        .and_then(|boundary| boundary.find_child(KML_NS, "LinearRing"))
        .and_then(|ring| ring.find_child(KML_NS, "coordinates"))
        .map(|coords| parse_coordinate_text(coords.text()))?;

    if outer.len() < 4 {
        return None;
    }

    let mut rings = vec![outer];
    for boundary in polygon.descendants(KML_NS, "innerBoundaryIs") {
        if let Some(inner) = boundary
            .find_child(KML_NS, "LinearRing")
            .and_then(|ring| ring.find_child(KML_NS, "coordinates"))
        {
            rings.push(parse_coordinate_text(inner.text()));
        }
    }
    Some(rings)
}

/// Shared coordinate-text parser: whitespace-separated groups of
/// comma-separated tokens. A group needs a finite longitude and latitude or
/// it is dropped; an unparseable altitude degrades the group to 2D.
fn parse_coordinate_text(text: &str) -> Vec<Position> {
    text.split_whitespace()
        .filter_map(|group| {
            let mut tokens = group.split(',').filter(|token| !token.is_empty());
            let lon = parse_finite(tokens.next()?)?;
            let lat = parse_finite(tokens.next()?)?;
            let alt = tokens.next().and_then(parse_finite);
            Some(Position { lon, lat, alt })
        })
        .collect()
}

/// One `gx:coord` sample: whitespace-separated longitude, latitude and
/// optional altitude.
fn parse_track_sample(text: &str) -> Option<Position> {
    let mut tokens = text.split_whitespace();
    let lon = parse_finite(tokens.next()?)?;
    let lat = parse_finite(tokens.next()?)?;
    let alt = tokens.next().and_then(parse_finite);
    Some(Position { lon, lat, alt })
}

fn parse_finite(token: &str) -> Option<f64> {
    token.parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Minimal namespace-resolved element tree, enough to walk Placemarks the
/// way the geometry resolution rules require.
#[derive(Debug, Default)]
struct XmlElement {
    ns: Option<String>,
    name: String,
    text: String,
    children: Vec<XmlElement>,
}

impl XmlElement {
    fn is(&self, ns: &str, name: &str) -> bool {
        self.name == name && self.ns.as_deref() == Some(ns)
    }

    fn text(&self) -> &str {
        self.text.trim()
    }

    fn find_child(&self, ns: &str, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|child| child.is(ns, name))
    }

    /// First matching descendant in document order, excluding self.
    fn find_descendant(&self, ns: &str, name: &str) -> Option<&XmlElement> {
        for child in &self.children {
            if child.is(ns, name) {
                return Some(child);
            }
            if let Some(found) = child.find_descendant(ns, name) {
                return Some(found);
            }
        }
        None
    }

    /// All matching descendants in document order, excluding self.
    fn descendants(&self, ns: &str, name: &str) -> Vec<&XmlElement> {
        let mut found = Vec::new();
        self.collect_descendants(ns, name, &mut found);
        found
    }

    fn collect_descendants<'a>(&'a self, ns: &str, name: &str, found: &mut Vec<&'a XmlElement>) {
        for child in &self.children {
            if child.is(ns, name) {
                found.push(child);
            }
            child.collect_descendants(ns, name, found);
        }
    }
}

/// Parse raw XML into an element tree under a synthetic root.
fn parse_tree(data: &[u8]) -> Result<XmlElement> {
    let mut reader = NsReader::from_reader(data);
    let mut stack = vec![XmlElement::default()];
    let mut buf = Vec::new();

    loop {
        let (resolution, event) =
            reader
                .read_resolved_event_into(&mut buf)
                .map_err(|e| SkyplanError::InvalidPayload {
                    reason: format!("invalid KML: {e}"),
                })?;

        match event {
            Event::Start(start) => {
                stack.push(resolved_element(&resolution, start.local_name().as_ref()));
            }
            Event::Empty(start) => {
                let element = resolved_element(&resolution, start.local_name().as_ref());
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(element);
                }
            }
            Event::End(_) => {
                if stack.len() < 2 {
                    return Err(SkyplanError::InvalidPayload {
                        reason: "invalid KML: unmatched closing tag".to_string(),
                    });
                }
                if let Some(element) = stack.pop() {
                    if let Some(parent) = stack.last_mut() {
                        parent.children.push(element);
                    }
                }
            }
            Event::Text(text) => {
                let decoded = text.unescape().map_err(|e| SkyplanError::InvalidPayload {
                    reason: format!("invalid KML: {e}"),
                })?;
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&decoded);
                }
            }
            Event::CData(cdata) => {
                if let Some(current) = stack.last_mut() {
                    current
                        .text
                        .push_str(&String::from_utf8_lossy(&cdata.into_inner()));
                }
            }
            Event::Eof => break,
            _ => {}
        }

        buf.clear();
    }

    match (stack.pop(), stack.is_empty()) {
        (Some(root), true) if !root.children.is_empty() => Ok(root),
        (Some(_), true) => Err(SkyplanError::InvalidPayload {
            reason: "invalid KML: no root element".to_string(),
        }),
        _ => Err(SkyplanError::InvalidPayload {
            reason: "invalid KML: unexpected end of document".to_string(),
        }),
    }
}

fn resolved_element(resolution: &ResolveResult, local_name: &[u8]) -> XmlElement {
    let ns = match resolution {
        ResolveResult::Bound(Namespace(ns)) => Some(String::from_utf8_lossy(ns).into_owned()),
        _ => None,
    };
    XmlElement {
        ns,
        name: String::from_utf8_lossy(local_name).into_owned(),
        text: String::new(),
        children: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn kml_doc(body: &str) -> Vec<u8> {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<kml xmlns="http://www.opengis.net/kml/2.2" xmlns:gx="http://www.google.com/kml/ext/2.2">
  <Document>
{body}
  </Document>
</kml>"#
        )
        .into_bytes()
    }

    #[test]
    fn test_coordinate_text_parsing() {
        let coords = parse_coordinate_text("-122.4,37.8,10 -122.5,37.9");
        assert_eq!(
            coords,
            vec![
                Position::with_alt(-122.4, 37.8, 10.0),
                Position::new(-122.5, 37.9)
            ]
        );
    }

    #[test]
    fn test_coordinate_text_bad_altitude_degrades_to_2d() {
        let coords = parse_coordinate_text("1,2,x");
        assert_eq!(coords, vec![Position::new(1.0, 2.0)]);
    }

    #[test]
    fn test_coordinate_text_drops_unparseable_pairs() {
        let coords = parse_coordinate_text("a,b 3,4 5 ,,6,7");
        // "a,b" has no finite lon/lat; "5" is a single token; ",,6,7" keeps
        // its non-empty tokens and parses as lon=6 lat=7
        assert_eq!(coords, vec![Position::new(3.0, 4.0), Position::new(6.0, 7.0)]);
    }

    #[test]
    fn test_coordinate_text_rejects_non_finite() {
        assert!(parse_coordinate_text("inf,2 1,nan").is_empty());
    }

    #[test]
    fn test_coordinate_text_handles_newlines_and_tabs() {
        let coords = parse_coordinate_text("0,0\n\t1,1\n2,2");
        assert_eq!(coords.len(), 3);
    }

    #[test]
    fn test_linestring_placemark() {
        let data = kml_doc(
            r#"<Placemark>
  <name>Corridor</name>
  <LineString>
    <coordinates>
      -122.36,37.82,0
      -122.37,37.83,0
    </coordinates>
  </LineString>
</Placemark>"#,
        );
        let result = parse(&data).unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result.features[0].properties["name"], "Corridor");
        assert_eq!(result.features[0].geometry.kind(), "LineString");
    }

    #[test]
    fn test_linestring_needs_two_coordinates() {
        let data = kml_doc(
            r#"<Placemark>
  <LineString><coordinates>1,1</coordinates></LineString>
</Placemark>"#,
        );
        assert!(matches!(
            parse(&data).unwrap_err(),
            SkyplanError::NoSupportedGeometry
        ));
    }

    #[test]
    fn test_gx_track_becomes_linestring() {
        let data = kml_doc(
            r#"<Placemark>
  <gx:Track>
    <when>2020-01-01T00:00:00Z</when>
    <gx:coord>-122.2 37.4 156.0</gx:coord>
    <when>2020-01-01T00:00:10Z</when>
    <gx:coord>-122.3 37.5</gx:coord>
    <gx:coord>-122.4 37.6 junk</gx:coord>
  </gx:Track>
</Placemark>"#,
        );
        let result = parse(&data).unwrap();

        assert_eq!(result.len(), 1);
        let Geometry::LineString { coordinates } = &result.features[0].geometry else {
            panic!("expected a LineString");
        };
        assert_eq!(
            coordinates,
            &vec![
                Position::with_alt(-122.2, 37.4, 156.0),
                Position::new(-122.3, 37.5),
                Position::new(-122.4, 37.6),
            ]
        );
    }

    #[test]
    fn test_polygon_with_inner_rings() {
        let data = kml_doc(
            r#"<Placemark>
  <Polygon>
    <outerBoundaryIs>
      <LinearRing>
        <coordinates>0,0 4,0 4,4 0,0</coordinates>
      </LinearRing>
    </outerBoundaryIs>
    <innerBoundaryIs>
      <LinearRing>
        <coordinates>1,1 2,1 1,2</coordinates>
      </LinearRing>
    </innerBoundaryIs>
    <innerBoundaryIs>
      <LinearRing>
        <coordinates>junk</coordinates>
      </LinearRing>
    </innerBoundaryIs>
  </Polygon>
</Placemark>"#,
        );
        let result = parse(&data).unwrap();

        let Geometry::Polygon { coordinates } = &result.features[0].geometry else {
            panic!("expected a Polygon");
        };
        assert_eq!(coordinates.len(), 3);
        assert_eq!(coordinates[0].len(), 4);
        // Inner rings carry no minimum: a 3-point ring and an empty ring are
        // both kept
        assert_eq!(coordinates[1].len(), 3);
        assert!(coordinates[2].is_empty());
    }

    #[test]
    fn test_polygon_outer_ring_minimum_of_four() {
        let data = kml_doc(
            r#"<Placemark>
  <Polygon>
    <outerBoundaryIs>
      <LinearRing>
        <coordinates>0,0 4,0 4,4</coordinates>
      </LinearRing>
    </outerBoundaryIs>
  </Polygon>
</Placemark>"#,
        );
        assert!(matches!(
            parse(&data).unwrap_err(),
            SkyplanError::NoSupportedGeometry
        ));
    }

    #[test]
    fn test_point_placemark() {
        let data = kml_doc(
            r#"<Placemark>
  <name>Launch site</name>
  <Point><coordinates>-122.326897,47.644548,0</coordinates></Point>
</Placemark>"#,
        );
        let result = parse(&data).unwrap();

        assert_eq!(
            result.features[0].geometry,
            Geometry::Point {
                coordinates: Position::with_alt(-122.326897, 47.644548, 0.0)
            }
        );
    }

    #[test]
    fn test_priority_linestring_beats_polygon() {
        // Polygon first in document order; LineString still wins
        let data = kml_doc(
            r#"<Placemark>
  <Polygon>
    <outerBoundaryIs>
      <LinearRing>
        <coordinates>0,0 4,0 4,4 0,0</coordinates>
      </LinearRing>
    </outerBoundaryIs>
  </Polygon>
  <LineString><coordinates>0,0 1,1</coordinates></LineString>
</Placemark>"#,
        );
        let result = parse(&data).unwrap();
        assert_eq!(result.features[0].geometry.kind(), "LineString");
    }

    #[test]
    fn test_priority_falls_through_invalid_candidates() {
        // The LineString is too short, so the Point is used instead
        let data = kml_doc(
            r#"<Placemark>
  <LineString><coordinates>1,1</coordinates></LineString>
  <Point><coordinates>5,6</coordinates></Point>
</Placemark>"#,
        );
        let result = parse(&data).unwrap();
        assert_eq!(result.features[0].geometry.kind(), "Point");
    }

    #[test]
    fn test_placemark_without_geometry_is_skipped() {
        let data = kml_doc(
            r#"<Placemark><name>No geometry here</name></Placemark>
<Placemark><Point><coordinates>1,2</coordinates></Point></Placemark>"#,
        );
        let result = parse(&data).unwrap();
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn test_placemarks_found_in_nested_folders() {
        let data = kml_doc(
            r#"<Folder>
  <name>Flights</name>
  <Folder>
    <name>2020</name>
    <Placemark><Point><coordinates>1,2</coordinates></Point></Placemark>
  </Folder>
</Folder>"#,
        );
        let result = parse(&data).unwrap();
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn test_unnamed_placemark_has_empty_properties() {
        let data = kml_doc(r#"<Placemark><Point><coordinates>1,2</coordinates></Point></Placemark>"#);
        let result = parse(&data).unwrap();
        assert!(result.features[0].properties.is_empty());
    }

    #[test]
    fn test_malformed_xml_is_invalid_payload() {
        for doc in ["not valid xml", "<kml><Placemark></kml>", ""] {
            assert!(
                matches!(
                    parse(doc.as_bytes()).unwrap_err(),
                    SkyplanError::InvalidPayload { .. }
                ),
                "expected InvalidPayload for {doc:?}"
            );
        }
    }

    #[test]
    fn test_no_placemarks_is_no_supported_geometry() {
        let data = kml_doc("<name>Empty document</name>");
        assert!(matches!(
            parse(&data).unwrap_err(),
            SkyplanError::NoSupportedGeometry
        ));
    }

    #[test]
    fn test_elements_outside_kml_namespace_are_ignored() {
        let data = br#"<?xml version="1.0"?>
<kml xmlns="http://example.com/not-kml">
  <Placemark><Point><coordinates>1,2</coordinates></Point></Placemark>
</kml>"#;
        assert!(matches!(
            parse(data).unwrap_err(),
            SkyplanError::NoSupportedGeometry
        ));
    }

    proptest! {
        // The coordinate parser never panics and only ever emits finite
        // positions, whatever the text.
        #[test]
        fn prop_coordinate_text_never_panics(text in ".{0,256}") {
            for position in parse_coordinate_text(&text) {
                prop_assert!(position.lon.is_finite());
                prop_assert!(position.lat.is_finite());
                if let Some(alt) = position.alt {
                    prop_assert!(alt.is_finite());
                }
            }
        }

        // Well-formed groups all survive the parser.
        #[test]
        fn prop_well_formed_groups_all_parse(
            groups in proptest::collection::vec((-180.0f64..180.0, -90.0f64..90.0), 1..20)
        ) {
            let text = groups
                .iter()
                .map(|(lon, lat)| format!("{lon},{lat}"))
                .collect::<Vec<_>>()
                .join(" ");
            prop_assert_eq!(parse_coordinate_text(&text).len(), groups.len());
        }
    }
}
