//! GeoJSON interchange document
//!
//! The document is a FeatureCollection rebuilt from scratch on every
//! mutation — never incrementally patched — so it always reflects exactly
//! the current shape set. Circles have no GeoJSON geometry of their own and
//! serialize as Point features with a `radius` property (meters), matching
//! the de-facto convention of tile-map draw plugins.

use super::shapes::{DrawnShape, ShapeGeometry, ShapeStyle};
use crate::geo::LatLng;
use serde_json::{json, Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeoJsonError {
    #[error("invalid GeoJSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("unsupported document shape: {0}")]
    Unsupported(String),
}

/// Serialize the full shape set as a FeatureCollection.
pub fn document_from_shapes(shapes: &[DrawnShape]) -> Value {
    let features: Vec<Value> = shapes.iter().map(feature_from_shape).collect();
    json!({
        "type": "FeatureCollection",
        "features": features,
    })
}

fn feature_from_shape(shape: &DrawnShape) -> Value {
    let mut properties = style_properties(&shape.style);
    properties.insert("shapeId".to_string(), json!(shape.id.to_string()));

    let geometry = match &shape.geometry {
        ShapeGeometry::Point(p) => json!({
            "type": "Point",
            "coordinates": p.to_position(),
        }),
        ShapeGeometry::Line(points) => json!({
            "type": "LineString",
            "coordinates": positions(points),
        }),
        ShapeGeometry::Polygon(ring) => {
            // GeoJSON rings are closed: first position repeated last.
            let mut ring_positions = positions(ring);
            if let (Some(first), Some(last)) = (ring_positions.first(), ring_positions.last()) {
                if first != last {
                    let first = first.clone();
                    ring_positions.push(first);
                }
            }
            json!({
                "type": "Polygon",
                "coordinates": [ring_positions],
            })
        }
        ShapeGeometry::Circle {
            center,
            radius_meters,
        } => {
            properties.insert("radius".to_string(), json!(radius_meters));
            json!({
                "type": "Point",
                "coordinates": center.to_position(),
            })
        }
    };

    json!({
        "type": "Feature",
        "properties": Value::Object(properties),
        "geometry": geometry,
    })
}

fn style_properties(style: &ShapeStyle) -> Map<String, Value> {
    let mut properties = Map::new();
    properties.insert("color".to_string(), json!(style.stroke_color));
    properties.insert("weight".to_string(), json!(style.stroke_width));
    properties.insert("fillColor".to_string(), json!(style.fill_color));
    properties.insert("fillOpacity".to_string(), json!(style.fill_opacity));
    properties
}

fn positions(points: &[LatLng]) -> Vec<Value> {
    points.iter().map(|p| json!(p.to_position())).collect()
}

/// Parse a serialized document back into owned shapes (preload path).
///
/// Accepts a FeatureCollection or a single Feature. Features with
/// geometries the draw tools cannot produce are reported, not skipped:
/// a preloaded document is editable state, and silently dropping part of
/// it would lose operator data on the next save.
pub fn shapes_from_document(content: &str) -> Result<Vec<DrawnShape>, GeoJsonError> {
    let document: Value = serde_json::from_str(content)?;

    let features: Vec<&Value> = match document.get("type").and_then(Value::as_str) {
        Some("FeatureCollection") => document
            .get("features")
            .and_then(Value::as_array)
            .map(|f| f.iter().collect())
            .unwrap_or_default(),
        Some("Feature") => vec![&document],
        other => {
            return Err(GeoJsonError::Unsupported(format!(
                "expected FeatureCollection or Feature, got {:?}",
                other
            )))
        }
    };

    features.into_iter().map(shape_from_feature).collect()
}

fn shape_from_feature(feature: &Value) -> Result<DrawnShape, GeoJsonError> {
    let geometry = feature
        .get("geometry")
        .ok_or_else(|| GeoJsonError::Unsupported("feature without geometry".to_string()))?;
    let properties = feature.get("properties").cloned().unwrap_or(Value::Null);

    let geometry_type = geometry.get("type").and_then(Value::as_str).unwrap_or("");
    let shape_geometry = match geometry_type {
        "Point" => {
            let position = point_coordinates(geometry)?;
            match properties.get("radius").and_then(Value::as_f64) {
                Some(radius_meters) => ShapeGeometry::Circle {
                    center: position,
                    radius_meters,
                },
                None => ShapeGeometry::Point(position),
            }
        }
        "LineString" => ShapeGeometry::Line(line_coordinates(geometry)?),
        "Polygon" => {
            let mut ring = polygon_exterior(geometry)?;
            // Drop the closing duplicate; the model keeps open rings.
            if ring.len() > 1 && ring.first() == ring.last() {
                ring.pop();
            }
            ShapeGeometry::Polygon(ring)
        }
        other => {
            return Err(GeoJsonError::Unsupported(format!(
                "geometry type {other:?}"
            )))
        }
    };

    Ok(DrawnShape::new(shape_geometry, style_from_properties(&properties)))
}

fn style_from_properties(properties: &Value) -> ShapeStyle {
    let defaults = ShapeStyle::default();
    ShapeStyle {
        stroke_color: properties
            .get("color")
            .and_then(Value::as_str)
            .unwrap_or(&defaults.stroke_color)
            .to_string(),
        stroke_width: properties
            .get("weight")
            .and_then(Value::as_f64)
            .unwrap_or(defaults.stroke_width),
        fill_color: properties
            .get("fillColor")
            .and_then(Value::as_str)
            .unwrap_or(&defaults.fill_color)
            .to_string(),
        fill_opacity: properties
            .get("fillOpacity")
            .and_then(Value::as_f64)
            .unwrap_or(defaults.fill_opacity),
    }
}

fn point_coordinates(geometry: &Value) -> Result<LatLng, GeoJsonError> {
    let coords = geometry
        .get("coordinates")
        .and_then(Value::as_array)
        .ok_or_else(|| GeoJsonError::Unsupported("point without coordinates".to_string()))?;
    position_from_values(coords)
}

fn line_coordinates(geometry: &Value) -> Result<Vec<LatLng>, GeoJsonError> {
    geometry
        .get("coordinates")
        .and_then(Value::as_array)
        .ok_or_else(|| GeoJsonError::Unsupported("line without coordinates".to_string()))?
        .iter()
        .map(|v| {
            v.as_array()
                .ok_or_else(|| GeoJsonError::Unsupported("malformed position".to_string()))
                .and_then(|p| position_from_values(p))
        })
        .collect()
}

fn polygon_exterior(geometry: &Value) -> Result<Vec<LatLng>, GeoJsonError> {
    let rings = geometry
        .get("coordinates")
        .and_then(Value::as_array)
        .ok_or_else(|| GeoJsonError::Unsupported("polygon without coordinates".to_string()))?;
    let exterior = rings
        .first()
        .and_then(Value::as_array)
        .ok_or_else(|| GeoJsonError::Unsupported("polygon without exterior ring".to_string()))?;
    exterior
        .iter()
        .map(|v| {
            v.as_array()
                .ok_or_else(|| GeoJsonError::Unsupported("malformed position".to_string()))
                .and_then(|p| position_from_values(p))
        })
        .collect()
}

fn position_from_values(position: &[Value]) -> Result<LatLng, GeoJsonError> {
    match position {
        [lng, lat, ..] => match (lng.as_f64(), lat.as_f64()) {
            (Some(lng), Some(lat)) => Ok(LatLng::new(lat, lng)),
            _ => Err(GeoJsonError::Unsupported(
                "non-numeric position".to_string(),
            )),
        },
        _ => Err(GeoJsonError::Unsupported("short position".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn line() -> DrawnShape {
        DrawnShape::new(
            ShapeGeometry::Line(vec![LatLng::new(1.0, 2.0), LatLng::new(3.0, 4.0)]),
            ShapeStyle::default(),
        )
    }

    #[test]
    fn empty_shape_set_is_an_empty_collection() {
        let doc = document_from_shapes(&[]);
        assert_eq!(doc["type"], "FeatureCollection");
        assert_eq!(doc["features"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn circle_serializes_as_point_with_radius() {
        let shape = DrawnShape::new(
            ShapeGeometry::Circle {
                center: LatLng::new(37.7, -122.4),
                radius_meters: 250.0,
            },
            ShapeStyle::default(),
        );
        let doc = document_from_shapes(&[shape]);
        let feature = &doc["features"][0];
        assert_eq!(feature["geometry"]["type"], "Point");
        assert_eq!(feature["geometry"]["coordinates"], json!([-122.4, 37.7]));
        assert_eq!(feature["properties"]["radius"], json!(250.0));
    }

    #[test]
    fn polygon_ring_is_closed_on_output_and_reopened_on_input() {
        let shape = DrawnShape::new(
            ShapeGeometry::Polygon(vec![
                LatLng::new(0.0, 0.0),
                LatLng::new(0.0, 1.0),
                LatLng::new(1.0, 1.0),
            ]),
            ShapeStyle::default(),
        );
        let doc = document_from_shapes(&[shape.clone()]);
        let ring = doc["features"][0]["geometry"]["coordinates"][0]
            .as_array()
            .unwrap();
        assert_eq!(ring.len(), 4);
        assert_eq!(ring[0], ring[3]);

        let parsed = shapes_from_document(&doc.to_string()).unwrap();
        assert_eq!(parsed[0].geometry, shape.geometry);
    }

    #[test]
    fn round_trip_preserves_geometry_and_style() {
        let shapes = vec![
            line(),
            DrawnShape::new(ShapeGeometry::Point(LatLng::new(5.0, 6.0)), ShapeStyle::default()),
        ];
        let doc = document_from_shapes(&shapes);
        let parsed = shapes_from_document(&doc.to_string()).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].geometry, shapes[0].geometry);
        assert_eq!(parsed[1].geometry, shapes[1].geometry);
        assert_eq!(parsed[0].style, shapes[0].style);
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(
            shapes_from_document("{not json"),
            Err(GeoJsonError::Parse(_))
        ));
    }

    #[test]
    fn non_feature_document_is_unsupported() {
        let doc = json!({"type": "GeometryCollection", "geometries": []});
        assert!(matches!(
            shapes_from_document(&doc.to_string()),
            Err(GeoJsonError::Unsupported(_))
        ));
    }
}
