//! GeoJSON serialization.

use serde_json::{Map, Value, json};
use tracing::debug;

use super::GeoJsonConfig;
use crate::model::{Coordinate, Feature, FeatureContent, Geometry};

const CRS84: &str = "urn:ogc:def:crs:OGC:1.3:CRS84";

/// Build the GeoJSON value for a feature tree.
///
/// The root is always written as a `FeatureCollection`. Folders nest as
/// collections; ground overlays and unknown features have no GeoJSON form
/// and are left out.
pub fn to_geojson_value(root: &Feature, config: &GeoJsonConfig) -> Value {
    let mut object = match root.content() {
        FeatureContent::Folder(_) => collection(root),
        _ => {
            let mut object = Map::new();
            object.insert("type".into(), json!("FeatureCollection"));
            object.insert(
                "features".into(),
                Value::Array(feature_value(root).into_iter().collect()),
            );
            object
        }
    };
    if config.emit_crs {
        object.insert(
            "crs".into(),
            json!({ "type": "name", "properties": { "name": CRS84 } }),
        );
    }
    Value::Object(object)
}

/// Serialize a feature tree as GeoJSON text.
pub fn write_geojson(root: &Feature, config: &GeoJsonConfig) -> String {
    let value = to_geojson_value(root, config);
    let text = if config.pretty {
        serde_json::to_string_pretty(&value)
    } else {
        serde_json::to_string(&value)
    };
    // A Value tree with string keys always serializes.
    text.unwrap_or_default()
}

fn collection(folder: &Feature) -> Map<String, Value> {
    let mut object = Map::new();
    object.insert("type".into(), json!("FeatureCollection"));
    write_metadata(folder, &mut object);
    let features: Vec<Value> = folder.children().iter().filter_map(feature_value).collect();
    object.insert("features".into(), Value::Array(features));
    object
}

fn feature_value(feature: &Feature) -> Option<Value> {
    match feature.content() {
        FeatureContent::Folder(_) => Some(Value::Object(collection(feature))),
        FeatureContent::Placemark(geometry) => {
            let mut object = Map::new();
            object.insert("type".into(), json!("Feature"));
            object.insert("geometry".into(), geometry_value(geometry));
            write_metadata(feature, &mut object);
            object
                .entry("properties")
                .or_insert_with(|| Value::Object(Map::new()));
            Some(Value::Object(object))
        }
        FeatureContent::GroundOverlay(_) | FeatureContent::Unknown => {
            debug!(
                kind = feature.kind().as_str(),
                name = ?feature.name,
                "feature has no GeoJSON form, skipping"
            );
            None
        }
    }
}

/// Write `id`, the `visibility`/`open` foreign members when false, and a
/// `properties` object holding name, description and extended data.
/// Properties are omitted when there is nothing to carry.
fn write_metadata(feature: &Feature, object: &mut Map<String, Value>) {
    if let Some(id) = &feature.id {
        object.insert("id".into(), json!(id));
    }
    if !feature.visible {
        object.insert("visibility".into(), json!(false));
    }
    if !feature.open {
        object.insert("open".into(), json!(false));
    }

    let mut properties: Map<String, Value> = feature
        .extended_data
        .iter()
        .map(|(k, v)| (k.clone(), json!(v)))
        .collect();
    if let Some(name) = &feature.name {
        properties.insert("name".into(), json!(name));
    }
    if let Some(description) = &feature.description {
        properties.insert("description".into(), json!(description));
    }
    if !properties.is_empty() {
        object.insert("properties".into(), Value::Object(properties));
    }
}

fn geometry_value(geometry: &Geometry) -> Value {
    match geometry {
        Geometry::Point(c) => json!({ "type": "Point", "coordinates": position(c) }),
        Geometry::LineString(coords) => {
            json!({ "type": "LineString", "coordinates": positions(coords) })
        }
        Geometry::Polygon { outer, holes } => {
            let rings: Vec<Value> = std::iter::once(outer)
                .chain(holes)
                .map(|ring| positions(ring))
                .collect();
            json!({ "type": "Polygon", "coordinates": rings })
        }
        Geometry::MultiGeometry(items) => {
            let geometries: Vec<Value> = items.iter().map(geometry_value).collect();
            json!({ "type": "GeometryCollection", "geometries": geometries })
        }
    }
}

/// `[longitude, latitude]`. Altitude is not written.
fn position(c: &Coordinate) -> Value {
    json!([c.longitude, c.latitude])
}

fn positions(coords: &[Coordinate]) -> Value {
    Value::Array(coords.iter().map(position).collect())
}
