//! GeoJSON parsing.

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::document::Document;
use crate::error::{Diagnostic, Error, Result};
use crate::model::{Coordinate, Feature, Geometry, StyleSheet};

/// Parse a GeoJSON document into a feature tree.
///
/// A `FeatureCollection` becomes the root folder. A lone `Feature` or bare
/// geometry is wrapped in an unnamed root folder. Styles never appear in
/// GeoJSON, so the returned style sheet is always empty.
pub fn read_geojson(content: &str) -> Result<Document> {
    let value: Value = serde_json::from_str(content)?;
    let object = value
        .as_object()
        .ok_or_else(|| Error::MalformedDocument("GeoJSON root is not an object".into()))?;

    let mut reader = GeoJsonReader {
        diagnostics: Vec::new(),
    };

    let root = match type_of(object) {
        Some("FeatureCollection") => reader.read_collection(object)?,
        Some("Feature") => {
            let feature = reader.read_feature(object);
            Feature::folder().with_child(feature)
        }
        Some(kind) if is_geometry_type(kind) => {
            let feature = match reader.read_geometry(object) {
                Ok(geometry) => Feature::placemark(geometry),
                Err(reason) => reader.unsupported(kind, reason),
            };
            Feature::folder().with_child(feature)
        }
        Some(kind) => {
            return Err(Error::MalformedDocument(format!(
                "unsupported GeoJSON type {kind:?}"
            )));
        }
        None => {
            return Err(Error::MalformedDocument(
                "GeoJSON object has no \"type\"".into(),
            ));
        }
    };

    Ok(Document {
        root,
        styles: StyleSheet::new(),
        diagnostics: reader.diagnostics,
    })
}

fn type_of(object: &Map<String, Value>) -> Option<&str> {
    object.get("type").and_then(Value::as_str)
}

fn is_geometry_type(kind: &str) -> bool {
    matches!(
        kind,
        "Point"
            | "LineString"
            | "Polygon"
            | "MultiPoint"
            | "MultiLineString"
            | "MultiPolygon"
            | "GeometryCollection"
    )
}

struct GeoJsonReader {
    diagnostics: Vec<Diagnostic>,
}

impl GeoJsonReader {
    fn unsupported(&mut self, element: &str, reason: String) -> Feature {
        warn!(element, %reason, "GeoJSON geometry became an unknown feature");
        self.diagnostics.push(Diagnostic::UnsupportedGeometry {
            element: element.to_string(),
            reason,
        });
        Feature::unknown(format!("Unknown object - {element}"))
    }

    fn read_collection(&mut self, object: &Map<String, Value>) -> Result<Feature> {
        let mut folder = Feature::folder();
        apply_metadata(&mut folder, object);

        let features = match object.get("features") {
            Some(Value::Array(features)) => features.as_slice(),
            None | Some(Value::Null) => &[],
            Some(_) => {
                return Err(Error::MalformedDocument(
                    "\"features\" is not an array".into(),
                ));
            }
        };

        for item in features {
            let Some(item) = item.as_object() else {
                debug!("ignoring non-object entry in features");
                continue;
            };
            let child = match type_of(item) {
                Some("Feature") => self.read_feature(item),
                Some("FeatureCollection") => self.read_collection(item)?,
                other => {
                    debug!(kind = ?other, "ignoring entry in features");
                    continue;
                }
            };
            folder.add_child(child)?;
        }
        Ok(folder)
    }

    fn read_feature(&mut self, object: &Map<String, Value>) -> Feature {
        let mut feature = match object.get("geometry") {
            Some(Value::Object(geometry)) => match self.read_geometry(geometry) {
                Ok(geometry) => Feature::placemark(geometry),
                Err(reason) => {
                    let kind = type_of(geometry).unwrap_or("geometry").to_string();
                    self.unsupported(&kind, reason)
                }
            },
            _ => self.unsupported("null", "feature has no geometry".into()),
        };
        let fallback_name = feature.name.take();
        apply_metadata(&mut feature, object);
        if feature.name.is_none() {
            feature.name = fallback_name;
        }
        feature
    }

    fn read_geometry(
        &mut self,
        object: &Map<String, Value>,
    ) -> std::result::Result<Geometry, String> {
        let kind = type_of(object).ok_or("geometry has no \"type\"")?;

        if kind == "GeometryCollection" {
            let members = object
                .get("geometries")
                .and_then(Value::as_array)
                .ok_or("GeometryCollection without \"geometries\"")?;
            let mut items = Vec::with_capacity(members.len());
            for member in members {
                let Some(member) = member.as_object() else {
                    continue;
                };
                match self.read_geometry(member) {
                    Ok(geometry) => items.push(geometry),
                    Err(reason) => {
                        let element = type_of(member).unwrap_or("geometry").to_string();
                        warn!(%element, %reason, "dropping GeometryCollection member");
                        self.diagnostics
                            .push(Diagnostic::UnsupportedGeometry { element, reason });
                    }
                }
            }
            return Ok(Geometry::MultiGeometry(items));
        }

        let coordinates = object
            .get("coordinates")
            .ok_or_else(|| format!("{kind} without \"coordinates\""))?;

        match kind {
            "Point" => self
                .position(coordinates)
                .map(Geometry::Point)
                .ok_or_else(|| "invalid Point position".to_string()),
            "LineString" => Ok(Geometry::LineString(self.positions(coordinates)?)),
            "Polygon" => self.polygon(coordinates),
            "MultiPoint" => Ok(Geometry::MultiGeometry(
                self.positions(coordinates)?
                    .into_iter()
                    .map(Geometry::Point)
                    .collect(),
            )),
            "MultiLineString" => {
                let lines = as_array(coordinates)?
                    .iter()
                    .map(|line| self.positions(line).map(Geometry::LineString))
                    .collect::<std::result::Result<_, _>>()?;
                Ok(Geometry::MultiGeometry(lines))
            }
            "MultiPolygon" => {
                let polygons = as_array(coordinates)?
                    .iter()
                    .map(|polygon| self.polygon(polygon))
                    .collect::<std::result::Result<_, _>>()?;
                Ok(Geometry::MultiGeometry(polygons))
            }
            other => Err(format!("unsupported geometry type {other:?}")),
        }
    }

    fn polygon(&mut self, value: &Value) -> std::result::Result<Geometry, String> {
        let mut rings = as_array(value)?
            .iter()
            .map(|ring| self.positions(ring))
            .collect::<std::result::Result<Vec<_>, _>>()?
            .into_iter();
        let outer = rings.next().unwrap_or_default();
        Ok(Geometry::Polygon {
            outer,
            holes: rings.collect(),
        })
    }

    /// An array of positions. Positions that are not numeric are dropped.
    fn positions(&mut self, value: &Value) -> std::result::Result<Vec<Coordinate>, String> {
        Ok(as_array(value)?
            .iter()
            .filter_map(|p| self.position(p))
            .collect())
    }

    fn position(&mut self, value: &Value) -> Option<Coordinate> {
        let parsed = value.as_array().and_then(|parts| {
            let lon = parts.first()?.as_f64()?;
            let lat = parts.get(1)?.as_f64()?;
            let alt = match parts.get(2) {
                Some(alt) => alt.as_f64()?,
                None => 0.0,
            };
            Some(Coordinate::with_altitude(lon, lat, alt))
        });
        if parsed.is_none() {
            let tuple = value.to_string();
            warn!(%tuple, "dropping unparseable GeoJSON position");
            self.diagnostics.push(Diagnostic::NumericParseFailure { tuple });
        }
        parsed
    }
}

fn as_array(value: &Value) -> std::result::Result<&Vec<Value>, String> {
    value
        .as_array()
        .ok_or_else(|| format!("expected an array, found {value}"))
}

/// Copy `id` and `properties` onto a feature.
///
/// `name` and `description` are reserved properties; everything else goes
/// to extended data, with non-string values written as JSON text.
fn apply_metadata(feature: &mut Feature, object: &Map<String, Value>) {
    feature.id = match object.get("id") {
        Some(Value::String(id)) => Some(id.clone()),
        Some(Value::Number(id)) => Some(id.to_string()),
        _ => None,
    };
    feature.visible = read_flag(object, "visibility");
    feature.open = read_flag(object, "open");

    let Some(Value::Object(properties)) = object.get("properties") else {
        return;
    };
    for (key, value) in properties {
        let text = match value {
            Value::Null => continue,
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        match key.as_str() {
            "name" => feature.name = Some(text),
            "description" => feature.description = Some(text),
            _ => {
                feature.extended_data.insert(key.clone(), text);
            }
        }
    }
}

/// `visibility`/`open` foreign members. Absent or non-boolean means `true`.
fn read_flag(object: &Map<String, Value>, key: &str) -> bool {
    object.get(key).and_then(Value::as_bool).unwrap_or(true)
}
