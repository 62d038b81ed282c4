//! KML parsing.
//!
//! Two passes over the element tree: every `Style` element is collected
//! first, then folders and placemarks are converted in document order.
//! Per-element problems are recovered locally and recorded as diagnostics.

use std::collections::BTreeMap;

use tracing::{debug, trace, warn};

use super::KmlConfig;
use super::dom::{self, Element};
use crate::document::Document;
use crate::error::{Diagnostic, Result};
use crate::model::{
    BoundingBox, Color, Coordinate, Feature, Geometry, GroundOverlay, Style, StyleSheet,
};

const GEOMETRY_ELEMENTS: &[&str] = &["Point", "LineString", "Polygon", "MultiGeometry"];

/// Parse a KML document into a feature tree and its styles.
pub fn read_kml(content: &str, config: &KmlConfig) -> Result<Document> {
    let root = dom::parse_document(content)?;
    let styles = collect_styles(&root);
    debug!(styles = styles.len(), "collected KML styles");

    let mut reader = KmlReader {
        config,
        diagnostics: Vec::new(),
    };
    let tree = reader.read_root(&root);

    Ok(Document {
        root: tree,
        styles,
        diagnostics: reader.diagnostics,
    })
}

/// Gather every `Style` element with an id, wherever it appears.
fn collect_styles(root: &Element) -> StyleSheet {
    let mut elements = Vec::new();
    root.find_all("Style", &mut elements);

    let mut sheet = StyleSheet::new();
    for element in elements {
        let Some(id) = element.attr("id").filter(|id| !id.is_empty()) else {
            trace!("ignoring Style without id");
            continue;
        };
        sheet.insert(id, read_style(element));
    }
    sheet
}

fn read_style(element: &Element) -> Style {
    let mut style = Style::new();
    if let Some(line) = element.child("LineStyle") {
        style.line_color = line.child_text("color").and_then(Color::from_kml_hex);
        style.line_width = line.child_text("width").and_then(|w| w.parse().ok());
    }
    if let Some(poly) = element.child("PolyStyle") {
        style.fill_color = poly.child_text("color").and_then(Color::from_kml_hex);
    }
    style
}

/// Attributes every KML feature element may carry.
struct Common {
    id: Option<String>,
    name: Option<String>,
    description: Option<String>,
    visible: bool,
    open: bool,
    style_ref: Option<String>,
    extended_data: BTreeMap<String, String>,
}

impl Common {
    fn new(element: &Element) -> Self {
        Self {
            id: element.attr("id").map(str::to_string),
            name: None,
            description: None,
            visible: true,
            open: true,
            style_ref: None,
            extended_data: BTreeMap::new(),
        }
    }

    /// Take in `child` if it is one of the common elements.
    fn accept(&mut self, child: &Element) -> bool {
        match child.name.as_str() {
            "name" => self.name = Some(child.text.clone()),
            "description" => self.description = Some(child.text.clone()),
            "visibility" => self.visible = parse_bool(&child.text, true),
            "open" => self.open = parse_bool(&child.text, true),
            "styleUrl" => {
                let url = child.text.trim();
                let url = url.strip_prefix('#').unwrap_or(url);
                if !url.is_empty() {
                    self.style_ref = Some(url.to_string());
                }
            }
            "ExtendedData" => {
                for data in child.children_named("Data") {
                    if let Some(name) = data.attr("name") {
                        let value = data.child("value").map(|v| v.text.clone());
                        self.extended_data.insert(name.to_string(), value.unwrap_or_default());
                    }
                }
            }
            _ => return false,
        }
        true
    }

    fn apply(self, mut feature: Feature) -> Feature {
        feature.id = self.id;
        feature.name = self.name;
        feature.description = self.description;
        feature.visible = self.visible;
        feature.open = self.open;
        feature.style_ref = self.style_ref;
        feature.extended_data = self.extended_data;
        feature
    }
}

struct KmlReader<'a> {
    config: &'a KmlConfig,
    diagnostics: Vec<Diagnostic>,
}

impl KmlReader<'_> {
    fn note(&mut self, diagnostic: Diagnostic) {
        match &diagnostic {
            Diagnostic::SkippedPlacemark { .. } => debug!("{diagnostic}"),
            _ => warn!("{diagnostic}"),
        }
        self.diagnostics.push(diagnostic);
    }

    /// Accepts `kml > Document`, a bare `Document`/`Folder`, or any other root
    /// whose feature children become the children of an anonymous folder.
    fn read_root(&mut self, root: &Element) -> Feature {
        if root.name == "Document" || root.name == "Folder" {
            return self.read_container(root);
        }

        let features: Vec<&Element> = root
            .children
            .iter()
            .filter(|c| is_feature_element(&c.name))
            .collect();
        if let [only] = features.as_slice()
            && (only.name == "Document" || only.name == "Folder")
        {
            return self.read_container(only);
        }

        if is_feature_element(&root.name) {
            let mut folder = Feature::folder();
            if let Some(feature) = self.read_feature(root) {
                let _ = folder.add_child(feature);
            }
            return folder;
        }

        self.read_container(root)
    }

    fn read_container(&mut self, element: &Element) -> Feature {
        let mut common = Common::new(element);
        let mut folder = Feature::folder();

        for child in &element.children {
            if common.accept(child) {
                continue;
            }
            if let Some(feature) = self.read_feature(child) {
                let _ = folder.add_child(feature);
            }
        }

        common.apply(folder)
    }

    fn read_feature(&mut self, element: &Element) -> Option<Feature> {
        match element.name.as_str() {
            "Document" | "Folder" => Some(self.read_container(element)),
            "Placemark" => self.read_placemark(element),
            "GroundOverlay" => Some(self.read_ground_overlay(element)),
            other => {
                trace!(element = other, "ignoring unrecognized element");
                None
            }
        }
    }

    fn read_placemark(&mut self, element: &Element) -> Option<Feature> {
        let mut common = Common::new(element);
        let mut geometry: Option<(&str, std::result::Result<Geometry, String>)> = None;

        for child in &element.children {
            if common.accept(child) {
                continue;
            }
            if GEOMETRY_ELEMENTS.contains(&child.name.as_str()) {
                if geometry.is_none() {
                    geometry = Some((child.name.as_str(), self.read_geometry(child)));
                } else {
                    debug!(element = %child.name, "placemark already has a geometry, ignoring");
                }
            }
        }

        match geometry {
            None => {
                self.note(Diagnostic::SkippedPlacemark {
                    name: common.name.clone(),
                });
                None
            }
            Some((_, Ok(geometry))) => Some(common.apply(Feature::placemark(geometry))),
            Some((element, Err(reason))) => {
                self.note(Diagnostic::UnsupportedGeometry {
                    element: element.to_string(),
                    reason,
                });
                let name = common
                    .name
                    .clone()
                    .unwrap_or_else(|| format!("Unknown object - {element}"));
                let mut feature = common.apply(Feature::unknown(name.clone()));
                feature.name = Some(name);
                Some(feature)
            }
        }
    }

    fn read_geometry(&mut self, element: &Element) -> std::result::Result<Geometry, String> {
        match element.name.as_str() {
            "Point" => {
                let coords = self.read_coordinates(element)?;
                coords
                    .first()
                    .copied()
                    .map(Geometry::Point)
                    .ok_or_else(|| "no valid coordinate".to_string())
            }
            "LineString" => Ok(Geometry::LineString(self.read_coordinates(element)?)),
            "Polygon" => {
                let outer = element
                    .child("outerBoundaryIs")
                    .ok_or_else(|| "missing <outerBoundaryIs>".to_string())?;
                let outer = self.read_coordinates(outer)?;

                let mut holes = Vec::new();
                if self.config.parse_holes {
                    for boundary in element.children_named("innerBoundaryIs") {
                        for ring in boundary.children_named("LinearRing") {
                            holes.push(self.read_coordinates(ring)?);
                        }
                    }
                }
                Ok(Geometry::Polygon { outer, holes })
            }
            "MultiGeometry" => {
                let mut items = Vec::new();
                for child in &element.children {
                    if !GEOMETRY_ELEMENTS.contains(&child.name.as_str()) {
                        continue;
                    }
                    match self.read_geometry(child) {
                        Ok(g) => items.push(g),
                        Err(reason) => self.note(Diagnostic::UnsupportedGeometry {
                            element: child.name.clone(),
                            reason,
                        }),
                    }
                }
                Ok(Geometry::MultiGeometry(items))
            }
            other => Err(format!("<{other}> is not a geometry")),
        }
    }

    /// Parse the first `coordinates` element under `element`.
    fn read_coordinates(
        &mut self,
        element: &Element,
    ) -> std::result::Result<Vec<Coordinate>, String> {
        let coordinates = element
            .find("coordinates")
            .ok_or_else(|| "missing <coordinates>".to_string())?;

        let mut list = Vec::new();
        for tuple in coordinates.text.split_whitespace() {
            match parse_tuple(tuple) {
                Some(c) => list.push(c),
                None => self.note(Diagnostic::NumericParseFailure {
                    tuple: tuple.to_string(),
                }),
            }
        }
        Ok(list)
    }

    fn read_ground_overlay(&mut self, element: &Element) -> Feature {
        let mut common = Common::new(element);
        let mut overlay = GroundOverlay::default();

        for child in &element.children {
            if common.accept(child) {
                continue;
            }
            match child.name.as_str() {
                "color" => overlay.color = Color::from_kml_hex(&child.text),
                "Icon" => overlay.icon_href = child.child_text("href").map(str::to_string),
                "LatLonBox" => {
                    let edge =
                        |name: &str| child.child_text(name).and_then(|v| v.parse::<f64>().ok());
                    if let (Some(north), Some(south), Some(east), Some(west)) =
                        (edge("north"), edge("south"), edge("east"), edge("west"))
                    {
                        overlay.lat_lon_box = Some(BoundingBox::new(north, south, east, west));
                    }
                    overlay.rotation = edge("rotation").unwrap_or(0.0);
                }
                _ => {}
            }
        }

        common.apply(Feature::ground_overlay(overlay))
    }
}

fn is_feature_element(name: &str) -> bool {
    matches!(name, "Document" | "Folder" | "Placemark" | "GroundOverlay")
}

/// Parse `lon,lat[,alt]`.
fn parse_tuple(tuple: &str) -> Option<Coordinate> {
    let mut parts = tuple.split(',');
    let lon = parts.next()?.trim().parse::<f64>().ok()?;
    let lat = parts.next()?.trim().parse::<f64>().ok()?;
    let alt = match parts.next() {
        Some(a) if !a.trim().is_empty() => a.trim().parse::<f64>().ok()?,
        _ => 0.0,
    };
    if parts.next().is_some() {
        return None;
    }
    Some(Coordinate::with_altitude(lon, lat, alt))
}

fn parse_bool(text: &str, default: bool) -> bool {
    match text.trim() {
        "0" | "false" => false,
        "1" | "true" => true,
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FeatureKind;

    fn read(content: &str) -> Document {
        read_kml(content, &KmlConfig::default()).unwrap()
    }

    #[test]
    fn test_parse_tuple() {
        assert_eq!(parse_tuple("2.3,48.8"), Some(Coordinate::new(2.3, 48.8)));
        assert_eq!(
            parse_tuple("2.3,48.8,120"),
            Some(Coordinate::with_altitude(2.3, 48.8, 120.0))
        );
        assert_eq!(parse_tuple("x,48.8"), None);
        assert_eq!(parse_tuple("2.3"), None);
        assert_eq!(parse_tuple("1,2,3,4"), None);
    }

    #[test]
    fn test_bad_tuple_is_dropped() {
        let doc = read(
            "<Document><Placemark><LineString>\
             <coordinates>1,2 oops 3,4</coordinates>\
             </LineString></Placemark></Document>",
        );
        let line = &doc.root.children()[0];
        assert_eq!(
            line.geometry(),
            Some(&Geometry::LineString(vec![
                Coordinate::new(1.0, 2.0),
                Coordinate::new(3.0, 4.0)
            ]))
        );
        assert_eq!(
            doc.diagnostics,
            vec![Diagnostic::NumericParseFailure {
                tuple: "oops".into()
            }]
        );
    }

    #[test]
    fn test_first_geometry_wins() {
        let doc = read(
            "<Document><Placemark>\
             <Point><coordinates>1,1</coordinates></Point>\
             <LineString><coordinates>2,2 3,3</coordinates></LineString>\
             </Placemark></Document>",
        );
        assert_eq!(doc.root.children().len(), 1);
        assert_eq!(doc.root.children()[0].kind(), FeatureKind::Point);
    }

    #[test]
    fn test_placemark_without_geometry_is_skipped() {
        let doc = read(
            "<Document><name>d</name><Placemark><name>empty</name></Placemark>\
             <Placemark><Point><coordinates>1,1</coordinates></Point></Placemark></Document>",
        );
        assert_eq!(doc.root.name.as_deref(), Some("d"));
        assert_eq!(doc.root.children().len(), 1);
        assert_eq!(
            doc.diagnostics,
            vec![Diagnostic::SkippedPlacemark {
                name: Some("empty".into())
            }]
        );
    }

    #[test]
    fn test_unconvertible_geometry_becomes_unknown() {
        let doc = read(
            "<Document><Placemark><name>p</name><Point><coordinates>bad</coordinates></Point></Placemark>\
             <Placemark><Point><coordinates>5,5</coordinates></Point></Placemark></Document>",
        );
        let kinds: Vec<_> = doc.root.children().iter().map(Feature::kind).collect();
        assert_eq!(kinds, vec![FeatureKind::Unknown, FeatureKind::Point]);
        assert_eq!(doc.root.children()[0].name.as_deref(), Some("p"));
        assert!(doc.diagnostics.iter().any(|d| matches!(
            d,
            Diagnostic::UnsupportedGeometry { element, .. } if element == "Point"
        )));
    }

    #[test]
    fn test_polygon_holes_follow_config() {
        let content = "<Document><Placemark><Polygon>\
             <outerBoundaryIs><LinearRing><coordinates>0,0 4,0 4,4 0,0</coordinates></LinearRing></outerBoundaryIs>\
             <innerBoundaryIs><LinearRing><coordinates>1,1 2,1 2,2 1,1</coordinates></LinearRing></innerBoundaryIs>\
             </Polygon></Placemark></Document>";

        let doc = read(content);
        match doc.root.children()[0].geometry() {
            Some(Geometry::Polygon { outer, holes }) => {
                assert_eq!(outer.len(), 4);
                assert_eq!(holes.len(), 1);
            }
            other => panic!("expected polygon, got {:?}", other),
        }

        let config = KmlConfig {
            parse_holes: false,
            ..Default::default()
        };
        let doc = read_kml(content, &config).unwrap();
        match doc.root.children()[0].geometry() {
            Some(Geometry::Polygon { holes, .. }) => assert!(holes.is_empty()),
            other => panic!("expected polygon, got {:?}", other),
        }
    }

    #[test]
    fn test_styles_anywhere_and_after_use() {
        let doc = read(
            r##"<kml><Document>
              <Placemark><styleUrl>#late</styleUrl><Point><coordinates>0,0</coordinates></Point></Placemark>
              <Folder><Style id="nested"><PolyStyle><color>80ff0000</color></PolyStyle></Style></Folder>
              <Style id="late"><LineStyle><color>ff0000ff</color><width>2.5</width></LineStyle></Style>
            </Document></kml>"##,
        );
        assert_eq!(doc.styles.len(), 2);
        let late = doc.styles.get("late").unwrap();
        assert_eq!(late.line_color, Some(Color::rgba(0xff, 0, 0, 0xff)));
        assert_eq!(late.line_width, Some(2.5));
        assert_eq!(
            doc.styles.get("nested").unwrap().fill_color,
            Some(Color::rgba(0, 0, 0xff, 0x80))
        );
        assert_eq!(doc.root.children()[0].style_ref.as_deref(), Some("late"));
    }

    #[test]
    fn test_ground_overlay() {
        let doc = read(
            "<Document><GroundOverlay id='g'><name>scan</name><color>7fffffff</color>\
             <Icon><href>map.png</href></Icon>\
             <LatLonBox><north>10</north><south>0</south><east>20</east><west>5</west><rotation>15</rotation></LatLonBox>\
             </GroundOverlay></Document>",
        );
        let go = &doc.root.children()[0];
        assert_eq!(go.kind(), FeatureKind::GroundOverlay);
        assert_eq!(go.id.as_deref(), Some("g"));
        let overlay = go.overlay().unwrap();
        assert_eq!(overlay.icon_href.as_deref(), Some("map.png"));
        assert_eq!(overlay.rotation, 15.0);
        assert_eq!(go.bounding_box(), Some(BoundingBox::new(10.0, 0.0, 20.0, 5.0)));
        assert_eq!(doc.root.bounding_box(), go.bounding_box());
    }

    #[test]
    fn test_text_fields_keep_whitespace() {
        let doc = read(
            "<Document><Placemark><name> padded </name>\
             <description>line one\n</description>\
             <ExtendedData><Data name=\"k\"><value> v </value></Data></ExtendedData>\
             <visibility> 0 </visibility>\
             <Point><coordinates> 1,2 </coordinates></Point></Placemark></Document>",
        );
        let placemark = &doc.root.children()[0];
        assert_eq!(placemark.name.as_deref(), Some(" padded "));
        assert_eq!(placemark.description.as_deref(), Some("line one\n"));
        assert_eq!(placemark.extended_data.get("k").map(String::as_str), Some(" v "));
        assert!(!placemark.visible);
        assert_eq!(placemark.geometry(), Some(&Geometry::Point(Coordinate::new(1.0, 2.0))));
    }

    #[test]
    fn test_bare_placemark_root() {
        let doc = read(
            "<Placemark><name>solo</name><Point><coordinates>1,2</coordinates></Point></Placemark>",
        );
        assert!(doc.root.is_folder());
        assert_eq!(doc.root.children()[0].name.as_deref(), Some("solo"));
    }
}
