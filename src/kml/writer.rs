//! KML serialization.

use quick_xml::escape::escape;
use tracing::debug;

use super::KmlConfig;
use crate::model::{
    Coordinate, Feature, FeatureContent, Geometry, GroundOverlay, Style, StyleSheet,
};

const KML_NAMESPACE: &str = "http://www.opengis.net/kml/2.2";

/// Serialize a feature tree and its style sheet as a KML document.
///
/// The root is written as the `Document`; a non-folder root is wrapped in
/// one. Styles are written once, after all feature content of the document.
pub fn write_kml(root: &Feature, styles: &StyleSheet, config: &KmlConfig) -> String {
    let mut w = KmlWriter {
        out: String::new(),
        indent: config.indent,
    };

    if config.xml_declaration {
        w.out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    }
    w.out.push_str(&format!("<kml xmlns=\"{KML_NAMESPACE}\">\n"));

    if root.is_folder() {
        w.write_container(root, "Document", 1, Some(styles));
    } else {
        w.open_tag("Document", None, 1);
        w.write_feature(root, 2);
        w.write_styles(styles, 2);
        w.close_tag("Document", 1);
    }

    w.out.push_str("</kml>\n");
    w.out
}

struct KmlWriter {
    out: String,
    indent: usize,
}

impl KmlWriter {
    fn pad(&mut self, depth: usize) {
        for _ in 0..depth * self.indent {
            self.out.push(' ');
        }
    }

    fn open_tag(&mut self, name: &str, id: Option<&str>, depth: usize) {
        self.pad(depth);
        match id {
            Some(id) => self
                .out
                .push_str(&format!("<{name} id=\"{}\">\n", escape(id))),
            None => self.out.push_str(&format!("<{name}>\n")),
        }
    }

    fn close_tag(&mut self, name: &str, depth: usize) {
        self.pad(depth);
        self.out.push_str(&format!("</{name}>\n"));
    }

    fn text_element(&mut self, name: &str, text: &str, depth: usize) {
        self.pad(depth);
        self.out
            .push_str(&format!("<{name}>{}</{name}>\n", escape(text)));
    }

    fn write_feature(&mut self, feature: &Feature, depth: usize) {
        match feature.content() {
            FeatureContent::Folder(_) => self.write_container(feature, "Folder", depth, None),
            FeatureContent::Placemark(geometry) => {
                self.open_tag("Placemark", feature.id.as_deref(), depth);
                self.write_common(feature, depth + 1);
                self.write_extended_data(feature, depth + 1);
                self.write_geometry(geometry, depth + 1);
                self.close_tag("Placemark", depth);
            }
            FeatureContent::GroundOverlay(overlay) => {
                self.open_tag("GroundOverlay", feature.id.as_deref(), depth);
                self.write_common(feature, depth + 1);
                self.write_extended_data(feature, depth + 1);
                self.write_overlay(overlay, depth + 1);
                self.close_tag("GroundOverlay", depth);
            }
            FeatureContent::Unknown => {
                debug!(name = ?feature.name, "not writing unknown feature to KML");
            }
        }
    }

    fn write_container(
        &mut self,
        folder: &Feature,
        tag: &str,
        depth: usize,
        styles: Option<&StyleSheet>,
    ) {
        self.open_tag(tag, folder.id.as_deref(), depth);
        self.write_common(folder, depth + 1);
        if !folder.open {
            self.text_element("open", "0", depth + 1);
        }
        self.write_extended_data(folder, depth + 1);
        for child in folder.children() {
            self.write_feature(child, depth + 1);
        }
        if let Some(styles) = styles {
            self.write_styles(styles, depth + 1);
        }
        self.close_tag(tag, depth);
    }

    fn write_common(&mut self, feature: &Feature, depth: usize) {
        if let Some(style_ref) = &feature.style_ref {
            self.text_element("styleUrl", &format!("#{style_ref}"), depth);
        }
        if let Some(name) = &feature.name {
            self.text_element("name", name, depth);
        }
        if let Some(description) = &feature.description {
            self.text_element("description", description, depth);
        }
        if !feature.visible {
            self.text_element("visibility", "0", depth);
        }
    }

    fn write_extended_data(&mut self, feature: &Feature, depth: usize) {
        if feature.extended_data.is_empty() {
            return;
        }
        self.open_tag("ExtendedData", None, depth);
        for (name, value) in &feature.extended_data {
            self.pad(depth + 1);
            self.out.push_str(&format!(
                "<Data name=\"{}\"><value>{}</value></Data>\n",
                escape(name.as_str()),
                escape(value.as_str())
            ));
        }
        self.close_tag("ExtendedData", depth);
    }

    fn write_geometry(&mut self, geometry: &Geometry, depth: usize) {
        let tag = geometry.type_name();
        self.open_tag(tag, None, depth);
        match geometry {
            Geometry::Point(c) => self.write_coordinates(std::slice::from_ref(c), depth + 1),
            Geometry::LineString(coords) => self.write_coordinates(coords, depth + 1),
            Geometry::Polygon { outer, holes } => {
                self.write_ring("outerBoundaryIs", outer, depth + 1);
                for hole in holes {
                    self.write_ring("innerBoundaryIs", hole, depth + 1);
                }
            }
            Geometry::MultiGeometry(items) => {
                for item in items {
                    self.write_geometry(item, depth + 1);
                }
            }
        }
        self.close_tag(tag, depth);
    }

    fn write_ring(&mut self, boundary: &str, ring: &[Coordinate], depth: usize) {
        self.open_tag(boundary, None, depth);
        self.open_tag("LinearRing", None, depth + 1);
        self.write_coordinates(ring, depth + 2);
        self.close_tag("LinearRing", depth + 1);
        self.close_tag(boundary, depth);
    }

    fn write_coordinates(&mut self, coords: &[Coordinate], depth: usize) {
        let tuples: Vec<String> = coords
            .iter()
            .map(|c| format!("{},{},{}", c.longitude, c.latitude, c.altitude))
            .collect();
        self.pad(depth);
        self.out
            .push_str(&format!("<coordinates>{}</coordinates>\n", tuples.join(" ")));
    }

    fn write_overlay(&mut self, overlay: &GroundOverlay, depth: usize) {
        if let Some(color) = overlay.color {
            self.text_element("color", &color.to_kml_hex(), depth);
        }
        if let Some(href) = &overlay.icon_href {
            self.open_tag("Icon", None, depth);
            self.text_element("href", href, depth + 1);
            self.close_tag("Icon", depth);
        }
        if let Some(bb) = overlay.lat_lon_box {
            self.open_tag("LatLonBox", None, depth);
            self.text_element("north", &bb.north.to_string(), depth + 1);
            self.text_element("south", &bb.south.to_string(), depth + 1);
            self.text_element("east", &bb.east.to_string(), depth + 1);
            self.text_element("west", &bb.west.to_string(), depth + 1);
            if overlay.rotation != 0.0 {
                self.text_element("rotation", &overlay.rotation.to_string(), depth + 1);
            }
            self.close_tag("LatLonBox", depth);
        }
    }

    fn write_styles(&mut self, styles: &StyleSheet, depth: usize) {
        for (id, style) in styles.iter() {
            self.write_style(id, style, depth);
        }
    }

    fn write_style(&mut self, id: &str, style: &Style, depth: usize) {
        self.open_tag("Style", Some(id), depth);
        if style.line_color.is_some() || style.line_width.is_some() {
            self.open_tag("LineStyle", None, depth + 1);
            if let Some(color) = style.line_color {
                self.text_element("color", &color.to_kml_hex(), depth + 2);
            }
            if let Some(width) = style.line_width {
                self.text_element("width", &width.to_string(), depth + 2);
            }
            self.close_tag("LineStyle", depth + 1);
        }
        if let Some(fill) = style.fill_color {
            self.open_tag("PolyStyle", None, depth + 1);
            self.text_element("color", &fill.to_kml_hex(), depth + 2);
            self.close_tag("PolyStyle", depth + 1);
        }
        self.close_tag("Style", depth);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Color;

    fn write(root: &Feature, styles: &StyleSheet) -> String {
        write_kml(root, styles, &KmlConfig::default())
    }

    #[test]
    fn test_visibility_only_when_hidden() {
        let root = Feature::folder()
            .with_child(
                Feature::placemark(Geometry::Point(Coordinate::new(1.0, 2.0))).with_name("shown"),
            )
            .with_child(
                Feature::placemark(Geometry::Point(Coordinate::new(3.0, 4.0)))
                    .with_name("hidden")
                    .with_visibility(false),
            );
        let kml = write(&root, &StyleSheet::new());
        assert_eq!(kml.matches("<visibility>").count(), 1);
        assert!(kml.contains("<coordinates>1,2,0</coordinates>"));
    }

    #[test]
    fn test_styles_written_once_at_document_end() {
        let mut styles = StyleSheet::new();
        styles.insert("s1", Style::new().with_line(Color::rgba(255, 0, 0, 255), 2.0));
        let root = Feature::folder().with_child(
            Feature::folder()
                .with_name("inner")
                .with_child(Feature::placemark(Geometry::LineString(vec![])).with_style("s1")),
        );
        let kml = write(&root, &styles);

        assert_eq!(kml.matches("<Style id=\"s1\">").count(), 1);
        let style_at = kml.find("<Style").unwrap();
        let folder_end = kml.find("</Folder>").unwrap();
        let document_end = kml.find("</Document>").unwrap();
        assert!(folder_end < style_at && style_at < document_end);
        assert!(kml.contains("<styleUrl>#s1</styleUrl>"));
        assert!(kml.contains("<color>ff0000ff</color>"));
    }

    #[test]
    fn test_polygon_boundaries() {
        let ring = vec![Coordinate::new(0.0, 0.0), Coordinate::new(1.0, 0.0)];
        let root = Feature::folder().with_child(Feature::placemark(Geometry::Polygon {
            outer: ring.clone(),
            holes: vec![ring.clone(), ring],
        }));
        let kml = write(&root, &StyleSheet::new());
        assert_eq!(kml.matches("<outerBoundaryIs>").count(), 1);
        assert_eq!(kml.matches("<innerBoundaryIs>").count(), 2);
        assert_eq!(kml.matches("<LinearRing>").count(), 3);
    }

    #[test]
    fn test_escapes_text() {
        let root = Feature::folder().with_name("a < b & \"c\"");
        let kml = write(&root, &StyleSheet::new());
        assert!(kml.contains("<name>a &lt; b &amp; &quot;c&quot;</name>"));
    }

    #[test]
    fn test_non_folder_root_is_wrapped() {
        let root = Feature::placemark(Geometry::Point(Coordinate::new(1.0, 1.0)));
        let kml = write(&root, &StyleSheet::new());
        assert!(kml.contains("<Document>"));
        assert!(kml.contains("<Placemark>"));
    }

    #[test]
    fn test_unknown_features_are_left_out() {
        let root = Feature::folder().with_child(Feature::unknown("Unknown object - Compass"));
        let kml = write(&root, &StyleSheet::new());
        assert!(!kml.contains("Compass"));
    }
}
