//! # geotree
//!
//! Geographic feature trees with lossless conversion between KML and GeoJSON.
//!
//! ## Features
//!
//! - Folder/placemark/ground-overlay trees with cached bounding boxes
//! - Point, line, polygon (with holes) and multi-geometries
//! - Styles shared by reference through a [`StyleSheet`]
//! - Read and write KML, including styles and extended data
//! - Read and write GeoJSON (styles and altitude are not carried)
//!
//! ## Quick Start
//!
//! ```no_run
//! use geotree::{Document, Format};
//!
//! // Convert KML to GeoJSON
//! let doc = Document::open("tracks.kml").unwrap();
//! doc.save("tracks.geojson").unwrap();
//!
//! // Or go through text
//! let geojson = doc.to_string(Format::GeoJson);
//! let back = Document::from_str(&geojson, Format::GeoJson).unwrap();
//! ```
//!
//! ## Building Trees
//!
//! ```
//! use geotree::{Color, Coordinate, Feature, Geometry, Style, StyleSheet};
//!
//! let mut styles = StyleSheet::new();
//! let red = styles.add(Style::new().with_line(Color::rgba(255, 0, 0, 255), 3.0));
//!
//! let mut root = Feature::folder().with_name("Trip");
//! root.add_child(
//!     Feature::placemark(Geometry::LineString(vec![
//!         Coordinate::new(2.35, 48.85),
//!         Coordinate::new(4.83, 45.76),
//!     ]))
//!     .with_name("Paris - Lyon")
//!     .with_style(red),
//! )
//! .unwrap();
//!
//! let bbox = root.bounding_box().unwrap();
//! assert_eq!(bbox.north, 48.85);
//! assert_eq!(bbox.west, 2.35);
//! ```

pub mod document;
pub mod error;
pub mod geojson;
pub mod kml;
pub mod model;
pub(crate) mod util;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use document::{Codec, Document, Format};
pub use error::{Diagnostic, Error, Result};
pub use geojson::{GeoJsonCodec, GeoJsonConfig};
pub use kml::{KmlCodec, KmlConfig};
pub use model::{
    BoundingBox, Color, Coordinate, Feature, FeatureContent, FeatureKind, FeatureVisitor,
    Geometry, GroundOverlay, OverlaySource, Style, StyleResolver, StyleSheet, VisualBuilder, Walk,
};
