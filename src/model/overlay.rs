//! Import of externally drawn shapes into the feature tree.
//!
//! Map front-ends describe what the user drew as an [`OverlaySource`]. The
//! conversion is best effort: sources with no feature counterpart become
//! [`FeatureKind::Unknown`](super::FeatureKind::Unknown) features rather than
//! errors.

use tracing::debug;

use super::feature::{Feature, FeatureKind};
use super::geometry::{Coordinate, Geometry};
use super::style::{Color, Style, StyleSheet};

/// A shape as described by a map front-end.
#[derive(Debug, Clone, PartialEq)]
pub enum OverlaySource {
    Marker {
        title: Option<String>,
        snippet: Option<String>,
        position: Coordinate,
        enabled: bool,
    },
    Polyline {
        points: Vec<Coordinate>,
        color: Color,
        width: f32,
        enabled: bool,
    },
    Polygon {
        title: Option<String>,
        snippet: Option<String>,
        points: Vec<Coordinate>,
        holes: Vec<Vec<Coordinate>>,
        fill_color: Color,
        stroke_color: Color,
        stroke_width: f32,
        enabled: bool,
    },
    Folder {
        name: Option<String>,
        description: Option<String>,
        items: Vec<OverlaySource>,
        enabled: bool,
    },
    /// A grouping of markers with no metadata of its own.
    Cluster {
        items: Vec<OverlaySource>,
        enabled: bool,
    },
    /// Anything else. Only its type name survives the import.
    Other { type_name: String },
}

impl Feature {
    /// Build a feature from an overlay description.
    ///
    /// Lines and polygons get a style derived from their colors and widths,
    /// added to `styles`. Groupings are converted recursively; members that
    /// convert to unknown features are left out of the resulting folder.
    pub fn from_overlay(source: &OverlaySource, styles: &mut StyleSheet) -> Feature {
        match source {
            OverlaySource::Marker {
                title,
                snippet,
                position,
                enabled,
            } => {
                let mut f =
                    Feature::placemark(Geometry::Point(*position)).with_visibility(*enabled);
                f.name = title.clone();
                f.description = snippet.clone();
                f
            }
            OverlaySource::Polyline {
                points,
                color,
                width,
                enabled,
            } => {
                let style_ref = styles.add(Style::new().with_line(*color, *width));
                Feature::placemark(Geometry::LineString(points.clone()))
                    .with_name(format!("LineString - {} points", points.len()))
                    .with_style(style_ref)
                    .with_visibility(*enabled)
            }
            OverlaySource::Polygon {
                title,
                snippet,
                points,
                holes,
                fill_color,
                stroke_color,
                stroke_width,
                enabled,
            } => {
                let style_ref = styles.add(
                    Style::new()
                        .with_line(*stroke_color, *stroke_width)
                        .with_fill(*fill_color),
                );
                let mut f = Feature::placemark(Geometry::Polygon {
                    outer: points.clone(),
                    holes: holes.clone(),
                })
                .with_style(style_ref)
                .with_visibility(*enabled);
                f.name = title.clone();
                f.description = snippet.clone();
                f
            }
            OverlaySource::Folder {
                name,
                description,
                items,
                enabled,
            } => {
                let mut f = Feature::folder().with_visibility(*enabled);
                f.add_overlays(items, styles);
                f.name = name.clone();
                f.description = description.clone();
                f
            }
            OverlaySource::Cluster { items, enabled } => {
                let mut f = Feature::folder().with_visibility(*enabled);
                f.add_overlays(items, styles);
                f
            }
            OverlaySource::Other { type_name } => {
                debug!(%type_name, "no feature counterpart for overlay");
                Feature::unknown(format!("Unknown object - {type_name}"))
            }
        }
    }

    /// Convert `source` and append it to this folder.
    ///
    /// Returns false when this is not a folder or the source converts to an
    /// unknown feature; nothing is added in either case.
    pub fn add_overlay(&mut self, source: &OverlaySource, styles: &mut StyleSheet) -> bool {
        if !self.is_folder() {
            return false;
        }
        let item = Feature::from_overlay(source, styles);
        if item.kind() == FeatureKind::Unknown {
            return false;
        }
        self.add_child(item).is_ok()
    }

    /// Convert and append every source, skipping unsupported ones.
    pub fn add_overlays(&mut self, sources: &[OverlaySource], styles: &mut StyleSheet) {
        for source in sources {
            self.add_overlay(source, styles);
        }
    }
}
