//! In-memory model of geographic features.
//!
//! - [`Geometry`] and [`Coordinate`]: shape values
//! - [`Feature`]: the folder/placemark/overlay tree with cached boxes
//! - [`StyleSheet`]: styles shared by reference
//! - [`OverlaySource`]: best-effort import of externally drawn shapes

mod bbox;
mod feature;
mod geometry;
mod overlay;
mod style;
mod walk;

pub use bbox::BoundingBox;
pub use feature::{Feature, FeatureContent, FeatureKind, GroundOverlay};
pub use geometry::{Coordinate, Geometry};
pub use overlay::OverlaySource;
pub use style::{Color, Style, StyleResolver, StyleSheet};
pub use walk::{FeatureVisitor, VisualBuilder, Walk};
