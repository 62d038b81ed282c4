//! The feature tree: folders, placemarks and ground overlays.
//!
//! Each [`Feature`] owns its payload exclusively: a folder owns its children,
//! a placemark owns its geometry. Every node caches the bounding box of its
//! subtree. Adding a child unions the child's box into the folder's box;
//! removing a child recomputes the folder's box from the remaining children,
//! since a sibling may or may not still reach the removed extreme.

use std::collections::BTreeMap;

use tracing::warn;

use super::bbox::{BoundingBox, union_opt};
use super::geometry::{Coordinate, Geometry};
use super::style::Color;
use crate::error::{Error, Result};

/// Kind of a feature, derived from its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureKind {
    Folder,
    Point,
    LineString,
    Polygon,
    MultiGeometry,
    GroundOverlay,
    Unknown,
}

impl FeatureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FeatureKind::Folder => "Folder",
            FeatureKind::Point => "Point",
            FeatureKind::LineString => "LineString",
            FeatureKind::Polygon => "Polygon",
            FeatureKind::MultiGeometry => "MultiGeometry",
            FeatureKind::GroundOverlay => "GroundOverlay",
            FeatureKind::Unknown => "Unknown",
        }
    }
}

/// An image draped over a lat/lon box.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GroundOverlay {
    pub icon_href: Option<String>,
    pub color: Option<Color>,
    pub lat_lon_box: Option<BoundingBox>,
    /// Rotation in degrees, counter-clockwise.
    pub rotation: f64,
}

/// Kind-specific payload of a feature.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureContent {
    Folder(Vec<Feature>),
    Placemark(Geometry),
    GroundOverlay(GroundOverlay),
    Unknown,
}

/// A node of the feature tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub visible: bool,
    /// Only meaningful for folders.
    pub open: bool,
    /// Key into a [`StyleSheet`](super::StyleSheet). Never an owned style.
    pub style_ref: Option<String>,
    pub extended_data: BTreeMap<String, String>,
    content: FeatureContent,
    bounding_box: Option<BoundingBox>,
}

impl Feature {
    fn with_content(content: FeatureContent) -> Self {
        let mut feature = Self {
            id: None,
            name: None,
            description: None,
            visible: true,
            open: true,
            style_ref: None,
            extended_data: BTreeMap::new(),
            content,
            bounding_box: None,
        };
        feature.bounding_box = feature.own_bounding_box();
        feature
    }

    /// An empty folder.
    pub fn folder() -> Self {
        Self::with_content(FeatureContent::Folder(Vec::new()))
    }

    /// A placemark carrying `geometry`.
    pub fn placemark(geometry: Geometry) -> Self {
        Self::with_content(FeatureContent::Placemark(geometry))
    }

    pub fn ground_overlay(overlay: GroundOverlay) -> Self {
        Self::with_content(FeatureContent::GroundOverlay(overlay))
    }

    /// A feature that could not be converted. `name` says what it was.
    pub fn unknown(name: impl Into<String>) -> Self {
        Self::with_content(FeatureContent::Unknown).with_name(name)
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_style(mut self, style_ref: impl Into<String>) -> Self {
        self.style_ref = Some(style_ref.into());
        self
    }

    pub fn with_visibility(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    pub fn with_extended_data(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_extended_data(name, value);
        self
    }

    /// Append a child, builder style. Non-folders are returned unchanged
    /// and the child is dropped with a warning.
    pub fn with_child(mut self, child: Feature) -> Self {
        if let Err(err) = self.add_child(child) {
            warn!(kind = self.kind().as_str(), name = ?self.name, "with_child: {err}");
        }
        self
    }

    pub fn kind(&self) -> FeatureKind {
        match &self.content {
            FeatureContent::Folder(_) => FeatureKind::Folder,
            FeatureContent::Placemark(Geometry::Point(_)) => FeatureKind::Point,
            FeatureContent::Placemark(Geometry::LineString(_)) => FeatureKind::LineString,
            FeatureContent::Placemark(Geometry::Polygon { .. }) => FeatureKind::Polygon,
            FeatureContent::Placemark(Geometry::MultiGeometry(_)) => FeatureKind::MultiGeometry,
            FeatureContent::GroundOverlay(_) => FeatureKind::GroundOverlay,
            FeatureContent::Unknown => FeatureKind::Unknown,
        }
    }

    pub fn is_folder(&self) -> bool {
        matches!(self.content, FeatureContent::Folder(_))
    }

    pub fn content(&self) -> &FeatureContent {
        &self.content
    }

    /// Children of a folder; empty for every other kind.
    pub fn children(&self) -> &[Feature] {
        match &self.content {
            FeatureContent::Folder(children) => children,
            _ => &[],
        }
    }

    pub fn geometry(&self) -> Option<&Geometry> {
        match &self.content {
            FeatureContent::Placemark(g) => Some(g),
            _ => None,
        }
    }

    pub fn overlay(&self) -> Option<&GroundOverlay> {
        match &self.content {
            FeatureContent::GroundOverlay(o) => Some(o),
            _ => None,
        }
    }

    /// Cached box of the whole subtree. `None` when it holds no coordinates.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        self.bounding_box
    }

    /// Set `name = value` in the extended data, replacing any previous value.
    pub fn set_extended_data(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.extended_data.insert(name.into(), value.into());
    }

    /// Append `child` to this folder and widen the folder's box.
    pub fn add_child(&mut self, child: Feature) -> Result<()> {
        let FeatureContent::Folder(children) = &mut self.content else {
            return Err(Error::NotAFolder);
        };
        self.bounding_box = union_opt(self.bounding_box, child.bounding_box);
        children.push(child);
        Ok(())
    }

    /// Remove and return the child at `index`, recomputing the folder's box
    /// from the children that remain.
    pub fn remove_child(&mut self, index: usize) -> Result<Feature> {
        let FeatureContent::Folder(children) = &mut self.content else {
            return Err(Error::NotAFolder);
        };
        if index >= children.len() {
            return Err(Error::IndexOutOfRange {
                index,
                len: children.len(),
            });
        }
        let removed = children.remove(index);
        self.bounding_box = self.own_bounding_box();
        Ok(removed)
    }

    /// Mutable access to a child.
    ///
    /// Edits made through the returned reference do not propagate to this
    /// folder's box; call [`Feature::recompute_bounding_box`] afterwards.
    pub fn child_mut(&mut self, index: usize) -> Option<&mut Feature> {
        match &mut self.content {
            FeatureContent::Folder(children) => children.get_mut(index),
            _ => None,
        }
    }

    /// Edit the geometry of a placemark in place and re-derive its box.
    ///
    /// Returns `None` without calling `edit` when this is not a placemark.
    pub fn edit_geometry<R>(&mut self, edit: impl FnOnce(&mut Geometry) -> R) -> Option<R> {
        let FeatureContent::Placemark(geometry) = &mut self.content else {
            return None;
        };
        let result = edit(geometry);
        self.bounding_box = geometry.bounding_box();
        Some(result)
    }

    /// Move a point placemark, as when its marker is dragged.
    ///
    /// Returns false, leaving the feature untouched, for non-point features.
    pub fn set_point(&mut self, position: Coordinate) -> bool {
        if self.kind() != FeatureKind::Point {
            return false;
        }
        self.edit_geometry(|g| *g = Geometry::Point(position)).is_some()
    }

    /// Edit a ground overlay in place and re-derive its box.
    pub fn edit_overlay<R>(&mut self, edit: impl FnOnce(&mut GroundOverlay) -> R) -> Option<R> {
        let FeatureContent::GroundOverlay(overlay) = &mut self.content else {
            return None;
        };
        let result = edit(overlay);
        self.bounding_box = overlay.lat_lon_box;
        Some(result)
    }

    /// Recompute every cached box in the subtree from its geometry.
    pub fn recompute_bounding_box(&mut self) -> Option<BoundingBox> {
        if let FeatureContent::Folder(children) = &mut self.content {
            for child in children.iter_mut() {
                child.recompute_bounding_box();
            }
        }
        self.bounding_box = self.own_bounding_box();
        self.bounding_box
    }

    /// Box of the subtree computed from the leaves, ignoring every cache.
    pub fn computed_bounding_box(&self) -> Option<BoundingBox> {
        match &self.content {
            FeatureContent::Folder(children) => children
                .iter()
                .map(Feature::computed_bounding_box)
                .fold(None, union_opt),
            _ => self.own_bounding_box(),
        }
    }

    /// Box from the payload, trusting the children's cached boxes.
    fn own_bounding_box(&self) -> Option<BoundingBox> {
        match &self.content {
            FeatureContent::Folder(children) => children
                .iter()
                .map(|c| c.bounding_box)
                .fold(None, union_opt),
            FeatureContent::Placemark(g) => g.bounding_box(),
            FeatureContent::GroundOverlay(o) => o.lat_lon_box,
            FeatureContent::Unknown => None,
        }
    }
}

impl Default for Feature {
    fn default() -> Self {
        Self::folder()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(lon: f64, lat: f64) -> Feature {
        Feature::placemark(Geometry::Point(Coordinate::new(lon, lat)))
    }

    #[test]
    fn test_defaults() {
        let f = Feature::folder();
        assert!(f.visible);
        assert!(f.open);
        assert_eq!(f.kind(), FeatureKind::Folder);
        assert_eq!(f.bounding_box(), None);
        assert!(f.children().is_empty());
    }

    #[test]
    fn test_with_child_on_placemark_is_unchanged() {
        let placemark = point(1.0, 2.0).with_name("p");
        let built = placemark.clone().with_child(point(5.0, 5.0));
        assert_eq!(built, placemark);
        assert_eq!(built.bounding_box(), placemark.bounding_box());
    }

    #[test]
    fn test_kind_follows_geometry() {
        assert_eq!(point(0.0, 0.0).kind(), FeatureKind::Point);
        assert_eq!(
            Feature::placemark(Geometry::LineString(vec![])).kind(),
            FeatureKind::LineString
        );
        assert_eq!(
            Feature::placemark(Geometry::polygon(vec![])).kind(),
            FeatureKind::Polygon
        );
        assert_eq!(
            Feature::placemark(Geometry::MultiGeometry(vec![])).kind(),
            FeatureKind::MultiGeometry
        );
        assert_eq!(Feature::unknown("x").kind(), FeatureKind::Unknown);
    }

    #[test]
    fn test_add_child_to_placemark_fails() {
        let mut p = point(1.0, 1.0);
        let before = p.clone();
        let err = p.add_child(point(2.0, 2.0)).unwrap_err();
        assert!(matches!(err, Error::NotAFolder));
        assert_eq!(p, before);
    }

    #[test]
    fn test_remove_child_out_of_range() {
        let mut f = Feature::folder().with_child(point(1.0, 1.0));
        let err = f.remove_child(1).unwrap_err();
        assert!(matches!(err, Error::IndexOutOfRange { index: 1, len: 1 }));
        assert_eq!(f.children().len(), 1);
    }

    #[test]
    fn test_add_child_unions_box() {
        let mut f = Feature::folder();
        f.add_child(point(1.0, 2.0)).unwrap();
        f.add_child(point(-3.0, 5.0)).unwrap();
        assert_eq!(f.bounding_box(), Some(BoundingBox::new(5.0, 2.0, 1.0, -3.0)));
    }

    #[test]
    fn test_remove_sole_extreme_shrinks_box() {
        let mut f = Feature::folder()
            .with_child(point(0.0, 0.0))
            .with_child(point(10.0, 10.0))
            .with_child(point(5.0, 5.0));
        let removed = f.remove_child(1).unwrap();
        assert_eq!(removed.kind(), FeatureKind::Point);
        assert_eq!(f.bounding_box(), Some(BoundingBox::new(5.0, 0.0, 5.0, 0.0)));
    }

    #[test]
    fn test_remove_non_extreme_keeps_box() {
        let mut f = Feature::folder()
            .with_child(point(0.0, 0.0))
            .with_child(point(5.0, 5.0))
            .with_child(point(10.0, 10.0));
        let before = f.bounding_box();
        f.remove_child(1).unwrap();
        assert_eq!(f.bounding_box(), before);
    }

    #[test]
    fn test_removing_last_child_clears_box() {
        let mut f = Feature::folder().with_child(point(3.0, 4.0));
        f.remove_child(0).unwrap();
        assert_eq!(f.bounding_box(), None);
    }

    #[test]
    fn test_set_point_updates_own_box() {
        let mut p = point(1.0, 1.0);
        assert!(p.set_point(Coordinate::new(7.0, 8.0)));
        assert_eq!(p.bounding_box(), Some(BoundingBox::new(8.0, 8.0, 7.0, 7.0)));

        let mut line = Feature::placemark(Geometry::LineString(vec![]));
        assert!(!line.set_point(Coordinate::new(0.0, 0.0)));
        assert_eq!(line.kind(), FeatureKind::LineString);
    }

    #[test]
    fn test_recompute_after_child_edit() {
        let mut f = Feature::folder().with_child(point(0.0, 0.0));
        f.child_mut(0).unwrap().set_point(Coordinate::new(20.0, 30.0));
        assert_ne!(f.bounding_box(), f.computed_bounding_box());
        f.recompute_bounding_box();
        assert_eq!(f.bounding_box(), Some(BoundingBox::new(30.0, 30.0, 20.0, 20.0)));
    }

    #[test]
    fn test_ground_overlay_box() {
        let bb = BoundingBox::new(10.0, 0.0, 10.0, 0.0);
        let mut go = Feature::ground_overlay(GroundOverlay {
            lat_lon_box: Some(bb),
            ..Default::default()
        });
        assert_eq!(go.bounding_box(), Some(bb));
        go.edit_overlay(|o| o.lat_lon_box = None);
        assert_eq!(go.bounding_box(), None);
    }

    #[test]
    fn test_extended_data_last_write_wins() {
        let mut f = point(0.0, 0.0);
        f.set_extended_data("k", "1");
        f.set_extended_data("k", "2");
        assert_eq!(f.extended_data.len(), 1);
        assert_eq!(f.extended_data["k"], "2");
    }

    #[test]
    fn test_clone_is_deep() {
        let original = Feature::folder()
            .with_name("root")
            .with_child(point(1.0, 1.0).with_style("s1").with_extended_data("a", "b"));
        let mut copy = original.clone();
        copy.child_mut(0).unwrap().set_point(Coordinate::new(9.0, 9.0));
        copy.child_mut(0).unwrap().set_extended_data("a", "changed");

        let child = &original.children()[0];
        assert_eq!(child.geometry(), Some(&Geometry::Point(Coordinate::new(1.0, 1.0))));
        assert_eq!(child.extended_data["a"], "b");
        assert_eq!(copy.children()[0].style_ref.as_deref(), Some("s1"));
        assert_eq!(copy.bounding_box(), original.bounding_box());
    }
}
