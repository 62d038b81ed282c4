//! Geometry value types.
//!
//! A [`Geometry`] is the shape payload of a placemark. It is a plain value:
//! cloning copies every coordinate, and nested multi-geometries are owned
//! recursively.

use super::bbox::{BoundingBox, union_opt};

/// A geographic position. Altitude defaults to 0.0 when the source omits it.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Coordinate {
    pub longitude: f64,
    pub latitude: f64,
    pub altitude: f64,
}

impl Coordinate {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
            altitude: 0.0,
        }
    }

    pub fn with_altitude(longitude: f64, latitude: f64, altitude: f64) -> Self {
        Self {
            longitude,
            latitude,
            altitude,
        }
    }

    /// Same position with the altitude zeroed.
    pub fn flattened(self) -> Self {
        Self {
            altitude: 0.0,
            ..self
        }
    }
}

/// Shape data of a placemark.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(Coordinate),
    LineString(Vec<Coordinate>),
    /// Outer ring plus holes. Ring closure is not enforced.
    Polygon {
        outer: Vec<Coordinate>,
        holes: Vec<Vec<Coordinate>>,
    },
    MultiGeometry(Vec<Geometry>),
}

impl Geometry {
    pub fn polygon(outer: Vec<Coordinate>) -> Self {
        Geometry::Polygon {
            outer,
            holes: Vec::new(),
        }
    }

    /// Name of the geometry as used by both KML and GeoJSON.
    pub fn type_name(&self) -> &'static str {
        match self {
            Geometry::Point(_) => "Point",
            Geometry::LineString(_) => "LineString",
            Geometry::Polygon { .. } => "Polygon",
            Geometry::MultiGeometry(_) => "MultiGeometry",
        }
    }

    /// Box covering the geometry.
    ///
    /// Polygons contribute their outer ring only; holes lie inside it.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        match self {
            Geometry::Point(c) => Some(BoundingBox::from_coordinate(c)),
            Geometry::LineString(coords) => BoundingBox::from_coordinates(coords),
            Geometry::Polygon { outer, .. } => BoundingBox::from_coordinates(outer),
            Geometry::MultiGeometry(items) => items
                .iter()
                .map(Geometry::bounding_box)
                .fold(None, union_opt),
        }
    }

    /// Visit every coordinate, holes included.
    pub fn for_each_coordinate<F: FnMut(&Coordinate)>(&self, f: &mut F) {
        match self {
            Geometry::Point(c) => f(c),
            Geometry::LineString(coords) => coords.iter().for_each(f),
            Geometry::Polygon { outer, holes } => {
                outer.iter().for_each(&mut *f);
                for hole in holes {
                    hole.iter().for_each(&mut *f);
                }
            }
            Geometry::MultiGeometry(items) => {
                for item in items {
                    item.for_each_coordinate(f);
                }
            }
        }
    }

    pub fn coordinate_count(&self) -> usize {
        let mut n = 0;
        self.for_each_coordinate(&mut |_| n += 1);
        n
    }

    /// Copy of the geometry with every altitude set to 0.0.
    pub fn flattened(&self) -> Geometry {
        fn ring(coords: &[Coordinate]) -> Vec<Coordinate> {
            coords.iter().map(|c| c.flattened()).collect()
        }
        match self {
            Geometry::Point(c) => Geometry::Point(c.flattened()),
            Geometry::LineString(coords) => Geometry::LineString(ring(coords)),
            Geometry::Polygon { outer, holes } => Geometry::Polygon {
                outer: ring(outer),
                holes: holes.iter().map(|h| ring(h)).collect(),
            },
            Geometry::MultiGeometry(items) => {
                Geometry::MultiGeometry(items.iter().map(Geometry::flattened).collect())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x: f64, y: f64, size: f64) -> Vec<Coordinate> {
        vec![
            Coordinate::new(x, y),
            Coordinate::new(x + size, y),
            Coordinate::new(x + size, y + size),
            Coordinate::new(x, y + size),
            Coordinate::new(x, y),
        ]
    }

    #[test]
    fn test_polygon_box_ignores_holes() {
        let g = Geometry::Polygon {
            outer: square(0.0, 0.0, 10.0),
            holes: vec![square(2.0, 2.0, 1.0)],
        };
        assert_eq!(
            g.bounding_box(),
            Some(BoundingBox::new(10.0, 0.0, 10.0, 0.0))
        );
        assert_eq!(g.coordinate_count(), 10);
    }

    #[test]
    fn test_empty_outer_ring_has_no_box() {
        assert_eq!(Geometry::polygon(Vec::new()).bounding_box(), None);
        assert_eq!(Geometry::LineString(Vec::new()).bounding_box(), None);
    }

    #[test]
    fn test_multi_geometry_box() {
        let g = Geometry::MultiGeometry(vec![
            Geometry::Point(Coordinate::new(1.0, 1.0)),
            Geometry::MultiGeometry(vec![Geometry::Point(Coordinate::new(-4.0, 6.0))]),
            Geometry::LineString(Vec::new()),
        ]);
        assert_eq!(
            g.bounding_box(),
            Some(BoundingBox::new(6.0, 1.0, 1.0, -4.0))
        );
    }

    #[test]
    fn test_clone_is_deep() {
        let original = Geometry::MultiGeometry(vec![Geometry::LineString(square(0.0, 0.0, 1.0))]);
        let mut copy = original.clone();
        if let Geometry::MultiGeometry(items) = &mut copy
            && let Geometry::LineString(coords) = &mut items[0]
        {
            coords[0].longitude = 99.0;
        }
        assert_ne!(original, copy);
        assert_eq!(original.coordinate_count(), copy.coordinate_count());
    }

    #[test]
    fn test_flattened_zeroes_altitude() {
        let g = Geometry::Point(Coordinate::with_altitude(1.0, 2.0, 300.0));
        assert_eq!(g.flattened(), Geometry::Point(Coordinate::new(1.0, 2.0)));
    }
}
