//! Axis-aligned geographic bounding boxes.

use super::geometry::Coordinate;

/// Minimal rectangle (in degrees) covering a set of coordinates.
///
/// Boxes are plain componentwise extremes; antimeridian wrapping is not
/// modelled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl BoundingBox {
    pub fn new(north: f64, south: f64, east: f64, west: f64) -> Self {
        Self {
            north,
            south,
            east,
            west,
        }
    }

    /// Degenerate box around a single coordinate.
    pub fn from_coordinate(c: &Coordinate) -> Self {
        Self::new(c.latitude, c.latitude, c.longitude, c.longitude)
    }

    /// Box covering every coordinate, or `None` for an empty sequence.
    pub fn from_coordinates<'a, I>(coords: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Coordinate>,
    {
        coords
            .into_iter()
            .map(Self::from_coordinate)
            .reduce(|acc, b| acc.union(&b))
    }

    /// Smallest box covering both `self` and `other`.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            north: self.north.max(other.north),
            south: self.south.min(other.south),
            east: self.east.max(other.east),
            west: self.west.min(other.west),
        }
    }

    pub fn contains(&self, c: &Coordinate) -> bool {
        c.latitude <= self.north
            && c.latitude >= self.south
            && c.longitude <= self.east
            && c.longitude >= self.west
    }

    pub fn center(&self) -> Coordinate {
        Coordinate::new(
            (self.east + self.west) / 2.0,
            (self.north + self.south) / 2.0,
        )
    }
}

/// Union of two optional boxes, where `None` means empty.
pub fn union_opt(a: Option<BoundingBox>, b: Option<BoundingBox>) -> Option<BoundingBox> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.union(&b)),
        (a, None) => a,
        (None, b) => b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_coordinates() {
        let coords = [
            Coordinate::new(2.0, 48.0),
            Coordinate::new(-1.5, 50.0),
            Coordinate::new(3.0, 47.5),
        ];
        let bb = BoundingBox::from_coordinates(&coords).unwrap();
        assert_eq!(bb, BoundingBox::new(50.0, 47.5, 3.0, -1.5));
        assert!(bb.contains(&Coordinate::new(0.0, 49.0)));
        assert!(!bb.contains(&Coordinate::new(4.0, 49.0)));
    }

    #[test]
    fn test_empty_has_no_box() {
        assert_eq!(BoundingBox::from_coordinates(&[]), None);
    }

    #[test]
    fn test_union_opt() {
        let a = BoundingBox::new(1.0, 0.0, 1.0, 0.0);
        let b = BoundingBox::new(5.0, 4.0, 5.0, 4.0);
        assert_eq!(union_opt(None, None), None);
        assert_eq!(union_opt(Some(a), None), Some(a));
        assert_eq!(union_opt(None, Some(b)), Some(b));
        assert_eq!(
            union_opt(Some(a), Some(b)),
            Some(BoundingBox::new(5.0, 0.0, 5.0, 0.0))
        );
    }
}
