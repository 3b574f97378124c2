use crate::location::Location;
use geo::algorithm::bounding_rect::BoundingRect;
use geo::algorithm::contains::Contains;
use geo_types::{MultiPolygon, Point, Polygon};
use rstar::primitives::Rectangle;
use rstar::{PointDistance, RTree, RTreeObject, AABB};

type Point2D = [f64; 2];

#[derive(Debug)]
pub struct RegionPart {
    rect: Rectangle<Point2D>,
    pub polygon: Polygon<f64>,
}

impl RegionPart {
    fn new(polygon: Polygon<f64>) -> Option<Self> {
        let rect = polygon.bounding_rect()?;
        let lower = [rect.min().x, rect.min().y];
        let upper = [rect.max().x, rect.max().y];
        let rect = Rectangle::from_aabb(AABB::from_corners(lower, upper));
        Some(RegionPart { rect, polygon })
    }
}

impl RTreeObject for RegionPart {
    type Envelope = AABB<Point2D>;

    fn envelope(&self) -> Self::Envelope {
        self.rect.envelope()
    }
}

impl PointDistance for RegionPart {
    fn distance_2(&self, point: &Point2D) -> f64 {
        self.rect.distance_2(point)
    }
}

/// The target area of a run. Read only once built, shared by all workers.
#[derive(Debug)]
pub struct Region {
    tree: RTree<RegionPart>,
}

impl Region {
    /// Returns `None` when no polygon has any vertex.
    pub fn new(mp: MultiPolygon<f64>) -> Option<Self> {
        let parts: Vec<RegionPart> = mp.into_iter().filter_map(RegionPart::new).collect();
        if parts.is_empty() {
            return None;
        }
        Some(Region {
            tree: RTree::bulk_load(parts),
        })
    }

    pub fn parts(&self) -> usize {
        self.tree.size()
    }

    /// Interior-only containment: points on an edge or a vertex, and points
    /// inside a hole, are not part of the region.
    pub fn contains(&self, loc: &Location) -> bool {
        let key: Point2D = (*loc).into();
        let point: Point<f64> = (*loc).into();
        self.tree
            .locate_all_at_point(&key)
            .any(|part| part.polygon.contains(&point))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    fn square() -> Region {
        let poly = polygon![
            (x: 0.0, y: 0.0),
            (x: 0.0, y: 60.0),
            (x: 60.0, y: 60.0),
            (x: 60.0, y: 0.0),
            (x: 0.0, y: 0.0),
        ];
        Region::new(poly.into()).unwrap()
    }

    fn loc(lng: f64, lat: f64) -> Location {
        Location::new(lng, lat).unwrap()
    }

    #[test]
    fn includes_interior_points() {
        let region = square();
        assert!(region.contains(&loc(10.0, 10.0)));
        assert!(region.contains(&loc(50.0, 50.0)));
        assert!(region.contains(&loc(59.999, 0.001)));
    }

    #[test]
    fn excludes_boundary_points() {
        let region = square();
        assert!(!region.contains(&loc(0.0, 30.0)));
        assert!(!region.contains(&loc(30.0, 60.0)));
        assert!(!region.contains(&loc(60.0, 60.0)));
        assert!(!region.contains(&loc(0.0, 0.0)));
    }

    #[test]
    fn excludes_outside_points() {
        let region = square();
        assert!(!region.contains(&loc(90.0, 90.0)));
        assert!(!region.contains(&loc(-0.5, 10.0)));
    }

    #[test]
    fn excludes_holes() {
        let poly = polygon!(
            exterior: [
                (x: 0.0, y: 0.0),
                (x: 10.0, y: 0.0),
                (x: 10.0, y: 10.0),
                (x: 0.0, y: 10.0),
            ],
            interiors: [
                [
                    (x: 4.0, y: 4.0),
                    (x: 6.0, y: 4.0),
                    (x: 6.0, y: 6.0),
                    (x: 4.0, y: 6.0),
                ],
            ],
        );
        let region = Region::new(poly.into()).unwrap();
        assert!(region.contains(&loc(2.0, 2.0)));
        assert!(!region.contains(&loc(5.0, 5.0)));
        assert!(!region.contains(&loc(4.0, 5.0)));
    }

    #[test]
    fn matches_any_part() {
        let left = polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0), (x: 0.0, y: 1.0)];
        let right = polygon![(x: 5.0, y: 0.0), (x: 6.0, y: 0.0), (x: 6.0, y: 1.0), (x: 5.0, y: 1.0)];
        let region = Region::new(MultiPolygon(vec![left, right])).unwrap();
        assert_eq!(region.parts(), 2);
        assert!(region.contains(&loc(0.5, 0.5)));
        assert!(region.contains(&loc(5.5, 0.5)));
        assert!(!region.contains(&loc(3.0, 0.5)));
    }

    #[test]
    fn rejects_empty_region() {
        assert!(Region::new(MultiPolygon(vec![])).is_none());
    }
}
