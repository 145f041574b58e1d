//! Core traits for primview

use crate::{mesh::*, point::*, point_cloud::*, transform::Transform3D};

/// Trait for objects with a spatial extent the camera can frame
pub trait Bounds3 {
    /// Get the axis-aligned bounding box of the object, or `None` if it is empty
    fn bounding_box(&self) -> Option<(Point3f, Point3f)>;

    /// Get the center point of the object
    fn center(&self) -> Option<Point3f> {
        self.bounding_box().map(|(min, max)| nalgebra::center(&min, &max))
    }

    /// Bounding box after a transform, computed from the eight transformed corners
    fn transformed_bounding_box(&self, transform: &Transform3D) -> Option<(Point3f, Point3f)> {
        let (min, max) = self.bounding_box()?;
        let corners = (0..8).map(|i| {
            Point3f::new(
                if i & 1 == 0 { min.x } else { max.x },
                if i & 2 == 0 { min.y } else { max.y },
                if i & 4 == 0 { min.z } else { max.z },
            )
        });
        bounds_of(corners.map(|c| transform.transform_point(&c)))
    }
}

/// Bounding box of a sequence of points
pub fn bounds_of<I: IntoIterator<Item = Point3f>>(points: I) -> Option<(Point3f, Point3f)> {
    let mut iter = points.into_iter();
    let first = iter.next()?;
    Some(iter.fold((first, first), |(min, max), p| {
        (min.inf(&p), max.sup(&p))
    }))
}

/// Union of two optional bounding boxes
pub fn merge_bounds(
    a: Option<(Point3f, Point3f)>,
    b: Option<(Point3f, Point3f)>,
) -> Option<(Point3f, Point3f)> {
    match (a, b) {
        (Some((amin, amax)), Some((bmin, bmax))) => Some((amin.inf(&bmin), amax.sup(&bmax))),
        (a, None) => a,
        (None, b) => b,
    }
}

impl<T> Bounds3 for PointCloud<T>
where
    T: Clone + Copy,
    Point3f: From<T>,
{
    fn bounding_box(&self) -> Option<(Point3f, Point3f)> {
        bounds_of(self.points.iter().map(|&p| Point3f::from(p)))
    }
}

impl Bounds3 for PolygonMesh {
    fn bounding_box(&self) -> Option<(Point3f, Point3f)> {
        bounds_of(self.points.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    #[test]
    fn test_mesh_bounds_and_center() {
        let mesh = PolygonMesh::from_parts(
            vec![Point3f::new(-1.0, 0.0, 2.0), Point3f::new(3.0, 4.0, -2.0)],
            vec![],
            vec![],
        );
        let (min, max) = mesh.bounding_box().unwrap();
        assert_eq!(min, Point3f::new(-1.0, 0.0, -2.0));
        assert_eq!(max, Point3f::new(3.0, 4.0, 2.0));
        assert_eq!(mesh.center().unwrap(), Point3f::new(1.0, 2.0, 0.0));
        assert!(PolygonMesh::new().bounding_box().is_none());
    }

    #[test]
    fn test_transformed_bounds() {
        let cloud = PointCloud::from_points(vec![Point3f::new(0.0, 0.0, 0.0), Point3f::new(1.0, 1.0, 1.0)]);
        let t = Transform3D::translation(Vector3::new(10.0, 0.0, 0.0))
            * Transform3D::scaling(Vector3::new(-2.0, 1.0, 1.0));
        let (min, max) = cloud.transformed_bounding_box(&t).unwrap();
        assert_eq!(min, Point3f::new(8.0, 0.0, 0.0));
        assert_eq!(max, Point3f::new(10.0, 1.0, 1.0));
    }

    #[test]
    fn test_merge_bounds() {
        let a = Some((Point3f::new(0.0, 0.0, 0.0), Point3f::new(1.0, 1.0, 1.0)));
        let b = Some((Point3f::new(-1.0, 0.5, 0.0), Point3f::new(0.5, 2.0, 0.5)));
        let (min, max) = merge_bounds(a, b).unwrap();
        assert_eq!(min, Point3f::new(-1.0, 0.0, 0.0));
        assert_eq!(max, Point3f::new(1.0, 2.0, 1.0));
        assert_eq!(merge_bounds(None, a), a);
        assert!(merge_bounds(None, None).is_none());
    }
}
