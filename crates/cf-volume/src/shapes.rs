//! World-space primitives consumed by cropping, box iteration and rasterization.
//!
//! Anything that can answer "is this world point inside?" implements [`Region`].
//! Regions that are bounded also report an axis-aligned bounding box, which lets
//! callers visit only the voxels under that box instead of the whole grid.
//!
//! # Example
//!
//! ```
//! use cf_volume::{Aabb, Region, Sphere};
//! use nalgebra::Point3;
//!
//! let sphere = Sphere::new(Point3::new(5.0, 5.0, 5.0), 2.0);
//! assert!(sphere.contains(&Point3::new(6.0, 5.0, 5.0)));
//!
//! let bounds = sphere.bounding_box().unwrap();
//! assert_eq!(bounds, Aabb::new(Point3::new(3.0, 3.0, 3.0), Point3::new(7.0, 7.0, 7.0)));
//! ```

use nalgebra::{Point3, Vector3};

/// A world-space point set that grid operations can test against.
pub trait Region {
    /// Returns `true` if `point` belongs to the region.
    fn contains(&self, point: &Point3<f64>) -> bool;

    /// Axis-aligned bounds of the region, or `None` if it is unbounded.
    fn bounding_box(&self) -> Option<Aabb> {
        None
    }
}

/// Adapts a closure into an unbounded [`Region`].
///
/// # Example
///
/// ```
/// use cf_volume::{Predicate, Region};
/// use nalgebra::Point3;
///
/// let upper = Predicate(|p: &Point3<f64>| p.z > 1.0);
/// assert!(upper.contains(&Point3::new(0.0, 0.0, 2.0)));
/// assert!(upper.bounding_box().is_none());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Predicate<F>(pub F);

impl<F> Region for Predicate<F>
where
    F: Fn(&Point3<f64>) -> bool,
{
    fn contains(&self, point: &Point3<f64>) -> bool {
        (self.0)(point)
    }
}

impl<R: Region + ?Sized> Region for &R {
    fn contains(&self, point: &Point3<f64>) -> bool {
        (**self).contains(point)
    }

    fn bounding_box(&self) -> Option<Aabb> {
        (**self).bounding_box()
    }
}

/// An axis-aligned box in world coordinates. Both corners are inclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Aabb {
    /// Minimum corner.
    pub min: Point3<f64>,
    /// Maximum corner.
    pub max: Point3<f64>,
}

impl Aabb {
    /// Creates a box from two opposite corners given in any order.
    #[must_use]
    pub fn new(a: Point3<f64>, b: Point3<f64>) -> Self {
        Self {
            min: Point3::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z)),
            max: Point3::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z)),
        }
    }

    /// Creates a box centered at `center` with the given half-extents.
    #[must_use]
    pub fn from_center(center: Point3<f64>, half_extents: Vector3<f64>) -> Self {
        Self::new(center - half_extents, center + half_extents)
    }

    /// The eight corners, ordered with x varying fastest.
    #[must_use]
    pub fn corners(&self) -> [Point3<f64>; 8] {
        let (lo, hi) = (self.min, self.max);
        [
            Point3::new(lo.x, lo.y, lo.z),
            Point3::new(hi.x, lo.y, lo.z),
            Point3::new(lo.x, hi.y, lo.z),
            Point3::new(hi.x, hi.y, lo.z),
            Point3::new(lo.x, lo.y, hi.z),
            Point3::new(hi.x, lo.y, hi.z),
            Point3::new(lo.x, hi.y, hi.z),
            Point3::new(hi.x, hi.y, hi.z),
        ]
    }

    /// Grows the box to include `point`.
    pub fn expand_to_include(&mut self, point: &Point3<f64>) {
        self.min = self.min.inf(point);
        self.max = self.max.sup(point);
    }
}

impl Region for Aabb {
    fn contains(&self, point: &Point3<f64>) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
            && point.z >= self.min.z
            && point.z <= self.max.z
    }

    fn bounding_box(&self) -> Option<Aabb> {
        Some(*self)
    }
}

/// A solid ball in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Sphere {
    /// Center of the ball.
    pub center: Point3<f64>,
    /// Radius, never negative.
    pub radius: f64,
}

impl Sphere {
    /// Creates a ball; a negative radius is taken by magnitude.
    #[must_use]
    pub const fn new(center: Point3<f64>, radius: f64) -> Self {
        Self {
            center,
            radius: if radius < 0.0 { -radius } else { radius },
        }
    }
}

impl Region for Sphere {
    fn contains(&self, point: &Point3<f64>) -> bool {
        (point - self.center).norm_squared() <= self.radius * self.radius
    }

    fn bounding_box(&self) -> Option<Aabb> {
        let r = Vector3::repeat(self.radius);
        Some(Aabb::from_center(self.center, r))
    }
}

/// A closed half-space bounded by a plane.
///
/// Points on the plane or on the side its normal points toward are inside.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Plane {
    /// A point on the plane.
    pub point: Point3<f64>,
    /// Unit normal.
    pub normal: Vector3<f64>,
}

impl Plane {
    /// Creates a plane through `point`; `normal` is normalised.
    ///
    /// A zero normal falls back to `+z`.
    #[must_use]
    pub fn new(point: Point3<f64>, normal: Vector3<f64>) -> Self {
        let normal = normal.try_normalize(f64::EPSILON).unwrap_or_else(Vector3::z);
        Self { point, normal }
    }

    /// Signed distance from the plane; positive on the normal side.
    #[must_use]
    pub fn signed_distance(&self, point: &Point3<f64>) -> f64 {
        (point - self.point).dot(&self.normal)
    }
}

impl Region for Plane {
    fn contains(&self, point: &Point3<f64>) -> bool {
        self.signed_distance(point) >= 0.0
    }
}

/// A straight segment between two world points.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Segment {
    /// First endpoint.
    pub a: Point3<f64>,
    /// Second endpoint.
    pub b: Point3<f64>,
}

impl Segment {
    /// Creates a segment from `a` to `b`.
    #[must_use]
    pub const fn new(a: Point3<f64>, b: Point3<f64>) -> Self {
        Self { a, b }
    }

    /// Unit direction from `a` to `b`, or zero for a degenerate segment.
    #[must_use]
    pub fn direction(&self) -> Vector3<f64> {
        (self.b - self.a)
            .try_normalize(f64::EPSILON)
            .unwrap_or_else(Vector3::zeros)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_aabb_auto_order() {
        let aabb = Aabb::new(Point3::new(10.0, 0.0, 5.0), Point3::new(0.0, 10.0, 0.0));
        assert_eq!(aabb.min, Point3::new(0.0, 0.0, 0.0));
        assert_eq!(aabb.max, Point3::new(10.0, 10.0, 5.0));
    }

    #[test]
    fn test_aabb_contains_boundary() {
        let aabb = Aabb::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0));
        assert!(aabb.contains(&Point3::new(1.0, 1.0, 1.0)));
        assert!(aabb.contains(&Point3::new(0.5, 0.0, 0.5)));
        assert!(!aabb.contains(&Point3::new(1.1, 0.5, 0.5)));
    }

    #[test]
    fn test_aabb_corners_cover_box() {
        let aabb = Aabb::new(Point3::origin(), Point3::new(1.0, 2.0, 3.0));
        let corners = aabb.corners();
        assert_eq!(corners[0], aabb.min);
        assert_eq!(corners[7], aabb.max);
        assert!(corners.iter().all(|c| aabb.contains(c)));
    }

    #[test]
    fn test_sphere_contains() {
        let sphere = Sphere::new(Point3::new(1.0, 1.0, 1.0), -2.0);
        assert_eq!(sphere.radius, 2.0);
        assert!(sphere.contains(&Point3::new(3.0, 1.0, 1.0)));
        assert!(!sphere.contains(&Point3::new(3.1, 1.0, 1.0)));
    }

    #[test]
    fn test_plane_half_space() {
        let plane = Plane::new(Point3::new(0.0, 0.0, 2.0), Vector3::new(0.0, 0.0, 5.0));
        assert_relative_eq!(plane.normal.norm(), 1.0);
        assert!(plane.contains(&Point3::new(0.0, 0.0, 2.0)));
        assert!(plane.contains(&Point3::new(9.0, -3.0, 4.0)));
        assert!(!plane.contains(&Point3::new(0.0, 0.0, 1.0)));
        assert!(plane.bounding_box().is_none());
    }

    #[test]
    fn test_plane_zero_normal_falls_back() {
        let plane = Plane::new(Point3::origin(), Vector3::zeros());
        assert_eq!(plane.normal, Vector3::z());
    }

    #[test]
    fn test_segment_direction() {
        let seg = Segment::new(Point3::origin(), Point3::new(3.0, 4.0, 0.0));
        assert_relative_eq!(seg.direction(), Vector3::new(0.6, 0.8, 0.0));
        let degenerate = Segment::new(Point3::origin(), Point3::origin());
        assert_eq!(degenerate.direction(), Vector3::zeros());
    }

    #[test]
    fn test_region_by_reference() {
        fn count_inside<R: Region>(region: R, points: &[Point3<f64>]) -> usize {
            points.iter().filter(|p| region.contains(p)).count()
        }
        let sphere = Sphere::new(Point3::origin(), 1.0);
        let points = [Point3::origin(), Point3::new(2.0, 0.0, 0.0)];
        assert_eq!(count_inside(&sphere, &points), 1);
        assert_eq!(count_inside(Predicate(|p: &Point3<f64>| p.x > 1.0), &points), 1);
    }
}
