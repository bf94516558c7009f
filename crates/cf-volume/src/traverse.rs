//! Line rasterisation onto a sampling.
//!
//! Segments are walked with a 3D DDA in continuous voxel space, so oriented and
//! anisotropic grids are handled without special cases. Every step moves one unit
//! along exactly one axis, which makes the visited samples a gap-free lattice path.

use nalgebra::{Point3, Vector3};

use crate::error::{Result, VolumeError};
use crate::sample::Sample;
use crate::sampling::Sampling;
use crate::shapes::Segment;

/// Iterator over the samples a segment passes through.
///
/// Created by [`Sampling::segment_traversal`]. The first item is always the sample
/// nearest the segment's start. The walk ends after reaching the sample nearest its
/// end, or just before it would leave the grid; the sample past the grid edge is
/// not yielded.
///
/// Each step goes along the axis whose next half-voxel boundary is closest; on
/// exact ties the later axis wins (X/Y tie steps Y, any tie with Z steps Z). When
/// that step would leave the box spanned by the two end samples, the remaining
/// axes are tried in the same order, so a segment whose end lies on a voxel
/// boundary still reaches the sample nearest its end.
#[derive(Debug, Clone)]
pub struct SegmentTraversal {
    current: Sample,
    target: Sample,
    lo: Sample,
    hi: Sample,
    num: [i32; 3],
    step: [i32; 3],
    origin: [f64; 3],
    extent: [f64; 3],
    t_max: [f64; 3],
    first: bool,
    done: bool,
}

impl SegmentTraversal {
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    fn new(sampling: &Sampling, segment: &Segment) -> Self {
        let va = sampling.voxel(&segment.a);
        let vb = sampling.voxel(&segment.b);
        let s0 = sampling.nearest(&segment.a);
        let s1 = sampling.nearest(&segment.b);

        let mut step = [1i32; 3];
        let mut extent = [0.0; 3];
        for axis in 0..3 {
            let delta = vb[axis] - va[axis];
            step[axis] = if delta > 0.0 { 1 } else { -1 };
            extent[axis] = delta.abs();
        }

        let mut out = Self {
            current: s0,
            target: s1,
            lo: Sample::new(s0.i.min(s1.i), s0.j.min(s1.j), s0.k.min(s1.k)),
            hi: Sample::new(s0.i.max(s1.i), s0.j.max(s1.j), s0.k.max(s1.k)),
            num: sampling.num().map(|n| n as i32),
            step,
            origin: [va.x, va.y, va.z],
            extent,
            t_max: [f64::INFINITY; 3],
            first: true,
            done: s0 == s1,
        };
        for axis in 0..3 {
            out.t_max[axis] = out.boundary_time(axis);
        }
        out
    }

    /// Segment parameter at which the walk leaves the current sample along `axis`.
    ///
    /// Computed from the sample rather than accumulated, so boundaries that are
    /// crossed at the same point give bit-identical times.
    fn boundary_time(&self, axis: usize) -> f64 {
        if self.extent[axis] == 0.0 {
            return f64::INFINITY;
        }
        let sign = f64::from(self.step[axis]);
        let boundary = f64::from(self.current[axis]) + 0.5 * sign;
        (boundary - self.origin[axis]) * sign / self.extent[axis]
    }

    fn in_grid(&self, sample: Sample) -> bool {
        (0..3).all(|axis| (0..self.num[axis]).contains(&sample[axis]))
    }

    fn in_box(&self, sample: Sample) -> bool {
        (0..3).all(|axis| sample[axis] >= self.lo[axis] && sample[axis] <= self.hi[axis])
    }

    fn stepped(&self, axis: usize) -> Sample {
        match axis {
            0 => self.current.offset(self.step[0], 0, 0),
            1 => self.current.offset(0, self.step[1], 0),
            _ => self.current.offset(0, 0, self.step[2]),
        }
    }

    /// Axes by increasing boundary time, later axis first on ties.
    fn axis_order(&self) -> [usize; 3] {
        let mut order = [2, 1, 0];
        order.sort_by(|&a, &b| {
            self.t_max[a]
                .partial_cmp(&self.t_max[b])
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        order
    }
}

impl Iterator for SegmentTraversal {
    type Item = Sample;

    fn next(&mut self) -> Option<Sample> {
        if self.first {
            self.first = false;
            if !self.in_grid(self.current) {
                self.done = true;
            }
            return Some(self.current);
        }
        if self.done {
            return None;
        }

        let order = self.axis_order();
        let mut chosen = None;
        for axis in order {
            let next = self.stepped(axis);
            if !self.in_box(next) {
                continue;
            }
            if self.in_grid(next) {
                chosen = Some((axis, next));
            }
            break;
        }
        let Some((axis, next)) = chosen else {
            self.done = true;
            return None;
        };

        self.current = next;
        self.t_max[axis] = self.boundary_time(axis);
        if next == self.target {
            self.done = true;
        }
        Some(next)
    }
}

impl std::iter::FusedIterator for SegmentTraversal {}

/// Appends `sub` to `out`, skipping its leading sample when it repeats the last one.
fn chain<T>(out: &mut Vec<(Sample, T)>, sub: impl IntoIterator<Item = (Sample, T)>) {
    let mut sub = sub.into_iter().peekable();
    if let (Some((last, _)), Some((head, _))) = (out.last(), sub.peek()) {
        if last == head {
            sub.next();
        }
    }
    out.extend(sub);
}

impl Sampling {
    /// Lazily walks the samples a segment passes through.
    #[must_use]
    pub fn segment_traversal(&self, segment: &Segment) -> SegmentTraversal {
        SegmentTraversal::new(self, segment)
    }

    /// Samples a segment passes through, from the sample nearest `segment.a`.
    ///
    /// A segment whose ends map to the same sample yields that single sample.
    ///
    /// # Example
    ///
    /// ```
    /// use cf_volume::{Sample, Sampling, Segment};
    /// use nalgebra::Point3;
    ///
    /// let grid = Sampling::unit([10, 10, 10]).unwrap();
    /// let path = grid.traverse(&Segment::new(Point3::origin(), Point3::new(3.0, 0.0, 0.0)));
    /// assert_eq!(path, vec![
    ///     Sample::new(0, 0, 0),
    ///     Sample::new(1, 0, 0),
    ///     Sample::new(2, 0, 0),
    ///     Sample::new(3, 0, 0),
    /// ]);
    /// ```
    #[must_use]
    pub fn traverse(&self, segment: &Segment) -> Vec<Sample> {
        self.segment_traversal(segment).collect()
    }

    /// Samples along a polyline, without repeating a sample at the joints.
    ///
    /// Fewer than two points yield an empty path.
    #[must_use]
    pub fn traverse_polyline(&self, points: &[Point3<f64>]) -> Vec<Sample> {
        let mut out: Vec<(Sample, ())> = Vec::new();
        for pair in points.windows(2) {
            let segment = Segment::new(pair[0], pair[1]);
            chain(&mut out, self.segment_traversal(&segment).map(|s| (s, ())));
        }
        out.into_iter().map(|(s, ())| s).collect()
    }

    /// Samples along a polyline, each paired with the unit direction of the segment
    /// that visited it.
    ///
    /// Degenerate segments contribute a zero direction.
    #[must_use]
    pub fn traverse_line(&self, points: &[Point3<f64>]) -> Vec<(Sample, Vector3<f64>)> {
        let mut out = Vec::new();
        for pair in points.windows(2) {
            let segment = Segment::new(pair[0], pair[1]);
            let direction = segment.direction();
            chain(&mut out, self.segment_traversal(&segment).map(|s| (s, direction)));
        }
        out
    }

    /// Samples along a polyline, each paired with the attribute of the segment
    /// endpoint closer to it in world space.
    ///
    /// Ties go to the segment's second endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`VolumeError::AttributeMismatch`] if `points` and `attributes` have
    /// different lengths.
    pub fn traverse_attribute<T: Clone>(
        &self,
        points: &[Point3<f64>],
        attributes: &[T],
    ) -> Result<Vec<(Sample, T)>> {
        if points.len() != attributes.len() {
            return Err(VolumeError::AttributeMismatch {
                points: points.len(),
                attributes: attributes.len(),
            });
        }

        let mut out = Vec::new();
        for (pair, attrs) in points.windows(2).zip(attributes.windows(2)) {
            let (a, b) = (pair[0], pair[1]);
            let segment = Segment::new(a, b);
            let tagged = self.segment_traversal(&segment).map(|s| {
                let p = self.world(s);
                let attr = if (p - a).norm() < (p - b).norm() {
                    &attrs[0]
                } else {
                    &attrs[1]
                };
                (s, attr.clone())
            });
            chain(&mut out, tagged);
        }
        Ok(out)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use nalgebra::UnitQuaternion;

    fn grid(num: [usize; 3]) -> Sampling {
        Sampling::unit(num).unwrap()
    }

    fn seg(a: [f64; 3], b: [f64; 3]) -> Segment {
        Segment::new(Point3::from(a), Point3::from(b))
    }

    fn assert_contiguous(path: &[Sample]) {
        for pair in path.windows(2) {
            assert_eq!(
                pair[0].manhattan_distance(pair[1]),
                1,
                "gap between {} and {}",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn test_straight_line_along_first_axis() {
        let s = grid([10, 10, 10]);
        let path = s.traverse(&seg([0.0, 0.0, 0.0], [3.0, 0.0, 0.0]));
        assert_eq!(
            path,
            vec![
                Sample::new(0, 0, 0),
                Sample::new(1, 0, 0),
                Sample::new(2, 0, 0),
                Sample::new(3, 0, 0),
            ]
        );
    }

    #[test]
    fn test_reverse_direction() {
        let s = grid([10, 10, 10]);
        let path = s.traverse(&seg([5.0, 2.0, 2.0], [2.0, 2.0, 2.0]));
        assert_eq!(path.len(), 4);
        assert_eq!(path[0], Sample::new(5, 2, 2));
        assert_eq!(path[3], Sample::new(2, 2, 2));
    }

    #[test]
    fn test_exact_diagonal_tie_steps_later_axis_first() {
        let s = grid([5, 5, 5]);
        let path = s.traverse(&seg([0.0, 0.0, 0.0], [2.0, 2.0, 0.0]));
        assert_eq!(
            path,
            vec![
                Sample::new(0, 0, 0),
                Sample::new(0, 1, 0),
                Sample::new(1, 1, 0),
                Sample::new(1, 2, 0),
                Sample::new(2, 2, 0),
            ]
        );
    }

    #[test]
    fn test_exact_tie_with_last_axis_steps_last_axis_first() {
        let s = grid([5, 5, 5]);
        let path = s.traverse(&seg([0.0, 0.0, 0.0], [2.0, 0.0, 2.0]));
        assert_eq!(
            path,
            vec![
                Sample::new(0, 0, 0),
                Sample::new(0, 0, 1),
                Sample::new(1, 0, 1),
                Sample::new(1, 0, 2),
                Sample::new(2, 0, 2),
            ]
        );

        let path = s.traverse(&seg([0.0, 0.0, 0.0], [0.0, 2.0, 2.0]));
        assert_eq!(
            path,
            vec![
                Sample::new(0, 0, 0),
                Sample::new(0, 0, 1),
                Sample::new(0, 1, 1),
                Sample::new(0, 1, 2),
                Sample::new(0, 2, 2),
            ]
        );
    }

    #[test]
    fn test_exact_three_way_tie_order() {
        let s = grid([5, 5, 5]);
        let path = s.traverse(&seg([0.0, 0.0, 0.0], [2.0, 2.0, 2.0]));
        assert_eq!(
            path,
            vec![
                Sample::new(0, 0, 0),
                Sample::new(0, 0, 1),
                Sample::new(0, 1, 1),
                Sample::new(1, 1, 1),
                Sample::new(1, 1, 2),
                Sample::new(1, 2, 2),
                Sample::new(2, 2, 2),
            ]
        );
    }

    #[test]
    fn test_endpoints_on_voxel_boundaries_reach_target() {
        let s = grid([10, 10, 10]);
        let segment = seg([0.0, 1.5, 4.5], [2.5, 2.5, 2.5]);
        let path = s.traverse(&segment);
        assert_eq!(s.nearest(&segment.b), Sample::new(3, 3, 3));
        assert_eq!(
            path,
            vec![
                Sample::new(0, 2, 5),
                Sample::new(0, 2, 4),
                Sample::new(1, 2, 4),
                Sample::new(1, 2, 3),
                Sample::new(2, 2, 3),
                Sample::new(2, 3, 3),
                Sample::new(3, 3, 3),
            ]
        );
    }

    #[test]
    fn test_boundary_endpoints_on_coarse_grid_reach_target() {
        // Odd world coordinates sit on voxel boundaries when the spacing is 2.
        let s = Sampling::new(Point3::origin(), Vector3::new(2.0, 2.0, 2.0), [8, 8, 8]).unwrap();
        let segment = seg([1.0, 3.0, 9.0], [7.0, 5.0, 3.0]);
        let path = s.traverse(&segment);
        assert_eq!(path[0], s.nearest(&segment.a));
        assert_eq!(*path.last().unwrap(), s.nearest(&segment.b));
        assert_eq!(
            path.len(),
            s.nearest(&segment.a).manhattan_distance(s.nearest(&segment.b)) as usize + 1
        );
        assert_contiguous(&path);
    }

    #[test]
    fn test_single_sample_segment() {
        let s = grid([5, 5, 5]);
        let path = s.traverse(&seg([1.1, 1.0, 1.0], [0.9, 1.2, 1.3]));
        assert_eq!(path, vec![Sample::new(1, 1, 1)]);
    }

    #[test]
    fn test_start_outside_grid_yields_only_start() {
        let s = grid([5, 5, 5]);
        let path = s.traverse(&seg([-3.0, 0.0, 0.0], [2.0, 0.0, 0.0]));
        assert_eq!(path, vec![Sample::new(-3, 0, 0)]);
    }

    #[test]
    fn test_stops_at_grid_edge() {
        let s = grid([4, 4, 4]);
        let path = s.traverse(&seg([1.0, 1.0, 1.0], [9.0, 1.0, 1.0]));
        assert_eq!(path.last(), Some(&Sample::new(3, 1, 1)));
        assert_eq!(path.len(), 3);
    }

    #[test]
    fn test_oblique_path_is_contiguous_and_reaches_end() {
        let s = grid([20, 20, 20]);
        let segment = seg([1.3, 2.7, 0.2], [15.6, 9.1, 12.4]);
        let path = s.traverse(&segment);
        assert_eq!(path[0], s.nearest(&segment.a));
        assert_eq!(*path.last().unwrap(), s.nearest(&segment.b));
        assert_contiguous(&path);
    }

    #[test]
    fn test_oriented_grid_path_is_contiguous() {
        let rot = UnitQuaternion::from_euler_angles(0.4, 0.1, -0.7);
        let s = Sampling::with_orientation(
            Point3::new(-2.0, 1.0, 0.5),
            Vector3::new(0.8, 1.2, 1.0),
            rot,
            [30, 30, 30],
        )
        .unwrap();
        let a = s.world_continuous(&Vector3::new(2.2, 3.1, 4.0));
        let b = s.world_continuous(&Vector3::new(20.4, 11.7, 25.3));
        let path = s.traverse(&Segment::new(a, b));
        assert_eq!(path[0], s.nearest(&a));
        assert_eq!(*path.last().unwrap(), s.nearest(&b));
        assert_contiguous(&path);
    }

    #[test]
    fn test_polyline_has_no_repeated_joints() {
        let s = grid([10, 10, 10]);
        let points = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(3.0, 0.0, 0.0),
            Point3::new(3.0, 2.0, 0.0),
        ];
        let path = s.traverse_polyline(&points);
        assert_eq!(path.len(), 6);
        assert_eq!(path[3], Sample::new(3, 0, 0));
        assert_eq!(path[4], Sample::new(3, 1, 0));
        assert_contiguous(&path);

        assert!(s.traverse_polyline(&points[..1]).is_empty());
    }

    #[test]
    fn test_traverse_line_directions() {
        let s = grid([10, 10, 10]);
        let points = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 2.0),
        ];
        let tagged = s.traverse_line(&points);
        assert_eq!(tagged.len(), 5);
        assert_eq!(tagged[0].1, Vector3::x());
        assert_eq!(tagged[2].1, Vector3::x());
        assert_eq!(tagged[3], (Sample::new(2, 0, 1), Vector3::z()));
    }

    #[test]
    fn test_traverse_attribute_nearest_endpoint() {
        let s = grid([10, 10, 10]);
        let points = [Point3::new(0.0, 0.0, 0.0), Point3::new(4.0, 0.0, 0.0)];
        let tagged = s.traverse_attribute(&points, &["a", "b"]).unwrap();
        let labels: Vec<_> = tagged.iter().map(|(_, l)| *l).collect();
        // The midpoint is equidistant and takes the second endpoint.
        assert_eq!(labels, vec!["a", "a", "b", "b", "b"]);
    }

    #[test]
    fn test_traverse_attribute_length_mismatch() {
        let s = grid([4, 4, 4]);
        let points = [Point3::origin(), Point3::new(1.0, 0.0, 0.0)];
        let err = s.traverse_attribute(&points, &[1.0]).unwrap_err();
        assert_eq!(
            err,
            VolumeError::AttributeMismatch {
                points: 2,
                attributes: 1
            }
        );
    }
}
