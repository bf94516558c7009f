//! Regular 3D lattices anchored in world space.

use nalgebra::{Matrix3, Point3, UnitQuaternion, Vector3};
use rand::Rng;
use tracing::{debug, info, warn};

use crate::affine::Affine;
use crate::error::{Result, VolumeError};
use crate::iter::SampleIter;
use crate::sample::Sample;
use crate::shapes::{Aabb, Region};

/// Tolerance used by [`Sampling::compatible`].
pub const COMPATIBLE_TOLERANCE: f64 = 1e-3;

/// Definition of a regular 3D lattice.
///
/// A sampling places sample `(0, 0, 0)` at `start`, spaces samples by `delta` along
/// each local axis, rotates the local axes by `orientation` and holds `num` samples
/// per axis:
///
/// ```text
/// world = start + R · (delta ⊙ (i, j, k))
/// ```
///
/// The rotation matrix and its inverse are computed once at construction. Samplings
/// are immutable values; every derived grid (resampled, cropped, grown) is new.
///
/// # Example
///
/// ```
/// use cf_volume::{Sample, Sampling};
/// use nalgebra::{Point3, Vector3};
///
/// let grid = Sampling::new(Point3::origin(), Vector3::new(1.0, 1.0, 1.0), [4, 4, 4]).unwrap();
/// assert_eq!(grid.size(), 64);
/// assert_eq!(grid.index(Sample::new(1, 2, 3)).unwrap(), 57);
/// assert_eq!(grid.world(Sample::new(1, 2, 3)), Point3::new(1.0, 2.0, 3.0));
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "SamplingParts", into = "SamplingParts")
)]
pub struct Sampling {
    start: Point3<f64>,
    delta: Vector3<f64>,
    orientation: UnitQuaternion<f64>,
    rotation: Matrix3<f64>,
    inverse: Matrix3<f64>,
    num: [usize; 3],
    size: usize,
}

/// Plain-value decomposition of a [`Sampling`], for codecs.
///
/// The orientation is stored as a unit quaternion in `(w, x, y, z)` order.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SamplingParts {
    /// World position of sample `(0, 0, 0)`.
    pub start: [f64; 3],
    /// Spacing along each local axis.
    pub delta: [f64; 3],
    /// Orientation quaternion `(w, x, y, z)`.
    pub orientation: [f64; 4],
    /// Sample counts per axis.
    pub num: [usize; 3],
}

impl Sampling {
    /// Creates an axis-aligned sampling.
    ///
    /// # Errors
    ///
    /// Returns an error if `start` is not finite, any spacing is not strictly positive
    /// and finite, or any count is zero.
    pub fn new(start: Point3<f64>, delta: Vector3<f64>, num: [usize; 3]) -> Result<Self> {
        Self::with_orientation(start, delta, UnitQuaternion::identity(), num)
    }

    /// Creates an oriented sampling.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Sampling::new`].
    pub fn with_orientation(
        start: Point3<f64>,
        delta: Vector3<f64>,
        orientation: UnitQuaternion<f64>,
        num: [usize; 3],
    ) -> Result<Self> {
        if !start.coords.iter().all(|v| v.is_finite()) {
            return Err(VolumeError::NonFiniteStart {
                x: start.x,
                y: start.y,
                z: start.z,
            });
        }
        for (axis, &value) in delta.iter().enumerate() {
            if !(value.is_finite() && value > 0.0) {
                return Err(VolumeError::InvalidDelta { axis, value });
            }
        }
        for (axis, &value) in num.iter().enumerate() {
            // Samples are addressed with i32 components.
            if value == 0 || i32::try_from(value).is_err() {
                return Err(VolumeError::InvalidCount { axis, value });
            }
        }
        let size = num[0]
            .checked_mul(num[1])
            .and_then(|n| n.checked_mul(num[2]))
            .ok_or(VolumeError::InvalidCount {
                axis: 2,
                value: num[2],
            })?;

        let rotation = orientation.to_rotation_matrix().into_inner();
        Ok(Self {
            start,
            delta,
            orientation,
            rotation,
            inverse: rotation.transpose(),
            num,
            size,
        })
    }

    /// Axis-aligned sampling at the origin with unit spacing.
    ///
    /// # Errors
    ///
    /// Returns an error if any count is zero.
    pub fn unit(num: [usize; 3]) -> Result<Self> {
        Self::new(Point3::origin(), Vector3::new(1.0, 1.0, 1.0), num)
    }

    /// Rebuilds a sampling from its plain parts.
    ///
    /// The quaternion is normalised before use.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Sampling::new`].
    pub fn from_parts(parts: &SamplingParts) -> Result<Self> {
        let [w, x, y, z] = parts.orientation;
        let orientation =
            UnitQuaternion::from_quaternion(nalgebra::Quaternion::new(w, x, y, z));
        Self::with_orientation(
            Point3::from(parts.start),
            Vector3::from(parts.delta),
            orientation,
            parts.num,
        )
    }

    /// Splits the sampling into plain parts.
    #[must_use]
    pub fn parts(&self) -> SamplingParts {
        let q = self.orientation.quaternion();
        SamplingParts {
            start: [self.start.x, self.start.y, self.start.z],
            delta: [self.delta.x, self.delta.y, self.delta.z],
            orientation: [q.w, q.i, q.j, q.k],
            num: self.num,
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// World position of sample `(0, 0, 0)`.
    #[must_use]
    pub const fn start(&self) -> Point3<f64> {
        self.start
    }

    /// Spacing along each local axis.
    #[must_use]
    pub const fn delta(&self) -> Vector3<f64> {
        self.delta
    }

    /// Orientation of the local axes.
    #[must_use]
    pub const fn orientation(&self) -> UnitQuaternion<f64> {
        self.orientation
    }

    /// Rotation matrix of the local axes.
    #[must_use]
    pub const fn rotation(&self) -> &Matrix3<f64> {
        &self.rotation
    }

    /// Sample counts per axis.
    #[must_use]
    pub const fn num(&self) -> [usize; 3] {
        self.num
    }

    /// Sample count along the first axis.
    #[must_use]
    pub const fn num_i(&self) -> usize {
        self.num[0]
    }

    /// Sample count along the second axis.
    #[must_use]
    pub const fn num_j(&self) -> usize {
        self.num[1]
    }

    /// Sample count along the third axis.
    #[must_use]
    pub const fn num_k(&self) -> usize {
        self.num[2]
    }

    /// Total number of samples.
    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Smallest per-axis count.
    #[must_use]
    pub fn num_min(&self) -> usize {
        self.num.iter().copied().min().unwrap_or(1)
    }

    /// Largest per-axis count.
    #[must_use]
    pub fn num_max(&self) -> usize {
        self.num.iter().copied().max().unwrap_or(1)
    }

    /// Smallest per-axis spacing.
    #[must_use]
    pub fn delta_min(&self) -> f64 {
        self.delta.min()
    }

    /// Largest per-axis spacing.
    #[must_use]
    pub fn delta_max(&self) -> f64 {
        self.delta.max()
    }

    /// Length of the voxel diagonal.
    #[must_use]
    pub fn delta_diag(&self) -> f64 {
        self.delta.norm()
    }

    /// Volume of one voxel.
    #[must_use]
    pub fn voxel_volume(&self) -> f64 {
        self.delta.x * self.delta.y * self.delta.z
    }

    /// True when exactly one axis has a single sample, i.e. the grid is a 2D slice.
    #[must_use]
    pub fn is_planar(&self) -> bool {
        self.num.iter().filter(|&&n| n == 1).count() == 1
    }

    /// The first sample, `(0, 0, 0)`.
    #[must_use]
    pub const fn first(&self) -> Sample {
        Sample::origin()
    }

    /// The last sample in linear order.
    #[must_use]
    pub fn last(&self) -> Sample {
        let [ni, nj, nk] = self.counts();
        Sample::new(ni - 1, nj - 1, nk - 1)
    }

    /// The middle sample, rounding down on even counts.
    #[must_use]
    pub fn center(&self) -> Sample {
        let [ni, nj, nk] = self.counts();
        Sample::new((ni - 1) / 2, (nj - 1) / 2, (nk - 1) / 2)
    }

    // Counts fit in i32; checked at construction.
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    const fn counts(&self) -> [i32; 3] {
        [self.num[0] as i32, self.num[1] as i32, self.num[2] as i32]
    }

    // ------------------------------------------------------------------
    // Coordinate transforms
    // ------------------------------------------------------------------

    /// World position of a sample.
    #[must_use]
    pub fn world(&self, sample: Sample) -> Point3<f64> {
        self.world_continuous(&sample.to_vector())
    }

    /// World position of sample `(i, j, k)`.
    #[must_use]
    pub fn world_ijk(&self, i: i32, j: i32, k: i32) -> Point3<f64> {
        self.world(Sample::new(i, j, k))
    }

    /// World position of a continuous voxel coordinate.
    #[must_use]
    pub fn world_continuous(&self, voxel: &Vector3<f64>) -> Point3<f64> {
        self.start + self.rotation * self.delta.component_mul(voxel)
    }

    /// World position of the sample at a linear index.
    #[must_use]
    pub fn world_index(&self, idx: usize) -> Point3<f64> {
        self.world(self.sample(idx))
    }

    /// Continuous voxel coordinate of a world point; the inverse of
    /// [`world_continuous`](Self::world_continuous).
    #[must_use]
    pub fn voxel(&self, point: &Point3<f64>) -> Vector3<f64> {
        (self.inverse * (point - self.start)).component_div(&self.delta)
    }

    /// Sample nearest to a world point.
    ///
    /// Each voxel coordinate is rounded half away from zero. The result may lie
    /// outside the grid. Coordinates beyond the `i32` range saturate, and a NaN
    /// coordinate maps to `i32::MIN`, so non-finite points never land inside.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn nearest(&self, point: &Point3<f64>) -> Sample {
        let round = |c: f64| if c.is_nan() { i32::MIN } else { c.round() as i32 };
        let v = self.voxel(point);
        Sample::new(round(v.x), round(v.y), round(v.z))
    }

    /// Sample nearest to a world point, clamped into the grid.
    #[must_use]
    pub fn nearest_inside(&self, point: &Point3<f64>) -> Sample {
        let s = self.nearest(point);
        let [ni, nj, nk] = self.counts();
        Sample::new(
            s.i.clamp(0, ni - 1),
            s.j.clamp(0, nj - 1),
            s.k.clamp(0, nk - 1),
        )
    }

    /// A uniformly random world point inside the voxel of `sample`.
    pub fn random_point<R: Rng + ?Sized>(&self, sample: Sample, rng: &mut R) -> Point3<f64> {
        let jitter = Vector3::new(
            rng.gen_range(-0.5..0.5),
            rng.gen_range(-0.5..0.5),
            rng.gen_range(-0.5..0.5),
        );
        self.world_continuous(&(sample.to_vector() + jitter))
    }

    /// Voxel-to-world transform as a homogeneous matrix.
    #[must_use]
    pub fn affine(&self) -> Affine {
        Affine::from_linear_translation(
            self.rotation * Matrix3::from_diagonal(&self.delta),
            self.start.coords,
        )
    }

    // ------------------------------------------------------------------
    // Indexing
    // ------------------------------------------------------------------

    /// Linear index of a sample, first axis fastest.
    ///
    /// # Errors
    ///
    /// Returns [`VolumeError::IndexOutOfRange`] if the sample is outside the grid.
    #[allow(clippy::cast_sign_loss)]
    pub fn index(&self, sample: Sample) -> Result<usize> {
        if !self.contains(sample) {
            return Err(VolumeError::IndexOutOfRange {
                sample,
                num: self.num,
            });
        }
        let (i, j, k) = (sample.i as usize, sample.j as usize, sample.k as usize);
        Ok(i + self.num[0] * (j + self.num[1] * k))
    }

    /// Linear index of sample `(i, j, k)`.
    ///
    /// # Errors
    ///
    /// Returns [`VolumeError::IndexOutOfRange`] if the sample is outside the grid.
    pub fn index_ijk(&self, i: i32, j: i32, k: i32) -> Result<usize> {
        self.index(Sample::new(i, j, k))
    }

    /// Decodes a linear index into a sample.
    ///
    /// Indices past the end decode to samples past the last slice.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    pub fn sample(&self, idx: usize) -> Sample {
        let i = idx % self.num[0];
        let rest = idx / self.num[0];
        let j = rest % self.num[1];
        let k = rest / self.num[1];
        Sample::new(i as i32, j as i32, k as i32)
    }

    // ------------------------------------------------------------------
    // Containment
    // ------------------------------------------------------------------

    /// True when every component lies in `[0, num)`.
    #[must_use]
    pub fn contains(&self, sample: Sample) -> bool {
        let n = self.counts();
        (0..n[0]).contains(&sample.i) && (0..n[1]).contains(&sample.j) && (0..n[2]).contains(&sample.k)
    }

    /// True when `(i, j, k)` is inside the grid.
    #[must_use]
    pub fn contains_ijk(&self, i: i32, j: i32, k: i32) -> bool {
        self.contains(Sample::new(i, j, k))
    }

    /// True when the linear index addresses a voxel.
    #[must_use]
    pub const fn contains_index(&self, idx: usize) -> bool {
        idx < self.size
    }

    /// True when every component lies in `[0, num]`, admitting one-past-the-end.
    #[must_use]
    pub fn contains_exclusive(&self, sample: Sample) -> bool {
        let n = self.counts();
        (0..=n[0]).contains(&sample.i)
            && (0..=n[1]).contains(&sample.j)
            && (0..=n[2]).contains(&sample.k)
    }

    /// True when the sample nearest to a world point is inside the grid.
    #[must_use]
    pub fn contains_world(&self, point: &Point3<f64>) -> bool {
        self.contains(self.nearest(point))
    }

    /// True when any component sits on the first or last sample of its axis.
    #[must_use]
    pub fn boundary(&self, sample: Sample) -> bool {
        let n = self.counts();
        (0..3).any(|axis| sample[axis] == 0 || sample[axis] == n[axis] - 1)
    }

    /// [`boundary`](Self::boundary) for a linear index.
    #[must_use]
    pub fn boundary_index(&self, idx: usize) -> bool {
        self.boundary(self.sample(idx))
    }

    /// Reflects out-of-grid components back across the border.
    ///
    /// Negative components are negated and components at or past `num` become
    /// `2 * num - idx - 1`. In-grid samples are returned unchanged.
    ///
    /// # Example
    ///
    /// ```
    /// use cf_volume::{Sample, Sampling};
    ///
    /// let grid = Sampling::unit([4, 4, 4]).unwrap();
    /// assert_eq!(grid.mirror(Sample::new(-1, 4, 2)), Sample::new(1, 3, 2));
    /// ```
    #[must_use]
    pub fn mirror(&self, sample: Sample) -> Sample {
        let n = self.counts();
        let reflect = |v: i32, n: i32| {
            if v < 0 {
                v.wrapping_neg()
            } else if v >= n {
                n.wrapping_mul(2).wrapping_sub(v).wrapping_sub(1)
            } else {
                v
            }
        };
        Sample::new(
            reflect(sample.i, n[0]),
            reflect(sample.j, n[1]),
            reflect(sample.k, n[2]),
        )
    }

    // ------------------------------------------------------------------
    // Iteration
    // ------------------------------------------------------------------

    /// Every sample in linear index order.
    #[must_use]
    pub fn iter(&self) -> SampleIter {
        SampleIter::block(Sample::origin(), self.num)
    }

    /// Samples with the first axis fixed at `i`.
    #[must_use]
    pub fn iterate_i(&self, i: i32) -> SampleIter {
        SampleIter::block(Sample::new(i, 0, 0), [1, self.num[1], self.num[2]])
    }

    /// Samples with the second axis fixed at `j`.
    #[must_use]
    pub fn iterate_j(&self, j: i32) -> SampleIter {
        SampleIter::block(Sample::new(0, j, 0), [self.num[0], 1, self.num[2]])
    }

    /// Samples with the third axis fixed at `k`.
    #[must_use]
    pub fn iterate_k(&self, k: i32) -> SampleIter {
        SampleIter::block(Sample::new(0, 0, k), [self.num[0], self.num[1], 1])
    }

    /// The inclusive box `center ± radius`, without bounds checking.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    pub fn iterate_neighborhood(&self, center: Sample, radius: [usize; 3]) -> SampleIter {
        let origin = center.offset(
            -(radius[0] as i32),
            -(radius[1] as i32),
            -(radius[2] as i32),
        );
        SampleIter::block(origin, radius.map(|r| 2 * r + 1))
    }

    /// The inclusive cube `center ± radius`, without bounds checking.
    #[must_use]
    pub fn iterate_neighborhood_uniform(&self, center: Sample, radius: usize) -> SampleIter {
        self.iterate_neighborhood(center, [radius; 3])
    }

    /// Samples whose voxel envelope overlaps a world box.
    ///
    /// The box corners are mapped into voxel space, the floor/ceil envelope is taken
    /// and clamped into the grid, and the inclusive sub-range is yielded lazily. The
    /// iterator is empty when the box misses the grid.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn iterate_box(&self, aabb: &Aabb) -> SampleIter {
        let mut lo = Vector3::repeat(f64::INFINITY);
        let mut hi = Vector3::repeat(f64::NEG_INFINITY);
        for corner in &aabb.corners() {
            let v = self.voxel(corner);
            lo = lo.inf(&v);
            hi = hi.sup(&v);
        }

        let n = self.counts();
        let mut origin = [0i32; 3];
        let mut extent = [0usize; 3];
        for axis in 0..3 {
            let first = lo[axis].floor().max(0.0);
            let last = hi[axis].ceil().min(f64::from(n[axis] - 1));
            if last < first || first.is_nan() || last.is_nan() {
                return SampleIter::empty();
            }
            origin[axis] = first as i32;
            extent[axis] = (last - first) as usize + 1;
        }
        SampleIter::block(Sample::from(origin), extent)
    }

    // ------------------------------------------------------------------
    // Derived grids
    // ------------------------------------------------------------------

    /// A grid with the same anchor and orientation but new counts.
    ///
    /// # Errors
    ///
    /// Returns an error if any count is zero.
    pub fn proto(&self, num: [usize; 3]) -> Result<Self> {
        Self::with_orientation(self.start, self.delta, self.orientation, num)
    }

    /// A grid with the same anchor and orientation but new spacing and counts.
    ///
    /// # Errors
    ///
    /// Returns an error if any spacing is invalid or any count is zero.
    pub fn proto_with_delta(&self, delta: Vector3<f64>, num: [usize; 3]) -> Result<Self> {
        Self::with_orientation(self.start, delta, self.orientation, num)
    }

    /// Covers the same extent with new sample counts.
    ///
    /// Spacing on an axis changes only when its count changes and both the old and
    /// new counts exceed one; then `new_delta = (old_num - 1) * old_delta /
    /// (new_num - 1)`, keeping the first and last samples fixed. Single-sample axes
    /// keep their spacing so that 2D slices resample cleanly.
    ///
    /// # Errors
    ///
    /// Returns an error if any count is zero.
    #[allow(clippy::cast_precision_loss)]
    pub fn resample_num(&self, ni: usize, nj: usize, nk: usize) -> Result<Self> {
        let num = [ni, nj, nk];
        let mut delta = self.delta;
        for axis in 0..3 {
            let (old, new) = (self.num[axis], num[axis]);
            if new == 0 {
                return Err(VolumeError::InvalidCount { axis, value: new });
            }
            if old != new && old > 1 && new > 1 {
                delta[axis] = (old - 1) as f64 * self.delta[axis] / (new - 1) as f64;
            }
        }
        debug!(from = ?self.num, to = ?num, "Resampling grid by count");
        self.proto_with_delta(delta, num)
    }

    /// Covers the same extent with new spacing; counts become
    /// `ceil(num * delta / new_delta)`.
    ///
    /// # Errors
    ///
    /// Returns an error if any spacing is not strictly positive and finite.
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn resample_delta(&self, dx: f64, dy: f64, dz: f64) -> Result<Self> {
        let delta = Vector3::new(dx, dy, dz);
        let mut num = [1usize; 3];
        for axis in 0..3 {
            let value = delta[axis];
            if !(value.is_finite() && value > 0.0) {
                return Err(VolumeError::InvalidDelta { axis, value });
            }
            let scaled = (self.num[axis] as f64 * self.delta[axis] / value).ceil();
            num[axis] = (scaled as usize).max(1);
        }
        debug!(from = ?self.num, to = ?num, "Resampling grid by spacing");
        self.proto_with_delta(delta, num)
    }

    /// Scales counts by per-axis factors; see [`resample_num`](Self::resample_num).
    ///
    /// Counts become `round(factor * num)`, floored at one; single-sample axes stay
    /// fixed.
    ///
    /// # Errors
    ///
    /// Returns an error if any factor is not strictly positive and finite.
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn zoom(&self, fi: f64, fj: f64, fk: f64) -> Result<Self> {
        let factors = [fi, fj, fk];
        let mut num = self.num;
        for axis in 0..3 {
            let value = factors[axis];
            if !(value.is_finite() && value > 0.0) {
                return Err(VolumeError::InvalidFactor { axis, value });
            }
            if self.num[axis] > 1 {
                num[axis] = ((value * self.num[axis] as f64).round() as usize).max(1);
            }
        }
        self.resample_num(num[0], num[1], num[2])
    }

    /// [`zoom`](Self::zoom) with one factor on every axis.
    ///
    /// # Errors
    ///
    /// Returns an error if the factor is not strictly positive and finite.
    pub fn zoom_uniform(&self, factor: f64) -> Result<Self> {
        self.zoom(factor, factor, factor)
    }

    /// Tightest sub-grid holding every sample whose world position the region
    /// contains.
    ///
    /// Regions that report a bounding box are scanned only over that box. The
    /// original grid is returned when nothing is selected, or when the selection
    /// collapses to a single sample on an axis that has more than one.
    ///
    /// # Example
    ///
    /// ```
    /// use cf_volume::{Sampling, Sphere};
    /// use nalgebra::Point3;
    ///
    /// let grid = Sampling::unit([10, 10, 10]).unwrap();
    /// let cropped = grid.crop(&Sphere::new(Point3::new(5.0, 5.0, 5.0), 2.0));
    /// assert_eq!(cropped.num(), [5, 5, 5]);
    /// assert_eq!(cropped.start(), Point3::new(3.0, 3.0, 3.0));
    /// ```
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub fn crop<R: Region + ?Sized>(&self, region: &R) -> Self {
        let candidates = match region.bounding_box() {
            Some(bbox) => self.iterate_box(&bbox),
            None => self.iter(),
        };

        let mut bounds: Option<(Sample, Sample)> = None;
        for sample in candidates {
            if !region.contains(&self.world(sample)) {
                continue;
            }
            bounds = Some(match bounds {
                None => (sample, sample),
                Some((lo, hi)) => (
                    Sample::new(lo.i.min(sample.i), lo.j.min(sample.j), lo.k.min(sample.k)),
                    Sample::new(hi.i.max(sample.i), hi.j.max(sample.j), hi.k.max(sample.k)),
                ),
            });
        }

        let Some((lo, hi)) = bounds else {
            warn!("Crop region selects no samples, keeping the full grid");
            return self.clone();
        };

        let extent = hi - lo;
        let num = [
            extent.i as usize + 1,
            extent.j as usize + 1,
            extent.k as usize + 1,
        ];
        if (0..3).any(|axis| num[axis] == 1 && self.num[axis] > 1) {
            warn!(?num, "Crop region collapses an axis, keeping the full grid");
            return self.clone();
        }

        info!(from = ?self.num, to = ?num, "Cropped grid");
        Self {
            start: self.world(lo),
            num,
            size: num[0] * num[1] * num[2],
            ..self.clone()
        }
    }

    /// Sub-grid from `start` (inclusive) to `end` (exclusive).
    ///
    /// # Errors
    ///
    /// Returns [`VolumeError::InvalidRange`] unless `start` is inside the grid, `end`
    /// is at most one past the end, and every axis has positive extent.
    #[allow(clippy::cast_sign_loss)]
    pub fn range_between(&self, start: Sample, end: Sample) -> Result<Self> {
        let extent = end - start;
        if !self.contains(start)
            || !self.contains_exclusive(end)
            || extent.i <= 0
            || extent.j <= 0
            || extent.k <= 0
        {
            return Err(VolumeError::InvalidRange { start, end });
        }
        let num = [extent.i as usize, extent.j as usize, extent.k as usize];
        Self::with_orientation(self.world(start), self.delta, self.orientation, num)
    }

    /// Pads the grid by `n` samples on every side.
    ///
    /// # Errors
    ///
    /// Returns an error if the padded counts do not fit the sample index range.
    pub fn grow(&self, n: usize) -> Result<Self> {
        let pad = i32::try_from(n).map_err(|_| VolumeError::InvalidCount { axis: 0, value: n })?;
        let num = self.num.map(|count| count.saturating_add(n.saturating_mul(2)));
        Self::with_orientation(
            self.world_ijk(-pad, -pad, -pad),
            self.delta,
            self.orientation,
            num,
        )
    }

    // ------------------------------------------------------------------
    // Geometry
    // ------------------------------------------------------------------

    /// World positions of the eight extreme samples, first axis varying fastest.
    #[must_use]
    pub fn corners(&self) -> [Point3<f64>; 8] {
        let [ni, nj, nk] = self.counts().map(|n| n - 1);
        [
            self.world_ijk(0, 0, 0),
            self.world_ijk(ni, 0, 0),
            self.world_ijk(0, nj, 0),
            self.world_ijk(ni, nj, 0),
            self.world_ijk(0, 0, nk),
            self.world_ijk(ni, 0, nk),
            self.world_ijk(0, nj, nk),
            self.world_ijk(ni, nj, nk),
        ]
    }

    /// World-space box around the sample centers of the grid.
    #[must_use]
    pub fn bounds(&self) -> Aabb {
        let corners = self.corners();
        let mut out = Aabb::new(corners[0], corners[0]);
        for corner in &corners[1..] {
            out.expand_to_include(corner);
        }
        out
    }

    /// Approximate equality: same counts, and start, spacing and rotation within
    /// [`COMPATIBLE_TOLERANCE`].
    #[must_use]
    pub fn compatible(&self, other: &Self) -> bool {
        self.num == other.num
            && (self.delta - other.delta).norm() < COMPATIBLE_TOLERANCE
            && (self.start - other.start).norm() < COMPATIBLE_TOLERANCE
            && (self.rotation - other.rotation).norm() < COMPATIBLE_TOLERANCE
    }
}

impl<'a> IntoIterator for &'a Sampling {
    type Item = Sample;
    type IntoIter = SampleIter;

    fn into_iter(self) -> SampleIter {
        self.iter()
    }
}

impl From<Sampling> for SamplingParts {
    fn from(sampling: Sampling) -> Self {
        sampling.parts()
    }
}

impl TryFrom<SamplingParts> for Sampling {
    type Error = VolumeError;

    fn try_from(parts: SamplingParts) -> Result<Self> {
        Self::from_parts(&parts)
    }
}
