//! Integer lattice samples.

use std::fmt;
use std::ops::Index;

use nalgebra::Vector3;

/// One cell of a regular 3D lattice, addressed by `(i, j, k)`.
///
/// A sample carries no grid of its own: any triple is a valid value, and whether it
/// addresses a voxel is decided by [`Sampling::contains`](crate::Sampling::contains).
/// Negative and past-the-end samples are routine intermediate values for
/// neighbourhood filters and boundary handling.
///
/// Hashing combines all three components, so permuted triples do not collide.
///
/// # Example
///
/// ```
/// use cf_volume::Sample;
///
/// let sample = Sample::new(1, 2, 3);
/// assert_eq!(sample.i, 1);
/// assert_eq!(sample[2], 3);
///
/// let shifted = sample.offset(-1, 0, 1);
/// assert_eq!(shifted, Sample::new(0, 2, 4));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Sample {
    /// Index along the first axis.
    pub i: i32,
    /// Index along the second axis.
    pub j: i32,
    /// Index along the third axis.
    pub k: i32,
}

impl Sample {
    /// Creates a new sample.
    #[must_use]
    pub const fn new(i: i32, j: i32, k: i32) -> Self {
        Self { i, j, k }
    }

    /// The sample `(0, 0, 0)`.
    #[must_use]
    pub const fn origin() -> Self {
        Self::new(0, 0, 0)
    }

    /// Returns the component along `axis`, or `None` if `axis > 2`.
    ///
    /// # Example
    ///
    /// ```
    /// use cf_volume::Sample;
    ///
    /// let sample = Sample::new(4, 5, 6);
    /// assert_eq!(sample.get(1), Some(5));
    /// assert_eq!(sample.get(3), None);
    /// ```
    #[must_use]
    pub const fn get(self, axis: usize) -> Option<i32> {
        match axis {
            0 => Some(self.i),
            1 => Some(self.j),
            2 => Some(self.k),
            _ => None,
        }
    }

    /// Returns this sample shifted by `(di, dj, dk)`.
    #[must_use]
    pub const fn offset(self, di: i32, dj: i32, dk: i32) -> Self {
        Self::new(
            self.i.wrapping_add(di),
            self.j.wrapping_add(dj),
            self.k.wrapping_add(dk),
        )
    }

    /// Returns the components as an array.
    #[must_use]
    pub const fn as_array(self) -> [i32; 3] {
        [self.i, self.j, self.k]
    }

    /// Converts to a floating-point (continuous) voxel coordinate.
    #[must_use]
    pub fn to_vector(self) -> Vector3<f64> {
        Vector3::new(f64::from(self.i), f64::from(self.j), f64::from(self.k))
    }

    /// Sum of absolute component differences.
    ///
    /// Two samples of a gap-free lattice path are always at distance one.
    #[must_use]
    pub const fn manhattan_distance(self, other: Self) -> u32 {
        let di = self.i.abs_diff(other.i);
        let dj = self.j.abs_diff(other.j);
        let dk = self.k.abs_diff(other.k);
        di.saturating_add(dj).saturating_add(dk)
    }
}

impl Index<usize> for Sample {
    type Output = i32;

    fn index(&self, axis: usize) -> &i32 {
        match axis {
            0 => &self.i,
            1 => &self.j,
            2 => &self.k,
            _ => panic!("sample axis out of range: {axis}"),
        }
    }
}

impl From<[i32; 3]> for Sample {
    fn from([i, j, k]: [i32; 3]) -> Self {
        Self::new(i, j, k)
    }
}

impl From<(i32, i32, i32)> for Sample {
    fn from((i, j, k): (i32, i32, i32)) -> Self {
        Self::new(i, j, k)
    }
}

impl From<Sample> for [i32; 3] {
    fn from(sample: Sample) -> Self {
        sample.as_array()
    }
}

impl std::ops::Add for Sample {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        self.offset(other.i, other.j, other.k)
    }
}

impl std::ops::Sub for Sample {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self::new(
            self.i.wrapping_sub(other.i),
            self.j.wrapping_sub(other.j),
            self.k.wrapping_sub(other.k),
        )
    }
}

impl fmt::Display for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.i, self.j, self.k)
    }
}
