//! Homogeneous affine transforms.

use nalgebra::{Matrix3, Matrix4, Point3, Vector3, Vector4};

/// A 3D affine transform stored as a 4×4 homogeneous matrix.
///
/// Applying the transform divides by the homogeneous coordinate; a zero
/// denominator is treated as 1 so that degenerate projective rows never produce
/// infinities.
///
/// # Example
///
/// ```
/// use cf_volume::Affine;
/// use nalgebra::{Matrix3, Point3, Vector3};
///
/// let xfm = Affine::from_linear_translation(
///     Matrix3::from_diagonal(&Vector3::new(2.0, 2.0, 2.0)),
///     Vector3::new(1.0, 0.0, 0.0),
/// );
/// assert_eq!(xfm.apply(&Point3::new(1.0, 1.0, 1.0)), Point3::new(3.0, 2.0, 2.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Affine {
    matrix: Matrix4<f64>,
}

impl Affine {
    /// The identity transform.
    #[must_use]
    pub fn identity() -> Self {
        Self {
            matrix: Matrix4::identity(),
        }
    }

    /// Wraps a homogeneous matrix as-is.
    #[must_use]
    pub const fn from_matrix(matrix: Matrix4<f64>) -> Self {
        Self { matrix }
    }

    /// Builds `x ↦ linear · x + translation`.
    #[must_use]
    pub fn from_linear_translation(linear: Matrix3<f64>, translation: Vector3<f64>) -> Self {
        let mut matrix = linear.to_homogeneous();
        matrix.fixed_view_mut::<3, 1>(0, 3).copy_from(&translation);
        Self { matrix }
    }

    /// The homogeneous matrix.
    #[must_use]
    pub const fn matrix(&self) -> &Matrix4<f64> {
        &self.matrix
    }

    /// Upper-left 3×3 block.
    #[must_use]
    pub fn linear(&self) -> Matrix3<f64> {
        self.matrix.fixed_view::<3, 3>(0, 0).into_owned()
    }

    /// Translation column.
    #[must_use]
    pub fn translation(&self) -> Vector3<f64> {
        self.matrix.fixed_view::<3, 1>(0, 3).into_owned()
    }

    /// Maps a point through the transform.
    #[must_use]
    pub fn apply(&self, point: &Point3<f64>) -> Point3<f64> {
        let out = self.matrix * Vector4::new(point.x, point.y, point.z, 1.0);
        let h = if out.w == 0.0 { 1.0 } else { out.w };
        Point3::new(out.x / h, out.y / h, out.z / h)
    }

    /// Transform equivalent to applying `first`, then `self`.
    #[must_use]
    pub fn compose(&self, first: &Self) -> Self {
        Self {
            matrix: self.matrix * first.matrix,
        }
    }

    /// Inverse transform, or `None` when the matrix is singular.
    #[must_use]
    pub fn inverse(&self) -> Option<Self> {
        self.matrix.try_inverse().map(|matrix| Self { matrix })
    }
}

impl Default for Affine {
    fn default() -> Self {
        Self::identity()
    }
}
