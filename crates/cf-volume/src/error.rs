//! Error types for lattice and volume operations.

use crate::sample::Sample;

/// Errors that can occur while building grids or addressing voxel storage.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum VolumeError {
    /// Spacing must be strictly positive and finite on every axis.
    #[error("invalid spacing on axis {axis}: {value}")]
    InvalidDelta {
        /// Axis index (0, 1 or 2).
        axis: usize,
        /// The rejected spacing.
        value: f64,
    },

    /// Sample counts must be at least one on every axis.
    #[error("invalid sample count on axis {axis}: {value}")]
    InvalidCount {
        /// Axis index (0, 1 or 2).
        axis: usize,
        /// The rejected count.
        value: usize,
    },

    /// The grid origin must be finite.
    #[error("grid start must be finite, got ({x}, {y}, {z})")]
    NonFiniteStart {
        /// X component.
        x: f64,
        /// Y component.
        y: f64,
        /// Z component.
        z: f64,
    },

    /// A zoom factor was not positive and finite.
    #[error("invalid zoom factor on axis {axis}: {value}")]
    InvalidFactor {
        /// Axis index (0, 1 or 2).
        axis: usize,
        /// The rejected factor.
        value: f64,
    },

    /// A store needs at least one channel.
    #[error("invalid channel count: {0}")]
    InvalidChannels(usize),

    /// A sample does not address a voxel of the grid.
    #[error("invalid sample ({}, {}, {}) in sampling of size {}x{}x{}", .sample.i, .sample.j, .sample.k, .num[0], .num[1], .num[2])]
    IndexOutOfRange {
        /// The offending sample.
        sample: Sample,
        /// Sample counts of the grid that rejected it.
        num: [usize; 3],
    },

    /// A sub-range request did not describe a non-empty region inside the grid.
    #[error("invalid range from {start:?} to {end:?}")]
    InvalidRange {
        /// First sample of the range (inclusive).
        start: Sample,
        /// Last sample of the range (exclusive).
        end: Sample,
    },

    /// A range expression did not have exactly three comma-separated tokens.
    #[error("range expression must have three comma-separated axes, got {0:?}")]
    RangeArity(String),

    /// One token of a range expression could not be used.
    #[error("invalid range token {token:?} on axis {axis}: {reason}")]
    RangeParse {
        /// Axis index (0, 1 or 2).
        axis: usize,
        /// The offending token.
        token: String,
        /// What was wrong with it.
        reason: String,
    },

    /// Two stores that must share geometry do not.
    #[error("samplings do not match")]
    SamplingMismatch,

    /// Two stores that must share a channel count do not.
    #[error("channel counts do not match: expected {expected}, got {actual}")]
    ChannelMismatch {
        /// Channel count required by the operation.
        expected: usize,
        /// Channel count that was supplied.
        actual: usize,
    },

    /// A replacement grid does not have the same voxel count.
    #[error("sampling sizes do not match: expected {expected} voxels, got {actual}")]
    SizeMismatch {
        /// Voxel count required by the operation.
        expected: usize,
        /// Voxel count that was supplied.
        actual: usize,
    },

    /// A polyline and its per-vertex attributes have different lengths.
    #[error("polyline has {points} points but {attributes} attributes")]
    AttributeMismatch {
        /// Number of polyline vertices.
        points: usize,
        /// Number of attribute vectors.
        attributes: usize,
    },

    /// A raw buffer does not hold `size * channels` elements.
    #[error("buffer holds {actual} elements, expected {expected}")]
    BufferLength {
        /// Required element count.
        expected: usize,
        /// Supplied element count.
        actual: usize,
    },
}

/// Result type for lattice and volume operations.
pub type Result<T> = std::result::Result<T, VolumeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = VolumeError::InvalidDelta {
            axis: 1,
            value: -0.5,
        };
        assert_eq!(format!("{err}"), "invalid spacing on axis 1: -0.5");

        let err = VolumeError::IndexOutOfRange {
            sample: Sample::new(4, 0, 1),
            num: [4, 4, 4],
        };
        assert_eq!(
            format!("{err}"),
            "invalid sample (4, 0, 1) in sampling of size 4x4x4"
        );
    }

    #[test]
    fn test_range_parse_display_names_axis_and_token() {
        let err = VolumeError::RangeParse {
            axis: 2,
            token: "a:b".to_string(),
            reason: "not an integer".to_string(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("axis 2"));
        assert!(msg.contains("a:b"));
    }
}
