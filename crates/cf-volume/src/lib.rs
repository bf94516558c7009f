//! Voxel lattice geometry and typed volume storage for CortenForge.
//!
//! This crate is the grid-addressing core for volumetric data: intensity images,
//! label maps and multi-channel parameter maps all live on a regular 3D lattice
//! anchored in world space.
//!
//! - [`Sample`] - Integer lattice coordinates `(i, j, k)`
//! - [`Sampling`] - Grid definition: origin, spacing, orientation and counts
//! - [`Volume`] - Dense multi-channel storage of one [`ElementType`]
//! - [`Mask`] - Integer label map with a label name dictionary
//! - [`Aabb`], [`Sphere`], [`Plane`], [`Segment`] and the [`Region`] trait
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate with **zero Bevy dependencies**. File codecs, viewers and
//! model fitting live elsewhere and reach the data through [`Volume`], [`Mask`] and
//! [`Sampling`].
//!
//! # Coordinate Systems
//!
//! A sampling maps sample indices to world positions with
//!
//! ```text
//! world = start + R · (delta ⊙ (i, j, k))
//! ```
//!
//! where `R` is the grid orientation. World coordinates are continuous `f64` values.
//! Samples are discrete `i32` values and linear indices vary fastest along `i`,
//! then `j`, then `k`.
//!
//! # Example
//!
//! ```
//! use cf_volume::{ElementType, Sample, Sampling, Volume};
//! use nalgebra::{Point3, Vector3};
//!
//! // A 4x4x4 grid with 2 mm spacing
//! let grid = Sampling::new(Point3::origin(), Vector3::new(2.0, 2.0, 2.0), [4, 4, 4]).unwrap();
//!
//! // World and index conversions
//! let sample = grid.nearest(&Point3::new(2.1, 3.9, 6.2));
//! assert_eq!(sample, Sample::new(1, 2, 3));
//! assert_eq!(grid.index(sample).unwrap(), 57);
//!
//! // Store a value
//! let mut volume = Volume::new(grid, ElementType::F32, 1).unwrap();
//! volume.set(sample, 0, 1.5).unwrap();
//! assert_eq!(volume.get_index(57, 0), 1.5);
//! ```
//!
//! # Rasterising Lines
//!
//! ```
//! use cf_volume::{Sample, Sampling, Segment};
//! use nalgebra::Point3;
//!
//! let grid = Sampling::unit([8, 8, 8]).unwrap();
//! let path = grid.traverse(&Segment::new(Point3::origin(), Point3::new(3.0, 2.0, 0.0)));
//!
//! assert_eq!(path.first(), Some(&Sample::new(0, 0, 0)));
//! assert_eq!(path.last(), Some(&Sample::new(3, 2, 0)));
//! for pair in path.windows(2) {
//!     assert_eq!(pair[0].manhattan_distance(pair[1]), 1);
//! }
//! ```
//!
//! # Derived Grids
//!
//! ```
//! use cf_volume::Sampling;
//!
//! let grid = Sampling::unit([10, 10, 10]).unwrap();
//! let half = grid.zoom_uniform(0.5).unwrap();
//! assert_eq!(half.num(), [5, 5, 5]);
//!
//! let slab = grid.range(Some("all,all,4")).unwrap();
//! assert_eq!(slab.num(), [10, 10, 1]);
//! ```

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod affine;
mod element;
mod error;
mod iter;
mod mask;
mod model;
mod params;
mod range;
mod sample;
mod sampling;
mod shapes;
mod traverse;
mod volume;

// Re-export core types
pub use affine::Affine;
pub use element::{ElementType, ParseElementTypeError, VoxelBuffer};
pub use error::{Result, VolumeError};
pub use iter::SampleIter;
pub use mask::{BACKGROUND, Mask};
pub use model::{ModelType, ParseModelTypeError};
pub use params::{TypePolicy, VolumeParams};
pub use sample::Sample;
pub use sampling::{COMPATIBLE_TOLERANCE, Sampling, SamplingParts};
pub use shapes::{Aabb, Plane, Predicate, Region, Segment, Sphere};
pub use traverse::SegmentTraversal;
pub use volume::Volume;

// Re-export nalgebra types for convenience
pub use nalgebra::{Point3, UnitQuaternion, Vector3};
