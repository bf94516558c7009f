//! Property-based tests for lattice geometry and volume storage.
//!
//! These tests use proptest to generate random grids and verify invariants.
//!
//! Run with: cargo test -p cf-volume -- proptest

#![allow(clippy::unwrap_used, clippy::cast_possible_truncation, clippy::cast_possible_wrap)]

use cf_volume::{ElementType, Mask, Region, Sample, Sampling, Segment, Sphere, Volume};
use nalgebra::{Point3, UnitQuaternion, Vector3};
use proptest::prelude::*;

// =============================================================================
// Strategies
// =============================================================================

/// Grid counts small enough to iterate exhaustively.
fn arb_num() -> impl Strategy<Value = [usize; 3]> {
    prop::array::uniform3(1usize..12)
}

/// Strictly positive spacing.
fn arb_delta() -> impl Strategy<Value = Vector3<f64>> {
    prop::array::uniform3(0.1..5.0f64).prop_map(|[x, y, z]| Vector3::new(x, y, z))
}

fn arb_start() -> impl Strategy<Value = Point3<f64>> {
    prop::array::uniform3(-50.0..50.0f64).prop_map(|[x, y, z]| Point3::new(x, y, z))
}

fn arb_orientation() -> impl Strategy<Value = UnitQuaternion<f64>> {
    prop::array::uniform3(-std::f64::consts::PI..std::f64::consts::PI)
        .prop_map(|[r, p, y]| UnitQuaternion::from_euler_angles(r, p, y))
}

/// An arbitrary oriented grid.
fn arb_sampling() -> impl Strategy<Value = Sampling> {
    (arb_start(), arb_delta(), arb_orientation(), arb_num()).prop_map(
        |(start, delta, orientation, num)| {
            Sampling::with_orientation(start, delta, orientation, num).unwrap()
        },
    )
}

/// A grid together with one sample inside it.
fn arb_sampling_and_sample() -> impl Strategy<Value = (Sampling, Sample)> {
    arb_sampling().prop_flat_map(|grid| {
        let [ni, nj, nk] = grid.num();
        (
            Just(grid),
            (0..ni as i32, 0..nj as i32, 0..nk as i32).prop_map(|(i, j, k)| Sample::new(i, j, k)),
        )
    })
}

/// An axis-aligned unit grid with two continuous points inside it.
fn arb_unit_grid_and_segment() -> impl Strategy<Value = (Sampling, Segment)> {
    prop::array::uniform3(2usize..16).prop_flat_map(|num| {
        let grid = Sampling::unit(num).unwrap();
        let point = (
            0.0..(num[0] - 1) as f64,
            0.0..(num[1] - 1) as f64,
            0.0..(num[2] - 1) as f64,
        )
            .prop_map(|(x, y, z)| Point3::new(x, y, z));
        (Just(grid), point.clone(), point)
            .prop_map(|(grid, a, b)| (grid, Segment::new(a, b)))
    })
}

/// A unit grid with two points whose coordinates are multiples of one half, so
/// endpoints often sit exactly on voxel boundaries.
fn arb_unit_grid_and_boundary_segment() -> impl Strategy<Value = (Sampling, Segment)> {
    prop::array::uniform3(2usize..12).prop_flat_map(|num| {
        let grid = Sampling::unit(num).unwrap();
        let halves = num.map(|n| 0..(2 * (n as i32 - 1)));
        let point = (halves[0].clone(), halves[1].clone(), halves[2].clone()).prop_map(
            |(x, y, z)| Point3::new(f64::from(x) * 0.5, f64::from(y) * 0.5, f64::from(z) * 0.5),
        );
        (Just(grid), point.clone(), point)
            .prop_map(|(grid, a, b)| (grid, Segment::new(a, b)))
    })
}

// =============================================================================
// Sampling properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Size always equals the product of the axis counts.
    #[test]
    fn proptest_size_is_product_of_counts(num in arb_num()) {
        let grid = Sampling::unit(num).unwrap();
        prop_assert_eq!(grid.size(), num[0] * num[1] * num[2]);
        prop_assert_eq!(grid.iter().len(), grid.size());
    }

    /// Linear index and sample conversions are inverse.
    #[test]
    fn proptest_index_round_trip((grid, sample) in arb_sampling_and_sample()) {
        let idx = grid.index(sample).unwrap();
        prop_assert!(idx < grid.size());
        prop_assert_eq!(grid.sample(idx), sample);
    }

    /// Iteration visits samples in linear index order.
    #[test]
    fn proptest_iteration_matches_index(num in arb_num()) {
        let grid = Sampling::unit(num).unwrap();
        for (idx, sample) in grid.iter().enumerate() {
            prop_assert_eq!(grid.index(sample).unwrap(), idx);
        }
    }

    /// World and voxel conversions are inverse for oriented grids.
    #[test]
    fn proptest_world_voxel_round_trip((grid, sample) in arb_sampling_and_sample()) {
        let world = grid.world(sample);
        let voxel = grid.voxel(&world);
        prop_assert!((voxel.x - f64::from(sample.i)).abs() < 1e-6);
        prop_assert!((voxel.y - f64::from(sample.j)).abs() < 1e-6);
        prop_assert!((voxel.z - f64::from(sample.k)).abs() < 1e-6);
        prop_assert_eq!(grid.nearest(&world), sample);
    }

    /// Mirroring leaves in-grid samples untouched.
    #[test]
    fn proptest_mirror_is_identity_inside((grid, sample) in arb_sampling_and_sample()) {
        prop_assert_eq!(grid.mirror(sample), sample);
    }

    /// A single reflection brings samples within one grid length back inside.
    #[test]
    fn proptest_mirror_reflects_near_outside(
        num in arb_num(),
        offset in prop::array::uniform3(1i32..12),
    ) {
        let grid = Sampling::unit(num).unwrap();
        let n = num.map(|v| v as i32);
        let below = Sample::new(
            -offset[0].min(n[0] - 1),
            -offset[1].min(n[1] - 1),
            -offset[2].min(n[2] - 1),
        );
        prop_assert!(grid.contains(grid.mirror(below)));

        let above = Sample::new(
            n[0] - 1 + offset[0].min(n[0]),
            n[1] - 1 + offset[1].min(n[1]),
            n[2] - 1 + offset[2].min(n[2]),
        );
        prop_assert!(grid.contains(grid.mirror(above)));
    }

    /// The eight corners lie inside the world-space bounds.
    #[test]
    fn proptest_corners_within_bounds(grid in arb_sampling()) {
        let bounds = grid.bounds();
        for corner in grid.corners() {
            for axis in 0..3 {
                prop_assert!(corner[axis] >= bounds.min[axis] - 1e-9);
                prop_assert!(corner[axis] <= bounds.max[axis] + 1e-9);
            }
        }
    }

    /// Cropping to a sphere keeps every selected sample inside the result.
    #[test]
    fn proptest_crop_contains_region(
        num in prop::array::uniform3(3usize..12),
        radius in 0.5..4.0f64,
    ) {
        let grid = Sampling::unit(num).unwrap();
        let center = grid.world(grid.center());
        let sphere = Sphere::new(center, radius);
        let cropped = grid.crop(&sphere);

        for sample in grid.iter() {
            let world = grid.world(sample);
            if sphere.contains(&world) {
                prop_assert!(cropped.contains(cropped.nearest(&world)));
            }
        }
    }
}

// =============================================================================
// Traversal properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// A path starts at the sample nearest `a` and ends at the one nearest `b`.
    #[test]
    fn proptest_traverse_endpoints((grid, segment) in arb_unit_grid_and_segment()) {
        let path = grid.traverse(&segment);
        prop_assert!(!path.is_empty());
        prop_assert_eq!(path[0], grid.nearest(&segment.a));
        prop_assert_eq!(*path.last().unwrap(), grid.nearest(&segment.b));
    }

    /// Endpoints on voxel boundaries still give a shortest path to the end sample.
    #[test]
    fn proptest_traverse_boundary_endpoints(
        (grid, segment) in arb_unit_grid_and_boundary_segment(),
    ) {
        let path = grid.traverse(&segment);
        let s0 = grid.nearest(&segment.a);
        let s1 = grid.nearest(&segment.b);
        prop_assert_eq!(path[0], s0);
        prop_assert_eq!(*path.last().unwrap(), s1);
        prop_assert_eq!(path.len(), s0.manhattan_distance(s1) as usize + 1);
        for pair in path.windows(2) {
            prop_assert_eq!(pair[0].manhattan_distance(pair[1]), 1);
        }
    }

    /// Consecutive samples are face neighbours.
    #[test]
    fn proptest_traverse_is_face_connected((grid, segment) in arb_unit_grid_and_segment()) {
        let path = grid.traverse(&segment);
        for pair in path.windows(2) {
            prop_assert_eq!(pair[0].manhattan_distance(pair[1]), 1);
        }
        for sample in &path {
            prop_assert!(grid.contains(*sample));
        }
    }
}

// =============================================================================
// Volume and mask properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Resampling onto the same grid reproduces the values.
    #[test]
    fn proptest_resample_same_grid_is_copy(
        num in arb_num(),
        seed_values in prop::collection::vec(-1000.0..1000.0f64, 1..8),
    ) {
        let grid = Sampling::unit(num).unwrap();
        let mut volume = Volume::new(grid.clone(), ElementType::F64, 1).unwrap();
        for idx in 0..grid.size() {
            volume.set_index(idx, 0, seed_values[idx % seed_values.len()]);
        }

        let copy = volume.resample(&grid);
        prop_assert_eq!(copy.element_type(), ElementType::F32);
        for idx in 0..grid.size() {
            let expected = volume.get_index(idx, 0);
            prop_assert!((copy.get_index(idx, 0) - expected).abs() <= expected.abs() * 1e-6);
        }
    }

    /// Projecting a mask onto a finer grid keeps its foreground volume.
    #[test]
    fn proptest_mask_projection_scales_foreground(
        num in prop::array::uniform3(1usize..6),
        labelled in prop::collection::vec(any::<bool>(), 216),
    ) {
        let coarse = Sampling::new(Point3::origin(), Vector3::new(2.0, 2.0, 2.0), num).unwrap();
        let mut source = Mask::new(coarse.clone());
        for idx in 0..coarse.size() {
            if labelled[idx] {
                source.set_index(idx, 1);
            }
        }

        // Each coarse voxel centre lines up with a 2x2x2 block on the fine grid,
        // shifted so the block straddles the centre.
        let fine = Sampling::new(
            Point3::new(-0.5, -0.5, -0.5),
            Vector3::new(1.0, 1.0, 1.0),
            num.map(|v| v * 2),
        )
        .unwrap();
        let mut target = Mask::new(fine);
        target.set_all_from(&source, 3);

        prop_assert_eq!(target.count_foreground(), source.count_foreground() * 8);
        prop_assert!(target.labels().iter().all(|&label| label == 0 || label == 3));
    }
}

// =============================================================================
// Serialization
// =============================================================================

#[cfg(feature = "serde")]
proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Sampling survives a JSON round trip.
    #[test]
    fn proptest_sampling_serde_round_trip(grid in arb_sampling()) {
        let json = serde_json::to_string(&grid).unwrap();
        let back: Sampling = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(back.num(), grid.num());
        prop_assert!(back.compatible(&grid));
    }
}
