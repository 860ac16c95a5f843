use nannou::glam::Vec3;

use crate::error::{ErosionError, Result};
use crate::volume::{VoxelGrid, VoxelIndex};

/// Returns the unit vector pointing along [v].
pub fn normalize(v: Vec3) -> Result<Vec3> {
    let length = v.length();

    if length == 0.0 || !length.is_finite() {
        return Err(ErosionError::DegenerateVector {
            x: v.x,
            y: v.y,
            z: v.z,
        });
    }

    Ok(v / length)
}

/// Find the virtual flow source used to compute exposure.
///
/// The source sits upstream of the grid center by the body's half extent projected on the flow
/// axis, so it lies on or outside the body boundary, plus an extra [source_height].
pub fn reference_center(grid: &VoxelGrid, flow: Vec3, source_height: f32) -> Vec3 {
    let (nx, ny, nz) = grid.dimensions();

    let half_extents = Vec3::new(nx as f32, ny as f32, nz as f32) * 0.5;
    let baseline = half_extents.dot(flow).abs();

    half_extents - flow * (baseline + source_height)
}

/// Score how directly each voxel faces a flow arriving from [source].
///
/// Each score is the cosine between the flow and the direction from the source to the voxel,
/// clamped to zero for voxels facing away. A voxel sitting exactly on the source scores 1.
pub fn exposure(voxels: &[VoxelIndex], source: Vec3, flow: Vec3) -> Vec<f32> {
    voxels
        .iter()
        .map(|(x, y, z)| {
            let d = Vec3::new(*x as f32, *y as f32, *z as f32) - source;
            let length = d.length();

            if length == 0.0 {
                1.0
            } else {
                (d / length).dot(flow).clamp(0.0, 1.0)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        let n = normalize(Vec3::new(0.0, 3.0, -4.0)).unwrap();
        assert!((n - Vec3::new(0.0, 0.6, -0.8)).length() < 1e-6);
    }

    #[test]
    fn test_normalize_zero_is_degenerate() {
        let result = normalize(Vec3::ZERO);
        assert!(matches!(result, Err(ErosionError::DegenerateVector { .. })));
    }

    #[test]
    fn test_reference_center_is_upstream() {
        let grid = VoxelGrid::new((10, 10, 10), 1.0).unwrap();
        let flow = Vec3::new(0.0, 0.0, -1.0);

        let center = reference_center(&grid, flow, 2.0);

        assert_eq!(center, Vec3::new(5.0, 5.0, 12.0));
    }

    #[test]
    fn test_reference_center_projects_half_extents() {
        let grid = VoxelGrid::new((20, 10, 4), 1.0).unwrap();
        let flow = normalize(Vec3::new(1.0, 1.0, 0.0)).unwrap();

        let center = reference_center(&grid, flow, 0.0);

        // |(10, 5, 2) . (1, 1, 0) / sqrt(2)| = 15 / sqrt(2)
        let expected = Vec3::new(10.0, 5.0, 2.0) - flow * (15.0 / 2f32.sqrt());
        assert!((center - expected).length() < 1e-5);
    }

    #[test]
    fn test_exposure_is_clamped_cosine() {
        let source = Vec3::new(0.0, 0.0, 10.0);
        let flow = Vec3::new(0.0, 0.0, -1.0);

        let voxels = [(0, 0, 0), (3, 0, 6), (0, 0, 20)];
        let scores = exposure(&voxels, source, flow);

        assert!((scores[0] - 1.0).abs() < 1e-6);
        assert!((scores[1] - 0.8).abs() < 1e-6);
        assert_eq!(scores[2], 0.0);
    }

    #[test]
    fn test_exposure_at_source_is_one() {
        let scores = exposure(&[(2, 2, 2)], Vec3::splat(2.0), Vec3::X);
        assert_eq!(scores, vec![1.0]);
    }

    #[test]
    fn test_exposure_in_unit_range() {
        let grid = VoxelGrid::new((6, 7, 8), 1.0).unwrap();
        let flow = normalize(Vec3::new(0.3, -1.0, 0.5)).unwrap();
        let source = reference_center(&grid, flow, 1.0);

        let voxels: Vec<_> = grid.indices().collect();

        for e in exposure(&voxels, source, flow) {
            assert!((0.0..=1.0).contains(&e));
        }
    }
}
