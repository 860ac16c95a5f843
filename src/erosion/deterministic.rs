use nannou::glam::Vec3;

use crate::erosion::{exposure, normalize, reference_center, ErosionRate};
use crate::error::{ErosionError, Result};
use crate::volume::{SurfaceRule, VoxelGrid};

#[derive(Debug, Clone, Copy)]
pub struct DeterministicParams {
    /// Direction of the flow; normalized on construction.
    pub flow: Vec3,
    /// Material removed from a fully exposed voxel per step.
    pub rate: f32,
    pub surface: SurfaceRule,
}

impl Default for DeterministicParams {
    fn default() -> Self {
        Self {
            flow: Vec3::new(0.0, 0.0, -1.0),
            rate: 0.01,
            surface: SurfaceRule::FlowFacing,
        }
    }
}

/// Erodes every surface voxel in proportion to its exposure to the flow.
#[derive(Debug, Clone)]
pub struct DeterministicErosion {
    flow: Vec3,
    rate: f32,
    surface: SurfaceRule,
}

impl DeterministicErosion {
    pub fn new(params: DeterministicParams) -> Result<Self> {
        if !params.rate.is_finite() || params.rate <= 0.0 {
            return Err(ErosionError::invalid_parameter(
                "erosion_rate",
                format!("must be > 0, got {}", params.rate),
            ));
        }

        Ok(Self {
            flow: normalize(params.flow)?,
            rate: params.rate,
            surface: params.surface,
        })
    }

    pub fn rate(&self) -> f32 {
        self.rate
    }
}

impl ErosionRate for DeterministicErosion {
    fn apply(&mut self, grid: &mut VoxelGrid, source_height: f32) -> Result<()> {
        let surface = self.surface.select(grid, self.flow);
        let source = reference_center(grid, self.flow, source_height);
        let scores = exposure(&surface, source, self.flow);

        // zero exposure erodes by zero; the voxel is still visited
        for (index, e) in surface.iter().zip(scores) {
            grid.erode_voxel(*index, e * self.rate)?;
        }

        log::trace!("eroded {} surface voxels", surface.len());

        Ok(())
    }

    fn flow(&self) -> Vec3 {
        self.flow
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(flow: Vec3, rate: f32) -> DeterministicErosion {
        DeterministicErosion::new(DeterministicParams {
            flow,
            rate,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_rejects_non_positive_rate() {
        let result = DeterministicErosion::new(DeterministicParams {
            rate: 0.0,
            ..Default::default()
        });
        assert!(matches!(result, Err(ErosionError::InvalidParameter { .. })));
    }

    #[test]
    fn test_rejects_zero_flow() {
        let result = DeterministicErosion::new(DeterministicParams {
            flow: Vec3::ZERO,
            ..Default::default()
        });
        assert!(matches!(result, Err(ErosionError::DegenerateVector { .. })));
    }

    #[test]
    fn test_flow_is_normalized() {
        let m = model(Vec3::new(0.0, 0.0, -5.0), 0.1);
        assert_eq!(m.flow(), Vec3::new(0.0, 0.0, -1.0));
    }

    #[test]
    fn test_erodes_only_flow_facing_layer() {
        let mut grid = VoxelGrid::new((10, 10, 10), 1.0).unwrap();
        let mut m = model(Vec3::new(0.0, 0.0, -1.0), 0.1);

        m.apply(&mut grid, 1.0).unwrap();

        assert!(grid.total_mass(1.0) < 1000.0);

        for index in grid.indices() {
            let v = grid.get(index).unwrap();
            if index.2 == 0 {
                assert!(v < 1.0);
                assert!(v >= 0.9);
            } else {
                assert_eq!(v, 1.0);
            }
        }
    }

    #[test]
    fn test_erosion_follows_exposure() {
        let mut grid = VoxelGrid::new((9, 9, 3), 1.0).unwrap();
        let mut m = model(Vec3::new(0.0, 0.0, -1.0), 0.5);

        m.apply(&mut grid, 0.0).unwrap();

        // the voxel under the source is eroded most, the corners least
        let middle = grid.get((4, 4, 0)).unwrap();
        let corner = grid.get((0, 0, 0)).unwrap();

        assert!(middle < corner);
    }

    #[test]
    fn test_morphological_rule_erodes_all_faces() {
        let mut grid = VoxelGrid::new((5, 5, 5), 1.0).unwrap();
        let mut m = DeterministicErosion::new(DeterministicParams {
            flow: Vec3::new(0.0, 0.0, -1.0),
            rate: 0.1,
            surface: SurfaceRule::Morphological,
        })
        .unwrap();

        m.apply(&mut grid, 1.0).unwrap();

        // the whole shell lies below the source, so every boundary voxel is exposed
        for index in grid.indices() {
            let interior = [index.0, index.1, index.2].iter().all(|c| (1..4).contains(c));
            let v = grid.get(index).unwrap();

            if interior {
                assert_eq!(v, 1.0);
            } else {
                assert!(v < 1.0);
            }
        }
    }
}
