use nannou::glam::Vec3;
use rand_distr::{Distribution, Normal};

use crate::erosion::{exposure, normalize, reference_center, ErosionRate, BACKGROUND_EXPOSURE};
use crate::error::{ErosionError, Result};
use crate::rand::{seeded_rng, weighted_sample, SimRng};
use crate::volume::{SurfaceRule, VoxelGrid, VoxelIndex};

#[derive(Debug, Clone, Copy)]
pub struct StochasticParams {
    /// Direction of the flow; normalized on construction.
    pub flow: Vec3,
    /// Mean material removed per erosion event.
    pub mean: f32,
    /// Standard deviation of the material removed per event.
    pub std: f32,
    /// Fraction of the surface voxels hit each step.
    pub fraction: f32,
    /// Seed for a reproducible run. Seeded from entropy when absent.
    pub seed: Option<u64>,
    pub surface: SurfaceRule,
}

impl Default for StochasticParams {
    fn default() -> Self {
        Self {
            flow: Vec3::new(0.0, 0.0, -1.0),
            mean: 0.01,
            std: 0.005,
            fraction: 0.2,
            seed: None,
            surface: SurfaceRule::FlowFacing,
        }
    }
}

/// Erodes a random subset of the surface each step, favoring the voxels most exposed to the flow.
#[derive(Debug, Clone)]
pub struct StochasticErosion {
    flow: Vec3,
    fraction: f32,
    surface: SurfaceRule,
    amount: Normal<f32>,
    rand: SimRng,
    /// The voxels hit by the most recent step, in selection order.
    selected: Vec<VoxelIndex>,
}

impl StochasticErosion {
    pub fn new(params: StochasticParams) -> Result<Self> {
        if !params.mean.is_finite() || params.mean <= 0.0 {
            return Err(ErosionError::invalid_parameter(
                "erosion_rate",
                format!("mean must be > 0, got {}", params.mean),
            ));
        }

        if !params.std.is_finite() || params.std < 0.0 {
            return Err(ErosionError::invalid_parameter(
                "erosion_std",
                format!("must be >= 0, got {}", params.std),
            ));
        }

        // a fraction of zero is accepted and leaves the body untouched
        if !(0.0..=1.0).contains(&params.fraction) {
            return Err(ErosionError::invalid_parameter(
                "erosion_fraction",
                format!("must be within [0, 1], got {}", params.fraction),
            ));
        }

        let amount = Normal::new(params.mean, params.std)
            .map_err(|e| ErosionError::invalid_parameter("erosion_std", e.to_string()))?;

        Ok(Self {
            flow: normalize(params.flow)?,
            fraction: params.fraction,
            surface: params.surface,
            amount,
            rand: seeded_rng(params.seed),
            selected: vec![],
        })
    }

    /// The voxels eroded by the most recent step.
    pub fn last_selection(&self) -> &[VoxelIndex] {
        &self.selected
    }
}

impl ErosionRate for StochasticErosion {
    fn apply(&mut self, grid: &mut VoxelGrid, source_height: f32) -> Result<()> {
        self.selected.clear();

        let surface = self.surface.select(grid, self.flow);

        if surface.is_empty() {
            return Ok(());
        }

        let source = reference_center(grid, self.flow, source_height);
        let mut scores = exposure(&surface, source, self.flow);

        if scores.iter().sum::<f32>() == 0.0 {
            return Ok(()); // nothing faces the source
        }

        for s in scores.iter_mut() {
            *s += BACKGROUND_EXPOSURE;
        }

        let k = (surface.len() as f32 * self.fraction).floor() as usize;

        // selection draws come first, then one amount per selected voxel
        let picks = weighted_sample(&mut self.rand, &scores, k);

        for i in picks.iter().cloned() {
            let amount = self.amount.sample(&mut self.rand).max(0.0) * scores[i];

            grid.erode_voxel(surface[i], amount)?;
            self.selected.push(surface[i]);
        }

        log::trace!(
            "eroded {} of {} surface voxels",
            self.selected.len(),
            surface.len()
        );

        Ok(())
    }

    fn flow(&self) -> Vec3 {
        self.flow
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(seed: u64) -> StochasticParams {
        StochasticParams {
            mean: 0.2,
            std: 0.05,
            fraction: 0.3,
            seed: Some(seed),
            ..Default::default()
        }
    }

    #[test]
    fn test_rejects_invalid_parameters() {
        let bad = [
            StochasticParams {
                mean: 0.0,
                ..params(1)
            },
            StochasticParams {
                std: -0.1,
                ..params(1)
            },
            StochasticParams {
                fraction: 1.5,
                ..params(1)
            },
            StochasticParams {
                fraction: -0.1,
                ..params(1)
            },
        ];

        for p in bad {
            let result = StochasticErosion::new(p);
            assert!(matches!(result, Err(ErosionError::InvalidParameter { .. })));
        }
    }

    #[test]
    fn test_selects_floor_of_fraction() {
        let mut grid = VoxelGrid::new((10, 10, 10), 1.0).unwrap();
        let mut model = StochasticErosion::new(params(5)).unwrap();

        model.apply(&mut grid, 1.0).unwrap();

        // 100 voxels face the flow, 30% of them are hit
        assert_eq!(model.last_selection().len(), 30);
        assert!(model.last_selection().iter().all(|(_, _, z)| *z == 0));

        let touched = grid.values().iter().filter(|v| **v < 1.0).count();
        assert!(touched <= 30);
    }

    #[test]
    fn test_zero_fraction_is_a_no_op() {
        let mut grid = VoxelGrid::new((6, 6, 6), 1.0).unwrap();
        let mut model = StochasticErosion::new(StochasticParams {
            fraction: 0.0,
            ..params(5)
        })
        .unwrap();

        for _ in 0..10 {
            model.apply(&mut grid, 1.0).unwrap();
        }

        assert_eq!(grid.total_mass(1.0), 216.0);
    }

    #[test]
    fn test_empty_grid_is_a_no_op() {
        let mut grid = VoxelGrid::from_values((2, 2, 2), 1.0, vec![0.0; 8]).unwrap();
        let mut model = StochasticErosion::new(params(5)).unwrap();

        model.apply(&mut grid, 1.0).unwrap();

        assert!(model.last_selection().is_empty());
        assert_eq!(grid.total_mass(1.0), 0.0);
    }

    #[test]
    fn test_source_behind_body_draws_nothing() {
        let mut grid = VoxelGrid::new((6, 6, 6), 1.0).unwrap();
        let mut model = StochasticErosion::new(params(4)).unwrap();

        // downstream of every surface voxel, so no exposure anywhere
        model.apply(&mut grid, -100.0).unwrap();

        assert!(model.last_selection().is_empty());
        assert_eq!(grid.total_mass(1.0), 216.0);

        let mut fresh = StochasticErosion::new(params(4)).unwrap();
        let mut fresh_grid = grid.clone();

        model.apply(&mut grid, 1.0).unwrap();
        fresh.apply(&mut fresh_grid, 1.0).unwrap();

        assert!(!model.last_selection().is_empty());
        assert_eq!(model.last_selection(), fresh.last_selection());
        assert_eq!(grid, fresh_grid);
    }

    #[test]
    fn test_same_seed_same_selection() {
        let mut a = StochasticErosion::new(params(11)).unwrap();
        let mut b = StochasticErosion::new(params(11)).unwrap();

        let mut grid_a = VoxelGrid::new((8, 8, 8), 1.0).unwrap();
        let mut grid_b = grid_a.clone();

        for _ in 0..5 {
            a.apply(&mut grid_a, 1.0).unwrap();
            b.apply(&mut grid_b, 1.0).unwrap();
            assert_eq!(a.last_selection(), b.last_selection());
        }

        assert_eq!(grid_a, grid_b);
    }

    #[test]
    fn test_zero_std_erodes_by_scaled_mean() {
        let mut grid = VoxelGrid::new((4, 4, 4), 1.0).unwrap();
        let mut model = StochasticErosion::new(StochasticParams {
            std: 0.0,
            fraction: 1.0,
            ..params(2)
        })
        .unwrap();

        model.apply(&mut grid, 1.0).unwrap();

        assert_eq!(model.last_selection().len(), 16);

        for index in model.last_selection() {
            let v = grid.get(*index).unwrap();
            assert!(v < 1.0 && v >= 0.8 - 1e-6);
        }
    }
}
