use nannou::glam::Vec3;

use crate::error::Result;
use crate::volume::VoxelGrid;

pub mod deterministic;
pub use deterministic::{DeterministicErosion, DeterministicParams};

pub mod exposure;
pub use exposure::{exposure, normalize, reference_center};

pub mod stochastic;
pub use stochastic::{StochasticErosion, StochasticParams};

/// Background exposure added to every surface voxel before stochastic sampling.
pub const BACKGROUND_EXPOSURE: f32 = 1e-6;

/// A model that removes material from a grid once per time step.
pub trait ErosionRate {
    /// Erode one time step worth of material, with the flow source [source_height] above the
    /// body along the flow axis.
    fn apply(&mut self, grid: &mut VoxelGrid, source_height: f32) -> Result<()>;

    /// The unit flow direction driving the erosion.
    fn flow(&self) -> Vec3;
}

/// The erosion model selected by configuration.
#[derive(Debug, Clone)]
pub enum ErosionModel {
    Deterministic(DeterministicErosion),
    Stochastic(StochasticErosion),
}

impl ErosionModel {
    pub fn name(&self) -> &'static str {
        match self {
            ErosionModel::Deterministic(_) => "deterministic",
            ErosionModel::Stochastic(_) => "stochastic",
        }
    }
}

impl ErosionRate for ErosionModel {
    fn apply(&mut self, grid: &mut VoxelGrid, source_height: f32) -> Result<()> {
        match self {
            ErosionModel::Deterministic(model) => model.apply(grid, source_height),
            ErosionModel::Stochastic(model) => model.apply(grid, source_height),
        }
    }

    fn flow(&self) -> Vec3 {
        match self {
            ErosionModel::Deterministic(model) => model.flow(),
            ErosionModel::Stochastic(model) => model.flow(),
        }
    }
}

impl From<DeterministicErosion> for ErosionModel {
    fn from(model: DeterministicErosion) -> Self {
        ErosionModel::Deterministic(model)
    }
}

impl From<StochasticErosion> for ErosionModel {
    fn from(model: StochasticErosion) -> Self {
        ErosionModel::Stochastic(model)
    }
}
