//! Erosion of a voxelized solid under a directional flow.
//!
//! A [VoxelGrid] holds the intactness of every cell. Each time step an [ErosionModel] picks the
//! surface voxels facing the flow, scores how directly they face a virtual flow source, and
//! removes material accordingly. The [TimeIntegrator] drives the steps and records the mass
//! history and optional snapshots of the grid.

pub mod analysis;
pub mod config;
pub mod erosion;
pub mod error;
pub mod rand;
pub mod simulation;
pub mod util;
pub mod volume;

pub use analysis::{erosion_map, mass_curve, MassSummary};
pub use config::SimulationConfig;
pub use erosion::{
    DeterministicErosion, DeterministicParams, ErosionModel, ErosionRate, StochasticErosion,
    StochasticParams,
};
pub use error::{ErosionError, Result};
pub use simulation::TimeIntegrator;
pub use volume::{Shape, SurfaceRule, VoxelGrid, VoxelIndex};
