use crate::error::{ErosionError, Result};
use crate::volume::VoxelGrid;

/// Summary statistics of a mass history.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MassSummary {
    pub initial_mass: f64,
    pub final_mass: f64,
    pub total_loss: f64,
    /// Mean mass lost per recorded step.
    pub mean_loss_rate: f64,
    /// The first step at which half of the initial mass is gone, if it ever is.
    pub half_mass_step: Option<usize>,
}

impl MassSummary {
    pub fn from_history(history: &[f64]) -> Option<Self> {
        let initial_mass = *history.first()?;
        let final_mass = *history.last()?;

        let total_loss = initial_mass - final_mass;
        let half_mass = initial_mass * 0.5;

        Some(Self {
            initial_mass,
            final_mass,
            total_loss,
            mean_loss_rate: total_loss / history.len() as f64,
            half_mass_step: history.iter().position(|m| *m <= half_mass),
        })
    }
}

/// Mass before every step followed by the final mass, one entry per snapshot of a run.
pub fn mass_curve(initial_mass: f64, history: &[f64]) -> Vec<f64> {
    std::iter::once(initial_mass)
        .chain(history.iter().copied())
        .collect()
}

/// Material lost by each voxel between two states of the same grid.
pub fn erosion_map(before: &VoxelGrid, after: &VoxelGrid) -> Result<Vec<f32>> {
    if before.dimensions() != after.dimensions() {
        return Err(ErosionError::InvalidGeometry(format!(
            "cannot compare grids of {:?} and {:?}",
            before.dimensions(),
            after.dimensions()
        )));
    }

    let erosion = before
        .values()
        .iter()
        .zip(after.values())
        .map(|(b, a)| (b - a).max(0.0))
        .collect();

    Ok(erosion)
}
