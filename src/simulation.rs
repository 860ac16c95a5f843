use crate::erosion::{ErosionModel, ErosionRate};
use crate::error::{ErosionError, Result};
use crate::volume::VoxelGrid;

/// Advances a grid through a fixed number of erosion steps and records how its mass evolves.
#[derive(Debug, Clone)]
pub struct TimeIntegrator<M = ErosionModel> {
    /// The grid being eroded.
    state: VoxelGrid,
    /// The erosion model applied once per step.
    model: M,
    /// Number of steps executed by [run].
    step_count: usize,
    /// Total mass after each completed step.
    mass_history: Vec<f64>,
    /// Copies of the grid before each step, plus one of the final state.
    snapshots: Vec<VoxelGrid>,
}

impl<M: ErosionRate> TimeIntegrator<M> {
    pub fn new(state: VoxelGrid, model: M, step_count: usize) -> Self {
        Self {
            state,
            model,
            step_count,
            mass_history: vec![],
            snapshots: vec![],
        }
    }

    /// Run every step from the current state, replacing any previously recorded history.
    ///
    /// An error from the model stops the run; the history recorded up to the last completed step
    /// remains available.
    pub fn run(&mut self, log_interval: usize, keep_snapshots: bool, source_height: f32) -> Result<()> {
        if log_interval == 0 {
            return Err(ErosionError::invalid_parameter(
                "log_interval",
                "must be a positive number of steps",
            ));
        }

        self.mass_history.clear();
        self.snapshots.clear();

        for step in 0..self.step_count {
            if keep_snapshots {
                self.snapshots.push(self.state.clone());
            }

            let mass = self.step(source_height)?;

            if step % log_interval == 0 {
                log::info!("step {:4}: mass = {:.3}", step, mass);
            }
        }

        if keep_snapshots {
            self.snapshots.push(self.state.clone());
        }

        Ok(())
    }

    /// Apply the model once and record the resulting mass.
    pub fn step(&mut self, source_height: f32) -> Result<f64> {
        self.model.apply(&mut self.state, source_height)?;

        let mass = self.state.total_mass(1.0);
        self.mass_history.push(mass);

        Ok(mass)
    }

    /// Refill the grid and forget the recorded history.
    pub fn reset(&mut self) {
        self.state.reset();
        self.mass_history.clear();
        self.snapshots.clear();
    }

    pub fn history(&self) -> &[f64] {
        &self.mass_history
    }

    pub fn snapshots(&self) -> &[VoxelGrid] {
        &self.snapshots
    }

    pub fn state(&self) -> &VoxelGrid {
        &self.state
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn step_count(&self) -> usize {
        self.step_count
    }
}
