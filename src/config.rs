use std::path::Path;

use nannou::glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::erosion::{
    DeterministicErosion, DeterministicParams, ErosionModel, StochasticErosion, StochasticParams,
};
use crate::error::{ErosionError, Result};
use crate::simulation::TimeIntegrator;
use crate::volume::{CylinderAxis, Shape, SurfaceRule, VoxelGrid};

/// A complete simulation setup, usually loaded from YAML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// The eroded body.
    #[serde(alias = "soap")]
    pub body: BodyConfig,
    pub erosion_model: ErosionConfig,
    #[serde(default)]
    pub simulation: RunConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BodyConfig {
    /// Grid dimensions in voxels.
    pub size: [usize; 3],
    /// Physical edge length of one voxel.
    #[serde(default = "default_resolution")]
    pub voxel_resolution: f32,
    /// One of cuboid, ellipsoid, cylinder, rounded_cuboid.
    #[serde(default = "default_geometry")]
    pub geometry: String,
    #[serde(default)]
    pub cylinder_axis: CylinderAxis,
    /// Superellipsoid exponent of the rounded cuboid.
    #[serde(default = "default_roundness")]
    pub roundness: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErosionConfig {
    /// Either deterministic or stochastic.
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default = "default_flow")]
    pub flow_vector: [f32; 3],
    /// Base rate of the deterministic model, mean amount of the stochastic model.
    pub erosion_rate: f32,
    #[serde(default = "default_std")]
    pub erosion_std: f32,
    #[serde(default = "default_fraction")]
    pub erosion_fraction: f32,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "default_source_height")]
    pub water_source_height: f32,
    #[serde(default)]
    pub surface: SurfaceRule,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default = "default_steps")]
    pub steps: usize,
    #[serde(default = "default_log_interval")]
    pub log_interval: usize,
    #[serde(default = "default_keep_snapshots")]
    pub keep_snapshots: bool,
}

fn default_resolution() -> f32 {
    1.0
}

fn default_geometry() -> String {
    "cuboid".to_string()
}

fn default_roundness() -> f32 {
    6.0
}

fn default_flow() -> [f32; 3] {
    [0.0, 0.0, -1.0]
}

fn default_std() -> f32 {
    0.005
}

fn default_fraction() -> f32 {
    0.2
}

fn default_source_height() -> f32 {
    1.0
}

fn default_steps() -> usize {
    100
}

fn default_log_interval() -> usize {
    10
}

fn default_keep_snapshots() -> bool {
    true
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            steps: default_steps(),
            log_interval: default_log_interval(),
            keep_snapshots: default_keep_snapshots(),
        }
    }
}

impl SimulationConfig {
    /// Load and validate a YAML config file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&content)
    }

    /// Parse and validate a YAML config document.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config: SimulationConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let [nx, ny, nz] = self.body.size;

        if nx == 0 || ny == 0 || nz == 0 {
            return Err(ErosionError::InvalidGeometry(format!(
                "body.size must be positive, got {:?}",
                self.body.size
            )));
        }

        if !(self.body.voxel_resolution > 0.0) {
            return Err(ErosionError::InvalidGeometry(format!(
                "body.voxel_resolution must be positive, got {}",
                self.body.voxel_resolution
            )));
        }

        if self.simulation.log_interval == 0 {
            return Err(ErosionError::invalid_parameter(
                "log_interval",
                "must be a positive number of steps",
            ));
        }

        self.shape()?;
        self.build_model()?;

        Ok(())
    }

    /// The initial shape of the body.
    pub fn shape(&self) -> Result<Shape> {
        let shape = match self.body.geometry.as_str() {
            "cuboid" => Shape::Cuboid,
            "ellipsoid" => Shape::Ellipsoid,
            "cylinder" => Shape::Cylinder {
                axis: self.body.cylinder_axis,
            },
            "rounded_cuboid" => {
                if !(self.body.roundness > 0.0) {
                    return Err(ErosionError::invalid_parameter(
                        "roundness",
                        format!("must be > 0, got {}", self.body.roundness),
                    ));
                }

                Shape::RoundedCuboid {
                    exponent: self.body.roundness,
                }
            }
            other => {
                return Err(ErosionError::invalid_parameter(
                    "geometry",
                    format!("unsupported geometry '{}'", other),
                ))
            }
        };

        Ok(shape)
    }

    pub fn build_grid(&self) -> Result<VoxelGrid> {
        let [nx, ny, nz] = self.body.size;
        self.shape()?
            .generate((nx, ny, nz), self.body.voxel_resolution)
    }

    /// Select and construct the erosion model named by the config.
    pub fn build_model(&self) -> Result<ErosionModel> {
        let e = &self.erosion_model;
        let flow = Vec3::from(e.flow_vector);

        let model: ErosionModel = match e.kind.as_str() {
            "deterministic" => DeterministicErosion::new(DeterministicParams {
                flow,
                rate: e.erosion_rate,
                surface: e.surface,
            })?
            .into(),
            "stochastic" => StochasticErosion::new(StochasticParams {
                flow,
                mean: e.erosion_rate,
                std: e.erosion_std,
                fraction: e.erosion_fraction,
                seed: e.seed,
                surface: e.surface,
            })?
            .into(),
            other => {
                return Err(ErosionError::invalid_parameter(
                    "type",
                    format!("unsupported erosion model '{}'", other),
                ))
            }
        };

        Ok(model)
    }

    pub fn build_integrator(&self) -> Result<TimeIntegrator> {
        Ok(TimeIntegrator::new(
            self.build_grid()?,
            self.build_model()?,
            self.simulation.steps,
        ))
    }

    /// A short name describing the run, suitable for window titles and file names.
    pub fn label(&self) -> String {
        let [fx, fy, fz] = self.erosion_model.flow_vector;

        format!(
            "{}_{}_v-{}_{}_{}_r-{}_w-{}",
            self.erosion_model.kind,
            self.body.geometry,
            fx,
            fy,
            fz,
            self.erosion_model.erosion_rate,
            self.erosion_model.water_source_height
        )
    }
}
