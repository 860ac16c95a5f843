use thiserror::Error;

pub type Result<T> = std::result::Result<T, ErosionError>;

#[derive(Error, Debug)]
pub enum ErosionError {
    /// Non-positive or mismatched grid dimensions, or an initial value outside \[0, 1\].
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    /// A zero-length vector was passed where a direction is required.
    #[error("degenerate vector: [{x}, {y}, {z}] has no direction")]
    DegenerateVector { x: f32, y: f32, z: f32 },

    /// A voxel index outside the grid extents.
    #[error("voxel ({x}, {y}, {z}) is outside grid {dimensions:?}")]
    OutOfBounds {
        x: usize,
        y: usize,
        z: usize,
        dimensions: (usize, usize, usize),
    },

    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("failed to read config: {0}")]
    ConfigIo(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] serde_yaml::Error),
}

impl ErosionError {
    pub fn invalid_parameter(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}
