pub mod shape;
pub mod voxel_grid;

pub use shape::{CylinderAxis, Shape};
pub use voxel_grid::{SurfaceRule, VoxelGrid, VoxelIndex, EPSILON};
