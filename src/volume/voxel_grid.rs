use itertools::iproduct;
use nannou::glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::{ErosionError, Result};

/// Values driven below this by erosion are snapped to zero.
pub const EPSILON: f32 = 1e-4;

/// Grid coordinates of a single voxel.
pub type VoxelIndex = (usize, usize, usize);

/// Offsets to the six axis-aligned neighbors of a voxel.
const AXIS_NEIGHBORS: [(i64, i64, i64); 6] = [
    (-1, 0, 0),
    (1, 0, 0),
    (0, -1, 0),
    (0, 1, 0),
    (0, 0, -1),
    (0, 0, 1),
];

/// Which voxels count as exposed surface when an erosion model runs.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceRule {
    /// Voxels whose neighbor one step along the (rounded) flow is empty or outside the grid.
    #[default]
    FlowFacing,
    /// Voxels with at least one empty or out-of-grid axis neighbor.
    Morphological,
}

impl SurfaceRule {
    pub fn select(&self, grid: &VoxelGrid, flow: Vec3) -> Vec<VoxelIndex> {
        match self {
            SurfaceRule::FlowFacing => grid.surface_voxels(flow),
            SurfaceRule::Morphological => grid.boundary_voxels(),
        }
    }
}

/// A dense 3D grid of intactness values in \[0, 1\].
#[derive(Debug, Clone, PartialEq)]
pub struct VoxelGrid {
    /// Number of cells along x, y and z.
    dimensions: (usize, usize, usize),
    /// Physical edge length of one cell.
    resolution: f32,
    /// Cell values, x outermost and z innermost.
    values: Vec<f32>,
}

impl VoxelGrid {
    /// Create a fully intact grid.
    pub fn new(dimensions: (usize, usize, usize), resolution: f32) -> Result<Self> {
        validate_geometry(dimensions, resolution)?;

        let (nx, ny, nz) = dimensions;

        Ok(Self {
            dimensions,
            resolution,
            values: vec![1.0; nx * ny * nz],
        })
    }

    /// Create a grid from a pre-populated buffer laid out x outermost, z innermost.
    pub fn from_values(
        dimensions: (usize, usize, usize),
        resolution: f32,
        values: Vec<f32>,
    ) -> Result<Self> {
        validate_geometry(dimensions, resolution)?;

        let (nx, ny, nz) = dimensions;

        if values.len() != nx * ny * nz {
            return Err(ErosionError::InvalidGeometry(format!(
                "expected {} values for {:?}, got {}",
                nx * ny * nz,
                dimensions,
                values.len()
            )));
        }

        if let Some(v) = values.iter().find(|v| !(0.0..=1.0).contains(*v)) {
            return Err(ErosionError::InvalidGeometry(format!(
                "initial value {} is outside [0, 1]",
                v
            )));
        }

        Ok(Self {
            dimensions,
            resolution,
            values,
        })
    }

    pub fn dimensions(&self) -> (usize, usize, usize) {
        self.dimensions
    }

    pub fn resolution(&self) -> f32 {
        self.resolution
    }

    /// Raw cell values, x outermost and z innermost.
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: VoxelIndex) -> Result<f32> {
        Ok(self.values[self.offset(index)?])
    }

    /// Iterate over every voxel index in storage order.
    pub fn indices(&self) -> impl Iterator<Item = VoxelIndex> {
        let (nx, ny, nz) = self.dimensions;
        iproduct!(0..nx, 0..ny, 0..nz)
    }

    /// Total mass of the remaining material.
    pub fn total_mass(&self, density: f64) -> f64 {
        let sum: f64 = self.values.iter().map(|v| *v as f64).sum();
        let cell_volume = (self.resolution as f64).powi(3);

        sum * density * cell_volume
    }

    /// Number of voxels that still hold any material.
    pub fn active_voxels(&self) -> usize {
        self.values.iter().filter(|v| **v > 0.0).count()
    }

    /// Find the voxels facing the flow.
    ///
    /// A voxel qualifies when it holds material and its neighbor one step along the rounded
    /// flow direction is either empty or outside the grid. With a flow of (0, 0, -1) this is
    /// the layer facing -z.
    pub fn surface_voxels(&self, flow: Vec3) -> Vec<VoxelIndex> {
        let step = rounded_step(flow);

        self.indices()
            .filter(|index| self.is_solid(*index))
            .filter(|index| match self.neighbor(*index, step) {
                Some(n) => !self.is_solid(n),
                None => true,
            })
            .collect()
    }

    /// Find every voxel on the boundary of the material, regardless of flow.
    pub fn boundary_voxels(&self) -> Vec<VoxelIndex> {
        self.indices()
            .filter(|index| self.is_solid(*index))
            .filter(|index| {
                AXIS_NEIGHBORS
                    .iter()
                    .any(|step| match self.neighbor(*index, *step) {
                        Some(n) => !self.is_solid(n),
                        None => true,
                    })
            })
            .collect()
    }

    /// Subtract [rate] from every voxel in [indices].
    pub fn erode(&mut self, indices: &[VoxelIndex], rate: f32) -> Result<()> {
        for index in indices.iter() {
            self.erode_voxel(*index, rate)?;
        }

        Ok(())
    }

    /// Subtract [amount] from a single voxel, snapping the result to zero below [EPSILON].
    pub fn erode_voxel(&mut self, index: VoxelIndex, amount: f32) -> Result<()> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(ErosionError::invalid_parameter(
                "rate",
                format!("erosion amount must be finite and >= 0, got {}", amount),
            ));
        }

        let offset = self.offset(index)?;
        let value = self.values[offset] - amount;

        self.values[offset] = if value < EPSILON { 0.0 } else { value };

        Ok(())
    }

    /// Refill every voxel.
    pub fn reset(&mut self) {
        self.values.fill(1.0);
    }

    fn is_solid(&self, index: VoxelIndex) -> bool {
        let (_, ny, nz) = self.dimensions;
        self.values[(index.0 * ny + index.1) * nz + index.2] > 0.0
    }

    fn neighbor(&self, index: VoxelIndex, step: (i64, i64, i64)) -> Option<VoxelIndex> {
        let (nx, ny, nz) = self.dimensions;

        let x = index.0 as i64 + step.0;
        let y = index.1 as i64 + step.1;
        let z = index.2 as i64 + step.2;

        let inside = (0..nx as i64).contains(&x)
            && (0..ny as i64).contains(&y)
            && (0..nz as i64).contains(&z);

        inside.then_some((x as usize, y as usize, z as usize))
    }

    fn offset(&self, index: VoxelIndex) -> Result<usize> {
        let (nx, ny, nz) = self.dimensions;
        let (x, y, z) = index;

        if x >= nx || y >= ny || z >= nz {
            return Err(ErosionError::OutOfBounds {
                x,
                y,
                z,
                dimensions: self.dimensions,
            });
        }

        Ok((x * ny + y) * nz + z)
    }
}

fn validate_geometry(dimensions: (usize, usize, usize), resolution: f32) -> Result<()> {
    let (nx, ny, nz) = dimensions;

    if nx == 0 || ny == 0 || nz == 0 {
        return Err(ErosionError::InvalidGeometry(format!(
            "dimensions must be positive, got {:?}",
            dimensions
        )));
    }

    if !resolution.is_finite() || resolution <= 0.0 {
        return Err(ErosionError::InvalidGeometry(format!(
            "resolution must be positive, got {}",
            resolution
        )));
    }

    Ok(())
}

/// Round a flow direction to the grid step it points along.
fn rounded_step(flow: Vec3) -> (i64, i64, i64) {
    let r = flow.round();
    (r.x as i64, r.y as i64, r.z as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(n: usize) -> VoxelGrid {
        VoxelGrid::new((n, n, n), 1.0).unwrap()
    }

    #[test]
    fn test_rejects_zero_dimension() {
        let result = VoxelGrid::new((10, 0, 10), 1.0);
        assert!(matches!(result, Err(ErosionError::InvalidGeometry(_))));
    }

    #[test]
    fn test_rejects_mismatched_buffer() {
        let result = VoxelGrid::from_values((2, 2, 2), 1.0, vec![1.0; 7]);
        assert!(matches!(result, Err(ErosionError::InvalidGeometry(_))));
    }

    #[test]
    fn test_rejects_out_of_range_values() {
        let result = VoxelGrid::from_values((1, 1, 2), 1.0, vec![1.0, 1.5]);
        assert!(matches!(result, Err(ErosionError::InvalidGeometry(_))));
    }

    #[test]
    fn test_total_mass_scales_with_resolution_and_density() {
        let grid = VoxelGrid::new((10, 10, 10), 0.5).unwrap();
        assert!((grid.total_mass(1.0) - 125.0).abs() < 1e-9);
        assert!((grid.total_mass(2.0) - 250.0).abs() < 1e-9);
    }

    #[test]
    fn test_erode_snaps_small_values_to_zero() {
        let mut grid = solid(3);

        grid.erode(&[(1, 1, 1)], 0.99995).unwrap();
        assert_eq!(grid.get((1, 1, 1)).unwrap(), 0.0);

        grid.erode(&[(0, 0, 0)], 0.25).unwrap();
        assert_eq!(grid.get((0, 0, 0)).unwrap(), 0.75);
    }

    #[test]
    fn test_erode_touches_only_given_indices() {
        let mut grid = solid(4);
        grid.erode(&[(0, 1, 2)], 0.5).unwrap();

        let changed = grid.values().iter().filter(|v| **v != 1.0).count();
        assert_eq!(changed, 1);
    }

    #[test]
    fn test_erode_zero_voxel_stays_zero() {
        let mut grid = solid(2);
        grid.erode(&[(0, 0, 0)], 5.0).unwrap();
        grid.erode(&[(0, 0, 0)], 0.3).unwrap();
        grid.erode(&[(0, 0, 0)], 0.0).unwrap();
        assert_eq!(grid.get((0, 0, 0)).unwrap(), 0.0);
    }

    #[test]
    fn test_erode_out_of_bounds() {
        let mut grid = solid(2);
        let result = grid.erode(&[(2, 0, 0)], 0.1);
        assert!(matches!(result, Err(ErosionError::OutOfBounds { x: 2, .. })));
    }

    #[test]
    fn test_erode_rejects_negative_rate() {
        let mut grid = solid(2);
        let result = grid.erode(&[(0, 0, 0)], -0.1);
        assert!(matches!(result, Err(ErosionError::InvalidParameter { .. })));
    }

    #[test]
    fn test_reset_refills() {
        let mut grid = solid(3);
        grid.erode(&grid.surface_voxels(Vec3::Z), 1.0).unwrap();
        assert!(grid.total_mass(1.0) < 27.0);

        grid.reset();
        assert_eq!(grid.total_mass(1.0), 27.0);
    }

    #[test]
    fn test_flow_facing_surface_is_downward_layer() {
        let grid = solid(10);
        let surface = grid.surface_voxels(Vec3::new(0.0, 0.0, -1.0));

        assert_eq!(surface.len(), 100);
        assert!(surface.iter().all(|(_, _, z)| *z == 0));
    }

    #[test]
    fn test_flow_facing_surface_follows_erosion() {
        let mut grid = solid(3);
        let flow = Vec3::new(0.0, 0.0, -1.0);

        grid.erode(&[(1, 1, 0)], 1.0).unwrap();

        let surface = grid.surface_voxels(flow);
        assert!(surface.contains(&(1, 1, 1)));
        assert!(!surface.contains(&(1, 1, 0)));
        assert_eq!(surface.len(), 9);
    }

    #[test]
    fn test_boundary_voxels_of_solid_cube_is_shell() {
        let grid = solid(4);
        // 4^3 - 2^3 interior
        assert_eq!(grid.boundary_voxels().len(), 56);
    }

    #[test]
    fn test_surface_rules_differ() {
        let grid = solid(5);
        let flow = Vec3::new(1.0, 0.0, 0.0);

        let facing = SurfaceRule::FlowFacing.select(&grid, flow);
        let boundary = SurfaceRule::Morphological.select(&grid, flow);

        assert_eq!(facing.len(), 25);
        assert_eq!(boundary.len(), 98);
    }

    #[test]
    fn test_active_voxels() {
        let mut grid = solid(2);
        grid.erode(&[(0, 0, 0), (1, 1, 1)], 1.0).unwrap();
        assert_eq!(grid.active_voxels(), 6);
    }
}
