use nannou::math::map_range;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::volume::VoxelGrid;

/// Initial shapes the simulated body can take. Each shape is inscribed in the grid extents.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum Shape {
    /// Every cell filled.
    #[default]
    Cuboid,
    Ellipsoid,
    Cylinder { axis: CylinderAxis },
    /// A superellipsoid; higher exponents give boxier shapes.
    RoundedCuboid { exponent: f32 },
}

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CylinderAxis {
    X,
    Y,
    #[default]
    Z,
}

impl Shape {
    /// Generate a grid of the given size filled with this shape.
    pub fn generate(&self, dimensions: (usize, usize, usize), resolution: f32) -> Result<VoxelGrid> {
        let grid = VoxelGrid::new(dimensions, resolution)?;

        if *self == Shape::Cuboid {
            return Ok(grid);
        }

        let (nx, ny, nz) = dimensions;

        let values = grid
            .indices()
            .map(|(x, y, z)| {
                let p = (linspace(x, nx), linspace(y, ny), linspace(z, nz));
                if self.contains(p) {
                    1.0
                } else {
                    0.0
                }
            })
            .collect();

        VoxelGrid::from_values(dimensions, resolution, values)
    }

    /// Returns true if the point, in \[-1, 1\] coordinates on each axis, lies inside the shape.
    fn contains(&self, (x, y, z): (f32, f32, f32)) -> bool {
        match self {
            Shape::Cuboid => true,
            Shape::Ellipsoid => x * x + y * y + z * z <= 1.0,
            Shape::Cylinder { axis } => {
                let (u, v) = match axis {
                    CylinderAxis::X => (y, z),
                    CylinderAxis::Y => (x, z),
                    CylinderAxis::Z => (x, y),
                };
                u * u + v * v <= 1.0
            }
            Shape::RoundedCuboid { exponent } => {
                x.abs().powf(*exponent) + y.abs().powf(*exponent) + z.abs().powf(*exponent) <= 1.0
            }
        }
    }
}

/// Position of cell [i] of [n] on an evenly spaced axis from -1 to 1.
fn linspace(i: usize, n: usize) -> f32 {
    if n < 2 {
        return -1.0;
    }

    map_range(i as f32, 0.0, (n - 1) as f32, -1.0, 1.0)
}
