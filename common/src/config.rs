use std::{fs, path::Path};

use anyhow::{Context, Result};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Describes the voxel grid that slices are rendered into and how it maps
/// onto physical space.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumeConfig {
    /// Number of voxels along each axis. X and Y are the raster size of a
    /// single slice, Z is the number of slices.
    pub grid: Vector3<u32>,
    /// Physical size of the build volume in mm.
    pub build_volume: Vector3<f32>,
    /// Fractional grid index of the physical origin on each axis.
    pub origin: Vector3<f32>,
    /// Size of a single voxel in mm.
    pub voxel_size: Vector3<f32>,
}

impl VolumeConfig {
    /// Creates a config with the physical origin in the middle of the XY
    /// plane and half a voxel below the first layer, so each layer is sampled
    /// through the center of its voxels.
    pub fn centered(grid: Vector3<u32>, build_volume: Vector3<f32>, voxel_size: Vector3<f32>) -> Self {
        let origin = Vector3::new(
            grid.x as f32 / 2.0 - 0.5,
            grid.y as f32 / 2.0 - 0.5,
            -0.5,
        );

        Self {
            grid,
            build_volume,
            origin,
            voxel_size,
        }
    }

    /// Physical position of grid index 0 on each axis.
    pub fn grid_start(&self) -> Vector3<f32> {
        -self.origin.component_mul(&self.voxel_size)
    }

    /// Physical height of the given layer index.
    pub fn layer_height(&self, layer: u32) -> f32 {
        (layer as f32 - self.origin.z) * self.voxel_size.z
    }

    pub fn layer_count(&self) -> u32 {
        self.grid.z
    }

    /// Width and height of a single slice in pixels.
    pub fn slice_size(&self) -> (u32, u32) {
        (self.grid.x, self.grid.y)
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string(self)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config `{}`", path.display()))?;
        Self::from_toml(&raw).with_context(|| format!("Invalid config `{}`", path.display()))
    }
}

impl Default for VolumeConfig {
    fn default() -> Self {
        Self::centered(
            Vector3::new(1440, 2560, 800),
            Vector3::new(68.0, 120.0, 160.0),
            Vector3::repeat(0.05),
        )
    }
}
