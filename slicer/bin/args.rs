use std::{path::PathBuf, str::FromStr};

use anyhow::{Context, Result};
use clap::Parser;
use common::config::VolumeConfig;
use nalgebra::{ArrayStorage, Const, Matrix, Scalar, Vector3, U1};
use num_traits::Zero;

#[derive(Debug, Parser)]
/// Slices a triangulated solid into a stack of binary PNG layers.
pub struct Args {
    /// Path to a text or binary .stl file.
    pub mesh: PathBuf,

    #[arg(long, short, default_value = "slices")]
    /// Directory to write the `slice{n}.png` files into. Created if it
    /// doesn't exist.
    pub output: PathBuf,

    #[arg(long)]
    /// TOML file describing the volume grid. Any flag below overrides the
    /// matching value from it.
    pub config: Option<PathBuf>,

    #[arg(long, value_parser = vector_value_parser::<u32, 3>)]
    /// Number of voxels along the X, Y, and Z axes.
    pub grid: Option<Vector3<u32>>,
    #[arg(long, value_parser = vector_value_parser::<f32, 3>)]
    /// Size of the build volume in mm.
    pub build_volume: Option<Vector3<f32>>,
    #[arg(long, value_parser = vector_value_parser::<f32, 3>)]
    /// Size of a single voxel in mm, Z is the layer height.
    pub voxel_size: Option<Vector3<f32>>,

    #[arg(long, default_value = "1, 1, 1", value_parser = vector_value_parser::<f32, 3>)]
    /// Scale of the model along the X, Y, and Z axes.
    pub scale: Vector3<f32>,
    #[arg(long, default_value = "0, 0, 0", value_parser = vector_value_parser::<f32, 3>)]
    /// Offset applied to the model after scaling, in mm.
    pub translate: Vector3<f32>,

    #[arg(long)]
    /// Number of worker threads, defaults to one per core.
    pub threads: Option<usize>,

    #[arg(long)]
    /// Print the resolved volume config as TOML and exit.
    pub print_config: bool,
}

impl Args {
    pub fn volume_config(&self) -> Result<VolumeConfig> {
        let base = match &self.config {
            Some(path) => VolumeConfig::load(path)?,
            None => VolumeConfig::default(),
        };

        if self.grid.is_none() && self.voxel_size.is_none() && self.build_volume.is_none() {
            return Ok(base);
        }

        // The origin depends on the grid, so re-center after overriding
        Ok(VolumeConfig::centered(
            self.grid.unwrap_or(base.grid),
            self.build_volume.unwrap_or(base.build_volume),
            self.voxel_size.unwrap_or(base.voxel_size),
        ))
    }
}

fn vector_value_parser<T, const N: usize>(
    raw: &str,
) -> Result<Matrix<T, Const<N>, U1, ArrayStorage<T, N, 1>>>
where
    T: FromStr + Scalar + Zero,
    T::Err: Send + Sync + std::error::Error + 'static,
{
    let mut vec = Matrix::<T, Const<N>, U1, ArrayStorage<T, N, 1>>::zeros();

    let mut parts = raw.splitn(N, ',');
    for i in 0..N {
        let element = parts.next().context("Missing vector element")?.trim();
        vec[i] = element
            .parse()
            .with_context(|| format!("Can't convert `{element}` to a number"))?;
    }

    Ok(vec)
}
