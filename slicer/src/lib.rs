//! Turns triangulated solids into stacks of binary raster cross-sections,
//! to be used as the exposure masks of a resin printer.
//!
//! A [`mesh::Mesh`] is loaded and transformed, then handed to a
//! [`slicer::Slicer`] which renders one layer at a time into caller owned
//! images.

use nalgebra::Vector3;

pub mod geometry;
pub mod mesh;
pub mod slicer;

pub type Pos = Vector3<f32>;
