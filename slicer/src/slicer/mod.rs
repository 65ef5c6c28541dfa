use common::config::VolumeConfig;
use image::{GrayImage, Luma};
use ordered_float::OrderedFloat;
use tracing::debug;

use crate::{geometry::Facet, mesh::Mesh};

mod crossings;
mod stack;

use crossings::Crossings;
pub use stack::SliceSummary;

/// Pixel value for voxels outside of the solid.
pub const OUTSIDE: u8 = 0x00;
/// Pixel value for voxels inside of the solid.
pub const INSIDE: u8 = u8::MAX;

/// Renders horizontal cross-sections of a mesh into raster images.
///
/// The slicer takes ownership of the mesh and sorts its facets by their
/// lowest point, after which the mesh can no longer be changed. Rendering
/// only reads from the slicer, so it can be shared between any number of
/// threads as long as each one renders into its own image.
pub struct Slicer {
    mesh: Mesh,
    config: VolumeConfig,
    max_height: f32,
}

impl Slicer {
    pub fn new(mut mesh: Mesh, config: VolumeConfig) -> Self {
        mesh.sort_facets_by(|a, b| {
            OrderedFloat(a.bounds().min.z).cmp(&OrderedFloat(b.bounds().min.z))
        });

        let max_height = (mesh.facets().iter())
            .map(|facet| facet.bounds().max.z)
            .fold(f32::NEG_INFINITY, f32::max);

        debug!(
            "Prepared slicer for {} facets, top at {max_height}",
            mesh.facet_count()
        );

        Self {
            mesh,
            config,
            max_height,
        }
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    /// Height of the highest point of the mesh. Negative infinity for an
    /// empty mesh.
    pub fn max_height(&self) -> f32 {
        self.max_height
    }

    pub fn layer_height(&self, layer: u32) -> f32 {
        self.config.layer_height(layer)
    }

    pub fn layer_count(&self) -> u32 {
        self.config.layer_count()
    }

    /// Renders the cross-section of the mesh at `height` into `image`.
    ///
    /// The whole image is overwritten with [`OUTSIDE`] first, then every
    /// pixel inside of the solid is set to [`INSIDE`]. Returns false, leaving
    /// the image empty, if `height` is above the top of the mesh. Any other
    /// height returns true, even if nothing was drawn.
    ///
    /// # Panics
    ///
    /// If the image size doesn't match the X and Y size of the volume grid.
    pub fn render(&self, image: &mut GrayImage, height: f32) -> bool {
        let (width, depth) = self.config.slice_size();
        assert_eq!(
            image.dimensions(),
            (width, depth),
            "Slice image must match the volume grid"
        );

        image.fill(OUTSIDE);
        if height > self.max_height {
            return false;
        }

        let facets = self.active_facets(height);
        let Some(bounds) = (facets.iter())
            .map(|facet| *facet.bounds())
            .reduce(|a, b| a.union(&b))
        else {
            return true;
        };

        let start = self.config.grid_start();
        let pitch = self.config.voxel_size;
        let mut crossings = Crossings::default();

        let mut y_pos = start.y;
        for y in 0..depth {
            // Rows outside of the bounding box can't contain anything
            if y_pos < bounds.min.y || y_pos > bounds.max.y {
                y_pos += pitch.y;
                continue;
            }

            crossings.collect(&facets, y_pos, height);
            if crossings.is_empty() {
                y_pos += pitch.y;
                continue;
            }

            let mut x_pos = start.x;
            for x in 0..width {
                if x_pos >= bounds.min.x && x_pos <= bounds.max.x && crossings.is_inside(x_pos) {
                    image.put_pixel(x, y, Luma([INSIDE]));
                }

                x_pos += pitch.x;
            }

            y_pos += pitch.y;
        }

        true
    }

    /// Gets every facet that crosses the plane at `height`. Facets that
    /// start exactly at the plane are included, ones that end exactly at it
    /// are not.
    fn active_facets(&self, height: f32) -> Vec<&Facet> {
        // The facets are sorted by their min height, so once one starts above
        // the plane all the rest do too.
        (self.mesh.facets().iter())
            .take_while(|facet| facet.bounds().min.z <= height)
            .filter(|facet| facet.bounds().max.z > height)
            .collect()
    }
}
