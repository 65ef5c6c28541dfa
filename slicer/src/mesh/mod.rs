use std::cmp::Ordering;

use crate::{
    geometry::{BoundingBox, Facet},
    Pos,
};

mod error;
mod primitives;
mod stl;

pub use error::ParseError;
pub use primitives::cuboid;
pub use stl::{load_mesh, MeshFormat};

/// A triangulated solid, stored as a list of independent facets.
///
/// The order of the facets has no meaning, but the [`crate::slicer::Slicer`]
/// sorts them by height when it takes ownership of the mesh.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    name: String,
    facets: Vec<Facet>,
}

impl Mesh {
    pub fn new(facets: Vec<Facet>) -> Self {
        Self {
            name: String::new(),
            facets,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// The name following the `solid` keyword of a text mesh. Empty for
    /// binary meshes.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn facets(&self) -> &[Facet] {
        &self.facets
    }

    pub fn facet_count(&self) -> usize {
        self.facets.len()
    }

    /// Scales every facet component-wise around the origin.
    pub fn scale(&mut self, scale: Pos) {
        self.facets.iter_mut().for_each(|facet| facet.scale(scale));
    }

    pub fn translate(&mut self, offset: Pos) {
        self.facets.iter_mut().for_each(|facet| facet.translate(offset));
    }

    /// Bounding box around every facet, or `None` for an empty mesh.
    pub fn bounds(&self) -> Option<BoundingBox> {
        self.facets
            .iter()
            .map(|facet| *facet.bounds())
            .reduce(|a, b| a.union(&b))
    }

    /// Tests if a point is inside the solid by casting a line parallel to the
    /// x-axis through it. Every facet casts one vote: it counts as inside if
    /// the line crosses it and its normal doesn't point toward -X, otherwise
    /// it counts as outside. The point is inside if the inside votes win.
    ///
    /// This is a cheap majority heuristic rather than an exact containment
    /// test, and isn't used by the slicer.
    pub fn contains(&self, point: &Pos) -> bool {
        let (mut inside, mut outside) = (0_usize, 0_usize);
        for facet in &self.facets {
            if facet.normal().x >= 0.0 && facet.contains_yz(point.y, point.z) {
                inside += 1;
            } else {
                outside += 1;
            }
        }

        inside > outside
    }

    pub(crate) fn sort_facets_by(&mut self, compare: impl FnMut(&Facet, &Facet) -> Ordering) {
        self.facets.sort_unstable_by(compare);
    }
}
