//! Triangle level geometry: facets with their cached bounding boxes and the
//! line crossing test used by the rasterizer.

mod bounding_box;
mod facet;

pub use bounding_box::BoundingBox;
pub use facet::Facet;
