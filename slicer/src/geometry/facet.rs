use crate::{geometry::BoundingBox, Pos};

/// A single triangle of a mesh along with its normal and bounding box.
///
/// The bounding box is always the tight box around the current vertices, it
/// is recomputed by every operation that moves them.
#[derive(Debug, Clone, PartialEq)]
pub struct Facet {
    vertices: [Pos; 3],
    normal: Pos,
    bounds: BoundingBox,
}

impl Facet {
    pub fn new(vertices: [Pos; 3], normal: Pos) -> Self {
        Self {
            vertices,
            normal,
            bounds: BoundingBox::from_points(&vertices),
        }
    }

    /// Creates a facet with its normal derived from the winding order of the
    /// vertices (counter-clockwise when viewed from outside). Degenerate
    /// triangles get a zero normal.
    pub fn from_vertices(vertices: [Pos; 3]) -> Self {
        let [v0, v1, v2] = vertices;
        let edge1 = v2 - v1;
        let edge2 = v0 - v1;
        let normal = edge1
            .cross(&edge2)
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(Pos::zeros);
        Self::new(vertices, normal)
    }

    pub fn vertices(&self) -> &[Pos; 3] {
        &self.vertices
    }

    pub fn normal(&self) -> Pos {
        self.normal
    }

    pub fn bounds(&self) -> &BoundingBox {
        &self.bounds
    }

    /// Scales every vertex component-wise. The normal is left as is, so a
    /// non-uniform scale will leave it pointing in a slightly wrong
    /// direction.
    pub fn scale(&mut self, scale: Pos) {
        for vertex in self.vertices.iter_mut() {
            vertex.component_mul_assign(&scale);
        }
        self.bounds = BoundingBox::from_points(&self.vertices);
    }

    pub fn translate(&mut self, offset: Pos) {
        for vertex in self.vertices.iter_mut() {
            *vertex += offset;
        }
        self.bounds = BoundingBox::from_points(&self.vertices);
    }

    /// Checks if the line parallel to the x-axis through `(y, z)` passes
    /// through this facet, by running an even-odd crossing test on the
    /// triangle projected onto the YZ plane.
    ///
    /// Points exactly on an edge are resolved by the half-open comparisons
    /// below, so the result is always the same for the same input.
    ///
    /// Reference: <https://wrf.ecse.rpi.edu/Research/Short_Notes/pnpoly.html>
    pub fn contains_yz(&self, y: f32, z: f32) -> bool {
        let v = &self.vertices;
        let mut inside = false;

        for (i, j) in [(0, 2), (1, 0), (2, 1)] {
            let (a, b) = (v[i], v[j]);
            // The division can't be by zero, edges with a.z == b.z never get
            // past the first check.
            if (a.z > z) != (b.z > z) && y < (b.y - a.y) * (z - a.z) / (b.z - a.z) + a.y {
                inside = !inside;
            }
        }

        inside
    }

    /// Finds where the line parallel to the x-axis through `(y, z)` crosses
    /// this facet, returning the x coordinate of the intersection.
    ///
    /// Any vector laying on the facet's plane is perpendicular to its normal,
    /// so `dot(v0 - (x, y, z), normal) = 0` can be solved for x. If the plane
    /// is parallel to the x-axis there is no single solution and the maximum
    /// x of the facet is returned instead. That value is only a
    /// deterministic stand-in and has no geometric meaning.
    pub fn x_intercept(&self, y: f32, z: f32) -> Option<f32> {
        if !self.contains_yz(y, z) {
            return None;
        }

        let (v0, normal) = (self.vertices[0], self.normal);
        if normal.x == 0.0 {
            return Some(self.bounds.max.x);
        }

        let intercept = v0.x * normal.x + (v0.y - y) * normal.y + (v0.z - z) * normal.z;
        Some(intercept / normal.x)
    }
}

impl Default for Facet {
    fn default() -> Self {
        Self::new([Pos::zeros(); 3], Pos::z())
    }
}
