use crate::{geometry::Facet, mesh::Mesh, Pos};

/// Builds an axis aligned box out of 12 facets with outward facing normals.
pub fn cuboid(min: Pos, max: Pos) -> Mesh {
    let corner = |x: usize, y: usize, z: usize| {
        Pos::new([min.x, max.x][x], [min.y, max.y][y], [min.z, max.z][z])
    };

    // Each side as four corners, counter-clockwise when seen from outside
    let sides = [
        (-Pos::x(), [(0, 0, 0), (0, 0, 1), (0, 1, 1), (0, 1, 0)]),
        (Pos::x(), [(1, 0, 0), (1, 1, 0), (1, 1, 1), (1, 0, 1)]),
        (-Pos::y(), [(0, 0, 0), (1, 0, 0), (1, 0, 1), (0, 0, 1)]),
        (Pos::y(), [(0, 1, 0), (0, 1, 1), (1, 1, 1), (1, 1, 0)]),
        (-Pos::z(), [(0, 0, 0), (0, 1, 0), (1, 1, 0), (1, 0, 0)]),
        (Pos::z(), [(0, 0, 1), (1, 0, 1), (1, 1, 1), (0, 1, 1)]),
    ];

    let mut facets = Vec::with_capacity(12);
    for (normal, quad) in sides {
        let [a, b, c, d] = quad.map(|(x, y, z)| corner(x, y, z));
        facets.push(Facet::new([a, b, c], normal));
        facets.push(Facet::new([a, c, d], normal));
    }

    Mesh::new(facets).with_name("cuboid")
}
