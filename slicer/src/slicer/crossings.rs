use std::cmp::Reverse;

use ordered_float::OrderedFloat;

use crate::geometry::Facet;

/// Every place a single row of a slice crosses the surface of the mesh.
///
/// The buffers are kept around between rows so each row doesn't need to
/// allocate.
#[derive(Default)]
pub struct Crossings {
    hits: Vec<(f32, bool)>,
    /// X intercepts, largest first.
    intercepts: Vec<f32>,
    /// `depth[i]` is the winding count after passing the `i` largest
    /// intercepts, moving toward -X.
    depth: Vec<i32>,
}

impl Crossings {
    /// Finds all the facets the line through `(y, z)` parallel to the x-axis
    /// passes through.
    pub fn collect(&mut self, facets: &[&Facet], y: f32, z: f32) {
        self.hits.clear();
        self.hits.extend(facets.iter().filter_map(|facet| {
            let intercept = facet.x_intercept(y, z)?;
            Some((intercept, facet.normal().x > 0.0))
        }));
        self.hits
            .sort_unstable_by_key(|&(intercept, _)| Reverse(OrderedFloat(intercept)));

        self.intercepts.clear();
        self.depth.clear();
        self.depth.push(0);

        let mut depth = 0;
        for &(intercept, facing) in &self.hits {
            // Facets facing +X are where the line enters the solid when
            // coming in from +X infinity
            depth += if facing { 1 } else { -1 };
            self.intercepts.push(intercept);
            self.depth.push(depth);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.intercepts.is_empty()
    }

    /// A point on the row is inside if the facets at or after it have a
    /// positive winding count.
    pub fn is_inside(&self, x: f32) -> bool {
        let passed = self.intercepts.partition_point(|&intercept| intercept >= x);
        self.depth[passed] > 0
    }
}

#[cfg(test)]
mod tests {
    use super::Crossings;
    use crate::{geometry::Facet, Pos};

    fn wall(x: f32, facing: f32) -> Facet {
        Facet::new(
            [
                Pos::new(x, -1.0, -1.0),
                Pos::new(x, 1.0, -1.0),
                Pos::new(x, 0.0, 1.0),
            ],
            Pos::new(facing, 0.0, 0.0),
        )
    }

    #[test]
    fn nested_walls() {
        // Two overlapping solids along the line: [-4, 1] and [-1, 3]
        let facets = [wall(-4.0, -1.0), wall(3.0, 1.0), wall(1.0, 1.0), wall(-1.0, -1.0)];
        let facets = facets.iter().collect::<Vec<_>>();

        let mut crossings = Crossings::default();
        crossings.collect(&facets, 0.0, 0.0);

        assert_eq!(crossings.intercepts, vec![3.0, 1.0, -1.0, -4.0]);
        assert_eq!(crossings.depth, vec![0, 1, 2, 1, 0]);

        for (x, inside) in [
            (4.0, false),
            (3.0, true),
            (2.0, true),
            (0.0, true),
            (-2.0, true),
            // Intercepts exactly at x count as passed
            (-4.0, false),
            (-4.5, false),
        ] {
            assert_eq!(crossings.is_inside(x), inside, "x = {x}");
        }
    }

    #[test]
    fn misses_are_ignored() {
        let facets = [wall(2.0, 1.0), wall(-2.0, -1.0)];
        let facets = facets.iter().collect::<Vec<_>>();

        let mut crossings = Crossings::default();
        crossings.collect(&facets, 5.0, 0.0);
        assert!(crossings.is_empty());
        assert!(!crossings.is_inside(0.0));

        // Buffers are reset between rows
        crossings.collect(&facets, 0.0, 0.0);
        assert!(crossings.is_inside(0.0));
        crossings.collect(&facets, 0.0, 5.0);
        assert!(!crossings.is_inside(0.0));
    }
}
