use crate::Pos;

/// Axis aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Pos,
    pub max: Pos,
}

impl BoundingBox {
    /// A box containing nothing. Expanding it by any point gives a box
    /// around just that point.
    pub const EMPTY: Self = Self {
        min: Pos::new(f32::INFINITY, f32::INFINITY, f32::INFINITY),
        max: Pos::new(f32::NEG_INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY),
    };

    pub fn from_points(points: &[Pos]) -> Self {
        let mut out = Self::EMPTY;
        points.iter().for_each(|&point| out.expand_point(point));
        out
    }

    pub fn expand_point(&mut self, point: Pos) {
        self.min = self.min.inf(&point);
        self.max = self.max.sup(&point);
    }

    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: self.min.inf(&other.min),
            max: self.max.sup(&other.max),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    pub fn size(&self) -> Pos {
        self.max - self.min
    }

    /// Checks if `other` fits completely inside of this box.
    pub fn contains(&self, other: &Self) -> bool {
        (0..3).all(|axis| self.min[axis] <= other.min[axis] && other.max[axis] <= self.max[axis])
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::EMPTY
    }
}
