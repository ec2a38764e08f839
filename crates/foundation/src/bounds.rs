use serde::{Deserialize, Serialize};

use crate::math::Vec3;

/// Axis-aligned bounding box in data space.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Aabb3 {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb3 {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Aabb3 { min, max }
    }

    /// Tight bounds of `points`, or `None` when there are none.
    pub fn from_points(points: &[Vec3]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut out = Aabb3::new(*first, *first);
        for p in rest {
            out.min = out.min.component_min(*p);
            out.max = out.max.component_max(*p);
        }
        Some(out)
    }

    /// Extent per axis (width, height, depth).
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max).scale(0.5)
    }

    pub fn max_dim(&self) -> f64 {
        self.size().max_component()
    }

    /// Factor that maps the largest extent onto `target`.
    ///
    /// `None` for zero-extent (or non-finite) boxes.
    pub fn uniform_scale_to(&self, target: f64) -> Option<f64> {
        let max_dim = self.max_dim();
        if !max_dim.is_finite() || max_dim <= 0.0 {
            return None;
        }
        Some(target / max_dim)
    }
}

#[cfg(test)]
mod tests {
    use super::Aabb3;
    use crate::math::Vec3;

    #[test]
    fn from_points_is_tight() {
        let pts = [
            Vec3::new(1.0, 5.0, -1.0),
            Vec3::new(-2.0, 0.0, 4.0),
            Vec3::new(0.5, 2.0, 0.0),
        ];
        let b = Aabb3::from_points(&pts).unwrap();
        assert_eq!(b.min, Vec3::new(-2.0, 0.0, -1.0));
        assert_eq!(b.max, Vec3::new(1.0, 5.0, 4.0));
        assert_eq!(b.size(), Vec3::new(3.0, 5.0, 5.0));
        assert_eq!(b.center(), Vec3::new(-0.5, 2.5, 1.5));
    }

    #[test]
    fn empty_has_no_bounds() {
        assert!(Aabb3::from_points(&[]).is_none());
    }

    #[test]
    fn zero_extent_has_no_scale() {
        let p = Vec3::new(1.0, 1.0, 1.0);
        let b = Aabb3::new(p, p);
        assert_eq!(b.uniform_scale_to(5.0), None);
        let b = Aabb3::new(Vec3::ZERO, Vec3::new(10.0, 2.0, 1.0));
        assert_eq!(b.uniform_scale_to(5.0), Some(0.5));
    }
}
