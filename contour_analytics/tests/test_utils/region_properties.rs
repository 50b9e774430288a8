use contour_analytics::{core::traits::FuzzyEq, polygon::Region};
use static_aabb2d_index::AABB;

/// Fuzzy compare AABB values
pub fn aabb_fuzzy_eq_eps(a: &AABB<f64>, b: &AABB<f64>, eps: f64) -> bool {
    a.min_x.fuzzy_eq_eps(b.min_x, eps)
        && a.min_y.fuzzy_eq_eps(b.min_y, eps)
        && a.max_x.fuzzy_eq_eps(b.max_x, eps)
        && a.max_y.fuzzy_eq_eps(b.max_y, eps)
}

/// Holds a set of properties of a region for comparison in tests
#[derive(Debug, Copy, Clone)]
pub struct RegionProperties {
    pub ring_count: usize,
    pub area: f64,
    pub perimeter: f64,
    pub extents: AABB<f64>,
}

impl RegionProperties {
    // property comparer epsilon
    pub const PROP_CMP_EPS: f64 = 1e-4;

    pub fn new(
        ring_count: usize,
        area: f64,
        perimeter: f64,
        min_x: f64,
        min_y: f64,
        max_x: f64,
        max_y: f64,
    ) -> Self {
        Self {
            ring_count,
            area,
            perimeter,
            extents: AABB::new(min_x, min_y, max_x, max_y),
        }
    }

    pub fn from_region(region: &Region) -> Self {
        Self {
            ring_count: region.rings().len(),
            area: region.area(),
            perimeter: region.perimeter(),
            extents: region
                .extents()
                .unwrap_or_else(|| AABB::new(0.0, 0.0, 0.0, 0.0)),
        }
    }

    pub fn fuzzy_eq_eps(&self, other: &Self, eps: f64) -> bool {
        self.ring_count == other.ring_count
            && self.area.fuzzy_eq_eps(other.area, eps)
            && self.perimeter.fuzzy_eq_eps(other.perimeter, eps)
            && aabb_fuzzy_eq_eps(&self.extents, &other.extents, eps)
    }

    pub fn fuzzy_eq(&self, other: &Self) -> bool {
        self.fuzzy_eq_eps(other, Self::PROP_CMP_EPS)
    }
}
