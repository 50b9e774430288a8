//! Planar rings and composite regions for a single slice.
//!
//! A [Region] stores oriented rings: counter clockwise rings bound filled area and clockwise
//! rings bound holes. Regions produced by [Region::from_ring], the boolean operations and the
//! [builder] are non self intersecting with a winding number of 0 or 1 everywhere.
mod boolean;
pub mod builder;

pub use boolean::{BooleanOp, BooleanOptions, region_boolean};

use crate::{
    core::{
        math::{Vector2, dist_squared, is_left, line_seg_closest_point, signed_area_x2},
        traits::Real,
    },
    error::GeometryError,
};
use static_aabb2d_index::AABB;

/// Orientation of a closed ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RingOrientation {
    CounterClockwise,
    Clockwise,
    /// Ring encloses no area.
    Collapsed,
}

/// Result of locating a point relative to a ring or region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointLocation {
    Inside,
    Outside,
    OnBoundary,
}

/// Closed loop of points, the last point implicitly connects back to the first.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Ring<T = f64> {
    points: Vec<Vector2<T>>,
}

impl<T> Ring<T>
where
    T: Real,
{
    pub fn new() -> Self {
        Ring { points: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Ring {
            points: Vec::with_capacity(capacity),
        }
    }

    /// Append a point.
    #[inline]
    pub fn add(&mut self, x: T, y: T) {
        self.points.push(Vector2::new(x, y));
    }

    /// Create a ring from points. A repeated closing point is allowed and removed by
    /// [Ring::cleaned].
    pub fn from_points(points: Vec<Vector2<T>>) -> Self {
        Ring { points }
    }

    /// Create a ring from `(x, y)` pairs.
    pub fn from_xy<I>(coords: I) -> Self
    where
        I: IntoIterator<Item = (T, T)>,
    {
        Ring {
            points: coords
                .into_iter()
                .map(|(x, y)| Vector2::new(x, y))
                .collect(),
        }
    }

    /// Axis aligned rectangle, counter clockwise.
    pub fn rectangle(min_x: T, min_y: T, max_x: T, max_y: T) -> Self {
        Ring::from_xy([(min_x, min_y), (max_x, min_y), (max_x, max_y), (min_x, max_y)])
    }

    #[inline]
    pub fn points(&self) -> &[Vector2<T>] {
        &self.points
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Iterate over the segments of the ring, including the closing segment.
    pub fn iter_segments(&self) -> impl Iterator<Item = (Vector2<T>, Vector2<T>)> + '_ {
        let n = self.points.len();
        (0..n).map(move |i| (self.points[i], self.points[(i + 1) % n]))
    }

    /// Signed area by the shoelace formula, positive for counter clockwise rings.
    pub fn signed_area(&self) -> T {
        if self.points.len() < 3 {
            return T::zero();
        }
        let mut double_area = T::zero();
        for (p0, p1) in self.iter_segments() {
            double_area = double_area + p0.x * p1.y - p0.y * p1.x;
        }
        double_area / T::two()
    }

    pub fn area(&self) -> T {
        self.signed_area().abs()
    }

    pub fn orientation(&self) -> RingOrientation {
        let a = self.signed_area();
        if a.fuzzy_eq_zero() {
            RingOrientation::Collapsed
        } else if a > T::zero() {
            RingOrientation::CounterClockwise
        } else {
            RingOrientation::Clockwise
        }
    }

    /// Total length of all segments.
    pub fn perimeter(&self) -> T {
        if self.points.len() < 2 {
            return T::zero();
        }
        self.iter_segments()
            .fold(T::zero(), |acc, (p0, p1)| acc + (p1 - p0).length())
    }

    /// Edge path lengths `(Σ|Δx|, Σ|Δy|)` along the ring.
    pub fn path_lengths(&self) -> Vector2<T> {
        if self.points.len() < 2 {
            return Vector2::zero();
        }
        self.iter_segments().fold(Vector2::zero(), |acc, (p0, p1)| {
            Vector2::new(acc.x + (p1.x - p0.x).abs(), acc.y + (p1.y - p0.y).abs())
        })
    }

    /// Area weighted centroid of the enclosed area. `None` when the ring is collapsed.
    pub fn centroid(&self) -> Option<Vector2<T>> {
        let area = self.signed_area();
        if area.fuzzy_eq_zero() {
            return None;
        }
        let (mut cx, mut cy) = (T::zero(), T::zero());
        for (p0, p1) in self.iter_segments() {
            let cross = p0.x * p1.y - p1.x * p0.y;
            cx = cx + (p0.x + p1.x) * cross;
            cy = cy + (p0.y + p1.y) * cross;
        }
        let six_area = T::two() * T::two() * area + T::two() * area;
        Some(Vector2::new(cx / six_area, cy / six_area))
    }

    /// Bounding box of the ring. `None` when the ring has no points.
    pub fn extents(&self) -> Option<AABB<T>> {
        let first = self.points.first()?;
        let mut bb = AABB::new(first.x, first.y, first.x, first.y);
        for p in self.points.iter().skip(1) {
            bb.min_x = num_traits::real::Real::min(bb.min_x, p.x);
            bb.min_y = num_traits::real::Real::min(bb.min_y, p.y);
            bb.max_x = num_traits::real::Real::max(bb.max_x, p.x);
            bb.max_y = num_traits::real::Real::max(bb.max_y, p.y);
        }
        Some(bb)
    }

    /// Winding number of `point`, using the crossing rule with half open y intervals.
    ///
    /// Positive for points enclosed by a counter clockwise ring, negative for clockwise.
    pub fn winding_number(&self, point: Vector2<T>) -> i32 {
        if self.points.len() < 3 {
            return 0;
        }
        let mut winding = 0;
        for (p0, p1) in self.iter_segments() {
            if p0.y <= point.y {
                if p1.y > point.y && is_left(p0, p1, point) {
                    winding += 1;
                }
            } else if p1.y <= point.y && signed_area_x2(p0, p1, point) < T::zero() {
                winding -= 1;
            }
        }
        winding
    }

    /// Returns `true` if `point` lies within `epsilon` of any ring segment.
    pub fn is_on_boundary(&self, point: Vector2<T>, epsilon: T) -> bool {
        let eps_sq = epsilon * epsilon;
        self.iter_segments()
            .any(|(p0, p1)| dist_squared(line_seg_closest_point(p0, p1, point), point) < eps_sq)
    }

    pub fn reversed(&self) -> Self {
        let mut points = self.points.clone();
        points.reverse();
        Ring { points }
    }

    /// Copy of the ring with repeated points, collinear points and spikes removed.
    ///
    /// Points closer than `pos_equal_eps` are merged. A point is collinear when it lies within
    /// `pos_equal_eps` of the line through its neighbors. Removal repeats until stable so the
    /// result does not depend on which vertex the loop starts at.
    pub fn cleaned(&self, pos_equal_eps: T) -> Self {
        let mut points = dedup_points(&self.points, pos_equal_eps);
        loop {
            let n = points.len();
            if n < 3 {
                break;
            }
            let mut kept: Vec<Vector2<T>> = Vec::with_capacity(n);
            for i in 0..n {
                let prev = kept.last().copied().unwrap_or(points[n - 1]);
                let next = points[(i + 1) % n];
                if !is_collinear(prev, points[i], next, pos_equal_eps) {
                    kept.push(points[i]);
                }
            }
            let kept = dedup_points(&kept, pos_equal_eps);
            if kept.len() == n {
                break;
            }
            points = kept;
        }
        Ring { points }
    }

    /// Returns the first coordinate that is not finite.
    pub(crate) fn check_finite(&self) -> Result<(), GeometryError> {
        match self.points.iter().find(|p| !p.is_finite()) {
            Some(p) => Err(GeometryError::NonFiniteCoordinate {
                x: p.x.to_f64().unwrap_or(f64::NAN),
                y: p.y.to_f64().unwrap_or(f64::NAN),
            }),
            None => Ok(()),
        }
    }
}

fn dedup_points<T>(points: &[Vector2<T>], eps: T) -> Vec<Vector2<T>>
where
    T: Real,
{
    let mut result: Vec<Vector2<T>> = Vec::with_capacity(points.len());
    for &p in points {
        if result.last().is_none_or(|last| !last.fuzzy_eq_eps(p, eps)) {
            result.push(p);
        }
    }
    while result.len() > 1 && result[result.len() - 1].fuzzy_eq_eps(result[0], eps) {
        result.pop();
    }
    result
}

fn is_collinear<T>(prev: Vector2<T>, point: Vector2<T>, next: Vector2<T>, eps: T) -> bool
where
    T: Real,
{
    let base = next - prev;
    let base_length = base.length();
    if base_length < eps {
        // spike back onto the previous point
        return true;
    }
    (base.perp_dot(point - prev) / base_length).abs() < eps
}

/// Composite 2D region on one slice: filled rings counter clockwise, holes clockwise.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Region<T = f64> {
    rings: Vec<Ring<T>>,
}

impl<T> Region<T>
where
    T: Real,
{
    pub fn empty() -> Self {
        Region { rings: Vec::new() }
    }

    /// Resolve a raw contour loop into a valid region.
    ///
    /// The loop may have either orientation and may self intersect, in which case enclosed area
    /// follows the nonzero winding rule.
    pub fn from_ring(ring: Ring<T>) -> Result<Self, GeometryError> {
        ring.check_finite()?;
        let raw = Region { rings: vec![ring] };
        region_boolean(&raw, &Region::empty(), BooleanOp::Or, &BooleanOptions::new())
    }

    /// Wrap rings that are already oriented and non overlapping, e.g. clipped rectangles.
    pub(crate) fn from_oriented_rings(rings: Vec<Ring<T>>) -> Self {
        Region { rings }
    }

    #[inline]
    pub fn rings(&self) -> &[Ring<T>] {
        &self.rings
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rings.is_empty()
    }

    /// Filled area minus hole area.
    pub fn area(&self) -> T {
        self.rings
            .iter()
            .fold(T::zero(), |acc, r| acc + r.signed_area())
    }

    /// Length of all ring boundaries, holes included.
    pub fn perimeter(&self) -> T {
        self.rings.iter().fold(T::zero(), |acc, r| acc + r.perimeter())
    }

    /// Edge path lengths `(Σ|Δx|, Σ|Δy|)` over the counter clockwise (outer) rings only.
    pub fn outer_path_lengths(&self) -> Vector2<T> {
        self.rings
            .iter()
            .filter(|r| r.orientation() == RingOrientation::CounterClockwise)
            .fold(Vector2::zero(), |acc, r| acc + r.path_lengths())
    }

    pub fn winding_number(&self, point: Vector2<T>) -> i32 {
        self.rings.iter().map(|r| r.winding_number(point)).sum()
    }

    /// Locate `point` relative to the region, treating points within `epsilon` of a ring as on
    /// the boundary.
    pub fn locate(&self, point: Vector2<T>, epsilon: T) -> PointLocation {
        if self.rings.iter().any(|r| r.is_on_boundary(point, epsilon)) {
            PointLocation::OnBoundary
        } else if self.winding_number(point) != 0 {
            PointLocation::Inside
        } else {
            PointLocation::Outside
        }
    }

    /// All ring vertices.
    pub fn vertices(&self) -> impl Iterator<Item = Vector2<T>> + '_ {
        self.rings.iter().flat_map(|r| r.points().iter().copied())
    }

    pub fn extents(&self) -> Option<AABB<T>> {
        self.rings
            .iter()
            .filter_map(|r| r.extents())
            .reduce(|a, b| {
                AABB::new(
                    num_traits::real::Real::min(a.min_x, b.min_x),
                    num_traits::real::Real::min(a.min_y, b.min_y),
                    num_traits::real::Real::max(a.max_x, b.max_x),
                    num_traits::real::Real::max(a.max_y, b.max_y),
                )
            })
    }

    /// Area weighted centroid. `None` for a region without area.
    pub fn centroid(&self) -> Option<Vector2<T>> {
        let mut area_sum = T::zero();
        let mut weighted = Vector2::zero();
        for ring in &self.rings {
            if let Some(c) = ring.centroid() {
                let a = ring.signed_area();
                area_sum = area_sum + a;
                weighted = weighted + c.scale(a);
            }
        }
        if area_sum.fuzzy_eq_zero() {
            return None;
        }
        Some(weighted.scale(T::one() / area_sum))
    }

    /// Split into sub regions, each one filled ring with the holes directly inside it.
    ///
    /// Each hole is assigned to the smallest filled ring enclosing a point just inside the hole.
    pub fn components(&self) -> Vec<Region<T>> {
        let mut outers: Vec<(usize, T)> = self
            .rings
            .iter()
            .enumerate()
            .filter(|(_, r)| r.orientation() == RingOrientation::CounterClockwise)
            .map(|(i, r)| (i, r.signed_area()))
            .collect();
        outers.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

        let mut components: Vec<Region<T>> = outers
            .iter()
            .map(|&(i, _)| Region {
                rings: vec![self.rings[i].clone()],
            })
            .collect();

        for hole in self
            .rings
            .iter()
            .filter(|r| r.orientation() == RingOrientation::Clockwise)
        {
            let Some(probe) = interior_probe(hole) else {
                continue;
            };
            let owner = outers
                .iter()
                .position(|&(i, _)| self.rings[i].winding_number(probe) != 0);
            match owner {
                Some(c) => components[c].rings.push(hole.clone()),
                None => log::debug!("hole ring without enclosing filled ring skipped"),
            }
        }

        components
    }
}

/// Point just to the right of the first usable segment of a clockwise ring, i.e. inside the hole.
fn interior_probe<T>(ring: &Ring<T>) -> Option<Vector2<T>>
where
    T: Real,
{
    let offset = T::from(1e-4)?;
    ring.iter_segments()
        .find(|(p0, p1)| (*p1 - *p0).length() > offset)
        .map(|(p0, p1)| {
            let mid = crate::core::math::midpoint(p0, p1);
            mid - (p1 - p0).unit_perp().scale(offset)
        })
}

impl<T> Region<T>
where
    T: Real,
{
    pub fn union(&self, other: &Region<T>) -> Result<Region<T>, GeometryError> {
        region_boolean(self, other, BooleanOp::Or, &BooleanOptions::new())
    }

    pub fn intersection(&self, other: &Region<T>) -> Result<Region<T>, GeometryError> {
        region_boolean(self, other, BooleanOp::And, &BooleanOptions::new())
    }

    pub fn difference(&self, other: &Region<T>) -> Result<Region<T>, GeometryError> {
        region_boolean(self, other, BooleanOp::Not, &BooleanOptions::new())
    }

    pub fn symmetric_difference(&self, other: &Region<T>) -> Result<Region<T>, GeometryError> {
        region_boolean(self, other, BooleanOp::Xor, &BooleanOptions::new())
    }
}
