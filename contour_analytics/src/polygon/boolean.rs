//! Boolean operations between regions.
//!
//! Every ring segment of both operands is split where it meets another segment. Each resulting
//! piece is tested by sampling just left and just right of its midpoint against both operands
//! (nonzero winding rule). A piece is kept when the operation gives a different answer on its
//! two sides, oriented so the filled side is on its left. Kept pieces are stitched end to start
//! into closed rings.
use super::{Region, Ring};
use crate::{
    core::{
        math::{
            LineLineIntr, Vector2, is_left, line_line_intr, midpoint, min_max,
            parametric_from_point, point_from_parametric, signed_area_x2,
        },
        traits::Real,
    },
    error::GeometryError,
};
use static_aabb2d_index::{StaticAABB2DIndex, StaticAABB2DIndexBuilder};

/// Boolean operation to apply to two regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BooleanOp {
    /// Union.
    Or,
    /// Intersection.
    And,
    /// Area of the first region not in the second.
    Not,
    /// Area in exactly one of the regions.
    Xor,
}

impl BooleanOp {
    #[inline]
    fn keeps(self, in_first: bool, in_second: bool) -> bool {
        match self {
            BooleanOp::Or => in_first || in_second,
            BooleanOp::And => in_first && in_second,
            BooleanOp::Not => in_first && !in_second,
            BooleanOp::Xor => in_first != in_second,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BooleanOptions<T>
where
    T: Real,
{
    /// Fuzzy comparison epsilon used for determining if two positions are equal.
    pub pos_equal_eps: T,
    /// Epsilon used when joining pieces end to start.
    pub slice_join_eps: T,
    /// Distance from a piece midpoint at which the two sides are sampled.
    pub sample_offset: T,
    /// Result rings with less absolute area than this are discarded.
    pub collapsed_area_eps: T,
}

impl<T> BooleanOptions<T>
where
    T: Real,
{
    #[inline]
    pub fn new() -> Self {
        Self {
            pos_equal_eps: T::from(1e-5).unwrap(),
            slice_join_eps: T::from(1e-4).unwrap(),
            sample_offset: T::from(1e-4).unwrap(),
            collapsed_area_eps: T::from(1e-5).unwrap(),
        }
    }
}

impl<T> Default for BooleanOptions<T>
where
    T: Real,
{
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operand {
    First,
    Second,
}

#[derive(Debug, Clone, Copy)]
struct Segment<T> {
    p0: Vector2<T>,
    p1: Vector2<T>,
    operand: Operand,
}

/// Directed piece of a split segment.
#[derive(Debug, Clone, Copy)]
struct Piece<T> {
    start: Vector2<T>,
    end: Vector2<T>,
}

impl<T> Piece<T>
where
    T: Real,
{
    fn reversed(self) -> Self {
        Piece {
            start: self.end,
            end: self.start,
        }
    }

    fn direction(&self) -> Vector2<T> {
        self.end - self.start
    }
}

/// All operand segments plus a spatial index over their bounding boxes.
struct SegmentSet<T>
where
    T: Real,
{
    segments: Vec<Segment<T>>,
    index: StaticAABB2DIndex<T>,
    max_x: T,
}

impl<T> SegmentSet<T>
where
    T: Real,
{
    fn new(first: &Region<T>, second: &Region<T>, eps: T) -> Result<Self, GeometryError> {
        let mut segments = Vec::new();
        for (region, operand) in [(first, Operand::First), (second, Operand::Second)] {
            for ring in region.rings() {
                for (p0, p1) in ring.iter_segments() {
                    if !p0.fuzzy_eq_eps(p1, eps) {
                        segments.push(Segment { p0, p1, operand });
                    }
                }
            }
        }

        let mut builder = StaticAABB2DIndexBuilder::new(segments.len());
        let mut max_x = segments.first().map_or(T::zero(), |s| s.p0.x);
        for s in &segments {
            let (min_x, seg_max_x) = min_max(s.p0.x, s.p1.x);
            let (min_y, max_y) = min_max(s.p0.y, s.p1.y);
            builder.add(min_x, min_y, seg_max_x, max_y);
            max_x = num_traits::real::Real::max(max_x, seg_max_x);
        }
        let index = build_index(builder)?;

        Ok(SegmentSet {
            segments,
            index,
            max_x,
        })
    }

    /// Winding number of `point` against the rings of one operand.
    ///
    /// Only segments whose bounding box meets the ray from `point` toward +x can contribute.
    fn winding_number(
        &self,
        operand: Operand,
        point: Vector2<T>,
        query_results: &mut Vec<usize>,
        query_stack: &mut Vec<usize>,
    ) -> i32 {
        if point.x > self.max_x {
            return 0;
        }
        query_results.clear();
        let mut visitor = |i: usize| query_results.push(i);
        self.index.visit_query_with_stack(
            point.x,
            point.y,
            self.max_x,
            point.y,
            &mut visitor,
            query_stack,
        );

        let mut winding = 0;
        for &i in query_results.iter() {
            let s = &self.segments[i];
            if s.operand != operand {
                continue;
            }
            if s.p0.y <= point.y {
                if s.p1.y > point.y && is_left(s.p0, s.p1, point) {
                    winding += 1;
                }
            } else if s.p1.y <= point.y && signed_area_x2(s.p0, s.p1, point) < T::zero() {
                winding -= 1;
            }
        }
        winding
    }

    /// Split every segment at its intersects with all other segments.
    fn split_pieces(&self, eps: T) -> Vec<Piece<T>> {
        let mut pieces = Vec::with_capacity(self.segments.len());
        let mut split_ts: Vec<T> = Vec::new();
        let mut candidates: Vec<usize> = Vec::new();
        let mut query_stack = Vec::new();

        for (i, s) in self.segments.iter().enumerate() {
            candidates.clear();
            let (min_x, max_x) = min_max(s.p0.x, s.p1.x);
            let (min_y, max_y) = min_max(s.p0.y, s.p1.y);
            let mut visitor = |j: usize| {
                if j != i {
                    candidates.push(j);
                }
            };
            self.index.visit_query_with_stack(
                min_x - eps,
                min_y - eps,
                max_x + eps,
                max_y + eps,
                &mut visitor,
                &mut query_stack,
            );

            split_ts.clear();
            for &j in candidates.iter() {
                let other = &self.segments[j];
                match line_line_intr(s.p0, s.p1, other.p0, other.p1, eps) {
                    LineLineIntr::TrueIntersect { seg1_t, .. } => split_ts.push(seg1_t),
                    LineLineIntr::Overlapping { .. } => {
                        split_ts.push(parametric_from_point(s.p0, s.p1, other.p0));
                        split_ts.push(parametric_from_point(s.p0, s.p1, other.p1));
                    }
                    LineLineIntr::NoIntersect | LineLineIntr::FalseIntersect { .. } => {}
                }
            }

            split_ts.sort_unstable_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
            let mut prev = s.p0;
            for &t in split_ts.iter() {
                if t <= T::zero() || t >= T::one() {
                    continue;
                }
                let p = point_from_parametric(s.p0, s.p1, t);
                if p.fuzzy_eq_eps(prev, eps) || p.fuzzy_eq_eps(s.p1, eps) {
                    continue;
                }
                pieces.push(Piece {
                    start: prev,
                    end: p,
                });
                prev = p;
            }
            pieces.push(Piece {
                start: prev,
                end: s.p1,
            });
        }

        pieces
    }
}

fn build_index<T>(builder: StaticAABB2DIndexBuilder<T>) -> Result<StaticAABB2DIndex<T>, GeometryError>
where
    T: Real,
{
    builder
        .build()
        .map_err(|e| GeometryError::SpatialIndex(e.to_string()))
}

/// Perform a boolean operation between two regions.
///
/// Operands are read with the nonzero winding rule, so raw loops of either orientation and self
/// intersecting loops are accepted. The result is a valid region.
///
/// # Examples
///
/// ```
/// # use contour_analytics::polygon::*;
/// # use contour_analytics::core::traits::*;
/// let a = Region::from_ring(Ring::rectangle(0.0, 0.0, 10.0, 10.0)).unwrap();
/// let b = Region::from_ring(Ring::rectangle(5.0, 0.0, 15.0, 10.0)).unwrap();
/// let overlap = region_boolean(&a, &b, BooleanOp::And, &BooleanOptions::new()).unwrap();
/// assert!(overlap.area().fuzzy_eq_eps(50.0, 1e-6));
/// ```
pub fn region_boolean<T>(
    first: &Region<T>,
    second: &Region<T>,
    operation: BooleanOp,
    options: &BooleanOptions<T>,
) -> Result<Region<T>, GeometryError>
where
    T: Real,
{
    let eps = options.pos_equal_eps;
    let set = SegmentSet::new(first, second, eps)?;
    if set.segments.is_empty() {
        return Ok(Region::empty());
    }

    let mut query_results = Vec::new();
    let mut query_stack = Vec::new();
    let mut kept = Vec::new();
    for piece in set.split_pieces(eps) {
        let mid = midpoint(piece.start, piece.end);
        let normal = piece.direction().unit_perp().scale(options.sample_offset);
        let mut side_kept = |sample: Vector2<T>| {
            let in_first = set.winding_number(Operand::First, sample, &mut query_results, &mut query_stack) != 0;
            let in_second = set.winding_number(Operand::Second, sample, &mut query_results, &mut query_stack) != 0;
            operation.keeps(in_first, in_second)
        };
        let left = side_kept(mid + normal);
        let right = side_kept(mid - normal);
        if left == right {
            continue;
        }
        kept.push(if left { piece } else { piece.reversed() });
    }

    let pieces = remove_coincident(kept, eps)?;
    let rings = stitch_pieces(&pieces, options)?;
    Ok(Region::from_oriented_rings(rings))
}

/// Remove pieces that duplicate an earlier piece (same start and end within `eps`).
fn remove_coincident<T>(pieces: Vec<Piece<T>>, eps: T) -> Result<Vec<Piece<T>>, GeometryError>
where
    T: Real,
{
    if pieces.len() < 2 {
        return Ok(pieces);
    }
    let mut builder = StaticAABB2DIndexBuilder::new(pieces.len());
    for p in &pieces {
        builder.add(p.start.x, p.start.y, p.start.x, p.start.y);
    }
    let index = build_index(builder)?;

    let mut removed = vec![false; pieces.len()];
    let mut query_stack = Vec::new();
    for i in 0..pieces.len() {
        if removed[i] {
            continue;
        }
        let p = pieces[i];
        let mut visitor = |j: usize| {
            if j > i && pieces[j].end.fuzzy_eq_eps(p.end, eps) {
                removed[j] = true;
            }
        };
        index.visit_query_with_stack(
            p.start.x - eps,
            p.start.y - eps,
            p.start.x + eps,
            p.start.y + eps,
            &mut visitor,
            &mut query_stack,
        );
    }

    Ok(pieces
        .into_iter()
        .zip(removed)
        .filter_map(|(p, r)| if r { None } else { Some(p) })
        .collect())
}

/// Turn from `incoming` to `outgoing` in radians, positive counter clockwise.
fn turn_angle<T>(incoming: Vector2<T>, outgoing: Vector2<T>) -> T
where
    T: Real,
{
    incoming.perp_dot(outgoing).atan2(incoming.dot(outgoing))
}

/// Stitch directed pieces into closed rings.
///
/// Where several pieces start at the end of the current one the sharpest counter clockwise turn
/// is taken, which keeps regions that only touch at a vertex in separate rings.
fn stitch_pieces<T>(pieces: &[Piece<T>], options: &BooleanOptions<T>) -> Result<Vec<Ring<T>>, GeometryError>
where
    T: Real,
{
    if pieces.is_empty() {
        return Ok(Vec::new());
    }
    let join_eps = options.slice_join_eps;
    let mut builder = StaticAABB2DIndexBuilder::new(pieces.len());
    for p in pieces {
        builder.add(p.start.x, p.start.y, p.start.x, p.start.y);
    }
    let starts_index = build_index(builder)?;

    let mut rings = Vec::new();
    let mut visited = vec![false; pieces.len()];
    let mut query_results = Vec::new();
    let mut query_stack = Vec::new();

    for i in 0..pieces.len() {
        if visited[i] {
            continue;
        }
        visited[i] = true;
        let beginning = pieces[i].start;
        let mut points = vec![beginning];
        let mut current = i;
        let mut closed = false;

        for _ in 0..pieces.len() {
            let end = pieces[current].end;
            if end.fuzzy_eq_eps(beginning, join_eps) {
                closed = true;
                break;
            }

            query_results.clear();
            let mut visitor = |j: usize| {
                if !visited[j] {
                    query_results.push(j);
                }
            };
            starts_index.visit_query_with_stack(
                end.x - join_eps,
                end.y - join_eps,
                end.x + join_eps,
                end.y + join_eps,
                &mut visitor,
                &mut query_stack,
            );

            let incoming = pieces[current].direction();
            let next = query_results.iter().copied().max_by(|&a, &b| {
                let ta = turn_angle(incoming, pieces[a].direction());
                let tb = turn_angle(incoming, pieces[b].direction());
                ta.partial_cmp(&tb).unwrap_or(std::cmp::Ordering::Equal)
            });

            let Some(next) = next else {
                break;
            };
            visited[next] = true;
            points.push(pieces[next].start);
            current = next;
        }

        if !closed {
            // may arrive here due to epsilon thresholds around overlapping segments
            log::debug!("discarding open chain of {} points while stitching", points.len());
            continue;
        }

        let ring = Ring::from_points(points).cleaned(options.pos_equal_eps);
        if ring.len() >= 3 && ring.area() >= options.collapsed_area_eps {
            rings.push(ring);
        }
    }

    Ok(rings)
}
