//! Distances from the surface of a structure to the surface of a target.
//!
//! Target points are held in a spatial index over (x, y). Distance in the transverse plane is a
//! lower bound on the 3D distance, so a box query whose half width is the best distance found
//! so far can never miss a closer point.
use crate::{
    config::DistanceOptions,
    core::math::Vector2,
    error::{DistanceError, GeometryError},
    planes::SetsOfPlanes,
    polygon::PointLocation,
    stats::StatSummary,
};
use static_aabb2d_index::{StaticAABB2DIndex, StaticAABB2DIndexBuilder};

const MM_PER_CM: f64 = 10.0;
/// Half width of the first box query around each point, mm.
const INITIAL_SEARCH_RADIUS: f64 = 10.0;
const MAX_SEARCH_EXPANSIONS: usize = 64;

/// Thin `points` by repeatedly removing every n-th point (n = 1 / `iterative_reduction`) until
/// at most `max_count` remain.
pub fn sample_points<P>(mut points: Vec<P>, max_count: usize, iterative_reduction: f64) -> Vec<P> {
    let n = if iterative_reduction > 0.0 {
        ((1.0 / iterative_reduction).round() as usize).max(2)
    } else {
        2
    };
    while points.len() > max_count {
        points = points
            .into_iter()
            .enumerate()
            .filter_map(|(i, p)| if i % n != 0 { Some(p) } else { None })
            .collect();
    }
    points
}

fn dist_3d(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    let (dx, dy, dz) = (a[0] - b[0], a[1] - b[1], a[2] - b[2]);
    (dx * dx + dy * dy + dz * dz).sqrt()
}

/// For each point in `oar`, the distance to the closest point in `target`, cm.
///
/// Fails with [DistanceError::TooManyPairs] when `oar.len() * target.len()` exceeds
/// `max_pairwise_evaluations`.
pub fn min_distances_to_target(
    oar: &[[f64; 3]],
    target: &[[f64; 3]],
    max_pairwise_evaluations: usize,
) -> Result<Vec<f64>, DistanceError> {
    if oar.is_empty() || target.is_empty() {
        return Err(DistanceError::EmptyPointSet);
    }
    if oar.len().saturating_mul(target.len()) > max_pairwise_evaluations {
        return Err(DistanceError::TooManyPairs {
            oar_points: oar.len(),
            target_points: target.len(),
            limit: max_pairwise_evaluations,
        });
    }

    let mut builder = StaticAABB2DIndexBuilder::new(target.len());
    for p in target {
        builder.add(p[0], p[1], p[0], p[1]);
    }
    let index: StaticAABB2DIndex<f64> = builder
        .build()
        .map_err(|e| GeometryError::SpatialIndex(e.to_string()))?;

    let mut query_stack = Vec::new();
    let mut hits = Vec::new();
    let mut result = Vec::with_capacity(oar.len());
    for p in oar {
        let mut radius = INITIAL_SEARCH_RADIUS;
        let mut best = f64::INFINITY;
        for _ in 0..MAX_SEARCH_EXPANSIONS {
            hits.clear();
            let mut visitor = |i: usize| hits.push(i);
            index.visit_query_with_stack(
                p[0] - radius,
                p[1] - radius,
                p[0] + radius,
                p[1] + radius,
                &mut visitor,
                &mut query_stack,
            );
            best = hits
                .iter()
                .map(|&i| dist_3d(p, &target[i]))
                .fold(best, f64::min);
            if best <= radius {
                break;
            }
            if best.is_finite() {
                // widen once to cover everything that could be closer
                radius = best;
            } else {
                radius *= 2.0;
            }
        }
        result.push(best / MM_PER_CM);
    }
    Ok(result)
}

/// Histogram of signed distances in 1 mm bins aligned to whole millimeters.
///
/// Bin `i` covers `[first_bin_mm + i, first_bin_mm + i + 1)` mm. Fractions sum to 1.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DistanceHistogram {
    pub first_bin_mm: i64,
    pub fractions: Vec<f64>,
}

impl DistanceHistogram {
    /// Bin signed distances given in cm. `None` for an empty input.
    pub fn from_signed_distances(distances_cm: &[f64]) -> Option<Self> {
        let bins: Vec<i64> = distances_cm
            .iter()
            .filter(|d| d.is_finite())
            .map(|d| (d * MM_PER_CM).floor() as i64)
            .collect();
        let first = *bins.iter().min()?;
        let last = *bins.iter().max()?;
        let mut counts = vec![0usize; (last - first + 1) as usize];
        for b in &bins {
            counts[(b - first) as usize] += 1;
        }
        let total = bins.len() as f64;
        Some(DistanceHistogram {
            first_bin_mm: first,
            fractions: counts.into_iter().map(|c| c as f64 / total).collect(),
        })
    }

    /// `(lower edge in mm, fraction)` for every bin.
    pub fn bins(&self) -> impl Iterator<Item = (i64, f64)> + '_ {
        self.fractions
            .iter()
            .enumerate()
            .map(|(i, &f)| (self.first_bin_mm + i as i64, f))
    }
}

/// Distance statistics of a structure relative to a target.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DistanceSummary {
    /// Statistics of the unsigned minimum distances, cm.
    pub stats: StatSummary,
    pub histogram: DistanceHistogram,
    pub oar_points: usize,
    pub target_points: usize,
}

/// Negate distances of points that lie inside the target.
///
/// A point is tested against the target slice nearest in z, provided that slice is within half
/// its own thickness.
pub fn sign_by_containment(points: &[[f64; 3]], distances_cm: &[f64], target: &SetsOfPlanes) -> Vec<f64> {
    let thicknesses = target.local_min_thicknesses();
    points
        .iter()
        .zip(distances_cm)
        .map(|(p, &d)| {
            let inside = target.nearest_slice(p[2]).is_some_and(|(key, region)| {
                (key.z() - p[2]).abs() <= thicknesses[&key] / 2.0
                    && region.locate(Vector2::new(p[0], p[1]), 1e-5)
                        == PointLocation::Inside
            });
            if inside { -d } else { d }
        })
        .collect()
}

/// Minimum distance statistics and signed histogram from `oar` to `target`.
///
/// Both surfaces are thinned to `max_point_count` points. If the pair count is still above the
/// limit they are thinned again to `fallback_point_count` before giving up.
pub fn measure(
    oar: &SetsOfPlanes,
    target: &SetsOfPlanes,
    options: &DistanceOptions,
) -> Result<DistanceSummary, DistanceError> {
    let reduction = options.iterative_reduction;
    let mut oar_points = sample_points(oar.surface_points(), options.max_point_count, reduction);
    let mut target_points = sample_points(target.surface_points(), options.max_point_count, reduction);

    let distances = match min_distances_to_target(&oar_points, &target_points, options.max_pairwise_evaluations) {
        Err(DistanceError::TooManyPairs { .. }) => {
            log::debug!(
                "{} x {} point pairs over limit, retrying with {} points",
                oar_points.len(),
                target_points.len(),
                options.fallback_point_count
            );
            oar_points = sample_points(oar_points, options.fallback_point_count, reduction);
            target_points = sample_points(target_points, options.fallback_point_count, reduction);
            min_distances_to_target(&oar_points, &target_points, options.max_pairwise_evaluations)?
        }
        other => other?,
    };

    let stats = StatSummary::from_values(&distances).ok_or(DistanceError::EmptyPointSet)?;
    let signed = sign_by_containment(&oar_points, &distances, target);
    let histogram = DistanceHistogram::from_signed_distances(&signed).ok_or(DistanceError::EmptyPointSet)?;
    Ok(DistanceSummary {
        stats,
        histogram,
        oar_points: oar_points.len(),
        target_points: target_points.len(),
    })
}
