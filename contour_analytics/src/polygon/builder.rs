//! Compose the contour loops of one slice into a single region.
//!
//! Structure sets do not mark which loops are holes. Nesting is implied by order: each loop is
//! tested against everything composed before it. A loop starting outside the accumulated region
//! is added to it, a loop starting inside (or on the boundary) toggles the area it covers, which
//! cuts holes into filled area and puts islands back into holes.
use super::{PointLocation, Region, Ring};
use crate::{core::traits::Real, error::GeometryError};

/// Compose loops in input order. Returns `Ok(None)` when every loop is degenerate.
///
/// Loops with a non-finite coordinate are skipped like degenerate ones.
///
/// # Examples
///
/// ```
/// # use contour_analytics::polygon::{builder::compose_slice, Ring};
/// # use contour_analytics::core::traits::*;
/// let outer = Ring::rectangle(0.0, 0.0, 10.0, 10.0);
/// let hole = Ring::rectangle(4.0, 4.0, 6.0, 6.0);
/// let region = compose_slice(vec![outer, hole]).unwrap().unwrap();
/// assert!(region.area().fuzzy_eq_eps(96.0, 1e-6));
/// ```
pub fn compose_slice<T, I>(contours: I) -> Result<Option<Region<T>>, GeometryError>
where
    T: Real,
    I: IntoIterator<Item = Ring<T>>,
{
    let eps = T::from(1e-5).unwrap_or_else(T::fuzzy_epsilon);
    let mut accumulator: Option<Region<T>> = None;

    for contour in contours {
        if let Err(e) = contour.check_finite() {
            log::warn!("ignoring contour with {} points: {e}", contour.len());
            continue;
        }
        let cleaned = contour.cleaned(eps);
        if cleaned.len() < 3 || cleaned.area() < eps {
            log::debug!("ignoring degenerate contour with {} points", contour.len());
            continue;
        }
        let first_vertex = cleaned.points()[0];
        let resolved = Region::from_ring(cleaned)?;
        if resolved.is_empty() {
            continue;
        }

        accumulator = Some(match accumulator {
            None => resolved,
            Some(acc) => match acc.locate(first_vertex, eps) {
                PointLocation::Outside => acc.union(&resolved)?,
                PointLocation::Inside | PointLocation::OnBoundary => {
                    acc.symmetric_difference(&resolved)?
                }
            },
        });
    }

    Ok(accumulator.filter(|r| !r.is_empty()))
}
