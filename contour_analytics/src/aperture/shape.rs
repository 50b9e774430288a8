use super::{ControlPoint, LeafAxis};
use crate::{
    config::MlcAnalyzerOptions,
    error::GeometryError,
    polygon::{Region, Ring},
};

/// Openings narrower than this (mm) are treated as closed.
const CLOSED_LEAF_GAP: f64 = 1e-5;

/// Where a jaw position came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum JawSource {
    /// Given on the control point itself.
    Explicit,
    /// Missing on the control point, taken from the first control point of the beam.
    InheritedFromFirst,
    /// Missing on the beam entirely, the configured maximum field size is used.
    MaxFieldSize,
}

/// Jaw opening along one axis, mm.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct JawSetting {
    pub min: f64,
    pub max: f64,
    pub source: JawSource,
}

impl JawSetting {
    fn resolve(own: Option<(f64, f64)>, first: Option<(f64, f64)>, max_field_size: f64) -> Self {
        let ordered = |(a, b): (f64, f64)| (a.min(b), a.max(b));
        let ((min, max), source) = match (own, first) {
            (Some(p), _) => (ordered(p), JawSource::Explicit),
            (None, Some(p)) => (ordered(p), JawSource::InheritedFromFirst),
            (None, None) => (
                (-max_field_size / 2.0, max_field_size / 2.0),
                JawSource::MaxFieldSize,
            ),
        };
        JawSetting { min, max, source }
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.max - self.min
    }

    fn clip(&self, lo: f64, hi: f64) -> (f64, f64) {
        (lo.max(self.min), hi.min(self.max))
    }
}

/// Jaws in effect for one control point.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResolvedJaws {
    pub x: JawSetting,
    pub y: JawSetting,
}

impl ResolvedJaws {
    pub fn resolve(point: &ControlPoint, first: &ControlPoint, options: &MlcAnalyzerOptions) -> Self {
        ResolvedJaws {
            x: JawSetting::resolve(point.jaw_x, first.jaw_x, options.max_field_size_x),
            y: JawSetting::resolve(point.jaw_y, first.jaw_y, options.max_field_size_y),
        }
    }

    fn rectangle(&self, min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Option<Ring> {
        let (x0, x1) = self.x.clip(min_x, max_x);
        let (y0, y1) = self.y.clip(min_y, max_y);
        if x1 - x0 > CLOSED_LEAF_GAP && y1 - y0 > CLOSED_LEAF_GAP {
            Some(Ring::rectangle(x0, y0, x1, y1))
        } else {
            None
        }
    }
}

/// Open field of a control point: the union of every leaf pair opening, clipped to the jaws.
///
/// Without leaf positions the aperture is the jaw rectangle. Leaf pair `i` spans the band
/// between `leaf_boundaries[i]` and `leaf_boundaries[i + 1]`; bank A holds the lower tip and
/// bank B the upper tip along the travel axis.
pub fn aperture(
    point: &ControlPoint,
    leaf_axis: LeafAxis,
    leaf_boundaries: &[f64],
    jaws: &ResolvedJaws,
) -> Result<Region, GeometryError> {
    let Some(leaves) = &point.leaves else {
        let jaw_ring = jaws.rectangle(jaws.x.min, jaws.y.min, jaws.x.max, jaws.y.max);
        return Ok(Region::from_oriented_rings(jaw_ring.into_iter().collect()));
    };

    let openings: Vec<Ring> = leaf_boundaries
        .windows(2)
        .zip(leaves.bank_a.iter().zip(&leaves.bank_b))
        .filter_map(|(band, (&a, &b))| {
            let (band_lo, band_hi) = (band[0].min(band[1]), band[0].max(band[1]));
            match leaf_axis {
                LeafAxis::Mlcx => jaws.rectangle(a, band_lo, b, band_hi),
                LeafAxis::Mlcy => jaws.rectangle(band_lo, a, band_hi, b),
            }
        })
        .collect();

    match openings.len() {
        0 => Ok(Region::empty()),
        1 => Ok(Region::from_oriented_rings(openings)),
        // bands only touch along their boundaries, merging resolves shared edges
        _ => Region::from_oriented_rings(openings).union(&Region::empty()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aperture::LeafBanks;
    use crate::assert_fuzzy_eq;
    use crate::core::traits::FuzzyEq;

    fn point(leaves: Option<(Vec<f64>, Vec<f64>)>, jaw_x: Option<(f64, f64)>) -> ControlPoint {
        ControlPoint {
            leaves: leaves.map(|(bank_a, bank_b)| LeafBanks { bank_a, bank_b }),
            jaw_x,
            jaw_y: Some((0.0, 20.0)),
            ..ControlPoint::default()
        }
    }

    fn jaws_for(p: &ControlPoint) -> ResolvedJaws {
        ResolvedJaws::resolve(p, p, &MlcAnalyzerOptions::default())
    }

    #[test]
    fn jaw_resolution_policy() {
        let options = MlcAnalyzerOptions::default();
        let first = ControlPoint {
            jaw_x: Some((30.0, -30.0)),
            ..ControlPoint::default()
        };
        let later = ControlPoint::default();
        let jaws = ResolvedJaws::resolve(&later, &first, &options);
        assert_eq!(jaws.x.source, JawSource::InheritedFromFirst);
        assert_fuzzy_eq!(jaws.x.min, -30.0);
        assert_fuzzy_eq!(jaws.x.max, 30.0);
        assert_eq!(jaws.y.source, JawSource::MaxFieldSize);
        assert_fuzzy_eq!(jaws.y.width(), 400.0);

        let own = ResolvedJaws::resolve(&first, &first, &options);
        assert_eq!(own.x.source, JawSource::Explicit);
    }

    #[test]
    fn staircase_aperture() {
        let p = point(Some((vec![-5.0, 0.0], vec![5.0, 5.0])), Some((-10.0, 10.0)));
        let region = aperture(&p, LeafAxis::Mlcx, &[0.0, 10.0, 20.0], &jaws_for(&p)).unwrap();
        assert_eq!(region.rings().len(), 1);
        assert_fuzzy_eq!(region.area(), 150.0, 1e-6);
        let paths = region.outer_path_lengths();
        assert_fuzzy_eq!(paths.x, 20.0, 1e-6);
        assert_fuzzy_eq!(paths.y, 40.0, 1e-6);
    }

    #[test]
    fn leaves_are_clipped_to_jaws() {
        let p = point(Some((vec![-5.0, 0.0], vec![5.0, 5.0])), Some((-2.0, 2.0)));
        let region = aperture(&p, LeafAxis::Mlcx, &[0.0, 10.0, 20.0], &jaws_for(&p)).unwrap();
        assert_fuzzy_eq!(region.area(), 60.0, 1e-6);
    }

    #[test]
    fn mlcy_leaves_travel_along_y() {
        let p = ControlPoint {
            leaves: Some(LeafBanks {
                bank_a: vec![2.0, 2.0],
                bank_b: vec![12.0, 7.0],
            }),
            jaw_x: Some((0.0, 20.0)),
            jaw_y: Some((0.0, 20.0)),
            ..ControlPoint::default()
        };
        let region = aperture(&p, LeafAxis::Mlcy, &[0.0, 10.0, 20.0], &jaws_for(&p)).unwrap();
        assert_fuzzy_eq!(region.area(), 150.0, 1e-6);
        let paths = region.outer_path_lengths();
        assert_fuzzy_eq!(paths.x, 40.0, 1e-6);
        assert_fuzzy_eq!(paths.y, 20.0, 1e-6);
    }

    #[test]
    fn closed_leaves_have_no_area() {
        let p = point(Some((vec![3.0, 3.0], vec![3.0, 1.0])), Some((-10.0, 10.0)));
        let region = aperture(&p, LeafAxis::Mlcx, &[0.0, 10.0, 20.0], &jaws_for(&p)).unwrap();
        assert!(region.is_empty());
        assert_eq!(region.area(), 0.0);
    }

    #[test]
    fn jaw_rectangle_without_leaves() {
        let p = point(None, Some((-10.0, 10.0)));
        let region = aperture(&p, LeafAxis::Mlcx, &[], &jaws_for(&p)).unwrap();
        assert_fuzzy_eq!(region.area(), 400.0);
    }
}
