//! Volumetric metrics of a single structure.
//!
//! Inputs are in mm. Results are converted to cm, cm² and cm³ except the centroid, which stays
//! in patient coordinates (mm).
use crate::{
    error::GeometryError,
    planes::{SetsOfPlanes, Structure, StructureKind},
    stats::median,
};

const MM3_PER_CM3: f64 = 1000.0;
const MM2_PER_CM2: f64 = 100.0;
const MM_PER_CM: f64 = 10.0;

/// Point in patient coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Point3 { x, y, z }
    }

    pub fn distance_to(&self, other: &Point3) -> f64 {
        let (dx, dy, dz) = (self.x - other.x, self.y - other.y, self.z - other.z);
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

/// Largest and median component cross section area, cm².
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CrossSection {
    pub max: f64,
    pub median: f64,
}

fn non_empty(planes: &SetsOfPlanes) -> Result<(), GeometryError> {
    if planes.is_empty() {
        Err(GeometryError::EmptyStructure)
    } else {
        Ok(())
    }
}

/// Volume in cm³: slice area times slice thickness, summed.
pub fn volume(planes: &SetsOfPlanes) -> Result<f64, GeometryError> {
    non_empty(planes)?;
    let thicknesses = planes.slice_thicknesses();
    let mm3: f64 = planes
        .iter()
        .map(|(key, region)| region.area() * thicknesses[&key])
        .sum();
    Ok(mm3 / MM3_PER_CM3)
}

/// Surface area in cm².
///
/// Each slice contributes its perimeter times its local thickness plus, for the faces below and
/// above it, the area not covered by the neighboring slice. A face is fully exposed on the first
/// and last slice and where the neighbor is more than twice the local thickness away.
///
/// Both tests use the slice's own local thickness, so a gap can be judged differently from its
/// two sides. For slices at z = 0, 1 and 10 the 9 mm gap is a discontinuity seen from z = 1
/// (local thickness 1 mm, top face capped) but contiguous seen from z = 10 (local thickness
/// 9 mm, bottom face only adds the area not covered by z = 1). The gap therefore gets one cap.
pub fn surface_area(planes: &SetsOfPlanes) -> Result<f64, GeometryError> {
    non_empty(planes)?;
    let thicknesses = planes.local_min_thicknesses();
    let slices: Vec<_> = planes.iter().collect();
    let mut mm2 = 0.0;

    for (i, &(key, region)) in slices.iter().enumerate() {
        let t = thicknesses[&key];
        let area = region.area();
        mm2 += region.perimeter() * t;

        let neighbors = [i.checked_sub(1), Some(i + 1).filter(|&j| j < slices.len())];
        for neighbor in neighbors {
            match neighbor {
                Some(j) if (key.z() - slices[j].0.z()).abs() <= 2.0 * t => {
                    mm2 += region.difference(slices[j].1)?.area();
                }
                _ => mm2 += area,
            }
        }
    }

    Ok(mm2 / MM2_PER_CM2)
}

/// Area weighted mean of the centroids of every sub region on every slice, mm.
pub fn centroid(planes: &SetsOfPlanes) -> Result<Point3, GeometryError> {
    non_empty(planes)?;
    let mut weight_sum = 0.0;
    let mut sum = Point3::default();
    for (key, region) in planes.iter() {
        for component in region.components() {
            let area = component.area();
            let Some(c) = component.centroid() else {
                continue;
            };
            weight_sum += area;
            sum.x += c.x * area;
            sum.y += c.y * area;
            sum.z += key.z() * area;
        }
    }
    if weight_sum <= 0.0 {
        return Err(GeometryError::ZeroArea);
    }
    Ok(Point3::new(
        sum.x / weight_sum,
        sum.y / weight_sum,
        sum.z / weight_sum,
    ))
}

/// Extent of all vertices along x, y and z, cm.
pub fn spread(planes: &SetsOfPlanes) -> Result<[f64; 3], GeometryError> {
    non_empty(planes)?;
    let mut lo = [f64::INFINITY; 3];
    let mut hi = [f64::NEG_INFINITY; 3];
    for p in planes.surface_points() {
        for d in 0..3 {
            lo[d] = lo[d].min(p[d]);
            hi[d] = hi[d].max(p[d]);
        }
    }
    Ok([0, 1, 2].map(|d| (hi[d] - lo[d]).abs() / MM_PER_CM))
}

/// Max and median area of the sub regions across all slices, cm².
pub fn cross_section(planes: &SetsOfPlanes) -> Result<CrossSection, GeometryError> {
    non_empty(planes)?;
    let areas: Vec<f64> = planes
        .iter()
        .flat_map(|(_, region)| region.components())
        .map(|c| c.area())
        .filter(|&a| a > 0.0)
        .collect();
    let median = median(&areas).ok_or(GeometryError::ZeroArea)?;
    let max = areas.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    Ok(CrossSection {
        max: max / MM2_PER_CM2,
        median: median / MM2_PER_CM2,
    })
}

/// Geometry of one structure. A metric that could not be evaluated is `None`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StructureMetrics {
    pub name: String,
    pub kind: StructureKind,
    pub slice_count: usize,
    /// cm³
    pub volume: Option<f64>,
    /// cm²
    pub surface_area: Option<f64>,
    /// mm
    pub centroid: Option<Point3>,
    /// cm, x/y/z
    pub spread: Option<[f64; 3]>,
    pub cross_section: Option<CrossSection>,
}

impl StructureMetrics {
    /// Evaluate every metric, logging and dropping the ones that fail.
    pub fn compute(structure: &Structure) -> Self {
        let planes = structure.planes();
        let name = structure.name();
        StructureMetrics {
            name: name.to_string(),
            kind: structure.kind(),
            slice_count: planes.len(),
            volume: recover(name, "volume", volume(planes)),
            surface_area: recover(name, "surface area", surface_area(planes)),
            centroid: recover(name, "centroid", centroid(planes)),
            spread: recover(name, "spread", spread(planes)),
            cross_section: recover(name, "cross section", cross_section(planes)),
        }
    }
}

/// Turn a failed metric into `None`, logging it with the structure name.
pub(crate) fn recover<V>(structure: &str, metric: &str, result: Result<V, GeometryError>) -> Option<V> {
    match result {
        Ok(v) => Some(v),
        Err(e) => {
            log::warn!("{structure}: {metric} not calculated: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_fuzzy_eq;
    use crate::core::traits::FuzzyEq;
    use crate::polygon::Ring;

    fn prism(rect: (f64, f64, f64, f64), zs: impl IntoIterator<Item = f64>) -> SetsOfPlanes {
        let (x0, y0, x1, y1) = rect;
        SetsOfPlanes::from_contours(zs.into_iter().map(|z| (z, Ring::rectangle(x0, y0, x1, y1))))
            .unwrap()
    }

    #[test]
    fn volume_of_box() {
        // 10 x 10 mm slices every 1 mm from z = 0 to z = 9, each slice counts 1 mm
        let planes = prism((0.0, 0.0, 10.0, 10.0), (0..10).map(f64::from));
        assert_fuzzy_eq!(volume(&planes).unwrap(), 1.0, 1e-9);
    }

    #[test]
    fn single_slice_uses_fallback_thickness() {
        let planes = prism((0.0, 0.0, 10.0, 10.0), [3.0]);
        assert_fuzzy_eq!(volume(&planes).unwrap(), 0.2, 1e-9);
    }

    #[test]
    fn surface_area_of_box() {
        let planes = prism((0.0, 0.0, 10.0, 10.0), (0..10).map(f64::from));
        // lateral 10 slices * 40 mm * 1 mm, plus top and bottom caps
        let expected = (10.0 * 40.0 + 2.0 * 100.0) / 100.0;
        assert_fuzzy_eq!(surface_area(&planes).unwrap(), expected, 1e-9);
    }

    #[test]
    fn surface_area_counts_step_between_slices() {
        let planes = SetsOfPlanes::from_contours(vec![
            (0.0, Ring::rectangle(0.0, 0.0, 10.0, 10.0)),
            (1.0, Ring::rectangle(0.0, 0.0, 5.0, 10.0)),
        ])
        .unwrap();
        // lateral 40 + 30, caps 100 + 50, exposed step 50 from below
        let expected = (40.0 + 30.0 + 100.0 + 50.0 + 50.0) / 100.0;
        assert_fuzzy_eq!(surface_area(&planes).unwrap(), expected, 1e-9);
    }

    #[test]
    fn distant_slices_are_capped() {
        let planes = prism((0.0, 0.0, 10.0, 10.0), [0.0, 1.0, 10.0]);
        // the 1 mm slice has its next neighbor 9 mm away, so its top face is a cap; the 10 mm
        // slice has a local thickness of 9 mm and sees the same neighbor as adjacent
        let lateral = 40.0 * 1.0 + 40.0 * 1.0 + 40.0 * 9.0;
        let faces = 100.0 + 0.0 + 0.0 + 100.0 + 0.0 + 100.0;
        assert_fuzzy_eq!(surface_area(&planes).unwrap(), (lateral + faces) / 100.0, 1e-9);
    }

    #[test]
    fn centroid_of_single_rectangle_slice() {
        let planes = prism((2.0, 4.0, 6.0, 10.0), [-7.5]);
        let c = centroid(&planes).unwrap();
        assert_fuzzy_eq!(c.x, 4.0);
        assert_fuzzy_eq!(c.y, 7.0);
        assert_fuzzy_eq!(c.z, -7.5);
    }

    #[test]
    fn spread_and_cross_section() {
        let planes = SetsOfPlanes::from_contours(vec![
            (0.0, Ring::rectangle(0.0, 0.0, 10.0, 10.0)),
            (0.0, Ring::rectangle(20.0, 0.0, 22.0, 2.0)),
            (5.0, Ring::rectangle(0.0, 0.0, 10.0, 20.0)),
        ])
        .unwrap();
        let s = spread(&planes).unwrap();
        assert_fuzzy_eq!(s[0], 2.2);
        assert_fuzzy_eq!(s[1], 2.0);
        assert_fuzzy_eq!(s[2], 0.5);

        let cs = cross_section(&planes).unwrap();
        assert_fuzzy_eq!(cs.max, 2.0, 1e-9);
        assert_fuzzy_eq!(cs.median, 1.0, 1e-9);
    }

    #[test]
    fn empty_structure_metrics_are_none() {
        let s = Structure::new("empty", StructureKind::OrganAtRisk, "test", SetsOfPlanes::new());
        let m = StructureMetrics::compute(&s);
        assert_eq!(m.slice_count, 0);
        assert!(m.volume.is_none());
        assert!(m.surface_area.is_none());
        assert!(m.centroid.is_none());
        assert!(m.spread.is_none());
        assert!(m.cross_section.is_none());
    }
}
