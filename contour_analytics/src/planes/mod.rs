//! Structures as ordered sets of planar regions.
//!
//! Slices are keyed by z rounded to 0.01 mm. Slice thickness is always derived from the gaps
//! between neighboring keys, never stored.
pub mod format;

use crate::{
    core::math::Vector2,
    error::{AnalysisError, GeometryError},
    polygon::{Region, Ring, builder::compose_slice},
};
use std::collections::BTreeMap;

/// Thickness used for a structure with a single slice, in mm.
pub const FALLBACK_SLICE_THICKNESS: f64 = 2.0;

/// Slice position: z in hundredths of a millimeter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SliceKey(i64);

impl SliceKey {
    /// Key for `z` (mm), rounded to 0.01 mm.
    pub fn from_z(z: f64) -> Self {
        SliceKey((z * 100.0).round() as i64)
    }

    /// Slice position in mm.
    pub fn z(self) -> f64 {
        self.0 as f64 / 100.0
    }
}

/// Ordered mapping of slice position to the composite region on that slice.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SetsOfPlanes {
    slices: BTreeMap<SliceKey, Region>,
}

impl SetsOfPlanes {
    pub fn new() -> Self {
        SetsOfPlanes {
            slices: BTreeMap::new(),
        }
    }

    /// Build from `(z, loop)` records in input order.
    ///
    /// Loops are grouped per slice key, keeping their relative order, then composed into one
    /// region per slice. Slices whose loops are all degenerate are left out.
    pub fn from_contours<I>(contours: I) -> Result<Self, GeometryError>
    where
        I: IntoIterator<Item = (f64, Ring)>,
    {
        let mut grouped: BTreeMap<SliceKey, Vec<Ring>> = BTreeMap::new();
        for (z, ring) in contours {
            if !z.is_finite() {
                log::warn!("ignoring contour at non-finite z = {z}");
                continue;
            }
            grouped.entry(SliceKey::from_z(z)).or_default().push(ring);
        }

        let mut slices = BTreeMap::new();
        for (key, rings) in grouped {
            match compose_slice(rings)? {
                Some(region) => {
                    slices.insert(key, region);
                }
                None => log::debug!("slice at z = {} has no area, skipped", key.z()),
            }
        }
        Ok(SetsOfPlanes { slices })
    }

    /// Wrap regions that were already composed, e.g. the result of a union.
    pub fn from_regions(slices: BTreeMap<SliceKey, Region>) -> Self {
        SetsOfPlanes {
            slices: slices.into_iter().filter(|(_, r)| !r.is_empty()).collect(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.slices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }

    pub fn get(&self, key: SliceKey) -> Option<&Region> {
        self.slices.get(&key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (SliceKey, &Region)> + '_ {
        self.slices.iter().map(|(k, r)| (*k, r))
    }

    pub fn keys(&self) -> impl Iterator<Item = SliceKey> + '_ {
        self.slices.keys().copied()
    }

    /// Slice closest to `z`, ties going to the lower slice.
    pub fn nearest_slice(&self, z: f64) -> Option<(SliceKey, &Region)> {
        let key = SliceKey::from_z(z);
        let below = self.slices.range(..=key).next_back();
        let above = self.slices.range(key..).next();
        let nearest = match (below, above) {
            (Some(b), Some(a)) => {
                if (a.0.z() - z).abs() < (z - b.0.z()).abs() {
                    a
                } else {
                    b
                }
            }
            (Some(s), None) | (None, Some(s)) => s,
            (None, None) => return None,
        };
        Some((*nearest.0, nearest.1))
    }

    /// Thickness assigned to each slice for volume integration (mm).
    ///
    /// Each slice gets the gap to the next slice. The last slice reuses the gap before it and a
    /// lone slice gets [FALLBACK_SLICE_THICKNESS].
    pub fn slice_thicknesses(&self) -> BTreeMap<SliceKey, f64> {
        let zs: Vec<(SliceKey, f64)> = self.keys().map(|k| (k, k.z())).collect();
        let mut result = BTreeMap::new();
        if zs.len() == 1 {
            result.insert(zs[0].0, FALLBACK_SLICE_THICKNESS);
            return result;
        }
        for (i, &(key, z)) in zs.iter().enumerate() {
            let gap = match zs.get(i + 1) {
                Some(&(_, next)) => next - z,
                None => z - zs[i - 1].1,
            };
            result.insert(key, gap);
        }
        result
    }

    /// Smaller of the gaps on either side of each slice (mm). A lone slice gets
    /// [FALLBACK_SLICE_THICKNESS].
    pub fn local_min_thicknesses(&self) -> BTreeMap<SliceKey, f64> {
        let zs: Vec<(SliceKey, f64)> = self.keys().map(|k| (k, k.z())).collect();
        let mut result = BTreeMap::new();
        for (i, &(key, z)) in zs.iter().enumerate() {
            let below = i.checked_sub(1).map(|j| z - zs[j].1);
            let above = zs.get(i + 1).map(|&(_, next)| next - z);
            let t = match (below, above) {
                (Some(b), Some(a)) => b.min(a),
                (Some(g), None) | (None, Some(g)) => g,
                (None, None) => FALLBACK_SLICE_THICKNESS,
            };
            result.insert(key, t);
        }
        result
    }

    /// Every ring vertex as `(x, y, z)` in mm.
    pub fn surface_points(&self) -> Vec<[f64; 3]> {
        self.slices
            .iter()
            .flat_map(|(k, r)| {
                let z = k.z();
                r.vertices().map(move |p: Vector2| [p.x, p.y, z])
            })
            .collect()
    }
}

/// Clinical role of a structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StructureKind {
    Target,
    OrganAtRisk,
    #[default]
    Other,
}

impl StructureKind {
    /// Classify a structure set ROI interpreted type, e.g. `PTV`, `ORGAN`.
    pub fn from_roi_type(roi_type: &str) -> Self {
        let t = roi_type.trim().to_ascii_uppercase();
        if ["PTV", "CTV", "GTV", "ITV"].iter().any(|p| t.starts_with(p)) {
            StructureKind::Target
        } else if t == "ORGAN" || t == "OAR" || t == "AVOIDANCE" {
            StructureKind::OrganAtRisk
        } else {
            StructureKind::Other
        }
    }
}

/// Named structure with its slices. Immutable once created.
#[derive(Debug, Clone, PartialEq)]
pub struct Structure {
    name: String,
    kind: StructureKind,
    provenance: String,
    planes: SetsOfPlanes,
}

impl Structure {
    pub fn new(
        name: impl Into<String>,
        kind: StructureKind,
        provenance: impl Into<String>,
        planes: SetsOfPlanes,
    ) -> Self {
        Structure {
            name: name.into(),
            kind,
            provenance: provenance.into(),
            planes,
        }
    }

    /// Parse canonical contour text and compose its slices.
    pub fn from_contour_text(
        name: impl Into<String>,
        kind: StructureKind,
        provenance: impl Into<String>,
        text: &str,
    ) -> Result<Self, AnalysisError> {
        let records = format::ContourRecords::parse(text)?;
        let planes = records.to_planes()?;
        Ok(Structure::new(name, kind, provenance, planes))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> StructureKind {
        self.kind
    }

    pub fn provenance(&self) -> &str {
        &self.provenance
    }

    pub fn planes(&self) -> &SetsOfPlanes {
        &self.planes
    }

    /// Copy with a new name, used when relabeling ranked targets.
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Structure {
            name: name.into(),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_fuzzy_eq;
    use crate::core::traits::FuzzyEq;

    fn slab(zs: &[f64]) -> SetsOfPlanes {
        SetsOfPlanes::from_contours(
            zs.iter()
                .map(|&z| (z, Ring::rectangle(0.0, 0.0, 10.0, 10.0))),
        )
        .unwrap()
    }

    #[test]
    fn slice_key_rounds_to_hundredths() {
        assert_eq!(SliceKey::from_z(-12.504), SliceKey::from_z(-12.5));
        assert_ne!(SliceKey::from_z(1.0), SliceKey::from_z(1.01));
        assert_fuzzy_eq!(SliceKey::from_z(2.345678).z(), 2.35);
    }

    #[test]
    fn loops_on_same_slice_are_composed() {
        let planes = SetsOfPlanes::from_contours(vec![
            (5.0, Ring::rectangle(0.0, 0.0, 10.0, 10.0)),
            (5.001, Ring::rectangle(4.0, 4.0, 6.0, 6.0)),
        ])
        .unwrap();
        assert_eq!(planes.len(), 1);
        assert_fuzzy_eq!(planes.get(SliceKey::from_z(5.0)).unwrap().area(), 96.0, 1e-6);
    }

    #[test]
    fn degenerate_slice_is_absent() {
        let planes = SetsOfPlanes::from_contours(vec![
            (0.0, Ring::rectangle(0.0, 0.0, 1.0, 1.0)),
            (1.0, Ring::from_xy([(0.0, 0.0), (1.0, 1.0)])),
        ])
        .unwrap();
        assert_eq!(planes.len(), 1);
        assert!(planes.get(SliceKey::from_z(1.0)).is_none());
    }

    #[test]
    fn non_finite_z_is_skipped() {
        let planes = SetsOfPlanes::from_contours(vec![
            (0.0, Ring::rectangle(0.0, 0.0, 10.0, 10.0)),
            (f64::NAN, Ring::rectangle(20.0, 0.0, 30.0, 10.0)),
            (f64::INFINITY, Ring::rectangle(0.0, 0.0, 1.0, 1.0)),
        ])
        .unwrap();
        assert_eq!(planes.len(), 1);
        assert_fuzzy_eq!(planes.get(SliceKey::from_z(0.0)).unwrap().area(), 100.0, 1e-6);
    }

    #[test]
    fn thickness_uses_gap_to_next_and_prior_for_last() {
        let t = slab(&[0.0, 2.0, 5.0]).slice_thicknesses();
        let v: Vec<f64> = t.values().copied().collect();
        assert_eq!(v.len(), 3);
        assert_fuzzy_eq!(v[0], 2.0);
        assert_fuzzy_eq!(v[1], 3.0);
        assert_fuzzy_eq!(v[2], 3.0);
    }

    #[test]
    fn single_slice_uses_fallback() {
        let planes = slab(&[7.5]);
        assert_eq!(
            planes.slice_thicknesses().values().copied().collect::<Vec<_>>(),
            vec![FALLBACK_SLICE_THICKNESS]
        );
        assert_eq!(
            planes.local_min_thicknesses().values().copied().collect::<Vec<_>>(),
            vec![FALLBACK_SLICE_THICKNESS]
        );
    }

    #[test]
    fn local_min_thickness() {
        let t = slab(&[0.0, 2.0, 5.0]).local_min_thicknesses();
        let v: Vec<f64> = t.values().copied().collect();
        assert_fuzzy_eq!(v[0], 2.0);
        assert_fuzzy_eq!(v[1], 2.0);
        assert_fuzzy_eq!(v[2], 3.0);
    }

    #[test]
    fn nearest_slice_lookup() {
        let planes = slab(&[0.0, 2.0, 5.0]);
        assert_eq!(planes.nearest_slice(2.0).unwrap().0, SliceKey::from_z(2.0));
        assert_eq!(planes.nearest_slice(3.9).unwrap().0, SliceKey::from_z(5.0));
        assert_eq!(planes.nearest_slice(1.0).unwrap().0, SliceKey::from_z(0.0));
        assert_eq!(planes.nearest_slice(-40.0).unwrap().0, SliceKey::from_z(0.0));
        assert!(SetsOfPlanes::new().nearest_slice(0.0).is_none());
    }

    #[test]
    fn structure_kind_from_roi_type() {
        assert_eq!(StructureKind::from_roi_type("PTV"), StructureKind::Target);
        assert_eq!(StructureKind::from_roi_type("ptv_high"), StructureKind::Target);
        assert_eq!(StructureKind::from_roi_type("ORGAN"), StructureKind::OrganAtRisk);
        assert_eq!(StructureKind::from_roi_type("BOLUS"), StructureKind::Other);
    }
}
