//! Operations between structures: union, overlap volume and centroid distance.
use crate::{
    error::GeometryError,
    metrics::Point3,
    planes::{SetsOfPlanes, SliceKey, Structure, StructureKind},
    polygon::Region,
};
use std::collections::BTreeMap;

/// Name given to the union of all targets.
pub const TREATMENT_VOLUME_NAME: &str = "Treatment Volume";

/// Slice by slice union. Slices found in only one input pass through unchanged.
pub fn union<'a, I>(inputs: I) -> Result<SetsOfPlanes, GeometryError>
where
    I: IntoIterator<Item = &'a SetsOfPlanes>,
{
    let mut merged: BTreeMap<SliceKey, Region> = BTreeMap::new();
    for planes in inputs {
        for (key, region) in planes.iter() {
            let combined = match merged.remove(&key) {
                Some(existing) => existing.union(region)?,
                None => region.clone(),
            };
            merged.insert(key, combined);
        }
    }
    Ok(SetsOfPlanes::from_regions(merged))
}

/// Union of every [StructureKind::Target] structure. `None` when there are no targets.
pub fn treatment_volume(structures: &[Structure]) -> Result<Option<Structure>, GeometryError> {
    let targets: Vec<&Structure> = structures
        .iter()
        .filter(|s| s.kind() == StructureKind::Target)
        .collect();
    if targets.is_empty() {
        return Ok(None);
    }
    let planes = union(targets.iter().map(|s| s.planes()))?;
    let provenance = targets
        .iter()
        .map(|s| s.name())
        .collect::<Vec<_>>()
        .join(", ");
    Ok(Some(Structure::new(
        TREATMENT_VOLUME_NAME,
        StructureKind::Target,
        provenance,
        planes,
    )))
}

/// Volume shared by two structures, cm³.
///
/// Only slices present in both are considered. Each slice counts with the smaller of the two
/// structures' slice thicknesses.
pub fn overlap_volume(a: &SetsOfPlanes, b: &SetsOfPlanes) -> Result<f64, GeometryError> {
    let a_thickness = a.slice_thicknesses();
    let b_thickness = b.slice_thicknesses();
    let mut mm3 = 0.0;
    for (key, region_a) in a.iter() {
        let Some(region_b) = b.get(key) else {
            continue;
        };
        let thickness = a_thickness[&key].min(b_thickness[&key]);
        mm3 += region_a.intersection(region_b)?.area() * thickness;
    }
    Ok(mm3 / 1000.0)
}

/// Distance between two centroids given in mm, cm.
pub fn centroid_distance(a: &Point3, b: &Point3) -> f64 {
    a.distance_to(b) / 10.0
}
