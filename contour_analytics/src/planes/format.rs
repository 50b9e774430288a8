//! Canonical contour text used for persisted structures.
//!
//! Records are separated by `:` and each record is `z,x1,y1,x2,y2,...`. Coordinates are written
//! in shortest round trip form, with a trailing `.0` for integral values, after rounding z to
//! 2 decimals and x/y to 3 decimals.
use super::{SetsOfPlanes, SliceKey};
use crate::{
    error::{ContourParseError, GeometryError},
    polygon::Ring,
};
use std::{fmt, str::FromStr};

const Z_DECIMALS: usize = 2;
const XY_DECIMALS: usize = 3;

/// One contour loop as persisted.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ContourRecord {
    pub z: f64,
    pub points: Vec<(f64, f64)>,
}

/// Ordered contour records, kept apart from [SetsOfPlanes] so that text survives a parse and
/// serialize cycle unchanged.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ContourRecords {
    records: Vec<ContourRecord>,
}

impl ContourRecords {
    pub fn new(records: Vec<ContourRecord>) -> Self {
        ContourRecords { records }
    }

    /// Parse canonical contour text.
    ///
    /// # Examples
    ///
    /// ```
    /// # use contour_analytics::planes::format::ContourRecords;
    /// let text = "-12.5,3.0,4.125,5.0,4.125,5.0,6.0:-10.0,0.0,0.0,1.0,0.0,1.0,1.0";
    /// let records = ContourRecords::parse(text).unwrap();
    /// assert_eq!(records.len(), 2);
    /// assert_eq!(records.to_string(), text);
    /// ```
    pub fn parse(text: &str) -> Result<Self, ContourParseError> {
        let mut records = Vec::new();
        for (index, record) in text.split(':').enumerate() {
            if record.trim().is_empty() {
                return Err(ContourParseError::EmptyRecord { record: index });
            }
            let values = record
                .split(',')
                .map(|token| {
                    token
                        .trim()
                        .parse::<f64>()
                        .map_err(|_| ContourParseError::InvalidNumber {
                            record: index,
                            token: token.to_string(),
                        })
                })
                .collect::<Result<Vec<f64>, _>>()?;

            let (z, coords) = values
                .split_first()
                .ok_or(ContourParseError::EmptyRecord { record: index })?;
            if !z.is_finite() {
                return Err(ContourParseError::NonFiniteZ {
                    record: index,
                    z: *z,
                });
            }
            if coords.len() % 2 != 0 {
                return Err(ContourParseError::UnpairedCoordinates {
                    record: index,
                    value_count: values.len(),
                });
            }
            records.push(ContourRecord {
                z: *z,
                points: coords.chunks_exact(2).map(|c| (c[0], c[1])).collect(),
            });
        }
        Ok(ContourRecords { records })
    }

    /// Records for every ring of every slice.
    ///
    /// Per slice, filled rings are written largest first, each followed by its holes, so that
    /// composing the records again reproduces the same region.
    pub fn from_planes(planes: &SetsOfPlanes) -> Self {
        let mut records = Vec::new();
        for (key, region) in planes.iter() {
            let mut components = region.components();
            components.sort_by(|a, b| {
                b.area()
                    .partial_cmp(&a.area())
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            for component in &components {
                for ring in component.rings() {
                    records.push(ContourRecord {
                        z: key.z(),
                        points: ring.points().iter().map(|p| (p.x, p.y)).collect(),
                    });
                }
            }
        }
        ContourRecords { records }
    }

    #[inline]
    pub fn records(&self) -> &[ContourRecord] {
        &self.records
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Compose the records into slices.
    pub fn to_planes(&self) -> Result<SetsOfPlanes, GeometryError> {
        SetsOfPlanes::from_contours(
            self.records
                .iter()
                .map(|r| (r.z, Ring::from_xy(r.points.iter().copied()))),
        )
    }

    /// Every point as `(x, y, z)`, with z exactly as recorded.
    pub fn points_3d(&self) -> Vec<[f64; 3]> {
        self.records
            .iter()
            .flat_map(|r| r.points.iter().map(move |&(x, y)| [x, y, r.z]))
            .collect()
    }

    /// Slice keys in record order, duplicates included.
    pub fn slice_keys(&self) -> impl Iterator<Item = SliceKey> + '_ {
        self.records.iter().map(|r| SliceKey::from_z(r.z))
    }
}

impl FromStr for ContourRecords {
    type Err = ContourParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ContourRecords::parse(s)
    }
}

impl fmt::Display for ContourRecords {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, record) in self.records.iter().enumerate() {
            if i > 0 {
                f.write_str(":")?;
            }
            f.write_str(&format_rounded(record.z, Z_DECIMALS))?;
            for &(x, y) in &record.points {
                write!(
                    f,
                    ",{},{}",
                    format_rounded(x, XY_DECIMALS),
                    format_rounded(y, XY_DECIMALS)
                )?;
            }
        }
        Ok(())
    }
}

/// Round to `decimals` and print in shortest round trip form, e.g. `3.0`, `-0.125`.
///
/// Rounding works on the exact binary value with ties to even, so `-129.8125` becomes
/// `-129.812` and `109.9395` (stored just below the tie) becomes `109.939`.
fn format_rounded(value: f64, decimals: usize) -> String {
    if !value.is_finite() {
        return format!("{value}");
    }
    let rounded = format!("{value:.decimals$}")
        .parse::<f64>()
        .unwrap_or(value);
    let mut s = format!("{rounded}");
    if !s.contains('.') {
        s.push_str(".0");
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_fuzzy_eq;
    use crate::core::traits::FuzzyEq;

    #[test]
    fn format_matches_canonical_form() {
        assert_eq!(format_rounded(3.0, 3), "3.0");
        assert_eq!(format_rounded(-12.5, 2), "-12.5");
        assert_eq!(format_rounded(4.1254, 3), "4.125");
        assert_eq!(format_rounded(0.1 + 0.2, 3), "0.3");
        assert_eq!(format_rounded(-0.0001, 3), "-0.0");
        assert_eq!(format_rounded(120.0, 2), "120.0");
    }

    #[test]
    fn halfway_values_round_to_even() {
        assert_eq!(format_rounded(-129.8125, 3), "-129.812");
        assert_eq!(format_rounded(257.5485, 3), "257.548");
        assert_eq!(format_rounded(109.9395, 3), "109.939");
        assert_eq!(format_rounded(0.0625, 3), "0.062");
        assert_eq!(format_rounded(-0.0005, 3), "-0.001");
        assert_eq!(format_rounded(1.0005, 3), "1.0");
        assert_eq!(format_rounded(-12.125, 2), "-12.12");
        assert_eq!(format_rounded(2.675, 2), "2.67");
        assert_eq!(format_rounded(-0.375, 2), "-0.38");
    }

    #[test]
    fn serialized_records_match_stored_text() {
        let records = ContourRecords::new(vec![ContourRecord {
            z: -12.125,
            points: vec![(-129.8125, 257.5485), (109.9395, 0.0625), (1.0005, 2.0)],
        }]);
        assert_eq!(
            records.to_string(),
            "-12.12,-129.812,257.548,109.939,0.062,1.0,2.0"
        );
    }

    #[test]
    fn parse_then_serialize_is_byte_identical() {
        let text = "-12.5,3.0,4.125,10.0,4.125,10.0,9.875:-12.5,5.0,5.0,6.0,5.0,6.0,6.0:-10.0,-0.5,0.25,1.0,0.0,1.0,1.0";
        let records: ContourRecords = text.parse().unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records.records()[0].points[1], (10.0, 4.125));
        assert_eq!(records.to_string(), text);
    }

    #[test]
    fn parse_errors() {
        assert_eq!(
            ContourParseError::EmptyRecord { record: 0 },
            ContourRecords::parse("").unwrap_err()
        );
        assert!(matches!(
            ContourRecords::parse("1.0,2.0,abc,4.0"),
            Err(ContourParseError::InvalidNumber { record: 0, .. })
        ));
        assert!(matches!(
            ContourRecords::parse("1.0,0.0,0.0,1.0,0.0,1.0,1.0:2.0,1.0,2.0,3.0"),
            Err(ContourParseError::UnpairedCoordinates {
                record: 1,
                value_count: 4
            })
        ));
        assert!(matches!(
            ContourRecords::parse("1.0,0.0,0.0::2.0,1.0,1.0"),
            Err(ContourParseError::EmptyRecord { record: 1 })
        ));
    }

    #[test]
    fn non_finite_z_is_rejected() {
        assert!(matches!(
            ContourRecords::parse("nan,0.0,0.0,10.0,0.0,10.0,10.0"),
            Err(ContourParseError::NonFiniteZ { record: 0, .. })
        ));
        assert!(matches!(
            ContourRecords::parse("0.0,0.0,0.0,1.0,0.0,1.0,1.0:-inf,0.0,0.0,1.0,0.0,1.0,1.0"),
            Err(ContourParseError::NonFiniteZ { record: 1, .. })
        ));
    }

    #[test]
    fn non_finite_xy_parse_and_are_skipped_when_composed() {
        let text = "0.0,0.0,0.0,10.0,0.0,10.0,10.0,0.0,10.0:1.0,nan,0.0,10.0,0.0,10.0,10.0:2.0,0.0,0.0,inf,0.0,10.0,10.0";
        let records = ContourRecords::parse(text).unwrap();
        assert_eq!(records.len(), 3);
        let planes = records.to_planes().unwrap();
        assert_eq!(planes.keys().collect::<Vec<_>>(), vec![SliceKey::from_z(0.0)]);
    }

    #[test]
    fn planes_round_trip_is_geometrically_equivalent() {
        let text = "0.0,0.0,0.0,10.0,0.0,10.0,10.0,0.0,10.0:0.0,4.0,4.0,6.0,4.0,6.0,6.0,4.0,6.0:0.0,4.5,4.5,5.5,4.5,5.5,5.5,4.5,5.5:2.5,0.0,0.0,8.0,0.0,8.0,8.0,0.0,8.0";
        let planes = ContourRecords::parse(text).unwrap().to_planes().unwrap();
        let reparsed = ContourRecords::from_planes(&planes)
            .to_string()
            .parse::<ContourRecords>()
            .unwrap()
            .to_planes()
            .unwrap();

        assert_eq!(planes.len(), reparsed.len());
        for ((k1, r1), (k2, r2)) in planes.iter().zip(reparsed.iter()) {
            assert_eq!(k1, k2);
            assert_fuzzy_eq!(r1.area(), r2.area(), 1e-6);
            assert_eq!(r1.components().len(), r2.components().len());
        }
        assert_fuzzy_eq!(
            planes.get(SliceKey::from_z(0.0)).unwrap().area(),
            97.0,
            1e-6
        );
    }

    #[test]
    fn points_3d_keep_recorded_z() {
        let records = ContourRecords::parse("1.005,1.0,2.0,3.0,4.0").unwrap();
        assert_eq!(records.points_3d(), vec![[1.0, 2.0, 1.005], [3.0, 4.0, 1.005]]);
    }
}
