//! Aperture complexity of delivered beams.
//!
//! Every control point is turned into an aperture polygon and scored by the length of its edges
//! relative to its open area, weighted by the monitor units delivered through it.
mod shape;

pub use shape::{JawSetting, JawSource, ResolvedJaws, aperture};

use crate::{
    config::MlcAnalyzerOptions, core::math::Vector2, error::BeamError, stats::StatSummary,
};

/// Apertures below this area (mm²) are considered closed.
const CLOSED_APERTURE_AREA: f64 = 1e-5;
const MM_PER_CM: f64 = 10.0;
const MM2_PER_CM2: f64 = 100.0;

/// Direction the MLC leaves travel in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LeafAxis {
    #[default]
    Mlcx,
    Mlcy,
}

/// Leaf tip positions of both banks, one entry per leaf pair, mm.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LeafBanks {
    pub bank_a: Vec<f64>,
    pub bank_b: Vec<f64>,
}

/// One control point of a beam. Positions are in mm, angles in degrees.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ControlPoint {
    pub cumulative_weight: f64,
    pub leaves: Option<LeafBanks>,
    pub jaw_x: Option<(f64, f64)>,
    pub jaw_y: Option<(f64, f64)>,
    pub gantry_angle: Option<f64>,
    pub collimator_angle: Option<f64>,
    pub couch_angle: Option<f64>,
}

/// A beam as delivered: its monitor units and control point sequence.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Beam {
    pub name: String,
    pub monitor_units: f64,
    pub leaf_axis: LeafAxis,
    /// Leaf pair boundaries across the travel axis, one more than the number of leaf pairs.
    pub leaf_boundaries: Vec<f64>,
    pub control_points: Vec<ControlPoint>,
}

impl Beam {
    /// Check the beam can be analyzed.
    pub fn validate(&self) -> Result<(), BeamError> {
        let beam = || self.name.clone();
        let Some(last) = self.control_points.last() else {
            return Err(BeamError::NoControlPoints { beam: beam() });
        };
        if self.monitor_units.is_nan() || self.monitor_units <= 0.0 {
            return Err(BeamError::ZeroMonitorUnits { beam: beam() });
        }
        if last.cumulative_weight.is_nan() || last.cumulative_weight <= 0.0 {
            return Err(BeamError::ZeroFinalWeight { beam: beam() });
        }

        let expected = self.leaf_boundaries.len().saturating_sub(1);
        for (i, point) in self.control_points.iter().enumerate() {
            let Some(leaves) = &point.leaves else {
                continue;
            };
            for found in [leaves.bank_a.len(), leaves.bank_b.len()] {
                if found != expected {
                    return Err(BeamError::LeafCountMismatch {
                        beam: beam(),
                        control_point: i,
                        expected,
                        found,
                    });
                }
            }
        }
        Ok(())
    }
}

/// Complexity score of one aperture: weighted edge length times MU over open area.
///
/// Zero for a point delivering no MU. `None` when MU is delivered through a closed aperture.
pub fn complexity_score(
    path_lengths: Vector2,
    area: f64,
    mu: f64,
    options: &MlcAnalyzerOptions,
) -> Option<f64> {
    if mu == 0.0 {
        return Some(0.0);
    }
    if area <= CLOSED_APERTURE_AREA {
        return None;
    }
    let weighted =
        options.complexity_weight_x * path_lengths.x + options.complexity_weight_y * path_lengths.y;
    Some(weighted * mu / area)
}

/// Per control point results. Lengths in cm, areas in cm².
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ControlPointSummary {
    /// 1 based position in the beam.
    pub index: usize,
    pub cumulative_weight: f64,
    pub cumulative_mu: f64,
    pub mu: f64,
    pub gantry_angle: Option<f64>,
    pub collimator_angle: Option<f64>,
    pub couch_angle: Option<f64>,
    pub jaws: ResolvedJaws,
    pub area: f64,
    pub x_perimeter: f64,
    pub y_perimeter: f64,
    pub perimeter: f64,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BeamStatistics {
    pub area: StatSummary,
    pub x_perimeter: StatSummary,
    pub y_perimeter: StatSummary,
    pub score: StatSummary,
    pub mu: StatSummary,
}

impl BeamStatistics {
    fn from_summaries(points: &[ControlPointSummary]) -> Option<Self> {
        let stat = |f: fn(&ControlPointSummary) -> f64| {
            StatSummary::from_values(&points.iter().map(f).collect::<Vec<_>>())
        };
        Some(BeamStatistics {
            area: stat(|p| p.area)?,
            x_perimeter: stat(|p| p.x_perimeter)?,
            y_perimeter: stat(|p| p.y_perimeter)?,
            score: stat(|p| p.score)?,
            mu: stat(|p| p.mu)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BeamMetrics {
    pub name: String,
    pub monitor_units: f64,
    /// Sum of control point scores divided by the beam MU.
    pub complexity: f64,
    pub control_points: Vec<ControlPointSummary>,
    /// `None` when every control point was left out.
    pub statistics: Option<BeamStatistics>,
}

#[derive(Debug, Clone, Copy, Default)]
struct Angles {
    gantry: Option<f64>,
    collimator: Option<f64>,
    couch: Option<f64>,
}

impl Angles {
    /// Angles in effect at `point`, keeping the previous value for any that are absent.
    fn advance(&mut self, point: &ControlPoint) -> Angles {
        self.gantry = point.gantry_angle.or(self.gantry);
        self.collimator = point.collimator_angle.or(self.collimator);
        self.couch = point.couch_angle.or(self.couch);
        *self
    }
}

/// Analyze every control point of `beam`.
///
/// Control point MU is the forward difference of the cumulative weights, normalized by the
/// final weight and scaled by the beam MU. The last point delivers nothing.
pub fn analyze_beam(beam: &Beam, options: &MlcAnalyzerOptions) -> Result<BeamMetrics, BeamError> {
    beam.validate()?;
    let points = &beam.control_points;
    let first = &points[0];
    let final_weight = points[points.len() - 1].cumulative_weight;
    let mu_per_weight = beam.monitor_units / final_weight;

    let mut angles = Angles::default();
    let mut score_sum = 0.0;
    let mut summaries = Vec::with_capacity(points.len());
    for (i, point) in points.iter().enumerate() {
        let current = angles.advance(point);
        let mu = points
            .get(i + 1)
            .map_or(0.0, |next| (next.cumulative_weight - point.cumulative_weight) * mu_per_weight);

        let jaws = ResolvedJaws::resolve(point, first, options);
        let region = aperture(point, beam.leaf_axis, &beam.leaf_boundaries, &jaws)?;
        let area = region.area();
        let paths = region.outer_path_lengths();
        let score = complexity_score(paths, area, mu, options).unwrap_or_else(|| {
            log::warn!(
                "beam '{}' control point {}: {mu} MU through a closed aperture, scored 0",
                beam.name,
                i + 1
            );
            0.0
        });
        score_sum += score;

        if options.ignore_zero_mu_control_points && mu == 0.0 {
            continue;
        }
        summaries.push(ControlPointSummary {
            index: i + 1,
            cumulative_weight: point.cumulative_weight,
            cumulative_mu: point.cumulative_weight * mu_per_weight,
            mu,
            gantry_angle: current.gantry,
            collimator_angle: current.collimator,
            couch_angle: current.couch,
            jaws: jaws_in_cm(jaws),
            area: area / MM2_PER_CM2,
            x_perimeter: paths.x / MM_PER_CM,
            y_perimeter: paths.y / MM_PER_CM,
            perimeter: (paths.x + paths.y) / MM_PER_CM,
            score,
        });
    }

    Ok(BeamMetrics {
        name: beam.name.clone(),
        monitor_units: beam.monitor_units,
        complexity: score_sum / beam.monitor_units,
        statistics: BeamStatistics::from_summaries(&summaries),
        control_points: summaries,
    })
}

fn jaws_in_cm(jaws: ResolvedJaws) -> ResolvedJaws {
    let cm = |j: JawSetting| JawSetting {
        min: j.min / MM_PER_CM,
        max: j.max / MM_PER_CM,
        source: j.source,
    };
    ResolvedJaws {
        x: cm(jaws.x),
        y: cm(jaws.y),
    }
}

/// MU weighted mean of the beam complexities. `None` without beams.
pub fn plan_complexity<'a, I>(beams: I) -> Option<f64>
where
    I: IntoIterator<Item = &'a BeamMetrics>,
{
    let (weighted, mu) = beams.into_iter().fold((0.0, 0.0), |(w, m), b| {
        (w + b.complexity * b.monitor_units, m + b.monitor_units)
    });
    if mu > 0.0 { Some(weighted / mu) } else { None }
}
