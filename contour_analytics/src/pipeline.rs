//! Whole study analysis: structure geometry, relations to the treatment volume, beam complexity
//! and target ranking.
//!
//! Failures are contained to the calculation they belong to. A structure whose metric cannot be
//! evaluated reports `None` for it, a beam with structural faults reports its error, and every
//! other result is still produced.
use crate::{
    aperture::{Beam, BeamMetrics, analyze_beam, plan_complexity},
    config::AnalysisConfig,
    distance::{self, DistanceSummary},
    metrics::{StructureMetrics, recover},
    ops,
    planes::{Structure, StructureKind},
    ranking::{TargetDvh, TargetRank, rank_targets},
};

/// Inputs of one study. Structures are already composed, see [Structure::from_contour_text].
#[derive(Debug, Clone, Default)]
pub struct Study {
    pub structures: Vec<Structure>,
    /// Structures that could not be loaded. Passed through to the report.
    pub failed_structures: Vec<StructureFailure>,
    pub beams: Vec<Beam>,
    pub target_dvhs: Vec<TargetDvh>,
}

/// Structure left out of the analysis, e.g. because its contour text did not parse.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StructureFailure {
    pub name: String,
    pub reason: String,
}

/// Geometric relation of a structure to the treatment volume.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TargetRelation {
    pub name: String,
    /// cm³
    pub overlap_volume: Option<f64>,
    /// cm
    pub centroid_distance: Option<f64>,
    pub distances: Option<DistanceSummary>,
}

/// Outcome of one beam.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BeamOutcome {
    Analyzed(BeamMetrics),
    Failed { name: String, reason: String },
}

impl BeamOutcome {
    pub fn metrics(&self) -> Option<&BeamMetrics> {
        match self {
            BeamOutcome::Analyzed(m) => Some(m),
            BeamOutcome::Failed { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StudyReport {
    pub structures: Vec<StructureMetrics>,
    pub failed_structures: Vec<StructureFailure>,
    /// Union of all targets, `None` without targets.
    pub treatment_volume: Option<StructureMetrics>,
    /// One entry per non target structure that is not excluded by name.
    pub relations: Vec<TargetRelation>,
    pub beams: Vec<BeamOutcome>,
    pub plan_complexity: Option<f64>,
    pub target_ranks: Vec<TargetRank>,
}

#[cfg(feature = "rayon")]
fn map_all<I, O, F>(items: &[I], f: F) -> Vec<O>
where
    I: Sync,
    O: Send,
    F: Fn(&I) -> O + Sync + Send,
{
    use rayon::prelude::*;
    items.par_iter().map(f).collect()
}

#[cfg(not(feature = "rayon"))]
fn map_all<I, O, F>(items: &[I], f: F) -> Vec<O>
where
    F: Fn(&I) -> O,
{
    items.iter().map(f).collect()
}

/// Analyze every structure and beam of `study`.
pub fn analyze_study(study: &Study, config: &AnalysisConfig) -> StudyReport {
    let structures = map_all(&study.structures, StructureMetrics::compute);

    // the union completes before any relation work starts
    let treatment_volume = recover(
        ops::TREATMENT_VOLUME_NAME,
        "union",
        ops::treatment_volume(&study.structures),
    )
    .flatten();
    let tv_metrics = treatment_volume.as_ref().map(StructureMetrics::compute);

    let relations = match (&treatment_volume, &tv_metrics) {
        (Some(tv), Some(tv_metrics)) => {
            let candidates: Vec<(&Structure, &StructureMetrics)> = study
                .structures
                .iter()
                .zip(&structures)
                .filter(|(s, _)| s.kind() != StructureKind::Target && !config.is_excluded(s.name()))
                .collect();
            map_all(&candidates, |&(s, m)| relate(s, m, tv, tv_metrics, config))
        }
        _ => Vec::new(),
    };

    let beams = map_all(&study.beams, |beam| match analyze_beam(beam, &config.mlc) {
        Ok(m) => BeamOutcome::Analyzed(m),
        Err(e) => {
            log::warn!("{e}");
            BeamOutcome::Failed {
                name: beam.name.clone(),
                reason: e.to_string(),
            }
        }
    });
    let plan_complexity = plan_complexity(beams.iter().filter_map(BeamOutcome::metrics));

    StudyReport {
        structures,
        failed_structures: study.failed_structures.clone(),
        treatment_volume: tv_metrics,
        relations,
        beams,
        plan_complexity,
        target_ranks: rank_targets(&study.target_dvhs, &config.target_label_prefix),
    }
}

fn relate(
    structure: &Structure,
    metrics: &StructureMetrics,
    tv: &Structure,
    tv_metrics: &StructureMetrics,
    config: &AnalysisConfig,
) -> TargetRelation {
    let name = structure.name();
    let overlap_volume = recover(
        name,
        "overlap volume",
        ops::overlap_volume(structure.planes(), tv.planes()),
    );
    let centroid_distance = metrics
        .centroid
        .zip(tv_metrics.centroid)
        .map(|(a, b)| ops::centroid_distance(&a, &b));
    let distances = match distance::measure(structure.planes(), tv.planes(), &config.distance) {
        Ok(summary) => Some(summary),
        Err(e) => {
            log::warn!("{name}: distance to {} not calculated: {e}", tv.name());
            None
        }
    };
    TargetRelation {
        name: name.to_string(),
        overlap_volume,
        centroid_distance,
        distances,
    }
}
