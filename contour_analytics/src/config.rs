//! Analysis configuration, loaded once per session and passed explicitly.

/// Settings for the aperture complexity analyzer.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MlcAnalyzerOptions {
    /// Field size used when no jaw positions are available, mm.
    pub max_field_size_x: f64,
    pub max_field_size_y: f64,
    /// Weight of the x edge path length in the complexity score.
    pub complexity_weight_x: f64,
    /// Weight of the y edge path length in the complexity score.
    pub complexity_weight_y: f64,
    /// Leave control points that deliver no MU out of the statistics.
    pub ignore_zero_mu_control_points: bool,
}

impl Default for MlcAnalyzerOptions {
    fn default() -> Self {
        MlcAnalyzerOptions {
            max_field_size_x: 400.0,
            max_field_size_y: 400.0,
            complexity_weight_x: 1.0,
            complexity_weight_y: 1.0,
            ignore_zero_mu_control_points: true,
        }
    }
}

/// Settings for structure to target distance calculations.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DistanceOptions {
    /// Point clouds are thinned until they have at most this many points.
    pub max_point_count: usize,
    /// Point count to retry with when the pair count exceeds the limit.
    pub fallback_point_count: usize,
    /// Fraction of points removed per thinning pass.
    pub iterative_reduction: f64,
    /// Largest number of point pairs a single calculation may evaluate.
    pub max_pairwise_evaluations: usize,
}

impl Default for DistanceOptions {
    fn default() -> Self {
        DistanceOptions {
            max_point_count: 5000,
            fallback_point_count: 3000,
            iterative_reduction: 0.1,
            max_pairwise_evaluations: 25_000_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AnalysisConfig {
    pub mlc: MlcAnalyzerOptions,
    pub distance: DistanceOptions,
    /// Prefix for ranked target labels, e.g. `Target-1`.
    pub target_label_prefix: String,
    /// Structure names (case insensitive) left out of overlap and distance work.
    pub excluded_structure_names: Vec<String>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            mlc: MlcAnalyzerOptions::default(),
            distance: DistanceOptions::default(),
            target_label_prefix: "Target-".to_string(),
            excluded_structure_names: ["external", "skin", "body"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl AnalysisConfig {
    /// Returns `true` if `name` is excluded from overlap and distance work.
    pub fn is_excluded(&self, name: &str) -> bool {
        let name = name.trim();
        self.excluded_structure_names
            .iter()
            .any(|n| n.eq_ignore_ascii_case(name))
    }
}
