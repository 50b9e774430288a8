//! Summary statistics over metric samples.

/// Minimum, mean, median and maximum of a sample.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatSummary {
    pub min: f64,
    pub mean: f64,
    pub median: f64,
    pub max: f64,
}

impl StatSummary {
    /// Summarize `values`. `None` for an empty sample.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let median = median(values)?;
        let (min, max) = values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
        Some(StatSummary {
            min,
            mean: values.iter().sum::<f64>() / values.len() as f64,
            median,
            max,
        })
    }

    /// Apply `f` to every statistic, e.g. a unit conversion.
    pub fn map(self, f: impl Fn(f64) -> f64) -> Self {
        StatSummary {
            min: f(self.min),
            mean: f(self.mean),
            median: f(self.median),
            max: f(self.max),
        }
    }
}

/// Median of `values`, averaging the two middle values of an even sample.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}
