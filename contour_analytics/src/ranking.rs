//! Ordering of multiple targets by the dose covering 95% of their volume.

/// Fraction of the target volume the ranking dose must cover.
const COVERAGE_FRACTION: f64 = 0.95;

/// Cumulative dose volume histogram of a target.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TargetDvh {
    pub name: String,
    /// Target volume, cm³.
    pub volume: f64,
    /// Volume (cm³) receiving at least the dose of each 1 cGy bin.
    pub cumulative_volume: Vec<f64>,
}

impl TargetDvh {
    /// Dose bin (cGy) of the first bin whose cumulative volume is below 95% of the target
    /// volume. The last bin when coverage never drops, `None` for an empty histogram.
    ///
    /// No interpolation between bins, which is enough to order targets.
    pub fn d95(&self) -> Option<usize> {
        let threshold = self.volume * COVERAGE_FRACTION;
        self.cumulative_volume
            .iter()
            .position(|&v| v < threshold)
            .or_else(|| self.cumulative_volume.len().checked_sub(1))
    }
}

/// Ranked target with its new label.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TargetRank {
    pub name: String,
    /// 1 for the lowest D95.
    pub rank: usize,
    pub label: String,
    pub d95: Option<usize>,
}

/// Rank targets by ascending D95, ties keeping input order. Targets without a histogram rank
/// last. Results are returned in input order.
pub fn rank_targets(targets: &[TargetDvh], label_prefix: &str) -> Vec<TargetRank> {
    let mut order: Vec<(usize, Option<usize>)> =
        targets.iter().map(|t| t.d95()).enumerate().collect();
    // stable sort keeps input order among equal doses
    order.sort_by_key(|&(_, d95)| (d95.is_none(), d95));

    let mut ranks = vec![0; targets.len()];
    for (position, &(i, _)) in order.iter().enumerate() {
        ranks[i] = position + 1;
    }

    targets
        .iter()
        .zip(ranks)
        .map(|(target, rank)| TargetRank {
            name: target.name.clone(),
            rank,
            label: format!("{label_prefix}{rank}"),
            d95: target.d95(),
        })
        .collect()
}
