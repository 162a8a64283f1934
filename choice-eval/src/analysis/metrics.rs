//! Rate metrics and overall projections over a [`HierarchyState`]

use serde::{Deserialize, Serialize};

use super::hierarchy::{CategoryStats, Counts, HierarchyState};
use crate::records::{Difficulty, Level, Mode};

/// The six reported metrics, in sheet order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Metric {
    Accuracy,
    ErrorRate,
    MissRate,
    Hard,
    Middle,
    Easy,
}

impl Metric {
    pub fn all() -> [Metric; 6] {
        [
            Metric::Accuracy,
            Metric::ErrorRate,
            Metric::MissRate,
            Metric::Hard,
            Metric::Middle,
            Metric::Easy,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Metric::Accuracy => "Accuracy",
            Metric::ErrorRate => "Error Rate",
            Metric::MissRate => "Miss Rate",
            Metric::Hard => "Hard",
            Metric::Middle => "Middle",
            Metric::Easy => "Easy",
        }
    }

    /// Difficulty tier for the per-tier accuracy metrics
    pub fn tier(&self) -> Option<Difficulty> {
        match self {
            Metric::Hard => Some(Difficulty::Hard),
            Metric::Middle => Some(Difficulty::Middle),
            Metric::Easy => Some(Difficulty::Easy),
            _ => None,
        }
    }

    /// Numerator and denominator of this metric over `counts`
    pub fn fraction(&self, counts: &Counts) -> (u64, u64) {
        match self {
            Metric::Accuracy => (counts.correct, counts.total),
            Metric::ErrorRate => (counts.error, counts.total),
            Metric::MissRate => (counts.miss, counts.total),
            Metric::Hard | Metric::Middle | Metric::Easy => {
                let tier = self
                    .tier()
                    .map(|d| *counts.difficulty.tier(d))
                    .unwrap_or_default();
                (tier.correct, tier.total)
            }
        }
    }

    /// Rate in `[0, 1]`; zero when nothing was counted
    pub fn value(&self, counts: &Counts) -> f64 {
        let (numerator, denominator) = self.fraction(counts);
        rate(numerator, denominator)
    }

    /// Whether `counts` contributes to a category-wise mean of this metric
    pub fn participates(&self, counts: &Counts) -> bool {
        self.fraction(counts).1 > 0
    }

    /// Overall policies reported for this metric.
    ///
    /// Error and miss rates are only meaningful sample-wise.
    pub fn policies(&self) -> Vec<OverallPolicy> {
        match self {
            Metric::ErrorRate | Metric::MissRate => vec![OverallPolicy::SampleWise],
            _ => vec![
                OverallPolicy::SampleWise,
                OverallPolicy::CategoryWise(Level::Subfield),
                OverallPolicy::CategoryWise(Level::Field),
                OverallPolicy::CategoryWise(Level::Discipline),
            ],
        }
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// How an overall figure is derived from the hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OverallPolicy {
    /// Sum raw counts over every sample, then divide
    SampleWise,
    /// Unweighted mean of each category's own rate at a level
    CategoryWise(Level),
}

/// Which counts of a node a projection reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View<'a> {
    /// All runs combined
    Combined,
    /// A single (model, mode) snapshot
    Run { model: &'a str, mode: Mode },
}

impl View<'_> {
    pub fn counts<'s>(&self, stats: &'s CategoryStats) -> Option<&'s Counts> {
        match self {
            View::Combined => Some(&stats.counts),
            View::Run { model, mode } => stats.run(model, *mode),
        }
    }
}

/// `numerator / denominator`, or 0 when the denominator is 0
pub fn rate(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Overall value of `metric` under `policy`.
///
/// Returns `None` for combinations that are not reported (category-wise error
/// and miss rates).
pub fn overall(state: &HierarchyState, metric: Metric, policy: OverallPolicy, view: View<'_>) -> Option<f64> {
    if !metric.policies().contains(&policy) {
        return None;
    }

    match policy {
        OverallPolicy::SampleWise => {
            let totals = sample_totals(state, view);
            Some(metric.value(&totals))
        }
        OverallPolicy::CategoryWise(level) => {
            let values: Vec<f64> = state
                .level(level)
                .values()
                .filter_map(|stats| view.counts(stats))
                .filter(|counts| metric.participates(counts))
                .map(|counts| metric.value(counts))
                .collect();

            if values.is_empty() {
                Some(0.0)
            } else {
                Some(values.iter().sum::<f64>() / values.len() as f64)
            }
        }
    }
}

/// Size of the population behind an overall figure: samples (tier samples for
/// tier metrics) for sample-wise, participating categories for category-wise
pub fn participants(state: &HierarchyState, metric: Metric, policy: OverallPolicy, view: View<'_>) -> u64 {
    match policy {
        OverallPolicy::SampleWise => metric.fraction(&sample_totals(state, view)).1,
        OverallPolicy::CategoryWise(level) => state
            .level(level)
            .values()
            .filter_map(|stats| view.counts(stats))
            .filter(|counts| metric.participates(counts))
            .count() as u64,
    }
}

fn sample_totals(state: &HierarchyState, view: View<'_>) -> Counts {
    match view {
        View::Combined => state.totals(),
        View::Run { model, mode } => state.run_totals(model, mode),
    }
}

/// Headline rates of one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HeadlineResults {
    pub accuracy: f64,
    pub error_rate: f64,
    pub miss_rate: f64,
    pub accuracy_hard: f64,
    pub accuracy_middle: f64,
    pub accuracy_easy: f64,
}

impl HeadlineResults {
    pub fn from_counts(counts: &Counts) -> Self {
        Self {
            accuracy: Metric::Accuracy.value(counts),
            error_rate: Metric::ErrorRate.value(counts),
            miss_rate: Metric::MissRate.value(counts),
            accuracy_hard: Metric::Hard.value(counts),
            accuracy_middle: Metric::Middle.value(counts),
            accuracy_easy: Metric::Easy.value(counts),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::Taxonomy;
    use crate::scoring::Outcome;

    /// One large subfield at 90% and one small subfield at 0%
    fn skewed() -> HierarchyState {
        let mut state = HierarchyState::new();
        let big = Taxonomy::new("Science", "Physics", "Optics");
        let small = Taxonomy::new("Science", "Physics", "Acoustics");
        for i in 0..10 {
            let outcome = if i < 9 { Outcome::Correct } else { Outcome::Incorrect };
            state.fold(&big, outcome, Difficulty::Hard);
        }
        state.fold(&small, Outcome::Miss, Difficulty::Easy);
        state.fold(&small, Outcome::Error, Difficulty::Easy);
        state
    }

    #[test]
    fn test_rates_and_zero_denominator() {
        assert_eq!(rate(1, 4), 0.25);
        assert_eq!(rate(3, 0), 0.0);
        assert_eq!(Metric::Middle.value(&Counts::default()), 0.0);
    }

    #[test]
    fn test_sample_wise_differs_from_category_wise() {
        let state = skewed();
        let sample = overall(&state, Metric::Accuracy, OverallPolicy::SampleWise, View::Combined).unwrap();
        let per_subfield =
            overall(&state, Metric::Accuracy, OverallPolicy::CategoryWise(Level::Subfield), View::Combined).unwrap();

        assert!((sample - 0.75).abs() < 1e-9);
        assert!((per_subfield - 0.45).abs() < 1e-9);
        assert_eq!(
            participants(&state, Metric::Accuracy, OverallPolicy::CategoryWise(Level::Subfield), View::Combined),
            2
        );
    }

    #[test]
    fn test_error_and_miss_are_sample_wise_only() {
        let state = skewed();
        let subfield_wise = OverallPolicy::CategoryWise(Level::Subfield);

        assert_eq!(overall(&state, Metric::ErrorRate, subfield_wise, View::Combined), None);
        assert_eq!(overall(&state, Metric::MissRate, subfield_wise, View::Combined), None);

        let miss = overall(&state, Metric::MissRate, OverallPolicy::SampleWise, View::Combined).unwrap();
        assert!((miss - 1.0 / 12.0).abs() < 1e-9);
    }

    #[test]
    fn test_tier_category_mean_skips_empty_tiers() {
        let state = skewed();
        let hard = overall(&state, Metric::Hard, OverallPolicy::CategoryWise(Level::Subfield), View::Combined).unwrap();
        assert!((hard - 0.9).abs() < 1e-9);
        assert_eq!(
            participants(&state, Metric::Hard, OverallPolicy::SampleWise, View::Combined),
            10
        );
    }

    #[test]
    fn test_run_view_reads_snapshots() {
        let mut global = HierarchyState::new();
        global.absorb_run("m1", Mode::ZeroShot, &skewed());

        let view = View::Run { model: "m1", mode: Mode::ZeroShot };
        let accuracy = overall(&global, Metric::Accuracy, OverallPolicy::SampleWise, view).unwrap();
        assert!((accuracy - 0.75).abs() < 1e-9);

        let missing = View::Run { model: "m2", mode: Mode::ZeroShot };
        assert_eq!(overall(&global, Metric::Accuracy, OverallPolicy::SampleWise, missing), Some(0.0));
    }

    #[test]
    fn test_headline_results() {
        let headline = HeadlineResults::from_counts(&skewed().totals());
        assert!((headline.accuracy - 0.75).abs() < 1e-9);
        assert!((headline.error_rate - 1.0 / 12.0).abs() < 1e-9);
        assert!((headline.accuracy_hard - 0.9).abs() < 1e-9);
        assert_eq!(headline.accuracy_easy, 0.0);
        assert_eq!(headline.accuracy_middle, 0.0);
    }
}
