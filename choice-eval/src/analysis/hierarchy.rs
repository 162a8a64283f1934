//! Hierarchical outcome aggregation
//!
//! A [`HierarchyState`] holds one [`CategoryStats`] node per discipline,
//! discipline/field and discipline/field/subfield key. Folding a sample touches
//! exactly one node per level, so every parent's counts equal the sum of its
//! children's. Merging sums counts pairwise and is commutative.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::records::{Difficulty, Level, Mode, Taxonomy};
use crate::scoring::Outcome;

/// Correct and total counts of one difficulty tier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierStats {
    pub correct: u64,
    pub total: u64,
}

impl TierStats {
    fn merge(&mut self, other: &TierStats) {
        self.correct += other.correct;
        self.total += other.total;
    }
}

/// Per-tier counts; `unknown` collects records without a recognised tier
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DifficultyBreakdown {
    pub easy: TierStats,
    pub middle: TierStats,
    pub hard: TierStats,
    pub unknown: TierStats,
}

impl DifficultyBreakdown {
    pub fn tier(&self, difficulty: Difficulty) -> &TierStats {
        match difficulty {
            Difficulty::Easy => &self.easy,
            Difficulty::Middle => &self.middle,
            Difficulty::Hard => &self.hard,
            Difficulty::Unknown => &self.unknown,
        }
    }

    fn tier_mut(&mut self, difficulty: Difficulty) -> &mut TierStats {
        match difficulty {
            Difficulty::Easy => &mut self.easy,
            Difficulty::Middle => &mut self.middle,
            Difficulty::Hard => &mut self.hard,
            Difficulty::Unknown => &mut self.unknown,
        }
    }

    /// Sum of all tier totals
    pub fn total(&self) -> u64 {
        self.easy.total + self.middle.total + self.hard.total + self.unknown.total
    }

    fn merge(&mut self, other: &DifficultyBreakdown) {
        self.easy.merge(&other.easy);
        self.middle.merge(&other.middle);
        self.hard.merge(&other.hard);
        self.unknown.merge(&other.unknown);
    }
}

/// Raw outcome counts of a set of samples.
///
/// `incorrect` is never stored; it is whatever remains of `total`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counts {
    pub total: u64,
    pub correct: u64,
    pub error: u64,
    pub miss: u64,
    pub difficulty: DifficultyBreakdown,
}

impl Counts {
    /// Count one sample
    pub fn record(&mut self, outcome: Outcome, difficulty: Difficulty) {
        self.total += 1;
        let tier = self.difficulty.tier_mut(difficulty);
        tier.total += 1;

        match outcome {
            Outcome::Correct => {
                self.correct += 1;
                tier.correct += 1;
            }
            Outcome::Error => self.error += 1,
            Outcome::Miss => self.miss += 1,
            Outcome::Incorrect => {}
        }
    }

    pub fn incorrect(&self) -> u64 {
        self.total - self.correct - self.error - self.miss
    }

    pub fn merge(&mut self, other: &Counts) {
        self.total += other.total;
        self.correct += other.correct;
        self.error += other.error;
        self.miss += other.miss;
        self.difficulty.merge(&other.difficulty);
    }
}

/// Statistics of one taxonomy node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryStats {
    pub discipline: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subfield: Option<String>,
    #[serde(flatten)]
    pub counts: Counts,
    /// Per-run snapshots, filled in by [`HierarchyState::absorb_run`]
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub models: BTreeMap<String, BTreeMap<Mode, Counts>>,
}

impl CategoryStats {
    fn new(taxonomy: &Taxonomy, level: Level) -> Self {
        let (field, subfield) = match level {
            Level::Discipline => (None, None),
            Level::Field => (Some(taxonomy.field.clone()), None),
            Level::Subfield => (Some(taxonomy.field.clone()), Some(taxonomy.subfield.clone())),
        };

        Self {
            discipline: taxonomy.discipline.clone(),
            field,
            subfield,
            counts: Counts::default(),
            models: BTreeMap::new(),
        }
    }

    /// Label of this node at its own level
    pub fn name(&self) -> &str {
        self.subfield
            .as_deref()
            .or(self.field.as_deref())
            .unwrap_or(&self.discipline)
    }

    /// Snapshot of one (model, mode) run, if that run touched this node
    pub fn run(&self, model: &str, mode: Mode) -> Option<&Counts> {
        self.models.get(model).and_then(|modes| modes.get(&mode))
    }

    fn merge(&mut self, other: &CategoryStats) {
        self.counts.merge(&other.counts);
        for (model, modes) in &other.models {
            let target = self.models.entry(model.clone()).or_default();
            for (mode, counts) in modes {
                target.entry(*mode).or_default().merge(counts);
            }
        }
    }
}

/// Three-level aggregation of classified samples
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HierarchyState {
    pub disciplines: BTreeMap<String, CategoryStats>,
    pub fields: BTreeMap<String, CategoryStats>,
    pub subfields: BTreeMap<String, CategoryStats>,
}

impl HierarchyState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.disciplines.is_empty()
    }

    /// Nodes of one level, keyed by their taxonomy path
    pub fn level(&self, level: Level) -> &BTreeMap<String, CategoryStats> {
        match level {
            Level::Discipline => &self.disciplines,
            Level::Field => &self.fields,
            Level::Subfield => &self.subfields,
        }
    }

    fn level_mut(&mut self, level: Level) -> &mut BTreeMap<String, CategoryStats> {
        match level {
            Level::Discipline => &mut self.disciplines,
            Level::Field => &mut self.fields,
            Level::Subfield => &mut self.subfields,
        }
    }

    /// Count one sample at every level
    pub fn fold(&mut self, taxonomy: &Taxonomy, outcome: Outcome, difficulty: Difficulty) {
        for level in Level::all() {
            self.level_mut(level)
                .entry(taxonomy.key(level))
                .or_insert_with(|| CategoryStats::new(taxonomy, level))
                .counts
                .record(outcome, difficulty);
        }
    }

    /// Sum another state into this one, snapshots included
    pub fn merge(&mut self, other: &HierarchyState) {
        for level in Level::all() {
            let target = self.level_mut(level);
            for (key, stats) in other.level(level) {
                match target.get_mut(key) {
                    Some(existing) => existing.merge(stats),
                    None => {
                        target.insert(key.clone(), stats.clone());
                    }
                }
            }
        }
    }

    /// Merge a single run's partial state and snapshot it under `model → mode`
    pub fn absorb_run(&mut self, model: &str, mode: Mode, partial: &HierarchyState) {
        self.merge(partial);
        for level in Level::all() {
            let target = self.level_mut(level);
            for (key, stats) in partial.level(level) {
                if let Some(node) = target.get_mut(key) {
                    node.models
                        .entry(model.to_string())
                        .or_default()
                        .entry(mode)
                        .or_default()
                        .merge(&stats.counts);
                }
            }
        }
    }

    /// Sum of every discipline's counts
    pub fn totals(&self) -> Counts {
        let mut totals = Counts::default();
        for stats in self.disciplines.values() {
            totals.merge(&stats.counts);
        }
        totals
    }

    /// Sum of every discipline's snapshot for one run
    pub fn run_totals(&self, model: &str, mode: Mode) -> Counts {
        let mut totals = Counts::default();
        for counts in self.disciplines.values().filter_map(|s| s.run(model, mode)) {
            totals.merge(counts);
        }
        totals
    }

    /// Every (model, mode) pair with a snapshot, sorted
    pub fn runs(&self) -> Vec<(String, Mode)> {
        let mut runs: Vec<(String, Mode)> = self
            .disciplines
            .values()
            .flat_map(|stats| {
                stats
                    .models
                    .iter()
                    .flat_map(|(model, modes)| modes.keys().map(move |mode| (model.clone(), *mode)))
            })
            .collect();
        runs.sort();
        runs.dedup();
        runs
    }

    /// Fields of `discipline`, sorted by key
    pub fn fields_of<'a>(&'a self, discipline: &'a str) -> impl Iterator<Item = (&'a String, &'a CategoryStats)> + 'a {
        self.fields
            .iter()
            .filter(move |(_, stats)| stats.discipline == discipline)
    }

    /// Subfields of `discipline/field`, sorted by key
    pub fn subfields_of<'a>(
        &'a self,
        discipline: &'a str,
        field: &'a str,
    ) -> impl Iterator<Item = (&'a String, &'a CategoryStats)> + 'a {
        self.subfields.iter().filter(move |(_, stats)| {
            stats.discipline == discipline && stats.field.as_deref() == Some(field)
        })
    }
}
