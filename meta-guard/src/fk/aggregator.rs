//! Combination of weighted classifier verdicts into a decision.

use serde::{Deserialize, Serialize};

use super::{ClassificationSet, ForeignKeyLabel, WeightedResult};

/// Order in which equal sums are resolved; earlier labels win.
const TIE_PREFERENCE: [ForeignKeyLabel; 3] = [
    ForeignKeyLabel::NoForeignKey,
    ForeignKeyLabel::Unknown,
    ForeignKeyLabel::ForeignKey,
];

/// Summed weight per label.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LabelWeights {
    pub foreign_key: f64,
    pub no_foreign_key: f64,
    pub unknown: f64,
}

impl LabelWeights {
    /// Sums the weights of a sequence of results.
    pub fn from_results<'a>(results: impl IntoIterator<Item = &'a WeightedResult>) -> Self {
        let mut weights = Self::default();
        for result in results {
            weights.add(result.label, result.weight);
        }
        weights
    }

    /// Adds weight to a label.
    pub fn add(&mut self, label: ForeignKeyLabel, weight: f64) {
        *self.get_mut(label) += weight;
    }

    /// Summed weight of a label.
    pub fn get(&self, label: ForeignKeyLabel) -> f64 {
        match label {
            ForeignKeyLabel::ForeignKey => self.foreign_key,
            ForeignKeyLabel::NoForeignKey => self.no_foreign_key,
            ForeignKeyLabel::Unknown => self.unknown,
        }
    }

    fn get_mut(&mut self, label: ForeignKeyLabel) -> &mut f64 {
        match label {
            ForeignKeyLabel::ForeignKey => &mut self.foreign_key,
            ForeignKeyLabel::NoForeignKey => &mut self.no_foreign_key,
            ForeignKeyLabel::Unknown => &mut self.unknown,
        }
    }

    /// Sum over all labels.
    pub fn total(&self) -> f64 {
        self.foreign_key + self.no_foreign_key + self.unknown
    }
}

/// Final verdict on one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    /// Winning label
    pub label: ForeignKeyLabel,
    /// Winning weight divided by total weight, in `[0, 1]`
    pub confidence: f64,
    /// Per-label sums the decision was made from
    pub weights: LabelWeights,
}

/// Weighted-sum aggregation of classifier verdicts.
///
/// The label with the greatest summed weight wins. Equal sums resolve in the
/// order `NO_FOREIGN_KEY`, `UNKNOWN`, `FOREIGN_KEY`, so a split vote never
/// yields a foreign key. Confidence is the winning sum over the total; a set
/// whose weights sum to zero (including an empty set) is `UNKNOWN` with
/// confidence `0`.
///
/// The result depends only on the multiset of verdicts, never on the order
/// classifiers ran in.
///
/// # Examples
///
/// ```rust
/// use meta_guard::catalog::ColumnId;
/// use meta_guard::fk::{
///     ClassificationSet, DecisionAggregator, ForeignKeyLabel, UnaryForeignKeyCandidate,
///     WeightedResult,
/// };
///
/// # fn main() -> meta_guard::error::Result<()> {
/// let mut set = ClassificationSet::new(UnaryForeignKeyCandidate::new(ColumnId::new(1), ColumnId::new(2)));
/// set.add_partial_result(WeightedResult::new(ForeignKeyLabel::ForeignKey, 2.0)?);
/// set.add_partial_result(WeightedResult::new(ForeignKeyLabel::NoForeignKey, 1.0)?);
/// set.add_partial_result(WeightedResult::new(ForeignKeyLabel::Unknown, 1.0)?);
///
/// let decision = DecisionAggregator::new().aggregate(&set);
/// assert_eq!(decision.label, ForeignKeyLabel::ForeignKey);
/// assert_eq!(decision.confidence, 0.5);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct DecisionAggregator;

impl DecisionAggregator {
    /// Creates the aggregator.
    pub fn new() -> Self {
        Self
    }

    /// Decides a fully populated set.
    pub fn aggregate(&self, set: &ClassificationSet) -> Decision {
        self.decide(LabelWeights::from_results(set.results()))
    }

    /// Decides from precomputed per-label sums.
    ///
    /// Sums that are negative or not finite yield `UNKNOWN` with confidence `0`.
    pub fn decide(&self, weights: LabelWeights) -> Decision {
        let total = weights.total();
        let valid = ForeignKeyLabel::ALL
            .iter()
            .all(|label| weights.get(*label).is_finite() && weights.get(*label) >= 0.0);
        if !valid || total <= 0.0 || !total.is_finite() {
            return Decision {
                label: ForeignKeyLabel::Unknown,
                confidence: 0.0,
                weights,
            };
        }

        let mut winner = TIE_PREFERENCE[0];
        for label in &TIE_PREFERENCE[1..] {
            if weights.get(*label) > weights.get(winner) {
                winner = *label;
            }
        }

        Decision {
            label: winner,
            confidence: weights.get(winner) / total,
            weights,
        }
    }
}
