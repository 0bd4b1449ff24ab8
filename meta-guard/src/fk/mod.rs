//! Foreign-key candidate classification.
//!
//! Unary inclusion dependencies become [`UnaryForeignKeyCandidate`]s. Every
//! configured [`PartialForeignKeyClassifier`] appends exactly one
//! [`WeightedResult`] to each candidate's [`ClassificationSet`], and the
//! [`DecisionAggregator`] folds those verdicts into a final [`Decision`].
//!
//! ## Architecture
//!
//! - [`classifiers`]: the classifier trait and its variants (coverage ratio,
//!   value overlap, type compatibility, naming similarity)
//! - [`aggregator`]: weighted-sum combination with a precision-first tie-break
//! - [`pipeline`]: ordered classifier list, sharded execution and reports
//! - [`config`]: JSON pipeline configuration
//! - [`evaluation`]: precision/recall against ground-truth DDL
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use meta_guard::catalog::ColumnId;
//! use meta_guard::constraints::{ColumnStatistics, InMemoryStatistics};
//! use meta_guard::fk::{
//!     ClassificationPipeline, CoverageClassifier, ForeignKeyLabel, UnaryForeignKeyCandidate,
//! };
//!
//! # fn main() -> meta_guard::error::Result<()> {
//! let statistics = Arc::new(InMemoryStatistics::from_statistics(vec![
//!     ColumnStatistics::new(ColumnId::new(1)).with_distinct_values(95),
//!     ColumnStatistics::new(ColumnId::new(2)).with_distinct_values(100),
//! ]));
//!
//! let pipeline = ClassificationPipeline::new()
//!     .add_classifier(Arc::new(CoverageClassifier::new(1.0, 0.9, 0.5, statistics)?))?;
//!
//! let candidate = UnaryForeignKeyCandidate::new(ColumnId::new(1), ColumnId::new(2));
//! let decisions = pipeline.classify(&[candidate]);
//! assert_eq!(decisions[0].decision.label, ForeignKeyLabel::ForeignKey);
//! assert_eq!(decisions[0].decision.confidence, 1.0);
//! # Ok(())
//! # }
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{MetaError, Result};

pub mod aggregator;
pub mod candidate;
pub mod classifiers;
pub mod config;
pub mod evaluation;
pub mod pipeline;

pub use aggregator::{Decision, DecisionAggregator, LabelWeights};
pub use candidate::{candidates_from_pinds, UnaryForeignKeyCandidate};
pub use classifiers::{
    CoverageClassifier, NamingClassifier, PartialForeignKeyClassifier,
    TypeCompatibilityClassifier, ValueOverlapClassifier,
};
pub use config::{ClassifierContext, ClassifierSpec, PipelineConfig};
pub use evaluation::{evaluate, EvaluationResult};
pub use pipeline::{CandidateDecision, ClassificationPipeline, ClassificationReport, RunMetadata};

/// Verdict on a foreign-key candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ForeignKeyLabel {
    /// The candidate is a foreign key
    ForeignKey,
    /// The candidate is not a foreign key
    NoForeignKey,
    /// Not enough evidence either way
    Unknown,
}

impl ForeignKeyLabel {
    /// All labels, in declaration order.
    pub const ALL: [ForeignKeyLabel; 3] = [
        ForeignKeyLabel::ForeignKey,
        ForeignKeyLabel::NoForeignKey,
        ForeignKeyLabel::Unknown,
    ];

    /// The label's wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ForeignKeyLabel::ForeignKey => "FOREIGN_KEY",
            ForeignKeyLabel::NoForeignKey => "NO_FOREIGN_KEY",
            ForeignKeyLabel::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for ForeignKeyLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One classifier's weighted verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawWeightedResult")]
pub struct WeightedResult {
    /// The verdict
    pub label: ForeignKeyLabel,
    /// Importance of the verdict, finite and non-negative
    pub weight: f64,
    /// Name of the classifier that produced it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classifier: Option<String>,
}

impl WeightedResult {
    /// Creates a result, rejecting negative or non-finite weights.
    pub fn new(label: ForeignKeyLabel, weight: f64) -> Result<Self> {
        classifiers::validate_weight(weight)?;
        Ok(Self::unchecked(label, weight))
    }

    pub(crate) fn unchecked(label: ForeignKeyLabel, weight: f64) -> Self {
        Self {
            label,
            weight,
            classifier: None,
        }
    }

    /// Tags the result with the producing classifier.
    pub fn with_classifier(mut self, name: impl Into<String>) -> Self {
        self.classifier = Some(name.into());
        self
    }
}

/// Unvalidated wire form of a [`WeightedResult`].
#[derive(Deserialize)]
struct RawWeightedResult {
    label: ForeignKeyLabel,
    weight: f64,
    #[serde(default)]
    classifier: Option<String>,
}

impl TryFrom<RawWeightedResult> for WeightedResult {
    type Error = MetaError;

    fn try_from(raw: RawWeightedResult) -> Result<Self> {
        let mut result = Self::new(raw.label, raw.weight)?;
        result.classifier = raw.classifier;
        Ok(result)
    }
}

/// A candidate and the verdicts collected for it so far.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationSet {
    candidate: UnaryForeignKeyCandidate,
    results: Vec<WeightedResult>,
}

impl ClassificationSet {
    /// Creates an empty set for a candidate.
    pub fn new(candidate: UnaryForeignKeyCandidate) -> Self {
        Self {
            candidate,
            results: Vec::new(),
        }
    }

    /// The candidate under evaluation.
    pub fn candidate(&self) -> &UnaryForeignKeyCandidate {
        &self.candidate
    }

    /// Appends a verdict.
    pub fn add_partial_result(&mut self, result: WeightedResult) {
        self.results.push(result);
    }

    /// Verdicts in the order they were added.
    pub fn results(&self) -> &[WeightedResult] {
        &self.results
    }

    /// Splits the set into its candidate and verdicts.
    pub fn into_parts(self) -> (UnaryForeignKeyCandidate, Vec<WeightedResult>) {
        (self.candidate, self.results)
    }
}

impl TryFrom<(ForeignKeyLabel, f64)> for WeightedResult {
    type Error = MetaError;

    fn try_from((label, weight): (ForeignKeyLabel, f64)) -> Result<Self> {
        Self::new(label, weight)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ColumnId;

    #[test]
    fn test_label_serde_names() {
        assert_eq!(
            serde_json::to_string(&ForeignKeyLabel::NoForeignKey).unwrap(),
            "\"NO_FOREIGN_KEY\""
        );
        let label: ForeignKeyLabel = serde_json::from_str("\"FOREIGN_KEY\"").unwrap();
        assert_eq!(label, ForeignKeyLabel::ForeignKey);
        assert_eq!(ForeignKeyLabel::Unknown.to_string(), "UNKNOWN");
    }

    #[test]
    fn test_weighted_result_rejects_bad_weights() {
        assert!(WeightedResult::new(ForeignKeyLabel::ForeignKey, -0.5).is_err());
        assert!(WeightedResult::new(ForeignKeyLabel::ForeignKey, f64::NAN).is_err());
        assert!(WeightedResult::try_from((ForeignKeyLabel::Unknown, 0.0)).is_ok());
    }

    #[test]
    fn test_deserialized_weights_are_validated() {
        let result: WeightedResult =
            serde_json::from_str(r#"{"label": "FOREIGN_KEY", "weight": 2.0, "classifier": "naming"}"#)
                .unwrap();
        assert_eq!(result.weight, 2.0);
        assert_eq!(result.classifier.as_deref(), Some("naming"));

        let err = serde_json::from_str::<WeightedResult>(r#"{"label": "UNKNOWN", "weight": -3.0}"#)
            .unwrap_err();
        assert!(err.to_string().contains("non-negative"), "{err}");

        let set = r#"{
            "candidate": {"dependent_column_id": 1, "referenced_column_id": 2},
            "results": [{"label": "NO_FOREIGN_KEY", "weight": -1.0}]
        }"#;
        assert!(serde_json::from_str::<ClassificationSet>(set).is_err());
    }

    #[test]
    fn test_set_keeps_result_order() {
        let candidate = UnaryForeignKeyCandidate::new(ColumnId::new(1), ColumnId::new(2));
        let mut set = ClassificationSet::new(candidate);
        set.add_partial_result(
            WeightedResult::new(ForeignKeyLabel::ForeignKey, 2.0)
                .unwrap()
                .with_classifier("coverage"),
        );
        set.add_partial_result(WeightedResult::new(ForeignKeyLabel::Unknown, 1.0).unwrap());

        let labels: Vec<_> = set.results().iter().map(|r| r.label).collect();
        assert_eq!(
            labels,
            vec![ForeignKeyLabel::ForeignKey, ForeignKeyLabel::Unknown]
        );
        assert_eq!(set.results()[0].classifier.as_deref(), Some("coverage"));

        let (owned, results) = set.into_parts();
        assert_eq!(owned, candidate);
        assert_eq!(results.len(), 2);
    }
}
