//! Partial foreign-key classifiers.
//!
//! A classifier looks at one candidate in isolation and produces a verdict
//! weighted by its configured importance. Classifiers never read each other's
//! results, and a classifier that lacks the information to decide answers
//! [`ForeignKeyLabel::Unknown`] rather than skipping the candidate.

use std::fmt::Debug;

use crate::error::{MetaError, Result};

use super::{ClassificationSet, ForeignKeyLabel, UnaryForeignKeyCandidate, WeightedResult};

mod coverage;
mod naming;
mod type_compatibility;
mod value_overlap;

pub use coverage::CoverageClassifier;
pub use naming::NamingClassifier;
pub use type_compatibility::{TypeCompatibilityClassifier, TypeFamily};
pub use value_overlap::ValueOverlapClassifier;

/// A weighted, independent judge of foreign-key candidates.
///
/// Implementations only need [`judge`](Self::judge); the provided
/// [`classify`](Self::classify) appends exactly one result per set.
pub trait PartialForeignKeyClassifier: Debug + Send + Sync {
    /// Name recorded on every result this classifier produces.
    fn name(&self) -> &str;

    /// The classifier's fixed weight.
    fn weight(&self) -> f64;

    /// Verdict for a single candidate.
    fn judge(&self, candidate: &UnaryForeignKeyCandidate) -> ForeignKeyLabel;

    /// Appends one weighted verdict to every set in the batch.
    fn classify(&self, sets: &mut [ClassificationSet]) {
        for set in sets.iter_mut() {
            let label = self.judge(set.candidate());
            set.add_partial_result(
                WeightedResult::unchecked(label, self.weight()).with_classifier(self.name()),
            );
        }
    }
}

/// Checks that a classifier weight is finite and non-negative.
pub fn validate_weight(weight: f64) -> Result<f64> {
    if weight.is_finite() && weight >= 0.0 {
        Ok(weight)
    } else {
        Err(MetaError::invalid_argument(format!(
            "classifier weight must be finite and non-negative, got {weight}"
        )))
    }
}

/// Checks a pair of thresholds where `fk >= non_fk >= 0`.
pub(crate) fn validate_thresholds(
    what: &str,
    fk_threshold: f64,
    non_fk_threshold: f64,
) -> Result<()> {
    if !fk_threshold.is_finite() || !non_fk_threshold.is_finite() {
        return Err(MetaError::invalid_argument(format!(
            "{what} thresholds must be finite, got {fk_threshold} and {non_fk_threshold}"
        )));
    }
    if non_fk_threshold < 0.0 || fk_threshold < non_fk_threshold {
        return Err(MetaError::invalid_argument(format!(
            "{what} thresholds must satisfy fk ({fk_threshold}) >= non-fk ({non_fk_threshold}) >= 0"
        )));
    }
    Ok(())
}

/// Maps a score onto a label using a pair of validated thresholds.
pub(crate) fn label_for_score(score: f64, fk_threshold: f64, non_fk_threshold: f64) -> ForeignKeyLabel {
    if score >= fk_threshold {
        ForeignKeyLabel::ForeignKey
    } else if score <= non_fk_threshold {
        ForeignKeyLabel::NoForeignKey
    } else {
        ForeignKeyLabel::Unknown
    }
}
