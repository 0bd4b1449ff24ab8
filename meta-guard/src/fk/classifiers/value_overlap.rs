//! Value-overlap classifier backed by discovered inclusion dependencies.

use std::collections::HashMap;
use tracing::debug;

use crate::catalog::ColumnId;
use crate::constraints::PartialInclusionDependency;
use crate::error::{MetaError, Result};
use crate::fk::{ForeignKeyLabel, UnaryForeignKeyCandidate};

use super::{label_for_score, validate_thresholds, validate_weight, PartialForeignKeyClassifier};

/// Judges a candidate by how many dependent values the referenced column holds.
///
/// The overlap of a pair is `1 - error` of the unary inclusion dependency
/// discovered for it; when several are known for a pair the best one counts.
/// Pairs without a dependency are `UNKNOWN`.
#[derive(Debug, Clone)]
pub struct ValueOverlapClassifier {
    weight: f64,
    fk_min_coverage: f64,
    non_fk_max_coverage: f64,
    coverage: HashMap<(ColumnId, ColumnId), f64>,
}

impl ValueOverlapClassifier {
    /// Name recorded on this classifier's results.
    pub const NAME: &'static str = "value_overlap";

    /// Creates the classifier from discovered dependencies.
    ///
    /// Thresholds must satisfy `1 >= fk_min_coverage >= non_fk_max_coverage >= 0`.
    /// Dependencies of higher arity are ignored.
    pub fn new<'a>(
        weight: f64,
        fk_min_coverage: f64,
        non_fk_max_coverage: f64,
        pinds: impl IntoIterator<Item = &'a PartialInclusionDependency>,
    ) -> Result<Self> {
        validate_weight(weight)?;
        validate_thresholds("value overlap", fk_min_coverage, non_fk_max_coverage)?;
        if fk_min_coverage > 1.0 {
            return Err(MetaError::invalid_argument(format!(
                "value overlap coverage threshold must not exceed 1, got {fk_min_coverage}"
            )));
        }

        let mut coverage: HashMap<(ColumnId, ColumnId), f64> = HashMap::new();
        for pind in pinds.into_iter().filter(|p| p.is_unary()) {
            let key = (pind.dependent_column_ids()[0], pind.referenced_column_ids()[0]);
            let value = 1.0 - pind.error();
            coverage
                .entry(key)
                .and_modify(|best| *best = best.max(value))
                .or_insert(value);
        }
        debug!(pairs = coverage.len(), "Indexed value overlap");

        Ok(Self {
            weight,
            fk_min_coverage,
            non_fk_max_coverage,
            coverage,
        })
    }

    /// Known overlap of a candidate pair.
    pub fn coverage_of(&self, candidate: &UnaryForeignKeyCandidate) -> Option<f64> {
        self.coverage
            .get(&(candidate.dependent_column_id, candidate.referenced_column_id))
            .copied()
    }
}

impl PartialForeignKeyClassifier for ValueOverlapClassifier {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn weight(&self) -> f64 {
        self.weight
    }

    fn judge(&self, candidate: &UnaryForeignKeyCandidate) -> ForeignKeyLabel {
        match self.coverage_of(candidate) {
            Some(coverage) => label_for_score(coverage, self.fk_min_coverage, self.non_fk_max_coverage),
            None => ForeignKeyLabel::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unary(dep: u32, referenced: u32, error: f64) -> PartialInclusionDependency {
        PartialInclusionDependency::unary(ColumnId::new(dep), ColumnId::new(referenced), error, 100)
            .unwrap()
    }

    fn candidate(dep: u32, referenced: u32) -> UnaryForeignKeyCandidate {
        UnaryForeignKeyCandidate::new(ColumnId::new(dep), ColumnId::new(referenced))
    }

    #[test]
    fn test_verdicts() {
        let pinds = vec![unary(1, 2, 0.0), unary(3, 2, 0.8), unary(4, 2, 0.3)];
        let classifier = ValueOverlapClassifier::new(2.0, 0.95, 0.5, &pinds).unwrap();

        assert_eq!(classifier.judge(&candidate(1, 2)), ForeignKeyLabel::ForeignKey);
        assert_eq!(classifier.judge(&candidate(3, 2)), ForeignKeyLabel::NoForeignKey);
        assert_eq!(classifier.judge(&candidate(4, 2)), ForeignKeyLabel::Unknown);
        assert_eq!(classifier.judge(&candidate(2, 1)), ForeignKeyLabel::Unknown);
    }

    #[test]
    fn test_best_dependency_counts() {
        let pinds = vec![unary(1, 2, 0.6), unary(1, 2, 0.01)];
        let classifier = ValueOverlapClassifier::new(1.0, 0.95, 0.5, &pinds).unwrap();
        assert_eq!(classifier.coverage_of(&candidate(1, 2)), Some(0.99));
    }

    #[test]
    fn test_nary_dependencies_ignored() {
        let binary = PartialInclusionDependency::new(
            vec![ColumnId::new(1), ColumnId::new(3)],
            vec![ColumnId::new(2), ColumnId::new(4)],
            0.0,
            10,
        )
        .unwrap();
        let classifier = ValueOverlapClassifier::new(1.0, 0.9, 0.5, [&binary]).unwrap();
        assert_eq!(classifier.coverage_of(&candidate(1, 2)), None);
    }

    #[test]
    fn test_threshold_validation() {
        let none: Vec<PartialInclusionDependency> = Vec::new();
        assert!(ValueOverlapClassifier::new(1.0, 1.5, 0.5, &none).is_err());
        assert!(ValueOverlapClassifier::new(1.0, 0.4, 0.5, &none).is_err());
        assert!(ValueOverlapClassifier::new(f64::NAN, 0.9, 0.5, &none).is_err());
    }
}
