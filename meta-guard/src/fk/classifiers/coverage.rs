//! Distinct-value coverage classifier.

use std::sync::Arc;
use tracing::instrument;

use crate::constraints::StatisticsProvider;
use crate::error::Result;
use crate::fk::{ForeignKeyLabel, UnaryForeignKeyCandidate};

use super::{label_for_score, validate_thresholds, validate_weight, PartialForeignKeyClassifier};

/// Compares the distinct-value counts of the two sides of a candidate.
///
/// A foreign key usually covers most of the key it references, so with
/// `dep` and `ref` the distinct counts of the dependent and referenced
/// columns:
///
/// - either count unknown → `UNKNOWN`
/// - `dep >= fk_ratio * ref` → `FOREIGN_KEY`
/// - `dep <= non_fk_ratio * ref` → `NO_FOREIGN_KEY`
/// - otherwise → `UNKNOWN`
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use meta_guard::catalog::ColumnId;
/// use meta_guard::constraints::{ColumnStatistics, InMemoryStatistics};
/// use meta_guard::fk::{
///     CoverageClassifier, ForeignKeyLabel, PartialForeignKeyClassifier, UnaryForeignKeyCandidate,
/// };
///
/// # fn main() -> meta_guard::error::Result<()> {
/// let stats = Arc::new(InMemoryStatistics::from_statistics(vec![
///     ColumnStatistics::new(ColumnId::new(1)).with_distinct_values(10),
///     ColumnStatistics::new(ColumnId::new(2)).with_distinct_values(100),
/// ]));
/// let classifier = CoverageClassifier::new(1.0, 0.9, 0.5, stats)?;
///
/// let candidate = UnaryForeignKeyCandidate::new(ColumnId::new(1), ColumnId::new(2));
/// assert_eq!(classifier.judge(&candidate), ForeignKeyLabel::NoForeignKey);
///
/// assert!(CoverageClassifier::new(1.0, 0.4, 0.5, Arc::new(InMemoryStatistics::new())).is_err());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct CoverageClassifier {
    weight: f64,
    fk_ratio: f64,
    non_fk_ratio: f64,
    statistics: Arc<dyn StatisticsProvider>,
}

impl CoverageClassifier {
    /// Name recorded on this classifier's results.
    pub const NAME: &'static str = "coverage";

    /// Creates the classifier; requires `fk_ratio >= non_fk_ratio >= 0`.
    #[instrument(skip(statistics))]
    pub fn new(
        weight: f64,
        fk_ratio: f64,
        non_fk_ratio: f64,
        statistics: Arc<dyn StatisticsProvider>,
    ) -> Result<Self> {
        validate_weight(weight)?;
        validate_thresholds("coverage ratio", fk_ratio, non_fk_ratio)?;
        Ok(Self {
            weight,
            fk_ratio,
            non_fk_ratio,
            statistics,
        })
    }

    /// Ratio at or above which a candidate is a foreign key.
    pub fn fk_ratio(&self) -> f64 {
        self.fk_ratio
    }

    /// Ratio at or below which a candidate is not a foreign key.
    pub fn non_fk_ratio(&self) -> f64 {
        self.non_fk_ratio
    }
}

impl PartialForeignKeyClassifier for CoverageClassifier {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn weight(&self) -> f64 {
        self.weight
    }

    fn judge(&self, candidate: &UnaryForeignKeyCandidate) -> ForeignKeyLabel {
        let dependent = self.statistics.distinct_values(candidate.dependent_column_id);
        let referenced = self.statistics.distinct_values(candidate.referenced_column_id);
        let (Some(dependent), Some(referenced)) = (dependent, referenced) else {
            return ForeignKeyLabel::Unknown;
        };

        let referenced = referenced as f64;
        label_for_score(
            dependent as f64,
            self.fk_ratio * referenced,
            self.non_fk_ratio * referenced,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ColumnId;
    use crate::constraints::{ColumnStatistics, InMemoryStatistics};

    fn classifier(dep: Option<u64>, referenced: Option<u64>) -> CoverageClassifier {
        let mut stats = InMemoryStatistics::new();
        let mut dep_stats = ColumnStatistics::new(ColumnId::new(1));
        dep_stats.num_distinct_values = dep;
        let mut ref_stats = ColumnStatistics::new(ColumnId::new(2));
        ref_stats.num_distinct_values = referenced;
        stats.insert(dep_stats);
        stats.insert(ref_stats);
        CoverageClassifier::new(1.0, 0.9, 0.5, Arc::new(stats)).unwrap()
    }

    fn judge(dep: Option<u64>, referenced: Option<u64>) -> ForeignKeyLabel {
        classifier(dep, referenced).judge(&UnaryForeignKeyCandidate::new(
            ColumnId::new(1),
            ColumnId::new(2),
        ))
    }

    #[test]
    fn test_reference_verdicts() {
        assert_eq!(judge(Some(100), Some(100)), ForeignKeyLabel::ForeignKey);
        assert_eq!(judge(Some(10), Some(100)), ForeignKeyLabel::NoForeignKey);
        assert_eq!(judge(Some(70), Some(100)), ForeignKeyLabel::Unknown);
    }

    #[test]
    fn test_ratio_bounds_are_inclusive() {
        assert_eq!(judge(Some(90), Some(100)), ForeignKeyLabel::ForeignKey);
        assert_eq!(judge(Some(89), Some(100)), ForeignKeyLabel::Unknown);
        assert_eq!(judge(Some(50), Some(100)), ForeignKeyLabel::NoForeignKey);
        assert_eq!(judge(Some(0), Some(0)), ForeignKeyLabel::ForeignKey);
    }

    #[test]
    fn test_unknown_statistics() {
        assert_eq!(judge(None, Some(100)), ForeignKeyLabel::Unknown);
        assert_eq!(judge(Some(100), None), ForeignKeyLabel::Unknown);
        assert_eq!(judge(None, None), ForeignKeyLabel::Unknown);
    }

    #[test]
    fn test_missing_column_is_unknown() {
        let classifier = classifier(Some(5), Some(5));
        let candidate = UnaryForeignKeyCandidate::new(ColumnId::new(1), ColumnId::new(99));
        assert_eq!(classifier.judge(&candidate), ForeignKeyLabel::Unknown);
    }

    #[test]
    fn test_invalid_construction() {
        let stats: Arc<dyn StatisticsProvider> = Arc::new(InMemoryStatistics::new());
        assert!(CoverageClassifier::new(1.0, 0.5, 0.9, stats.clone())
            .unwrap_err()
            .is_invalid_argument());
        assert!(CoverageClassifier::new(1.0, 0.9, -0.1, stats.clone()).is_err());
        assert!(CoverageClassifier::new(-1.0, 0.9, 0.5, stats).is_err());
    }
}
