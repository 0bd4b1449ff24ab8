//! Precomputed column statistics.
//!
//! Statistics are produced outside this crate; the classification engine only
//! reads them. A missing value is reported as `None` and never as an error.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Debug;

use crate::catalog::ColumnId;

use super::{Constraint, ConstraintKind};

/// Summary statistics of a single column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnStatistics {
    /// The column described
    pub column_id: ColumnId,
    /// Number of distinct non-null values, if known
    #[serde(default)]
    pub num_distinct_values: Option<u64>,
    /// Number of null values, if known
    #[serde(default)]
    pub num_nulls: Option<u64>,
    /// Fraction of non-null values, if known
    #[serde(default)]
    pub fill_status: Option<f64>,
}

impl ColumnStatistics {
    /// Creates statistics with only the column id set.
    pub fn new(column_id: ColumnId) -> Self {
        Self {
            column_id,
            num_distinct_values: None,
            num_nulls: None,
            fill_status: None,
        }
    }

    /// Sets the distinct value count.
    pub fn with_distinct_values(mut self, count: u64) -> Self {
        self.num_distinct_values = Some(count);
        self
    }

    /// Sets the null count.
    pub fn with_nulls(mut self, count: u64) -> Self {
        self.num_nulls = Some(count);
        self
    }

    /// Sets the fill status, clamped to `[0, 1]`.
    pub fn with_fill_status(mut self, fill_status: f64) -> Self {
        self.fill_status = Some(fill_status.clamp(0.0, 1.0));
        self
    }
}

impl Constraint for ColumnStatistics {
    fn kind(&self) -> ConstraintKind {
        ConstraintKind::ColumnStatistics
    }

    fn all_target_ids(&self) -> Vec<ColumnId> {
        vec![self.column_id]
    }
}

/// Read-only source of column statistics.
///
/// Implementations must be safe for concurrent reads; a provider is treated as
/// immutable for the duration of one classification run.
pub trait StatisticsProvider: Debug + Send + Sync {
    /// Number of distinct values of a column, or `None` when unknown.
    fn distinct_values(&self, column: ColumnId) -> Option<u64>;
}

/// Statistics held in a hash map.
///
/// # Examples
///
/// ```rust
/// use meta_guard::catalog::ColumnId;
/// use meta_guard::constraints::{ColumnStatistics, InMemoryStatistics, StatisticsProvider};
///
/// let stats = InMemoryStatistics::from_statistics(vec![
///     ColumnStatistics::new(ColumnId::new(1)).with_distinct_values(100),
///     ColumnStatistics::new(ColumnId::new(2)),
/// ]);
///
/// assert_eq!(stats.distinct_values(ColumnId::new(1)), Some(100));
/// assert_eq!(stats.distinct_values(ColumnId::new(2)), None);
/// assert_eq!(stats.distinct_values(ColumnId::new(3)), None);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<ColumnStatistics>", into = "Vec<ColumnStatistics>")]
pub struct InMemoryStatistics {
    statistics: HashMap<ColumnId, ColumnStatistics>,
}

impl InMemoryStatistics {
    /// Creates an empty statistics map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a map from a list; later entries for a column replace earlier ones.
    pub fn from_statistics(statistics: impl IntoIterator<Item = ColumnStatistics>) -> Self {
        let mut map = Self::new();
        for stats in statistics {
            map.insert(stats);
        }
        map
    }

    /// Adds or replaces the statistics of a column.
    pub fn insert(&mut self, statistics: ColumnStatistics) {
        self.statistics.insert(statistics.column_id, statistics);
    }

    /// Returns the statistics of a column.
    pub fn get(&self, column: ColumnId) -> Option<&ColumnStatistics> {
        self.statistics.get(&column)
    }

    /// Number of columns with statistics.
    pub fn len(&self) -> usize {
        self.statistics.len()
    }

    /// Whether no statistics are stored.
    pub fn is_empty(&self) -> bool {
        self.statistics.is_empty()
    }
}

impl StatisticsProvider for InMemoryStatistics {
    fn distinct_values(&self, column: ColumnId) -> Option<u64> {
        self.statistics
            .get(&column)
            .and_then(|s| s.num_distinct_values)
    }
}

impl From<Vec<ColumnStatistics>> for InMemoryStatistics {
    fn from(statistics: Vec<ColumnStatistics>) -> Self {
        Self::from_statistics(statistics)
    }
}

impl From<InMemoryStatistics> for Vec<ColumnStatistics> {
    fn from(map: InMemoryStatistics) -> Self {
        let mut statistics: Vec<ColumnStatistics> = map.statistics.into_values().collect();
        statistics.sort_by_key(|s| s.column_id);
        statistics
    }
}
