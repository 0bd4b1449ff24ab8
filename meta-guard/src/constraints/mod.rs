//! Discovered structural constraints over the catalog.
//!
//! This module holds the constraint types the metadata store keeps about
//! catalog columns, and the algorithms that operate on them:
//!
//! - **[`PartialInclusionDependency`]**: approximate n-ary inclusion
//!   dependencies with their implication and triviality checks
//! - **[`MinimalCover`]**: reduction of a dependency set to its
//!   non-redundant cover
//! - **[`ColumnStatistics`]** and the read-only [`StatisticsProvider`]
//! - **[`ConstraintCollection`]**: a named, scoped batch of constraints as
//!   stored in a [`ConstraintRepository`](crate::repository::ConstraintRepository)
//!
//! ## Loading discovery output
//!
//! Upstream discovery delivers raw dependencies that may be malformed.
//! [`load_pinds`] validates them under a [`BatchErrorPolicy`]:
//!
//! ```rust
//! use meta_guard::catalog::ColumnId;
//! use meta_guard::constraints::{load_pinds, BatchErrorPolicy, RawInclusionDependency};
//!
//! let raw = vec![
//!     RawInclusionDependency {
//!         dependent_column_ids: vec![ColumnId::new(1)],
//!         referenced_column_ids: vec![ColumnId::new(2)],
//!         error: 0.0,
//!         dependent_size: 10,
//!     },
//!     RawInclusionDependency {
//!         dependent_column_ids: vec![ColumnId::new(3), ColumnId::new(1)],
//!         referenced_column_ids: vec![ColumnId::new(2), ColumnId::new(4)],
//!         error: 0.0,
//!         dependent_size: 10,
//!     },
//! ];
//!
//! let loaded = load_pinds(raw.clone(), BatchErrorPolicy::SkipAndRecord).unwrap();
//! assert_eq!(loaded.accepted.len(), 1);
//! assert_eq!(loaded.rejected[0].position, 1);
//!
//! assert!(load_pinds(raw, BatchErrorPolicy::AbortOnFirst).is_err());
//! ```

use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use tracing::{instrument, warn};

use crate::catalog::{ColumnId, SchemaId};
use crate::error::{MetaError, Result};

mod inclusion;
mod minimality;
mod statistics;

pub use inclusion::{PartialInclusionDependency, RawInclusionDependency};
pub use minimality::MinimalCover;
pub use statistics::{ColumnStatistics, InMemoryStatistics, StatisticsProvider};

/// Kinds of constraints the store knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    /// A partial inclusion dependency
    InclusionDependency,
    /// Column summary statistics
    ColumnStatistics,
}

/// A statement about one or more catalog columns.
pub trait Constraint: Debug + Send + Sync {
    /// The kind of this constraint.
    fn kind(&self) -> ConstraintKind;

    /// Every column id this constraint refers to.
    fn all_target_ids(&self) -> Vec<ColumnId>;
}

/// A constraint as stored in a [`ConstraintCollection`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "constraint", rename_all = "snake_case")]
pub enum StoredConstraint {
    /// A partial inclusion dependency
    InclusionDependency(PartialInclusionDependency),
    /// Column summary statistics
    ColumnStatistics(ColumnStatistics),
}

impl StoredConstraint {
    fn as_constraint(&self) -> &dyn Constraint {
        match self {
            StoredConstraint::InclusionDependency(pind) => pind as &dyn Constraint,
            StoredConstraint::ColumnStatistics(stats) => stats as &dyn Constraint,
        }
    }

    /// The kind of the wrapped constraint.
    pub fn kind(&self) -> ConstraintKind {
        self.as_constraint().kind()
    }

    /// Every column id the wrapped constraint refers to.
    pub fn all_target_ids(&self) -> Vec<ColumnId> {
        self.as_constraint().all_target_ids()
    }
}

impl From<PartialInclusionDependency> for StoredConstraint {
    fn from(pind: PartialInclusionDependency) -> Self {
        StoredConstraint::InclusionDependency(pind)
    }
}

impl From<ColumnStatistics> for StoredConstraint {
    fn from(stats: ColumnStatistics) -> Self {
        StoredConstraint::ColumnStatistics(stats)
    }
}

/// A described batch of constraints over a set of schemas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintCollection {
    /// Human-readable description, e.g. the discovery run that produced it
    pub description: String,
    /// Schemas the constraints range over
    #[serde(default)]
    pub scope: Vec<SchemaId>,
    /// The constraints themselves
    #[serde(default)]
    pub constraints: Vec<StoredConstraint>,
}

impl ConstraintCollection {
    /// Creates an empty collection.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            scope: Vec::new(),
            constraints: Vec::new(),
        }
    }

    /// Adds a schema to the scope.
    pub fn with_scope(mut self, schema: SchemaId) -> Self {
        self.scope.push(schema);
        self
    }

    /// Adds a constraint.
    pub fn add(&mut self, constraint: impl Into<StoredConstraint>) {
        self.constraints.push(constraint.into());
    }

    /// Adds every constraint of an iterator.
    pub fn extend<I, C>(&mut self, constraints: I)
    where
        I: IntoIterator<Item = C>,
        C: Into<StoredConstraint>,
    {
        self.constraints
            .extend(constraints.into_iter().map(Into::into));
    }

    /// Number of constraints.
    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    /// Whether the collection holds no constraints.
    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    /// The inclusion dependencies of this collection.
    pub fn inclusion_dependencies(&self) -> impl Iterator<Item = &PartialInclusionDependency> {
        self.constraints.iter().filter_map(|c| match c {
            StoredConstraint::InclusionDependency(pind) => Some(pind),
            _ => None,
        })
    }

    /// The column statistics of this collection.
    pub fn column_statistics(&self) -> impl Iterator<Item = &ColumnStatistics> {
        self.constraints.iter().filter_map(|c| match c {
            StoredConstraint::ColumnStatistics(stats) => Some(stats),
            _ => None,
        })
    }
}

/// What a batch operation does when one of its inputs is invalid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchErrorPolicy {
    /// Fail the whole batch on the first invalid input
    #[default]
    AbortOnFirst,
    /// Skip invalid inputs and record why they were rejected
    SkipAndRecord,
}

/// An input rejected under [`BatchErrorPolicy::SkipAndRecord`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedInput {
    /// Position of the input in the batch
    pub position: usize,
    /// Why it was rejected
    pub reason: String,
}

/// Outcome of a batch load.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOutcome<T> {
    /// Inputs that passed validation, in input order
    pub accepted: Vec<T>,
    /// Inputs that were skipped
    pub rejected: Vec<RejectedInput>,
}

impl<T> BatchOutcome<T> {
    pub(crate) fn new() -> Self {
        Self {
            accepted: Vec::new(),
            rejected: Vec::new(),
        }
    }

    /// Applies `policy` to one converted input.
    pub(crate) fn record(
        &mut self,
        policy: BatchErrorPolicy,
        position: usize,
        item: Result<T>,
    ) -> Result<()> {
        match item {
            Ok(value) => self.accepted.push(value),
            Err(err) => match policy {
                BatchErrorPolicy::AbortOnFirst => {
                    return Err(match err {
                        MetaError::InvalidArgument(reason) => MetaError::InvalidArgument(
                            format!("input {position}: {reason}"),
                        ),
                        other => other,
                    });
                }
                BatchErrorPolicy::SkipAndRecord => {
                    warn!(position, error = %err, "Skipping invalid input");
                    self.rejected.push(RejectedInput {
                        position,
                        reason: err.to_string(),
                    });
                }
            },
        }
        Ok(())
    }
}

/// Validates raw inclusion dependencies from upstream discovery.
#[instrument(skip(raw))]
pub fn load_pinds(
    raw: impl IntoIterator<Item = RawInclusionDependency>,
    policy: BatchErrorPolicy,
) -> Result<BatchOutcome<PartialInclusionDependency>> {
    let mut outcome = BatchOutcome::new();
    for (position, item) in raw.into_iter().enumerate() {
        outcome.record(policy, position, PartialInclusionDependency::try_from(item))?;
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(dep: &[u32], refd: &[u32]) -> RawInclusionDependency {
        RawInclusionDependency {
            dependent_column_ids: dep.iter().copied().map(ColumnId::new).collect(),
            referenced_column_ids: refd.iter().copied().map(ColumnId::new).collect(),
            error: 0.0,
            dependent_size: 1,
        }
    }

    #[test]
    fn test_abort_on_first_reports_position() {
        let err = load_pinds(
            vec![raw(&[1], &[2]), raw(&[1, 2], &[3])],
            BatchErrorPolicy::AbortOnFirst,
        )
        .unwrap_err();
        assert!(err.is_invalid_argument());
        assert!(err.to_string().contains("input 1"));
    }

    #[test]
    fn test_skip_and_record() {
        let outcome = load_pinds(
            vec![raw(&[2, 1], &[3, 4]), raw(&[1], &[2]), raw(&[], &[])],
            BatchErrorPolicy::SkipAndRecord,
        )
        .unwrap();
        assert_eq!(outcome.accepted.len(), 1);
        let positions: Vec<usize> = outcome.rejected.iter().map(|r| r.position).collect();
        assert_eq!(positions, vec![0, 2]);
    }

    #[test]
    fn test_collection_accessors() {
        let mut collection = ConstraintCollection::new("discovery run").with_scope(SchemaId::new(7));
        collection.add(PartialInclusionDependency::unary(ColumnId::new(1), ColumnId::new(2), 0.0, 3).unwrap());
        collection.extend(vec![
            ColumnStatistics::new(ColumnId::new(1)).with_distinct_values(3),
            ColumnStatistics::new(ColumnId::new(2)).with_distinct_values(3),
        ]);

        assert_eq!(collection.len(), 3);
        assert_eq!(collection.inclusion_dependencies().count(), 1);
        assert_eq!(collection.column_statistics().count(), 2);
        assert_eq!(
            collection.constraints[0].all_target_ids(),
            vec![ColumnId::new(1), ColumnId::new(2)]
        );
        assert_eq!(
            collection.constraints[1].kind(),
            ConstraintKind::ColumnStatistics
        );
    }

    #[test]
    fn test_collection_serde() {
        let mut collection = ConstraintCollection::new("inds");
        collection.add(PartialInclusionDependency::unary(ColumnId::new(1), ColumnId::new(2), 0.25, 8).unwrap());

        let json = serde_json::to_string(&collection).unwrap();
        assert!(json.contains("\"kind\":\"inclusion_dependency\""));
        let restored: ConstraintCollection = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, collection);
    }
}
