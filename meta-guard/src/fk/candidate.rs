//! Unary foreign-key candidates.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, instrument};

use crate::catalog::ColumnId;
use crate::constraints::{BatchErrorPolicy, BatchOutcome, PartialInclusionDependency};
use crate::error::{MetaError, Result};

/// A single-column foreign-key hypothesis: `dependent` references `referenced`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UnaryForeignKeyCandidate {
    /// The referencing column
    pub dependent_column_id: ColumnId,
    /// The referenced column
    pub referenced_column_id: ColumnId,
}

impl UnaryForeignKeyCandidate {
    /// Creates a candidate.
    pub fn new(dependent_column_id: ColumnId, referenced_column_id: ColumnId) -> Self {
        Self {
            dependent_column_id,
            referenced_column_id,
        }
    }
}

impl fmt::Display for UnaryForeignKeyCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] ⊆ [{}]",
            self.dependent_column_id, self.referenced_column_id
        )
    }
}

impl TryFrom<&PartialInclusionDependency> for UnaryForeignKeyCandidate {
    type Error = MetaError;

    fn try_from(pind: &PartialInclusionDependency) -> Result<Self> {
        match (pind.dependent_column_ids(), pind.referenced_column_ids()) {
            ([dependent], [referenced]) => Ok(Self::new(*dependent, *referenced)),
            _ => Err(MetaError::invalid_argument(format!(
                "foreign-key candidates must be unary, got arity {} for {pind}",
                pind.arity()
            ))),
        }
    }
}

impl PartialInclusionDependency {
    /// Converts an arity-1 dependency into a foreign-key candidate.
    pub fn to_unary_candidate(&self) -> Result<UnaryForeignKeyCandidate> {
        UnaryForeignKeyCandidate::try_from(self)
    }
}

/// Turns inclusion dependencies into candidates under a batch error policy.
///
/// Trivial dependencies (`[c] ⊆ [c]`) are silently dropped; n-ary ones are
/// invalid input.
#[instrument(skip(pinds))]
pub fn candidates_from_pinds<'a>(
    pinds: impl IntoIterator<Item = &'a PartialInclusionDependency>,
    policy: BatchErrorPolicy,
) -> Result<BatchOutcome<UnaryForeignKeyCandidate>> {
    let mut outcome = BatchOutcome::new();
    let mut trivial = 0usize;
    for (position, pind) in pinds.into_iter().enumerate() {
        if pind.is_unary() && pind.is_trivial() {
            trivial += 1;
            continue;
        }
        outcome.record(policy, position, pind.to_unary_candidate())?;
    }
    debug!(
        accepted = outcome.accepted.len(),
        rejected = outcome.rejected.len(),
        trivial,
        "Built foreign-key candidates"
    );
    Ok(outcome)
}
