//! Partial (approximate) n-ary inclusion dependencies.
//!
//! A [`PartialInclusionDependency`] states that the projection of a dependent
//! relation on `dependent_column_ids` is contained in the projection of the
//! referenced relation on `referenced_column_ids`, except for an `error`
//! fraction of violating tuples.
//!
//! Column pairs are index-aligned: position `i` relates
//! `dependent_column_ids[i]` to `referenced_column_ids[i]`. The dependent ids
//! are strictly ascending, which lets [`is_implied_by`] decide containment
//! with a single sorted co-iteration.
//!
//! [`is_implied_by`]: PartialInclusionDependency::is_implied_by

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use crate::catalog::ColumnId;
use crate::error::{MetaError, Result};

use super::{Constraint, ConstraintKind};

/// Raw, unvalidated inclusion dependency as delivered by upstream discovery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawInclusionDependency {
    /// Dependent column ids; must be strictly ascending
    pub dependent_column_ids: Vec<ColumnId>,
    /// Referenced column ids, paired by position with the dependent ids
    pub referenced_column_ids: Vec<ColumnId>,
    /// Fraction of violating tuples
    #[serde(default)]
    pub error: f64,
    /// Cardinality of the dependent relation
    #[serde(default)]
    pub dependent_size: u64,
}

/// A validated partial inclusion dependency.
///
/// # Examples
///
/// ```rust
/// use meta_guard::catalog::ColumnId;
/// use meta_guard::constraints::PartialInclusionDependency;
///
/// # fn main() -> meta_guard::error::Result<()> {
/// let ids = |raw: &[u32]| raw.iter().copied().map(ColumnId::new).collect::<Vec<_>>();
///
/// let a = PartialInclusionDependency::new(ids(&[1]), ids(&[2]), 0.0, 100)?;
/// let b = PartialInclusionDependency::new(ids(&[1, 3]), ids(&[2, 4]), 0.0, 100)?;
///
/// assert!(a.is_implied_by(&b));
/// assert!(!b.is_implied_by(&a));
/// assert_eq!(b.to_string(), "[1,3] ⊆ [2,4]");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawInclusionDependency", into = "RawInclusionDependency")]
pub struct PartialInclusionDependency {
    dependent_column_ids: Vec<ColumnId>,
    referenced_column_ids: Vec<ColumnId>,
    error: f64,
    dependent_size: u64,
}

impl PartialInclusionDependency {
    /// Creates an inclusion dependency.
    ///
    /// # Errors
    ///
    /// Fails with [`MetaError::InvalidArgument`] if the id arrays are empty
    /// or differ in length, if the dependent ids are not strictly ascending,
    /// or if `error` is not a finite value in `[0, 1]`.
    pub fn new(
        dependent_column_ids: Vec<ColumnId>,
        referenced_column_ids: Vec<ColumnId>,
        error: f64,
        dependent_size: u64,
    ) -> Result<Self> {
        if dependent_column_ids.len() != referenced_column_ids.len() {
            return Err(MetaError::invalid_argument(format!(
                "dependent and referenced columns differ in length ({} vs {})",
                dependent_column_ids.len(),
                referenced_column_ids.len()
            )));
        }
        if dependent_column_ids.is_empty() {
            return Err(MetaError::invalid_argument(
                "inclusion dependencies need at least one column pair",
            ));
        }
        if let Some(pos) = dependent_column_ids.windows(2).position(|w| w[0] >= w[1]) {
            return Err(MetaError::invalid_argument(format!(
                "dependent column ids are not strictly ascending at position {}: {} >= {}",
                pos + 1,
                dependent_column_ids[pos],
                dependent_column_ids[pos + 1]
            )));
        }
        if !error.is_finite() || !(0.0..=1.0).contains(&error) {
            return Err(MetaError::invalid_argument(format!(
                "error must lie in [0, 1], got {error}"
            )));
        }

        Ok(Self {
            dependent_column_ids,
            referenced_column_ids,
            error,
            dependent_size,
        })
    }

    /// Creates a unary inclusion dependency.
    pub fn unary(
        dependent_column_id: ColumnId,
        referenced_column_id: ColumnId,
        error: f64,
        dependent_size: u64,
    ) -> Result<Self> {
        Self::new(
            vec![dependent_column_id],
            vec![referenced_column_id],
            error,
            dependent_size,
        )
    }

    /// Dependent column ids, strictly ascending.
    pub fn dependent_column_ids(&self) -> &[ColumnId] {
        &self.dependent_column_ids
    }

    /// Referenced column ids, paired by position with the dependent ids.
    pub fn referenced_column_ids(&self) -> &[ColumnId] {
        &self.referenced_column_ids
    }

    /// Fraction of violating dependent tuples.
    pub fn error(&self) -> f64 {
        self.error
    }

    /// Cardinality of the dependent relation.
    pub fn dependent_size(&self) -> u64 {
        self.dependent_size
    }

    /// Number of column pairs.
    pub fn arity(&self) -> usize {
        self.dependent_column_ids.len()
    }

    /// Whether each dependent column references itself.
    pub fn is_trivial(&self) -> bool {
        self.dependent_column_ids == self.referenced_column_ids
    }

    /// Checks whether this dependency is implied by `that`, i.e. whether every
    /// column pair of `self` also occurs among the pairs of `that`.
    ///
    /// The check is purely structural and ignores `error` and
    /// `dependent_size`; whether a covered dependency may be dropped is left to
    /// the caller (see [`MinimalCover`](super::MinimalCover)).
    pub fn is_implied_by(&self, that: &PartialInclusionDependency) -> bool {
        let (this_arity, that_arity) = (self.arity(), that.arity());
        if this_arity > that_arity {
            return false;
        }

        // Co-iterate both dependencies along their sorted dependent ids.
        let (mut i, mut j) = (0, 0);
        while i < this_arity && j < that_arity && this_arity - i <= that_arity - j {
            let order = match self.dependent_column_ids[i].cmp(&that.dependent_column_ids[j]) {
                Ordering::Equal => {
                    self.referenced_column_ids[i].cmp(&that.referenced_column_ids[j])
                }
                unequal => unequal,
            };
            match order {
                Ordering::Equal => {
                    i += 1;
                    j += 1;
                }
                Ordering::Greater => j += 1,
                // Sorted order rules out any later match.
                Ordering::Less => return false,
            }
        }

        i == this_arity
    }

    /// Returns `true` for unary dependencies.
    pub fn is_unary(&self) -> bool {
        self.arity() == 1
    }

    pub(crate) fn structural_cmp(&self, other: &Self) -> Ordering {
        self.dependent_column_ids
            .cmp(&other.dependent_column_ids)
            .then_with(|| self.referenced_column_ids.cmp(&other.referenced_column_ids))
    }
}

impl Constraint for PartialInclusionDependency {
    fn kind(&self) -> ConstraintKind {
        ConstraintKind::InclusionDependency
    }

    /// Dependent ids followed by referenced ids, each half in pair order.
    fn all_target_ids(&self) -> Vec<ColumnId> {
        let mut ids = Vec::with_capacity(self.arity() * 2);
        ids.extend_from_slice(&self.dependent_column_ids);
        ids.extend_from_slice(&self.referenced_column_ids);
        ids
    }
}

impl TryFrom<RawInclusionDependency> for PartialInclusionDependency {
    type Error = MetaError;

    fn try_from(raw: RawInclusionDependency) -> Result<Self> {
        Self::new(
            raw.dependent_column_ids,
            raw.referenced_column_ids,
            raw.error,
            raw.dependent_size,
        )
    }
}

impl From<PartialInclusionDependency> for RawInclusionDependency {
    fn from(pind: PartialInclusionDependency) -> Self {
        Self {
            dependent_column_ids: pind.dependent_column_ids,
            referenced_column_ids: pind.referenced_column_ids,
            error: pind.error,
            dependent_size: pind.dependent_size,
        }
    }
}

impl fmt::Display for PartialInclusionDependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_ids(f, &self.dependent_column_ids)?;
        write!(f, " \u{2286} ")?;
        write_ids(f, &self.referenced_column_ids)
    }
}

fn write_ids(f: &mut fmt::Formatter<'_>, ids: &[ColumnId]) -> fmt::Result {
    write!(f, "[")?;
    for (pos, id) in ids.iter().enumerate() {
        if pos > 0 {
            write!(f, ",")?;
        }
        write!(f, "{id}")?;
    }
    write!(f, "]")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[u32]) -> Vec<ColumnId> {
        raw.iter().copied().map(ColumnId::new).collect()
    }

    fn pind(dep: &[u32], refd: &[u32]) -> PartialInclusionDependency {
        PartialInclusionDependency::new(ids(dep), ids(refd), 0.0, 10).unwrap()
    }

    #[test]
    fn test_mismatched_lengths_rejected() {
        let err = PartialInclusionDependency::new(ids(&[1, 2]), ids(&[3]), 0.0, 1).unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_unsorted_dependent_ids_rejected() {
        assert!(PartialInclusionDependency::new(ids(&[3, 1]), ids(&[4, 2]), 0.0, 1).is_err());
        // Duplicates are not strictly ascending either.
        assert!(PartialInclusionDependency::new(ids(&[1, 1]), ids(&[4, 2]), 0.0, 1).is_err());
    }

    #[test]
    fn test_empty_and_bad_error_rejected() {
        assert!(PartialInclusionDependency::new(vec![], vec![], 0.0, 1).is_err());
        assert!(PartialInclusionDependency::new(ids(&[1]), ids(&[2]), 1.5, 1).is_err());
        assert!(PartialInclusionDependency::new(ids(&[1]), ids(&[2]), -0.1, 1).is_err());
        assert!(PartialInclusionDependency::new(ids(&[1]), ids(&[2]), f64::NAN, 1).is_err());
    }

    #[test]
    fn test_referenced_ids_need_not_be_sorted() {
        let p = pind(&[1, 2], &[9, 3]);
        assert_eq!(p.referenced_column_ids(), ids(&[9, 3]).as_slice());
    }

    #[test]
    fn test_triviality() {
        assert!(pind(&[1, 2], &[1, 2]).is_trivial());
        assert!(!pind(&[1, 2], &[2, 1]).is_trivial());
        assert!(!pind(&[1], &[2]).is_trivial());
    }

    #[test]
    fn test_all_target_ids() {
        let p = pind(&[1, 5], &[10, 7]);
        assert_eq!(p.all_target_ids(), ids(&[1, 5, 10, 7]));
        assert_eq!(p.kind(), ConstraintKind::InclusionDependency);
    }

    #[test]
    fn test_unary_implied_by_binary() {
        let a = pind(&[1], &[2]);
        let b = pind(&[1, 3], &[2, 4]);
        assert!(a.is_implied_by(&b));
        assert!(!b.is_implied_by(&a));
    }

    #[test]
    fn test_reflexive() {
        let a = pind(&[1, 4, 9], &[20, 3, 11]);
        assert!(a.is_implied_by(&a));
    }

    #[test]
    fn test_implied_skipping_middle_pair() {
        let a = pind(&[1, 5], &[10, 50]);
        let b = pind(&[1, 3, 5], &[10, 30, 50]);
        assert!(a.is_implied_by(&b));
    }

    #[test]
    fn test_same_dependent_different_referenced() {
        let a = pind(&[1, 5], &[10, 51]);
        let b = pind(&[1, 3, 5], &[10, 30, 50]);
        assert!(!a.is_implied_by(&b));

        let c = pind(&[3], &[31]);
        assert!(!c.is_implied_by(&b));
    }

    #[test]
    fn test_missing_dependent_column() {
        let a = pind(&[2], &[20]);
        let b = pind(&[1, 3], &[10, 30]);
        assert!(!a.is_implied_by(&b));

        let tail = pind(&[4], &[40]);
        assert!(!tail.is_implied_by(&b));
    }

    #[test]
    fn test_implication_ignores_error() {
        let strict = PartialInclusionDependency::unary(ColumnId::new(1), ColumnId::new(2), 0.0, 5)
            .unwrap();
        let loose = PartialInclusionDependency::unary(ColumnId::new(1), ColumnId::new(2), 0.4, 5)
            .unwrap();
        assert!(strict.is_implied_by(&loose));
        assert!(loose.is_implied_by(&strict));
    }

    #[test]
    fn test_display() {
        assert_eq!(pind(&[1, 3], &[2, 4]).to_string(), "[1,3] ⊆ [2,4]");
        assert_eq!(pind(&[7], &[8]).to_string(), "[7] ⊆ [8]");
    }

    #[test]
    fn test_deserialization_validates() {
        let valid = r#"{"dependent_column_ids":[1,3],"referenced_column_ids":[2,4],"error":0.1,"dependent_size":50}"#;
        let p: PartialInclusionDependency = serde_json::from_str(valid).unwrap();
        assert_eq!(p.arity(), 2);
        assert_eq!(p.dependent_size(), 50);

        let unsorted = r#"{"dependent_column_ids":[3,1],"referenced_column_ids":[2,4]}"#;
        assert!(serde_json::from_str::<PartialInclusionDependency>(unsorted).is_err());
    }
}
