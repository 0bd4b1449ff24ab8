//! Reduction of inclusion dependency sets to a non-redundant cover.

use std::cmp::Ordering;
use tracing::{debug, instrument};

use crate::log_pruning;
use crate::logging::{truncate_field, LogConfig};

use super::PartialInclusionDependency;

/// Computes the non-redundant cover of a set of inclusion dependencies.
///
/// Candidates are visited by arity (largest first), then error (lowest
/// first), then by their column ids. A candidate is dropped when an already
/// retained dependency implies it and has an error no worse than its own;
/// otherwise it is retained. Structurally equal dependencies therefore
/// collapse onto the one with the lowest error.
///
/// The result is in visiting order, and running the engine on its own output
/// returns the same set.
///
/// # Examples
///
/// ```rust
/// use meta_guard::catalog::ColumnId;
/// use meta_guard::constraints::{MinimalCover, PartialInclusionDependency};
///
/// # fn main() -> meta_guard::error::Result<()> {
/// let ids = |raw: &[u32]| raw.iter().copied().map(ColumnId::new).collect::<Vec<_>>();
/// let unary = PartialInclusionDependency::new(ids(&[1]), ids(&[2]), 0.0, 10)?;
/// let binary = PartialInclusionDependency::new(ids(&[1, 3]), ids(&[2, 4]), 0.0, 10)?;
///
/// let cover = MinimalCover::new().compute(&[unary, binary.clone()]);
/// assert_eq!(cover, vec![binary]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MinimalCover {
    discard_trivial: bool,
    log_config: LogConfig,
}

impl MinimalCover {
    /// Creates an engine that keeps trivial dependencies.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether trivial dependencies (`X ⊆ X`) are dropped up front.
    pub fn discard_trivial(mut self, discard: bool) -> Self {
        self.discard_trivial = discard;
        self
    }

    /// Sets the logging configuration.
    pub fn with_log_config(mut self, config: LogConfig) -> Self {
        self.log_config = config;
        self
    }

    /// Returns the subset of `pinds` not implied by another retained member.
    #[instrument(skip(self, pinds), fields(input = pinds.len()))]
    pub fn compute(&self, pinds: &[PartialInclusionDependency]) -> Vec<PartialInclusionDependency> {
        let mut ordered: Vec<&PartialInclusionDependency> = pinds
            .iter()
            .filter(|p| !(self.discard_trivial && p.is_trivial()))
            .collect();
        ordered.sort_by(|a, b| visiting_order(a, b));

        let mut retained: Vec<PartialInclusionDependency> = Vec::with_capacity(ordered.len());
        for candidate in ordered {
            let cover = retained
                .iter()
                .find(|kept| kept.error() <= candidate.error() && candidate.is_implied_by(kept));
            match cover {
                Some(kept) => {
                    let limit = self.log_config.max_field_length;
                    log_pruning!(
                        self.log_config,
                        pruned = %truncate_field(&candidate.to_string(), limit),
                        covered_by = %truncate_field(&kept.to_string(), limit),
                        "Pruned redundant inclusion dependency"
                    );
                }
                None => retained.push(candidate.clone()),
            }
        }

        debug!(
            input = pinds.len(),
            retained = retained.len(),
            "Computed minimal inclusion dependency cover"
        );
        retained
    }
}

fn visiting_order(a: &PartialInclusionDependency, b: &PartialInclusionDependency) -> Ordering {
    b.arity()
        .cmp(&a.arity())
        .then_with(|| a.error().total_cmp(&b.error()))
        .then_with(|| a.structural_cmp(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ColumnId;

    fn pind(dep: &[u32], refd: &[u32], error: f64) -> PartialInclusionDependency {
        PartialInclusionDependency::new(
            dep.iter().copied().map(ColumnId::new).collect(),
            refd.iter().copied().map(ColumnId::new).collect(),
            error,
            100,
        )
        .unwrap()
    }

    #[test]
    fn test_empty_input() {
        assert!(MinimalCover::new().compute(&[]).is_empty());
    }

    #[test]
    fn test_subsumed_unary_removed() {
        let a = pind(&[1], &[2], 0.0);
        let b = pind(&[1, 3], &[2, 4], 0.0);
        let c = pind(&[5], &[6], 0.0);

        let cover = MinimalCover::new().compute(&[a, b.clone(), c.clone()]);
        assert_eq!(cover, vec![b, c]);
    }

    #[test]
    fn test_duplicates_keep_lowest_error() {
        let worse = pind(&[1], &[2], 0.3);
        let better = pind(&[1], &[2], 0.1);

        let cover = MinimalCover::new().compute(&[worse, better.clone()]);
        assert_eq!(cover, vec![better]);
    }

    #[test]
    fn test_covered_with_lower_error_is_kept() {
        // The unary dependency is structurally implied but holds more strictly.
        let loose_binary = pind(&[1, 3], &[2, 4], 0.2);
        let strict_unary = pind(&[1], &[2], 0.0);

        let cover = MinimalCover::new().compute(&[strict_unary.clone(), loose_binary.clone()]);
        assert_eq!(cover, vec![loose_binary, strict_unary]);
    }

    #[test]
    fn test_trivial_dependencies() {
        let trivial = pind(&[4], &[4], 0.0);
        let other = pind(&[1], &[2], 0.0);

        let kept = MinimalCover::new().compute(&[trivial.clone(), other.clone()]);
        assert_eq!(kept.len(), 2);

        let dropped = MinimalCover::new()
            .discard_trivial(true)
            .compute(&[trivial, other.clone()]);
        assert_eq!(dropped, vec![other]);
    }

    #[test]
    fn test_idempotent() {
        let input = vec![
            pind(&[1], &[2], 0.0),
            pind(&[1, 3], &[2, 4], 0.05),
            pind(&[3], &[4], 0.1),
            pind(&[3], &[4], 0.0),
            pind(&[1, 3, 5], &[2, 4, 6], 0.05),
            pind(&[7], &[8], 0.5),
        ];
        let engine = MinimalCover::new();
        let once = engine.compute(&input);
        let twice = engine.compute(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_order_independent() {
        let mut input = vec![
            pind(&[1, 3], &[2, 4], 0.0),
            pind(&[1], &[2], 0.0),
            pind(&[9], &[2], 0.2),
            pind(&[3], &[4], 0.0),
        ];
        let forward = MinimalCover::new().compute(&input);
        input.reverse();
        let backward = MinimalCover::new().compute(&input);
        assert_eq!(forward, backward);
    }
}
