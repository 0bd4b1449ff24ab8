//! Quality of a classification run against declared foreign keys.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{info, instrument};

use crate::catalog::Catalog;
use crate::sql::ForeignKeyDefinition;

use super::{ClassificationReport, UnaryForeignKeyCandidate};

/// Precision and recall of predicted foreign keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub true_positives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
    /// `tp / (tp + fp)`, `0` when nothing was predicted
    pub precision: f64,
    /// `tp / (tp + fn)`, `0` when the ground truth is empty
    pub recall: f64,
    /// Harmonic mean of precision and recall, `0` when both are `0`
    pub f1: f64,
    /// Ground-truth keys that could not be compared, with the reason
    pub diagnostics: Vec<String>,
}

/// Compares the foreign keys of a report with declared ones.
///
/// Only unary declared keys are compared. Their names are resolved through
/// the catalog; a key whose table or columns are missing or ambiguous is
/// skipped and recorded in [`EvaluationResult::diagnostics`].
#[instrument(skip_all, fields(decisions = report.decisions.len(), ground_truth = ground_truth.len()))]
pub fn evaluate(
    report: &ClassificationReport,
    ground_truth: &[ForeignKeyDefinition],
    catalog: &Catalog,
) -> EvaluationResult {
    let mut diagnostics = Vec::new();
    let mut expected = BTreeSet::new();
    for definition in ground_truth {
        match resolve(definition, catalog) {
            Ok(candidate) => {
                expected.insert(candidate);
            }
            Err(reason) => diagnostics.push(format!(
                "{}({}) -> {}({}): {reason}",
                definition.table,
                definition.columns.join(", "),
                definition.referenced_table,
                definition.referenced_columns.join(", ")
            )),
        }
    }

    let predicted: BTreeSet<UnaryForeignKeyCandidate> =
        report.foreign_keys().map(|d| d.candidate).collect();
    let true_positives = predicted.intersection(&expected).count();
    let false_positives = predicted.len() - true_positives;
    let false_negatives = expected.len() - true_positives;

    let precision = ratio(true_positives, true_positives + false_positives);
    let recall = ratio(true_positives, true_positives + false_negatives);
    let f1 = if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    };

    info!(
        true_positives,
        false_positives,
        false_negatives,
        precision,
        recall,
        skipped = diagnostics.len(),
        "Evaluated classification against ground truth"
    );

    EvaluationResult {
        true_positives,
        false_positives,
        false_negatives,
        precision,
        recall,
        f1,
        diagnostics,
    }
}

fn resolve(
    definition: &ForeignKeyDefinition,
    catalog: &Catalog,
) -> std::result::Result<UnaryForeignKeyCandidate, String> {
    let ([column], [referenced_column]) = (
        definition.columns.as_slice(),
        definition.referenced_columns.as_slice(),
    ) else {
        return Err(format!(
            "only unary foreign keys are compared (arity {}, {} referenced columns)",
            definition.arity(),
            definition.referenced_columns.len()
        ));
    };

    let dependent = catalog
        .resolve_column(&definition.table, column)
        .map_err(|e| e.to_string())?;
    let referenced = catalog
        .resolve_column(&definition.referenced_table, referenced_column)
        .map_err(|e| e.to_string())?;
    Ok(UnaryForeignKeyCandidate::new(dependent.id(), referenced.id()))
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}
