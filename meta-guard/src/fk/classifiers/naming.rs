//! Naming-similarity classifier.

use std::sync::Arc;

use crate::catalog::Catalog;
use crate::error::Result;
use crate::fk::{ForeignKeyLabel, UnaryForeignKeyCandidate};

use super::{label_for_score, validate_thresholds, validate_weight, PartialForeignKeyClassifier};

/// Compares the dependent column's name with what it references.
///
/// The dependent name is reduced to its stem (`fk_customer_id` becomes
/// `customer`) and scored by Jaro–Winkler similarity against the referenced
/// table's singular name and the referenced column's name; the best score
/// counts. Columns with equal names score `1.0`.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use meta_guard::catalog::{Catalog, Location};
/// use meta_guard::fk::{
///     ForeignKeyLabel, NamingClassifier, PartialForeignKeyClassifier, UnaryForeignKeyCandidate,
/// };
///
/// # fn main() -> meta_guard::error::Result<()> {
/// let mut catalog = Catalog::new();
/// let shop = catalog.add_schema("shop", Location::new())?;
/// let customers = catalog.add_table(shop, "customers", Location::new())?;
/// let orders = catalog.add_table(shop, "orders", Location::new())?;
/// let id = catalog.add_column(customers, "id", None)?;
/// let customer_id = catalog.add_column(orders, "customer_id", None)?;
///
/// let classifier = NamingClassifier::new(1.0, 0.9, 0.6, Arc::new(catalog))?;
/// let candidate = UnaryForeignKeyCandidate::new(customer_id, id);
/// assert_eq!(classifier.judge(&candidate), ForeignKeyLabel::ForeignKey);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct NamingClassifier {
    weight: f64,
    fk_similarity: f64,
    non_fk_similarity: f64,
    catalog: Arc<Catalog>,
}

impl NamingClassifier {
    /// Name recorded on this classifier's results.
    pub const NAME: &'static str = "naming";

    /// Creates the classifier; similarities must satisfy `1 >= fk >= non_fk >= 0`.
    pub fn new(
        weight: f64,
        fk_similarity: f64,
        non_fk_similarity: f64,
        catalog: Arc<Catalog>,
    ) -> Result<Self> {
        validate_weight(weight)?;
        validate_thresholds("naming similarity", fk_similarity, non_fk_similarity)?;
        if fk_similarity > 1.0 {
            return Err(crate::error::MetaError::invalid_argument(format!(
                "naming similarity threshold must not exceed 1, got {fk_similarity}"
            )));
        }
        Ok(Self {
            weight,
            fk_similarity,
            non_fk_similarity,
            catalog,
        })
    }

    /// Similarity score of a candidate, or `None` if a column is unknown.
    pub fn similarity(&self, candidate: &UnaryForeignKeyCandidate) -> Option<f64> {
        let dependent = self.catalog.column(candidate.dependent_column_id)?;
        let referenced = self.catalog.column(candidate.referenced_column_id)?;
        let referenced_table = self.catalog.table_of(candidate.referenced_column_id)?;

        if dependent.name().eq_ignore_ascii_case(referenced.name()) {
            return Some(1.0);
        }

        let stem = column_stem(dependent.name());
        let by_table = strsim::jaro_winkler(&stem, &singular(&referenced_table.name().to_lowercase()));
        let by_column = strsim::jaro_winkler(&stem, &referenced.name().to_lowercase());
        Some(by_table.max(by_column))
    }
}

impl PartialForeignKeyClassifier for NamingClassifier {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn weight(&self) -> f64 {
        self.weight
    }

    fn judge(&self, candidate: &UnaryForeignKeyCandidate) -> ForeignKeyLabel {
        match self.similarity(candidate) {
            Some(score) => label_for_score(score, self.fk_similarity, self.non_fk_similarity),
            None => ForeignKeyLabel::Unknown,
        }
    }
}

/// Lowercased column name without `fk_` prefix and `_id`/`id` suffix.
fn column_stem(name: &str) -> String {
    let lower = name.to_lowercase();
    let mut stem = lower.as_str();
    if let Some(rest) = stem.strip_prefix("fk_") {
        if !rest.is_empty() {
            stem = rest;
        }
    }
    for suffix in ["_id", "id"] {
        if let Some(rest) = stem.strip_suffix(suffix) {
            if !rest.is_empty() {
                stem = rest;
                break;
            }
        }
    }
    stem.trim_end_matches('_').to_string()
}

fn singular(name: &str) -> String {
    if let Some(rest) = name.strip_suffix("ies") {
        format!("{rest}y")
    } else if name.ends_with("ss") {
        name.to_string()
    } else if let Some(rest) = name.strip_suffix('s') {
        rest.to_string()
    } else {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ColumnId, Location};

    #[test]
    fn test_column_stem() {
        assert_eq!(column_stem("customer_id"), "customer");
        assert_eq!(column_stem("FK_Customer_ID"), "customer");
        assert_eq!(column_stem("customerid"), "customer");
        assert_eq!(column_stem("id"), "id");
        assert_eq!(column_stem("fk_"), "fk");
        assert_eq!(column_stem("region"), "region");
    }

    #[test]
    fn test_singular() {
        assert_eq!(singular("categories"), "category");
        assert_eq!(singular("orders"), "order");
        assert_eq!(singular("address"), "address");
        assert_eq!(singular("person"), "person");
    }

    fn setup() -> (NamingClassifier, [ColumnId; 4]) {
        let mut catalog = Catalog::new();
        let schema = catalog.add_schema("shop", Location::new()).unwrap();
        let customers = catalog.add_table(schema, "customers", Location::new()).unwrap();
        let orders = catalog.add_table(schema, "orders", Location::new()).unwrap();
        let customer_pk = catalog.add_column(customers, "id", None).unwrap();
        let order_customer = catalog.add_column(orders, "customer_id", None).unwrap();
        let order_total = catalog.add_column(orders, "total_amount", None).unwrap();
        let order_id = catalog.add_column(orders, "id", None).unwrap();
        let classifier = NamingClassifier::new(1.0, 0.9, 0.6, Arc::new(catalog)).unwrap();
        (classifier, [customer_pk, order_customer, order_total, order_id])
    }

    #[test]
    fn test_verdicts() {
        let (classifier, [customer_pk, order_customer, order_total, order_id]) = setup();

        let fk = UnaryForeignKeyCandidate::new(order_customer, customer_pk);
        assert_eq!(classifier.judge(&fk), ForeignKeyLabel::ForeignKey);

        let unrelated = UnaryForeignKeyCandidate::new(order_total, customer_pk);
        assert_eq!(classifier.judge(&unrelated), ForeignKeyLabel::NoForeignKey);

        let same_name = UnaryForeignKeyCandidate::new(order_id, customer_pk);
        assert_eq!(classifier.similarity(&same_name), Some(1.0));
    }

    #[test]
    fn test_unknown_columns() {
        let (classifier, [customer_pk, ..]) = setup();
        let candidate = UnaryForeignKeyCandidate::new(ColumnId::new(0x00ab_c000), customer_pk);
        assert_eq!(classifier.judge(&candidate), ForeignKeyLabel::Unknown);
    }
}
