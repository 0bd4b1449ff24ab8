//! Declared-type compatibility classifier.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::catalog::Catalog;
use crate::error::Result;
use crate::fk::{ForeignKeyLabel, UnaryForeignKeyCandidate};

use super::{validate_weight, PartialForeignKeyClassifier};

#[allow(clippy::expect_used)]
static TYPE_PARAMETERS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*\(.*\)\s*").expect("Hard-coded regex pattern should be valid"));

/// Broad groups of SQL data types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeFamily {
    Integer,
    Decimal,
    Text,
    Temporal,
    Boolean,
    Binary,
    Uuid,
}

impl TypeFamily {
    /// Family of a normalized type name, if it is a known one.
    pub fn of(normalized: &str) -> Option<Self> {
        let family = match normalized {
            "int" | "integer" | "smallint" | "bigint" | "tinyint" | "mediumint" | "int2"
            | "int4" | "int8" | "serial" | "smallserial" | "bigserial" => TypeFamily::Integer,
            "decimal" | "numeric" | "real" | "float" | "float4" | "float8" | "double"
            | "double precision" | "money" => TypeFamily::Decimal,
            "char" | "character" | "varchar" | "character varying" | "nchar" | "nvarchar"
            | "text" | "string" | "clob" | "varchar2" => TypeFamily::Text,
            "date" | "time" | "timestamp" | "timestamptz" | "datetime" | "interval"
            | "timestamp with time zone" | "timestamp without time zone" => TypeFamily::Temporal,
            "bool" | "boolean" | "bit" => TypeFamily::Boolean,
            "blob" | "bytea" | "binary" | "varbinary" => TypeFamily::Binary,
            "uuid" => TypeFamily::Uuid,
            _ => return None,
        };
        Some(family)
    }
}

/// Lowercases a declared type and strips length/precision parameters.
///
/// `VARCHAR(255)` and `varchar` normalize to the same name.
pub fn normalize_type(declared: &str) -> String {
    let stripped = TYPE_PARAMETERS.replace_all(declared, " ");
    stripped
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Compares the declared types of the two sides of a candidate.
///
/// Identical normalized types are `FOREIGN_KEY`, types from different
/// families are `NO_FOREIGN_KEY`. Related types (e.g. `int` and `bigint`),
/// unrecognized types and columns without a declared type are `UNKNOWN`.
#[derive(Debug, Clone)]
pub struct TypeCompatibilityClassifier {
    weight: f64,
    catalog: Arc<Catalog>,
}

impl TypeCompatibilityClassifier {
    /// Name recorded on this classifier's results.
    pub const NAME: &'static str = "type_compatibility";

    /// Creates the classifier over a catalog snapshot.
    pub fn new(weight: f64, catalog: Arc<Catalog>) -> Result<Self> {
        validate_weight(weight)?;
        Ok(Self { weight, catalog })
    }
}

impl PartialForeignKeyClassifier for TypeCompatibilityClassifier {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn weight(&self) -> f64 {
        self.weight
    }

    fn judge(&self, candidate: &UnaryForeignKeyCandidate) -> ForeignKeyLabel {
        let declared = |id| {
            self.catalog
                .column(id)
                .and_then(|c| c.data_type())
                .map(normalize_type)
        };
        let (Some(dependent), Some(referenced)) = (
            declared(candidate.dependent_column_id),
            declared(candidate.referenced_column_id),
        ) else {
            return ForeignKeyLabel::Unknown;
        };

        if dependent == referenced {
            return ForeignKeyLabel::ForeignKey;
        }
        match (TypeFamily::of(&dependent), TypeFamily::of(&referenced)) {
            (Some(a), Some(b)) if a != b => ForeignKeyLabel::NoForeignKey,
            _ => ForeignKeyLabel::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ColumnId, Location};

    fn setup() -> (TypeCompatibilityClassifier, Vec<ColumnId>) {
        let mut catalog = Catalog::new();
        let schema = catalog.add_schema("s", Location::new()).unwrap();
        let table = catalog.add_table(schema, "t", Location::new()).unwrap();
        let ids = vec![
            catalog.add_column(table, "a", Some("INTEGER")).unwrap(),
            catalog.add_column(table, "b", Some("integer")).unwrap(),
            catalog.add_column(table, "c", Some("BIGINT")).unwrap(),
            catalog.add_column(table, "d", Some("VARCHAR(20)")).unwrap(),
            catalog.add_column(table, "e", None).unwrap(),
            catalog.add_column(table, "f", Some("geometry")).unwrap(),
        ];
        let classifier = TypeCompatibilityClassifier::new(1.0, Arc::new(catalog)).unwrap();
        (classifier, ids)
    }

    #[test]
    fn test_normalize_type() {
        assert_eq!(normalize_type("VARCHAR(255)"), "varchar");
        assert_eq!(normalize_type("Decimal (10, 2)"), "decimal");
        assert_eq!(normalize_type("  double   precision "), "double precision");
    }

    #[test]
    fn test_verdicts() {
        let (classifier, ids) = setup();
        let judge = |a: usize, b: usize| {
            classifier.judge(&UnaryForeignKeyCandidate::new(ids[a], ids[b]))
        };

        assert_eq!(judge(0, 1), ForeignKeyLabel::ForeignKey);
        assert_eq!(judge(0, 2), ForeignKeyLabel::Unknown);
        assert_eq!(judge(0, 3), ForeignKeyLabel::NoForeignKey);
        assert_eq!(judge(0, 4), ForeignKeyLabel::Unknown);
        assert_eq!(judge(0, 5), ForeignKeyLabel::Unknown);
    }

    #[test]
    fn test_unknown_column() {
        let (classifier, ids) = setup();
        let candidate = UnaryForeignKeyCandidate::new(ids[0], ColumnId::new(0x00ff_ffff));
        assert_eq!(classifier.judge(&candidate), ForeignKeyLabel::Unknown);
    }
}
