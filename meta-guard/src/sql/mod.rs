//! Extraction of tables and declared keys from SQL DDL.
//!
//! Declared primary and foreign keys serve as ground truth when evaluating
//! classification results, and `CREATE TABLE` statements can seed a
//! [`Catalog`](crate::catalog::Catalog). Scripts are parsed with `sqlparser`;
//! nothing here executes SQL.
//!
//! ## Example
//!
//! ```rust
//! use meta_guard::sql::{parse_foreign_keys, parse_schema};
//!
//! # fn main() -> meta_guard::error::Result<()> {
//! let ddl = r#"
//!     CREATE TABLE customers (id INTEGER PRIMARY KEY, name TEXT);
//!     CREATE TABLE orders (
//!         id INTEGER PRIMARY KEY,
//!         customer_id INTEGER REFERENCES customers
//!     );
//! "#;
//!
//! let schema = parse_schema(ddl)?;
//! assert_eq!(schema["orders"][1].name, "customer_id");
//!
//! let fks = parse_foreign_keys(ddl)?;
//! assert_eq!(fks[0].referenced_table, "customers");
//! // An omitted column list resolves to the referenced primary key.
//! assert_eq!(fks[0].referenced_columns, vec!["id".to_string()]);
//! # Ok(())
//! # }
//! ```

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::{debug, instrument, warn};

use crate::error::Result;

mod parser;

pub use parser::{
    parse_statements, ColumnDefinition, CreateTable, ForeignKeyDefinition, PrimaryKeyDefinition,
    Statement, TableConstraint,
};

/// Reads a DDL script from disk.
#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn load_sql_file(path: impl AsRef<Path>) -> Result<String> {
    let sql = std::fs::read_to_string(path.as_ref())?;
    debug!(bytes = sql.len(), "Loaded SQL file");
    Ok(sql)
}

/// Tables and their columns, in declaration order, keyed by table name.
///
/// A table declared twice keeps its last definition.
pub fn parse_schema(sql: &str) -> Result<BTreeMap<String, Vec<ColumnDefinition>>> {
    let mut tables = BTreeMap::new();
    for statement in parse_statements(sql)? {
        if let Statement::CreateTable(table) = statement {
            if tables.insert(table.name.clone(), table.columns).is_some() {
                warn!(table = %table.name, "Table declared more than once; keeping the last definition");
            }
        }
    }
    Ok(tables)
}

/// Primary keys declared in `CREATE TABLE` or added by `ALTER TABLE`.
pub fn parse_primary_keys(sql: &str) -> Result<Vec<PrimaryKeyDefinition>> {
    Ok(primary_keys(&parse_statements(sql)?))
}

/// Foreign keys declared in `CREATE TABLE` or added by `ALTER TABLE`.
///
/// References without a column list resolve to the referenced table's
/// primary key when the script declares one.
pub fn parse_foreign_keys(sql: &str) -> Result<Vec<ForeignKeyDefinition>> {
    let statements = parse_statements(sql)?;
    let primary: HashMap<String, Vec<String>> = primary_keys(&statements)
        .into_iter()
        .map(|pk| (pk.table, pk.columns))
        .collect();

    let mut foreign_keys = Vec::new();
    for (table, constraint) in constraints(&statements) {
        if let TableConstraint::ForeignKey {
            columns,
            referenced_table,
            referenced_columns,
        } = constraint
        {
            let referenced_columns = if referenced_columns.is_empty() {
                match primary.get(referenced_table) {
                    Some(pk) if pk.len() == columns.len() => pk.clone(),
                    _ => {
                        warn!(
                            table,
                            referenced_table = %referenced_table,
                            "Foreign key without column list and no matching primary key"
                        );
                        Vec::new()
                    }
                }
            } else {
                referenced_columns.clone()
            };
            foreign_keys.push(ForeignKeyDefinition {
                table: table.to_string(),
                columns: columns.clone(),
                referenced_table: referenced_table.clone(),
                referenced_columns,
            });
        }
    }
    Ok(foreign_keys)
}

fn primary_keys(statements: &[Statement]) -> Vec<PrimaryKeyDefinition> {
    constraints(statements)
        .filter_map(|(table, constraint)| match constraint {
            TableConstraint::PrimaryKey(columns) => Some(PrimaryKeyDefinition {
                table: table.to_string(),
                columns: columns.clone(),
            }),
            _ => None,
        })
        .collect()
}

fn constraints(statements: &[Statement]) -> impl Iterator<Item = (&str, &TableConstraint)> {
    statements.iter().flat_map(|statement| {
        let (table, constraints) = match statement {
            Statement::CreateTable(table) => (table.name.as_str(), &table.constraints),
            Statement::AlterTable { table, constraints } => (table.as_str(), constraints),
        };
        constraints.iter().map(move |c| (table, c))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRIMARY_KEYS: &str = r#"
        CREATE TABLE table1 (id INT PRIMARY KEY, name TEXT);
        CREATE TABLE table2 (id INT, PRIMARY KEY (id));
        CREATE TABLE table3 (first_name TEXT, last_name TEXT, CONSTRAINT pk3 PRIMARY KEY (first_name, last_name));
        CREATE TABLE table4 (added_id INT);
        ALTER TABLE table4 ADD PRIMARY KEY (added_id);
        CREATE TABLE table5 (added_fn TEXT, added_ln TEXT);
        ALTER TABLE table5 ADD CONSTRAINT pk5 PRIMARY KEY (added_fn, added_ln);
    "#;

    const FOREIGN_KEYS: &str = r#"
        CREATE TABLE ref1 (id INT PRIMARY KEY);
        CREATE TABLE dep1 (that_id INT REFERENCES ref1 (id));
        CREATE TABLE dep2 (that_id INT, FOREIGN KEY (that_id) REFERENCES ref2 (id));
        CREATE TABLE dep3 (first_name TEXT, last_name TEXT,
            CONSTRAINT fk3 FOREIGN KEY (first_name, last_name) REFERENCES ref3 (fn, ln));
        CREATE TABLE dep4 (that_oid INT);
        ALTER TABLE dep4 ADD CONSTRAINT fk4 FOREIGN KEY (that_oid) REFERENCES ref4 (oid);
        CREATE TABLE dep5 (first_name TEXT, last_name TEXT);
        ALTER TABLE dep5 ADD FOREIGN KEY (first_name, last_name) REFERENCES ref5 (fn, ln);
    "#;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_parse_primary_keys() {
        let keys = parse_primary_keys(PRIMARY_KEYS).unwrap();
        let expected = vec![
            ("table1", strings(&["id"])),
            ("table2", strings(&["id"])),
            ("table3", strings(&["first_name", "last_name"])),
            ("table4", strings(&["added_id"])),
            ("table5", strings(&["added_fn", "added_ln"])),
        ];
        let actual: Vec<(&str, Vec<String>)> = keys
            .iter()
            .map(|k| (k.table.as_str(), k.columns.clone()))
            .collect();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_parse_foreign_keys() {
        let keys = parse_foreign_keys(FOREIGN_KEYS).unwrap();
        assert_eq!(keys.len(), 5);
        assert_eq!(
            keys[0],
            ForeignKeyDefinition {
                table: "dep1".to_string(),
                columns: strings(&["that_id"]),
                referenced_table: "ref1".to_string(),
                referenced_columns: strings(&["id"]),
            }
        );
        assert_eq!(keys[2].arity(), 2);
        assert_eq!(keys[2].referenced_columns, strings(&["fn", "ln"]));
        assert_eq!(keys[3].table, "dep4");
        assert_eq!(keys[3].referenced_columns, strings(&["oid"]));
        assert_eq!(keys[4].referenced_table, "ref5");
    }

    #[test]
    fn test_unresolvable_implicit_reference() {
        let keys = parse_foreign_keys("CREATE TABLE a (b_id INT REFERENCES b);").unwrap();
        assert!(keys[0].referenced_columns.is_empty());
    }

    #[test]
    fn test_parse_schema() {
        let schema = parse_schema(PRIMARY_KEYS).unwrap();
        assert_eq!(schema.len(), 5);
        let names: Vec<&str> = schema["table3"].iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["first_name", "last_name"]);
        assert_eq!(schema["table1"][1].data_type.as_deref(), Some("TEXT"));
    }

    #[test]
    fn test_load_sql_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schema.sql");
        std::fs::write(&path, FOREIGN_KEYS).unwrap();

        let sql = load_sql_file(&path).unwrap();
        assert_eq!(parse_foreign_keys(&sql).unwrap().len(), 5);
        assert!(load_sql_file(dir.path().join("missing.sql")).is_err());
    }
}
