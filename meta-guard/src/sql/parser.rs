//! Statement-level reader for `CREATE TABLE` and `ALTER TABLE` DDL.
//!
//! Scripts are parsed with `sqlparser` in its SQLite dialect; the resulting
//! AST is reduced to the tables, columns and key constraints needed for
//! schema extraction.

use serde::{Deserialize, Serialize};
use sqlparser::ast::{
    self, AlterTableOperation, ColumnDef, ColumnOption, Ident, ObjectName,
};
use sqlparser::dialect::SQLiteDialect;
use sqlparser::parser::Parser;
use tracing::{debug, instrument};

use crate::error::{MetaError, Result};

/// A column declared in a `CREATE TABLE` statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    pub name: String,
    /// Declared type in canonical form, e.g. `VARCHAR(255)`; absent for untyped columns
    pub data_type: Option<String>,
}

/// A primary key declared on a table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PrimaryKeyDefinition {
    pub table: String,
    pub columns: Vec<String>,
}

/// A foreign key declared on a table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ForeignKeyDefinition {
    /// The referencing table
    pub table: String,
    pub columns: Vec<String>,
    pub referenced_table: String,
    /// Referenced columns; empty when the DDL relies on the referenced
    /// table's primary key and that key is not declared in the same script
    pub referenced_columns: Vec<String>,
}

impl ForeignKeyDefinition {
    /// Number of column pairs.
    pub fn arity(&self) -> usize {
        self.columns.len()
    }
}

/// A key constraint, from either a column or a table definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableConstraint {
    PrimaryKey(Vec<String>),
    ForeignKey {
        columns: Vec<String>,
        referenced_table: String,
        referenced_columns: Vec<String>,
    },
}

/// A `CREATE TABLE` statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTable {
    pub name: String,
    pub columns: Vec<ColumnDefinition>,
    /// Column-level keys in column order, followed by table-level keys
    pub constraints: Vec<TableConstraint>,
}

/// A DDL statement relevant to schema extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    CreateTable(CreateTable),
    /// `ALTER TABLE` with the key constraints it adds
    AlterTable {
        table: String,
        constraints: Vec<TableConstraint>,
    },
}

/// Parses every `CREATE TABLE` and `ALTER TABLE .. ADD` statement of a
/// script; other statements are skipped.
///
/// Unquoted identifiers are lowercased, qualified names keep only their last
/// part. Syntax errors anywhere in the script fail the whole script.
#[instrument(skip_all, fields(bytes = sql.len()))]
pub fn parse_statements(sql: &str) -> Result<Vec<Statement>> {
    let parsed = Parser::parse_sql(&SQLiteDialect {}, sql)
        .map_err(|e| MetaError::Parse(format!("invalid DDL: {e}")))?;

    let mut statements = Vec::new();
    for (index, statement) in parsed.iter().enumerate() {
        let statement = convert_statement(statement)
            .map_err(|e| MetaError::Parse(format!("statement {}: {e}", index + 1)))?;
        if let Some(statement) = statement {
            statements.push(statement);
        }
    }
    debug!(
        parsed = parsed.len(),
        statements = statements.len(),
        "Parsed DDL statements"
    );
    Ok(statements)
}

fn convert_statement(statement: &ast::Statement) -> Result<Option<Statement>> {
    match statement {
        ast::Statement::CreateTable {
            name,
            columns,
            constraints,
            query,
            ..
        } => {
            // CREATE TABLE .. AS SELECT carries no column list.
            if query.is_some() && columns.is_empty() {
                return Ok(None);
            }
            let name = object_name(name)?;
            let mut table = CreateTable {
                name,
                columns: Vec::with_capacity(columns.len()),
                constraints: Vec::new(),
            };
            for column in columns {
                convert_column(column, &mut table)?;
            }
            for constraint in constraints {
                if let Some(constraint) = convert_constraint(constraint)? {
                    table.constraints.push(constraint);
                }
            }
            Ok(Some(Statement::CreateTable(table)))
        }
        ast::Statement::AlterTable {
            name, operations, ..
        } => {
            let mut constraints = Vec::new();
            for operation in operations {
                if let AlterTableOperation::AddConstraint(constraint) = operation {
                    if let Some(constraint) = convert_constraint(constraint)? {
                        constraints.push(constraint);
                    }
                }
            }
            if constraints.is_empty() {
                return Ok(None);
            }
            Ok(Some(Statement::AlterTable {
                table: object_name(name)?,
                constraints,
            }))
        }
        _ => Ok(None),
    }
}

fn convert_column(column: &ColumnDef, table: &mut CreateTable) -> Result<()> {
    let name = identifier(&column.name);
    let rendered = column.data_type.to_string();
    let data_type = (!rendered.trim().is_empty()).then(|| rendered.trim().to_string());

    for option in &column.options {
        match &option.option {
            ColumnOption::Unique {
                is_primary: true, ..
            } => table
                .constraints
                .push(TableConstraint::PrimaryKey(vec![name.clone()])),
            ColumnOption::ForeignKey {
                foreign_table,
                referred_columns,
                ..
            } => table.constraints.push(foreign_key(
                vec![name.clone()],
                foreign_table,
                referred_columns,
            )?),
            _ => {}
        }
    }
    table.columns.push(ColumnDefinition { name, data_type });
    Ok(())
}

fn convert_constraint(constraint: &ast::TableConstraint) -> Result<Option<TableConstraint>> {
    match constraint {
        ast::TableConstraint::Unique {
            columns,
            is_primary: true,
            ..
        } => Ok(Some(TableConstraint::PrimaryKey(identifiers(columns)))),
        ast::TableConstraint::ForeignKey {
            columns,
            foreign_table,
            referred_columns,
            ..
        } => foreign_key(identifiers(columns), foreign_table, referred_columns).map(Some),
        _ => Ok(None),
    }
}

fn foreign_key(
    columns: Vec<String>,
    foreign_table: &ObjectName,
    referred_columns: &[Ident],
) -> Result<TableConstraint> {
    let referenced_columns = identifiers(referred_columns);
    if !referenced_columns.is_empty() && referenced_columns.len() != columns.len() {
        return Err(MetaError::Parse(format!(
            "foreign key ({}) references {} columns of {foreign_table}",
            columns.join(", "),
            referenced_columns.len()
        )));
    }
    Ok(TableConstraint::ForeignKey {
        columns,
        referenced_table: object_name(foreign_table)?,
        referenced_columns,
    })
}

fn identifier(ident: &Ident) -> String {
    match ident.quote_style {
        Some(_) => ident.value.clone(),
        None => ident.value.to_lowercase(),
    }
}

fn identifiers(idents: &[Ident]) -> Vec<String> {
    idents.iter().map(identifier).collect()
}

fn object_name(name: &ObjectName) -> Result<String> {
    name.0
        .last()
        .map(identifier)
        .ok_or_else(|| MetaError::Parse("empty object name".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_table(sql: &str) -> CreateTable {
        match parse_statements(sql).unwrap().remove(0) {
            Statement::CreateTable(table) => table,
            other => panic!("expected CREATE TABLE, got {other:?}"),
        }
    }

    #[test]
    fn test_column_types() {
        let table = create_table(
            "CREATE TABLE IF NOT EXISTS public.Orders (
                id BIGINT NOT NULL,
                price NUMERIC(10, 2) DEFAULT 0,
                ratio DOUBLE PRECISION,
                title varchar(40)
            )",
        );
        assert_eq!(table.name, "orders");
        let types: Vec<Option<&str>> = table.columns.iter().map(|c| c.data_type.as_deref()).collect();
        assert_eq!(
            types,
            vec![
                Some("BIGINT"),
                Some("NUMERIC(10,2)"),
                Some("DOUBLE PRECISION"),
                Some("VARCHAR(40)"),
            ]
        );
    }

    #[test]
    fn test_quoted_identifiers_keep_case() {
        let table = create_table(r#"CREATE TABLE "Order Items" ("ItemKey" INT, [Qty] INT, Price INT)"#);
        assert_eq!(table.name, "Order Items");
        let names: Vec<&str> = table.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["ItemKey", "Qty", "price"]);
    }

    #[test]
    fn test_column_and_table_level_keys() {
        let table = create_table(
            "CREATE TABLE dep (
                id INT PRIMARY KEY,
                that_id INT REFERENCES ref1(id),
                fn VARCHAR(20), ln VARCHAR(20),
                CONSTRAINT fk_name FOREIGN KEY (fn, ln) REFERENCES people (first, last),
                UNIQUE (fn),
                CHECK (id > 0)
            );",
        );
        assert_eq!(table.columns.len(), 4);
        assert_eq!(
            table.constraints,
            vec![
                TableConstraint::PrimaryKey(vec!["id".to_string()]),
                TableConstraint::ForeignKey {
                    columns: vec!["that_id".to_string()],
                    referenced_table: "ref1".to_string(),
                    referenced_columns: vec!["id".to_string()],
                },
                TableConstraint::ForeignKey {
                    columns: vec!["fn".to_string(), "ln".to_string()],
                    referenced_table: "people".to_string(),
                    referenced_columns: vec!["first".to_string(), "last".to_string()],
                },
            ]
        );
    }

    #[test]
    fn test_alter_table_add_constraints() {
        let statements = parse_statements(
            "ALTER TABLE t4 ADD CONSTRAINT pk PRIMARY KEY (added_id);
             ALTER TABLE t5 ADD FOREIGN KEY (a) REFERENCES t4 (added_id);
             ALTER TABLE t6 DROP COLUMN y;",
        )
        .unwrap();
        assert_eq!(statements.len(), 2);
        assert_eq!(
            statements[0],
            Statement::AlterTable {
                table: "t4".to_string(),
                constraints: vec![TableConstraint::PrimaryKey(vec!["added_id".to_string()])],
            }
        );
    }

    #[test]
    fn test_other_statements_ignored() {
        let statements = parse_statements(
            "INSERT INTO t VALUES (1, 'a;b'); CREATE INDEX i ON t (a); DROP TABLE x; CREATE TABLE y AS SELECT 1;",
        )
        .unwrap();
        assert!(statements.is_empty());
    }

    #[test]
    fn test_mismatched_foreign_key_is_error() {
        let err = parse_statements(
            "CREATE TABLE b (z INT); CREATE TABLE a (x INT, y INT, FOREIGN KEY (x, y) REFERENCES b (z));",
        )
        .unwrap_err();
        assert!(matches!(err, MetaError::Parse(_)));
        assert!(err.to_string().contains("statement 2"), "{err}");
    }

    #[test]
    fn test_syntax_error() {
        let err = parse_statements("CREATE TABLE a (x INT").unwrap_err();
        assert!(matches!(err, MetaError::Parse(ref message) if message.starts_with("invalid DDL")));
    }
}
