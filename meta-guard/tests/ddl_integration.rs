//! Integration tests for reading schemas and declared keys from DDL files.

use meta_guard::catalog::Catalog;
use meta_guard::error::MetaError;
use meta_guard::sql::{
    load_sql_file, parse_foreign_keys, parse_primary_keys, parse_schema, parse_statements,
    Statement,
};

const WAREHOUSE_DDL: &str = r#"
-- Dimension tables
CREATE TABLE IF NOT EXISTS dw.dim_date (
    date_key INTEGER NOT NULL,
    full_date DATE,
    CONSTRAINT pk_dim_date PRIMARY KEY (date_key)
);

CREATE TABLE "Dim_Store" (
    "StoreKey" INT PRIMARY KEY,
    store_name VARCHAR(120) DEFAULT 'unknown',
    UNIQUE (store_name)
);

/* Fact table with a composite key */
CREATE TABLE fact_sales (
    date_key INTEGER REFERENCES dw.dim_date,
    store_key INT,
    line_no SMALLINT,
    amount NUMERIC(12, 2) CHECK (amount >= 0),
    PRIMARY KEY (date_key, store_key, line_no)
);

ALTER TABLE fact_sales
    ADD CONSTRAINT fk_sales_store FOREIGN KEY (store_key) REFERENCES "Dim_Store" ("StoreKey");

CREATE INDEX idx_sales_date ON fact_sales (date_key);
"#;

#[test]
fn test_warehouse_schema() {
    let schema = parse_schema(WAREHOUSE_DDL).unwrap();
    let tables: Vec<&str> = schema.keys().map(String::as_str).collect();
    assert_eq!(tables, vec!["Dim_Store", "dim_date", "fact_sales"]);

    let fact: Vec<(&str, Option<&str>)> = schema["fact_sales"]
        .iter()
        .map(|c| (c.name.as_str(), c.data_type.as_deref()))
        .collect();
    assert_eq!(
        fact,
        vec![
            ("date_key", Some("INTEGER")),
            ("store_key", Some("INT")),
            ("line_no", Some("SMALLINT")),
            ("amount", Some("NUMERIC(12,2)")),
        ]
    );
}

#[test]
fn test_warehouse_keys() {
    let primary = parse_primary_keys(WAREHOUSE_DDL).unwrap();
    assert_eq!(primary.len(), 3);
    assert_eq!(primary[2].table, "fact_sales");
    assert_eq!(primary[2].columns, vec!["date_key", "store_key", "line_no"]);

    let foreign = parse_foreign_keys(WAREHOUSE_DDL).unwrap();
    assert_eq!(foreign.len(), 2);
    // Resolved through the declared primary key of dim_date.
    assert_eq!(foreign[0].referenced_table, "dim_date");
    assert_eq!(foreign[0].referenced_columns, vec!["date_key"]);
    assert_eq!(foreign[1].referenced_table, "Dim_Store");
    assert_eq!(foreign[1].referenced_columns, vec!["StoreKey"]);
}

#[test]
fn test_other_statements_are_skipped() {
    let statements = parse_statements(WAREHOUSE_DDL).unwrap();
    let creates = statements
        .iter()
        .filter(|s| matches!(s, Statement::CreateTable(_)))
        .count();
    let alters = statements
        .iter()
        .filter(|s| matches!(s, Statement::AlterTable { .. }))
        .count();
    assert_eq!((creates, alters), (3, 1));
}

#[test]
fn test_catalog_from_ddl_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("warehouse.sql");
    std::fs::write(&path, WAREHOUSE_DDL).unwrap();

    let sql = load_sql_file(&path).unwrap();
    let mut catalog = Catalog::new();
    catalog.import_ddl("dw", &sql).unwrap();

    assert_eq!(catalog.column_count(), 8);
    let amount = catalog.resolve_column("fact_sales", "amount").unwrap();
    assert_eq!(amount.data_type(), Some("NUMERIC(12,2)"));
    assert_eq!(
        catalog.qualified_name(amount.id()).as_deref(),
        Some("dw.fact_sales.amount")
    );
}

#[test]
fn test_malformed_ddl_is_parse_error() {
    let err = parse_statements("CREATE TABLE a (id INT);\nCREATE TABLE b (id INT").unwrap_err();
    match err {
        MetaError::Parse(message) => assert!(message.starts_with("invalid DDL"), "{message}"),
        other => panic!("expected parse error, got {other:?}"),
    }
}
