//! Common test fixtures for classification scenarios.
//!
//! The shop fixture is a three-table schema with two declared foreign keys,
//! column statistics and a set of discovered inclusion dependencies that
//! contains both genuine and spurious candidates. The generators build
//! larger dependency sets for property tests and benchmarks.

use std::sync::Arc;

use crate::catalog::{Catalog, ColumnId};
use crate::constraints::{ColumnStatistics, InMemoryStatistics, PartialInclusionDependency};
use crate::error::Result;
use crate::fk::ClassifierContext;
use crate::sql::{parse_foreign_keys, ForeignKeyDefinition};

/// DDL of the shop fixture.
pub const SHOP_DDL: &str = r#"
    CREATE TABLE customers (
        id INTEGER PRIMARY KEY,
        name VARCHAR(100)
    );

    CREATE TABLE products (
        id INTEGER PRIMARY KEY,
        name VARCHAR(100),
        price DECIMAL(10, 2)
    );

    CREATE TABLE orders (
        id INTEGER PRIMARY KEY,
        customer_id INTEGER NOT NULL REFERENCES customers (id),
        product_id INTEGER,
        quantity INTEGER,
        note VARCHAR(255),
        FOREIGN KEY (product_id) REFERENCES products (id)
    );
"#;

/// Catalog, statistics and discovered dependencies of a small shop schema.
#[derive(Debug, Clone)]
pub struct ShopFixture {
    pub catalog: Arc<Catalog>,
    pub statistics: Arc<InMemoryStatistics>,
    /// Discovered inclusion dependencies, including a trivial one
    pub pinds: Vec<PartialInclusionDependency>,
    /// Foreign keys declared in [`SHOP_DDL`]
    pub ground_truth: Vec<ForeignKeyDefinition>,
}

impl ShopFixture {
    /// Id of `table.column`.
    pub fn column(&self, table: &str, column: &str) -> Result<ColumnId> {
        Ok(self.catalog.resolve_column(table, column)?.id())
    }

    /// Classifier resources backed by this fixture.
    pub fn context(&self) -> ClassifierContext {
        ClassifierContext::new()
            .with_statistics(self.statistics.clone())
            .with_catalog(Arc::clone(&self.catalog))
            .with_pinds(self.pinds.clone())
    }
}

/// Builds the shop fixture.
///
/// With the default classifiers `orders.customer_id ⊆ customers.id` and
/// `orders.product_id ⊆ products.id` are foreign keys; `orders.quantity ⊆
/// products.id` and `orders.note ⊆ customers.name` are not.
pub fn shop_fixture() -> Result<ShopFixture> {
    let mut catalog = Catalog::new();
    catalog.import_ddl("shop", SHOP_DDL)?;
    let id = |table: &str, column: &str| -> Result<ColumnId> {
        Ok(catalog.resolve_column(table, column)?.id())
    };

    let customer_id = id("customers", "id")?;
    let customer_name = id("customers", "name")?;
    let product_id = id("products", "id")?;
    let order_id = id("orders", "id")?;
    let order_customer = id("orders", "customer_id")?;
    let order_product = id("orders", "product_id")?;
    let order_quantity = id("orders", "quantity")?;
    let order_note = id("orders", "note")?;

    let statistics = InMemoryStatistics::from_statistics(vec![
        ColumnStatistics::new(customer_id).with_distinct_values(100),
        ColumnStatistics::new(customer_name).with_distinct_values(95),
        ColumnStatistics::new(product_id).with_distinct_values(50),
        ColumnStatistics::new(order_id).with_distinct_values(400),
        ColumnStatistics::new(order_customer).with_distinct_values(95),
        ColumnStatistics::new(order_product).with_distinct_values(48),
        ColumnStatistics::new(order_quantity).with_distinct_values(10),
        ColumnStatistics::new(order_note).with_distinct_values(5),
    ]);

    let pinds = vec![
        PartialInclusionDependency::unary(order_customer, customer_id, 0.0, 400)?,
        PartialInclusionDependency::unary(order_product, product_id, 0.0, 400)?,
        PartialInclusionDependency::unary(order_quantity, product_id, 0.6, 400)?,
        PartialInclusionDependency::unary(order_note, customer_name, 0.4, 120)?,
        PartialInclusionDependency::unary(order_id, order_id, 0.0, 400)?,
    ];

    Ok(ShopFixture {
        catalog: Arc::new(catalog),
        statistics: Arc::new(statistics),
        pinds,
        ground_truth: parse_foreign_keys(SHOP_DDL)?,
    })
}

/// All projections of one `arity`-ary dependency `[1..=arity] ⊆ [101..]`.
///
/// Every non-empty subset of the column pairs is returned, so the minimal
/// cover of the result is the single full dependency.
pub fn projection_lattice(arity: usize, error: f64) -> Result<Vec<PartialInclusionDependency>> {
    let mut pinds = Vec::new();
    for mask in 1u32..(1u32 << arity) {
        let (dependent, referenced): (Vec<ColumnId>, Vec<ColumnId>) = (0..arity as u32)
            .filter(|i| mask & (1 << i) != 0)
            .map(|i| (ColumnId::new(i + 1), ColumnId::new(i + 101)))
            .unzip();
        pinds.push(PartialInclusionDependency::new(dependent, referenced, error, 1_000)?);
    }
    Ok(pinds)
}

/// `count` unary candidates over disjoint column ids.
pub fn unary_pinds(count: u32) -> Result<Vec<PartialInclusionDependency>> {
    (0..count)
        .map(|i| PartialInclusionDependency::unary(ColumnId::new(2 * i + 1), ColumnId::new(2 * i + 2), 0.0, 100))
        .collect()
}
