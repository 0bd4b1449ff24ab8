//! # meta-guard - Structural Metadata for Rust
//!
//! meta-guard stores the structural metadata that data profiling discovers
//! about a set of tables, and decides which discovered inclusion
//! dependencies are foreign keys. It never scans data itself: column
//! statistics and inclusion dependencies are supplied by an upstream
//! discovery step.
//!
//! ## Overview
//!
//! - A [`Catalog`](catalog::Catalog) of schemas, tables and columns, each
//!   addressed by a packed `u32` global id.
//! - **Partial inclusion dependencies** (PINDs): `X ⊆ Y` that holds for all
//!   but a fraction `error` of the dependent values, with an implication
//!   check and a [`MinimalCover`](constraints::MinimalCover) that removes
//!   redundant dependencies.
//! - **Foreign key classification**: unary PINDs become candidates, a
//!   configurable list of classifiers votes on each with a weight, and a
//!   decision aggregator picks the label with the largest total weight.
//!
//! ## Quick Start
//!
//! ```rust
//! use meta_guard::prelude::*;
//! use meta_guard::constraints::InMemoryStatistics;
//! use meta_guard::fk::CoverageClassifier;
//! use std::sync::Arc;
//!
//! # fn main() -> meta_guard::error::Result<()> {
//! let mut catalog = Catalog::new();
//! catalog.import_ddl(
//!     "shop",
//!     "CREATE TABLE customers (id INT PRIMARY KEY);
//!      CREATE TABLE orders (id INT PRIMARY KEY, customer_id INT);",
//! )?;
//! let customer_id = catalog.resolve_column("customers", "id")?.id();
//! let order_customer = catalog.resolve_column("orders", "customer_id")?.id();
//!
//! let stats = Arc::new(InMemoryStatistics::from_statistics(vec![
//!     ColumnStatistics::new(customer_id).with_distinct_values(100),
//!     ColumnStatistics::new(order_customer).with_distinct_values(97),
//! ]));
//!
//! let pinds = vec![PartialInclusionDependency::unary(order_customer, customer_id, 0.0, 500)?];
//! let cover = MinimalCover::new().compute(&pinds);
//!
//! let pipeline = ClassificationPipeline::new()
//!     .add_classifier(Arc::new(CoverageClassifier::new(1.0, 0.9, 0.5, stats)?))?;
//! let candidates = pipeline.candidates(&cover)?.accepted;
//! let decisions = pipeline.classify(&candidates);
//!
//! assert_eq!(decisions[0].decision.label, ForeignKeyLabel::ForeignKey);
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration-driven pipelines
//!
//! Classifier lists are usually loaded from JSON:
//!
//! ```rust
//! use meta_guard::fk::{ClassifierContext, ClassificationPipeline, PipelineConfig};
//! use std::sync::Arc;
//!
//! # fn main() -> meta_guard::error::Result<()> {
//! let config = PipelineConfig::from_json_str(r#"{
//!     "classifiers": [
//!         {"type": "type_compatibility", "weight": 0.5},
//!         {"type": "naming", "fk_similarity": 0.85}
//!     ],
//!     "workers": 2
//! }"#)?;
//!
//! let context = ClassifierContext::new()
//!     .with_catalog(Arc::new(meta_guard::catalog::Catalog::new()));
//! let pipeline = ClassificationPipeline::from_config(&config, &context)?;
//! assert_eq!(pipeline.classifier_names(), vec!["type_compatibility", "naming"]);
//! # Ok(())
//! # }
//! ```
//!
//! Large candidate sets run sharded across blocking worker threads with
//! [`ClassificationPipeline::run`](fk::ClassificationPipeline::run), which
//! honours a shutdown signal between candidates.
//!
//! ## Architecture
//!
//! - **`catalog`**: schemas, tables, columns and the global id layout
//! - **`constraints`**: PINDs, minimal cover, column statistics, constraint collections
//! - **`repository`**: async storage of constraint collections
//! - **`fk`**: candidates, classifiers, aggregation, pipeline and evaluation
//! - **`sql`**: declared keys and tables from DDL, used as ground truth
//! - **`formatters`**: JSON, console and Markdown reports
//! - **`logging`**: tracing configuration and subscriber setup

pub mod catalog;
pub mod constraints;
pub mod error;
pub mod fk;
pub mod formatters;
pub mod logging;
pub mod prelude;
pub mod repository;
pub mod sql;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_fixtures;
