//! Prelude for commonly used types and traits in meta-guard.

pub use crate::catalog::{Catalog, ColumnId, SchemaId, TableId};
pub use crate::constraints::{
    BatchErrorPolicy, ColumnStatistics, MinimalCover, PartialInclusionDependency,
    StatisticsProvider,
};
pub use crate::error::{MetaError, Result};
pub use crate::fk::{
    ClassificationPipeline, ClassificationReport, ForeignKeyLabel, PartialForeignKeyClassifier,
    PipelineConfig, UnaryForeignKeyCandidate,
};
pub use crate::formatters::{FormatterConfig, ResultFormatter};
pub use crate::logging::LogConfig;
pub use crate::repository::ConstraintRepository;
